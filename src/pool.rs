//! Free lists of [`Chunk`]s and [`Layer`]s recycled across document swaps.
//!
//! A pool is created explicitly and handed to every [`crate::Map`] that
//! should share it (`Arc<Pool>`). The free lists are mutex guarded, so maps
//! living on different threads may share one pool.

use parking_lot::Mutex;
use serde::Deserialize;

use crate::chunk::Chunk;
use crate::layer::Layer;

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Chunks allocated up front.
    pub prewarm_chunks: usize,
    /// Layers allocated up front.
    pub prewarm_layers: usize,
    /// Released chunks beyond this count are dropped.
    pub max_free_chunks: usize,
    /// Released layers beyond this count are dropped.
    pub max_free_layers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            prewarm_chunks: 2,
            prewarm_layers: 2,
            max_free_chunks: 4096,
            max_free_layers: 256,
        }
    }
}

/// Snapshot of the free list sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Chunks waiting for reuse.
    pub free_chunks: usize,
    /// Layers waiting for reuse.
    pub free_layers: usize,
}

/// Reusable chunk and layer storage.
#[derive(Debug)]
pub struct Pool {
    config: PoolConfig,
    chunks: Mutex<Vec<Chunk>>,
    layers: Mutex<Vec<Layer>>,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    /// Pool with [`PoolConfig::default`].
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    /// Pool sized by `config`, prewarmed up to its caps.
    pub fn with_config(config: PoolConfig) -> Self {
        let chunks = (0..config.prewarm_chunks.min(config.max_free_chunks))
            .map(|_| Chunk::new())
            .collect();
        let layers = (0..config.prewarm_layers.min(config.max_free_layers))
            .map(|_| Layer::new())
            .collect();
        Pool {
            config,
            chunks: Mutex::new(chunks),
            layers: Mutex::new(layers),
        }
    }

    /// Sizing in effect.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// A recycled chunk, or a new one when the free list is empty.
    pub fn acquire_chunk(&self) -> Chunk {
        self.chunks.lock().pop().unwrap_or_default()
    }

    /// Resets `chunk` and keeps it for reuse.
    pub fn release_chunk(&self, mut chunk: Chunk) {
        chunk.reset();
        let mut free = self.chunks.lock();
        if free.len() < self.config.max_free_chunks {
            free.push(chunk);
        }
    }

    /// A recycled, empty layer, or a new one.
    pub fn acquire_layer(&self) -> Layer {
        self.layers.lock().pop().unwrap_or_default()
    }

    /// Returns `layer` and all of its chunks to the pool.
    pub fn release_layer(&self, mut layer: Layer) {
        {
            let mut free = self.chunks.lock();
            for mut chunk in layer.drain_chunks() {
                chunk.reset();
                if free.len() < self.config.max_free_chunks {
                    free.push(chunk);
                }
            }
        }
        layer.reset();

        let mut free = self.layers.lock();
        if free.len() < self.config.max_free_layers {
            free.push(layer);
        }
    }

    /// Current free list sizes.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            free_chunks: self.chunks.lock().len(),
            free_layers: self.layers.lock().len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir_map::{IrChunk, IrLayer, IrLayerData, IrPayload, LayerFlags};
    use macroquad::prelude::*;

    fn chunked_layer(n: i32) -> IrLayer {
        IrLayer {
            name: "l".into(),
            width: 0,
            height: 0,
            flags: LayerFlags::VISIBLE,
            offset: Vec2::ZERO,
            data: IrLayerData::Chunks(
                (0..n)
                    .map(|i| IrChunk {
                        x: i * 2,
                        y: 0,
                        width: 2,
                        height: 2,
                        payload: IrPayload::from_gids(&[1, 1, 1, 1]),
                    })
                    .collect(),
            ),
        }
    }

    #[test]
    fn prewarms_free_lists() {
        let pool = Pool::new();
        assert_eq!(
            pool.stats(),
            PoolStats {
                free_chunks: 2,
                free_layers: 2
            }
        );
    }

    #[test]
    fn release_layer_recycles_its_chunks() {
        let pool = Pool::with_config(PoolConfig {
            prewarm_chunks: 0,
            prewarm_layers: 0,
            ..PoolConfig::default()
        });

        let mut layer = pool.acquire_layer();
        layer.fill(&chunked_layer(5), true, &pool).unwrap();
        assert_eq!(layer.chunk_count(), 5);

        pool.release_layer(layer);
        assert_eq!(
            pool.stats(),
            PoolStats {
                free_chunks: 5,
                free_layers: 1
            }
        );

        let again = pool.acquire_layer();
        assert_eq!(again.chunk_count(), 0);
        assert!(!again.is_visible());
        let chunk = pool.acquire_chunk();
        assert!(chunk.bounds().is_empty());
        assert!(!chunk.is_decoded());
        assert_eq!(pool.stats().free_chunks, 4);
    }

    #[test]
    fn caps_are_respected() {
        let pool = Pool::with_config(PoolConfig {
            prewarm_chunks: 0,
            prewarm_layers: 0,
            max_free_chunks: 3,
            max_free_layers: 0,
        });
        let mut layer = pool.acquire_layer();
        layer.fill(&chunked_layer(5), true, &pool).unwrap();
        pool.release_layer(layer);
        assert_eq!(
            pool.stats(),
            PoolStats {
                free_chunks: 3,
                free_layers: 0
            }
        );
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: PoolConfig = serde_json::from_str(r#"{ "max_free_chunks": 10 }"#).unwrap();
        assert_eq!(cfg.max_free_chunks, 10);
        assert_eq!(cfg.prewarm_layers, PoolConfig::default().prewarm_layers);
    }

    #[test]
    fn shared_across_threads() {
        let pool = std::sync::Arc::new(Pool::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let pool = pool.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        let c = pool.acquire_chunk();
                        pool.release_chunk(c);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(pool.stats().free_chunks >= 2);
    }
}
