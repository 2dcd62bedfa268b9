use macroquad::prelude::*;

use crate::chunk::Chunk;
use crate::error::{DecodeError, MapError};
use crate::ir_map::{IrLayer, IrLayerData, LayerFlags};
use crate::pool::Pool;
use crate::query::region::Region;
use crate::resolve::{TileData, TileResolver};
use crate::spatial::index::GridIndex;

/// Queryable tile layer: one chunk spanning the layer for finite maps, or
/// grid-indexed chunks for infinite ones.
#[derive(Debug, Default)]
pub struct Layer {
    flags: LayerFlags,
    offset: Vec2,
    infinite: bool,
    chunks: Vec<Chunk>,
    index: GridIndex,
    hits: Vec<usize>,
}

impl Layer {
    /// Empty layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Visible layers contribute to queries.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(LayerFlags::VISIBLE)
    }

    /// Locked in the editor; informational only.
    pub fn is_locked(&self) -> bool {
        self.flags.contains(LayerFlags::LOCKED)
    }

    /// Chunked layer of an infinite map.
    pub fn is_infinite(&self) -> bool {
        self.infinite
    }

    /// Number of chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Chunks in document order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Fills an empty layer from `src`, taking chunks from `pool`.
    ///
    /// On error the layer may hold some chunks; hand it back to the pool.
    pub(crate) fn fill(
        &mut self,
        src: &IrLayer,
        infinite: bool,
        pool: &Pool,
    ) -> Result<(), MapError> {
        self.flags = src.flags;
        self.offset = src.offset;
        self.infinite = infinite;

        match (&src.data, infinite) {
            (IrLayerData::Finite(payload), false) => {
                if src.width < 0 || src.height < 0 {
                    return Err(MapError::InvalidDocument(format!(
                        "layer '{}' has negative size {}x{}",
                        src.name, src.width, src.height
                    )));
                }
                let mut chunk = pool.acquire_chunk();
                chunk.load(0, 0, src.width, src.height, payload);
                self.chunks.push(chunk);
            }
            (IrLayerData::Chunks(chunks), true) => {
                let (cw, ch) = chunks
                    .first()
                    .map(|c| (c.width, c.height))
                    .unwrap_or((0, 0));
                self.index.reset(cw, ch);

                for c in chunks {
                    if c.width <= 0 || c.height <= 0 {
                        return Err(MapError::InvalidDocument(format!(
                            "layer '{}' has an empty chunk at ({}, {})",
                            src.name, c.x, c.y
                        )));
                    }
                    let mut chunk = pool.acquire_chunk();
                    chunk.load(c.x, c.y, c.width, c.height, &c.payload);
                    self.index.insert(chunk.bounds());
                    self.chunks.push(chunk);
                }
            }
            (IrLayerData::Finite(_), true) => {
                return Err(MapError::InvalidDocument(format!(
                    "layer '{}' has no chunks but the map is infinite",
                    src.name
                )));
            }
            (IrLayerData::Chunks(_), false) => {
                return Err(MapError::InvalidDocument(format!(
                    "layer '{}' is chunked but the map is finite",
                    src.name
                )));
            }
        }
        Ok(())
    }

    /// Empties the layer; chunks are handed out through `drain_chunks` first.
    pub(crate) fn reset(&mut self) {
        debug_assert!(self.chunks.is_empty());
        self.flags = LayerFlags::empty();
        self.offset = Vec2::ZERO;
        self.infinite = false;
        self.index.reset(0, 0);
        self.hits.clear();
    }

    pub(crate) fn drain_chunks(&mut self) -> std::vec::Drain<'_, Chunk> {
        self.chunks.drain(..)
    }

    fn resolver<'a>(&self, base: &TileResolver<'a>) -> TileResolver<'a> {
        TileResolver {
            offset: self.offset,
            ..*base
        }
    }

    /// Appends the layer's tiles inside `area` to `out`, chunk by chunk.
    /// Ignores visibility.
    pub fn collect(
        &mut self,
        area: &Region,
        base: &TileResolver<'_>,
        out: &mut Vec<TileData>,
    ) -> Result<(), DecodeError> {
        let resolver = self.resolver(base);
        if !self.infinite {
            if let Some(chunk) = self.chunks.first_mut() {
                chunk.collect(area, &resolver, out)?;
            }
            return Ok(());
        }

        self.index.query(area, &mut self.hits);
        for &slot in &self.hits {
            self.chunks[slot].collect(area, &resolver, out)?;
        }
        Ok(())
    }

    /// Tile at `(x, y)` in tile coordinates; the first chunk containing the
    /// position answers.
    pub fn tile_at(
        &mut self,
        x: i32,
        y: i32,
        base: &TileResolver<'_>,
    ) -> Result<Option<TileData>, DecodeError> {
        let resolver = self.resolver(base);
        if !self.infinite {
            return match self.chunks.first_mut() {
                Some(chunk) => chunk.tile_at(x, y, &resolver),
                None => Ok(None),
            };
        }

        self.index.query(&Region::new(x, y, x + 1, y + 1), &mut self.hits);
        match self.hits.first() {
            Some(&slot) => self.chunks[slot].tile_at(x, y, &resolver),
            None => Ok(None),
        }
    }
}
