use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use log::{debug, trace, warn};
use macroquad::prelude::*;

use crate::error::MapError;
use crate::ir_map::{IrLayerData, IrMap, IrTileset};
use crate::layer::Layer;
use crate::loader::json_loader::decode_map_file_to_ir;
use crate::pool::Pool;
use crate::query::cache::{CacheOutcome, CacheStats, QueryCache};
use crate::query::iter::LayerTiles;
use crate::query::region::{Frame, Region};
use crate::resolve::{TileData, TileResolver};

/// World-space extents of a map, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MapBounds {
    /// Left edge.
    pub min_x: i32,
    /// Top edge.
    pub min_y: i32,
    /// Right edge.
    pub max_x: i32,
    /// Bottom edge.
    pub max_y: i32,
}

impl MapBounds {
    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.max_x.saturating_sub(self.min_x)
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Same extents as a macroquad [`Rect`].
    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.min_x as f32,
            self.min_y as f32,
            self.width() as f32,
            self.height() as f32,
        )
    }

    fn of(doc: &IrMap) -> Self {
        let tiles = if doc.infinite {
            tile_extent(doc)
        } else {
            Region::new(0, 0, doc.width, doc.height)
        };
        MapBounds {
            min_x: tiles.min_x.saturating_mul(doc.tile_w),
            min_y: tiles.min_y.saturating_mul(doc.tile_h),
            max_x: tiles.max_x.saturating_mul(doc.tile_w),
            max_y: tiles.max_y.saturating_mul(doc.tile_h),
        }
    }
}

/// Tile area holding the document's cells: the largest layer for finite
/// maps, the union of all chunks for infinite ones. Empty when there are none.
fn tile_extent(doc: &IrMap) -> Region {
    if !doc.infinite {
        let w = doc.layers.iter().map(|l| l.width).fold(doc.width, i32::max);
        let h = doc.layers.iter().map(|l| l.height).fold(doc.height, i32::max);
        return Region::new(0, 0, w.max(0), h.max(0));
    }

    let mut extent: Option<Region> = None;
    for layer in &doc.layers {
        if let IrLayerData::Chunks(chunks) = &layer.data {
            for c in chunks {
                let r = Region::new(
                    c.x,
                    c.y,
                    c.x.saturating_add(c.width),
                    c.y.saturating_add(c.height),
                );
                extent = Some(match extent {
                    Some(e) => Region::new(
                        e.min_x.min(r.min_x),
                        e.min_y.min(r.min_y),
                        e.max_x.max(r.max_x),
                        e.max_y.max(r.max_y),
                    ),
                    None => r,
                });
            }
        }
    }
    extent.unwrap_or_default()
}

/// Query engine over one map document.
///
/// Build it empty with [`Map::new`], give it a document with
/// [`Map::set_document`], then call [`Map::query`] once per frame with the
/// visible world rectangle. Queries take `&mut self` and the returned
/// iterator borrows the map, so results can't be aliased across queries;
/// use [`LayerTiles::to_snapshot`] to keep them.
#[derive(Debug)]
pub struct Map {
    pool: Arc<Pool>,
    doc: Option<Arc<IrMap>>,
    layers: Vec<Layer>,
    layers_built: bool,
    frame: Frame,
    bounds: MapBounds,
    extent: Region,
    cache: QueryCache,
}

impl Map {
    /// An empty map drawing its chunks and layers from `pool`.
    pub fn new(pool: Arc<Pool>) -> Self {
        Map {
            pool,
            doc: None,
            layers: Vec::with_capacity(4),
            layers_built: false,
            frame: Frame::default(),
            bounds: MapBounds::default(),
            extent: Region::default(),
            cache: QueryCache::new(),
        }
    }

    /// Map with `doc` already set.
    pub fn with_document(pool: Arc<Pool>, doc: Arc<IrMap>) -> Result<Self, MapError> {
        let mut map = Self::new(pool);
        map.set_document(doc)?;
        Ok(map)
    }

    /// Loads a Tiled JSON map from disk.
    pub fn load(path: impl AsRef<Path>, pool: Arc<Pool>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let ir = decode_map_file_to_ir(path)
            .with_context(|| format!("Loading map {}", path.display()))?;
        Self::with_document(pool, Arc::new(ir))
            .with_context(|| format!("Building map {}", path.display()))
    }

    /// Replaces the document and rebuilds all layers.
    ///
    /// A document without layers or with a non-positive tile size is
    /// rejected and the current document stays. If building the layers fails,
    /// the map is left without a document.
    pub fn set_document(&mut self, doc: Arc<IrMap>) -> Result<(), MapError> {
        if doc.layers.is_empty() {
            return Err(MapError::InvalidDocument("map has no layers".into()));
        }
        if doc.tile_w <= 0 || doc.tile_h <= 0 {
            return Err(MapError::InvalidDocument(format!(
                "tile size must be positive, got {}x{}",
                doc.tile_w, doc.tile_h
            )));
        }

        self.release_layers();
        self.cache.invalidate();
        self.doc = None;
        self.bounds = MapBounds::default();
        self.extent = Region::default();

        build_layers(&self.pool, &doc, &mut self.layers)?;
        self.layers_built = true;
        self.bounds = MapBounds::of(&doc);
        self.extent = tile_extent(&doc);

        debug!(
            "map document set: {} layers, {} chunks, infinite={}",
            self.layers.len(),
            self.layers.iter().map(Layer::chunk_count).sum::<usize>(),
            doc.infinite
        );
        self.doc = Some(doc);
        Ok(())
    }

    /// Returns layers and chunks to the pool and clears the cache. The
    /// document is kept; the next query rebuilds the layers.
    pub fn flush(&mut self) {
        self.release_layers();
        self.cache.invalidate();
        debug!("map flushed");
    }

    fn release_layers(&mut self) {
        for layer in self.layers.drain(..) {
            self.pool.release_layer(layer);
        }
        self.layers_built = false;
    }

    /// The current document.
    pub fn document(&self) -> Option<&Arc<IrMap>> {
        self.doc.as_ref()
    }

    /// World-space extents, computed when the document was set.
    pub fn bounds(&self) -> MapBounds {
        self.bounds
    }

    /// Frame of the last successful query.
    pub fn frame(&self) -> Frame {
        self.frame
    }

    /// Live layers, in document order. Empty after [`Map::flush`].
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Number of live layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// Pool this map draws from.
    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// Hit/reuse/rebuild totals since the map was created.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// How the last successful query was served.
    pub fn last_outcome(&self) -> Option<CacheOutcome> {
        self.cache.last_outcome()
    }

    /// Tile region of the cached results, if any.
    pub fn cached_region(&self) -> Option<Region> {
        self.cache.region()
    }

    /// Tileset `index` of the document. Fails if it has no source.
    pub fn tileset(&self, index: usize) -> Result<&IrTileset, MapError> {
        let doc = self.doc.as_ref().ok_or(MapError::NoDocument)?;
        let ts = doc
            .tilesets
            .get(index)
            .ok_or(MapError::TilesetNotFound(index))?;
        if ts.source.is_empty() {
            return Err(MapError::TilesetSourceEmpty(index));
        }
        Ok(ts)
    }

    fn ensure_layers(&mut self) -> Result<(), MapError> {
        if self.layers_built {
            return Ok(());
        }
        let doc = self.doc.clone().ok_or(MapError::NoDocument)?;
        if let Err(e) = build_layers(&self.pool, &doc, &mut self.layers) {
            self.doc = None;
            self.bounds = MapBounds::default();
            self.extent = Region::default();
            return Err(e);
        }
        self.layers_built = true;
        Ok(())
    }

    /// Tiles visible in `frame` (world pixels), one slice per document layer.
    ///
    /// Querying the same tile region again returns the cached results
    /// without recomputing anything.
    pub fn query(&mut self, frame: Frame) -> Result<LayerTiles<'_>, MapError> {
        if self.doc.is_none() {
            return Err(MapError::NoDocument);
        }
        frame.validate()?;
        self.ensure_layers()?;

        let doc = self.doc.as_deref().ok_or(MapError::NoDocument)?;
        let region = Region::from_frame(&frame, doc.tile_w, doc.tile_h);
        let base = TileResolver {
            tilesets: &doc.tilesets,
            tile_w: doc.tile_w,
            tile_h: doc.tile_h,
            offset: Vec2::ZERO,
        };

        let layers = &mut self.layers;
        let outcome = self
            .cache
            .refresh(region, &self.extent, layers.len(), |i, out| {
                let layer = &mut layers[i];
                if !layer.is_visible() {
                    return Ok(());
                }
                layer.collect(&region, &base, out)
            })
            .map_err(|e| {
                warn!("decoding tiles for {region:?} failed: {e}");
                MapError::from(e)
            })?;

        self.frame = frame;
        trace!(
            "query {:?} -> {:?}, {} tiles",
            region,
            outcome,
            self.cache.tiles().len()
        );
        Ok(self.cache.iter())
    }

    /// Single tile of layer `layer` at tile `(x, y)`, bypassing the query
    /// cache (but not the chunk memo). Hidden layers still answer.
    pub fn tile_at(
        &mut self,
        layer: usize,
        x: i32,
        y: i32,
    ) -> Result<Option<TileData>, MapError> {
        self.ensure_layers()?;
        let doc = self.doc.as_deref().ok_or(MapError::NoDocument)?;
        let base = TileResolver {
            tilesets: &doc.tilesets,
            tile_w: doc.tile_w,
            tile_h: doc.tile_h,
            offset: Vec2::ZERO,
        };
        let Some(l) = self.layers.get_mut(layer) else {
            return Ok(None);
        };
        Ok(l.tile_at(x, y, &base)?)
    }
}

impl Drop for Map {
    fn drop(&mut self) {
        self.release_layers();
    }
}

/// Builds one layer per document layer into `out` (which must be empty).
/// On failure everything built so far goes back to the pool.
fn build_layers(pool: &Pool, doc: &IrMap, out: &mut Vec<Layer>) -> Result<(), MapError> {
    for src in &doc.layers {
        let mut layer = pool.acquire_layer();
        let res = layer.fill(src, doc.infinite, pool);
        out.push(layer);
        if let Err(e) = res {
            for layer in out.drain(..) {
                pool.release_layer(layer);
            }
            return Err(e);
        }
    }
    Ok(())
}
