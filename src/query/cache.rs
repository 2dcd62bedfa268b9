use crate::query::iter::LayerTiles;
use crate::query::region::Region;
use crate::resolve::TileData;

/// What a query did with the cached results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Same region as last time; nothing recomputed.
    Hit,
    /// Region changed by at most one tile per dimension; recomputed into the
    /// existing buffers.
    Reused,
    /// Recomputed after growing the buffers to the estimated size.
    Rebuilt,
}

/// Running totals of [`CacheOutcome`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Queries answered from the cache.
    pub hits: u64,
    /// Recomputed into the existing buffers.
    pub reuses: u64,
    /// Recomputed after resizing the buffers.
    pub rebuilds: u64,
}

/// Last queried region and its tiles, one contiguous run per layer.
///
/// `offsets` has `layers + 1` non-decreasing entries once built; layer `i`
/// owns `tiles[offsets[i]..offsets[i + 1]]`. Buffers are only ever cleared,
/// never shrunk.
#[derive(Debug, Default)]
pub struct QueryCache {
    region: Option<Region>,
    tiles: Vec<TileData>,
    offsets: Vec<usize>,
    stats: CacheStats,
    last: Option<CacheOutcome>,
}

impl QueryCache {
    /// Empty cache; the first query rebuilds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides how a query for `region` is served.
    pub fn plan(&self, region: &Region) -> CacheOutcome {
        match &self.region {
            Some(cached) if cached == region => CacheOutcome::Hit,
            Some(cached) if cached.capacity_compatible(region) => CacheOutcome::Reused,
            _ => CacheOutcome::Rebuilt,
        }
    }

    /// Serves `region`: returns immediately on a hit, otherwise refills the
    /// buffers by calling `fill(layer, out)` for every layer in order.
    ///
    /// `extent` is the tile area the layers can hold tiles in; buffers are
    /// sized for its overlap with `region`, never for `region` alone.
    /// If `fill` fails the cache is left empty and invalid.
    pub fn refresh<E, F>(
        &mut self,
        region: Region,
        extent: &Region,
        layer_count: usize,
        mut fill: F,
    ) -> Result<CacheOutcome, E>
    where
        F: FnMut(usize, &mut Vec<TileData>) -> Result<(), E>,
    {
        let outcome = self.plan(&region);
        self.last = Some(outcome);

        match outcome {
            CacheOutcome::Hit => {
                self.stats.hits += 1;
                return Ok(outcome);
            }
            CacheOutcome::Reused => {
                self.stats.reuses += 1;
                self.tiles.clear();
            }
            CacheOutcome::Rebuilt => {
                self.stats.rebuilds += 1;
                self.tiles.clear();
                let estimate = region.clip(extent).area().saturating_mul(layer_count);
                self.tiles.reserve(estimate);
            }
        }
        self.offsets.clear();
        self.offsets.reserve(layer_count + 1);
        self.region = None;

        for layer in 0..layer_count {
            self.offsets.push(self.tiles.len());
            if let Err(e) = fill(layer, &mut self.tiles) {
                self.invalidate();
                return Err(e);
            }
        }
        self.offsets.push(self.tiles.len());
        self.region = Some(region);

        Ok(outcome)
    }

    /// Forgets the cached region and empties the buffers.
    pub fn invalidate(&mut self) {
        self.region = None;
        self.tiles.clear();
        self.offsets.clear();
    }

    /// Region the buffers hold, if valid.
    pub fn region(&self) -> Option<Region> {
        self.region
    }

    /// All cached tiles, layer after layer.
    pub fn tiles(&self) -> &[TileData] {
        &self.tiles
    }

    /// Start of each layer in `tiles`, plus the end.
    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    /// Allocated tile slots.
    pub fn capacity(&self) -> usize {
        self.tiles.capacity()
    }

    /// Outcome totals.
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Outcome of the last `refresh`.
    pub fn last_outcome(&self) -> Option<CacheOutcome> {
        self.last
    }

    /// Per-layer view of the cached tiles.
    pub fn iter(&self) -> LayerTiles<'_> {
        LayerTiles::new(&self.tiles, &self.offsets)
    }
}
