use std::collections::HashMap;

use crate::query::region::Region;

/// Grid cell edge, in tiles, used when a layer has no chunk to size it from.
pub const DEFAULT_CELL_SIZE: i32 = 16;

/// Position of a tile, in tiles. Hashes the pair, never a packed integer.
///
/// Both coordinates must fit the `i32` tile space of the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileKey {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileKey {
    /// Key for tile `(x, y)`.
    #[inline]
    pub fn new(x: i32, y: i32) -> Self {
        TileKey { x, y }
    }
}

/// Coordinate of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoord {
    /// Cell column.
    pub x: i32,
    /// Cell row.
    pub y: i32,
}

/// Uniform grid over chunk rectangles.
///
/// Items are identified by a slot (their index in the owning layer); a
/// rectangle spanning several cells is stored in each of them and
/// deduplicated on query.
#[derive(Debug)]
pub struct GridIndex {
    cell_w: i32,
    cell_h: i32,
    buckets: HashMap<CellCoord, Vec<usize>>,
    bounds: Vec<Region>,
    spare: Vec<Vec<usize>>,
}

impl Default for GridIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl GridIndex {
    /// Empty grid with the default cell size.
    pub fn new() -> Self {
        GridIndex {
            cell_w: DEFAULT_CELL_SIZE,
            cell_h: DEFAULT_CELL_SIZE,
            buckets: HashMap::new(),
            bounds: Vec::new(),
            spare: Vec::new(),
        }
    }

    /// Empties the grid and sets a new cell size. Bucket storage is kept.
    pub fn reset(&mut self, cell_w: i32, cell_h: i32) {
        for (_, mut bucket) in self.buckets.drain() {
            bucket.clear();
            self.spare.push(bucket);
        }
        self.bounds.clear();
        self.cell_w = cell_w.max(1);
        self.cell_h = cell_h.max(1);
    }

    /// Number of inserted rectangles.
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Nothing inserted.
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Cell width and height in tiles.
    pub fn cell_size(&self) -> (i32, i32) {
        (self.cell_w, self.cell_h)
    }

    #[inline]
    fn cell_range(&self, r: &Region) -> (CellCoord, CellCoord) {
        (
            CellCoord {
                x: r.min_x.div_euclid(self.cell_w),
                y: r.min_y.div_euclid(self.cell_h),
            },
            CellCoord {
                x: (r.max_x - 1).div_euclid(self.cell_w),
                y: (r.max_y - 1).div_euclid(self.cell_h),
            },
        )
    }

    /// Registers `bounds` under the next slot and returns that slot.
    /// Empty rectangles get a slot but are never returned by [`query`].
    ///
    /// [`query`]: GridIndex::query
    pub fn insert(&mut self, bounds: Region) -> usize {
        let slot = self.bounds.len();
        self.bounds.push(bounds);
        if bounds.is_empty() {
            return slot;
        }

        let (lo, hi) = self.cell_range(&bounds);
        for cy in lo.y..=hi.y {
            for cx in lo.x..=hi.x {
                let spare = &mut self.spare;
                self.buckets
                    .entry(CellCoord { x: cx, y: cy })
                    .or_insert_with(|| spare.pop().unwrap_or_default())
                    .push(slot);
            }
        }
        slot
    }

    /// Writes the slots whose rectangle intersects `area` into `out`,
    /// ascending and without duplicates.
    pub fn query(&self, area: &Region, out: &mut Vec<usize>) {
        out.clear();
        if area.is_empty() || self.bounds.is_empty() {
            return;
        }

        let (lo, hi) = self.cell_range(area);
        let cells = (hi.x as i64 - lo.x as i64 + 1) * (hi.y as i64 - lo.y as i64 + 1);

        if cells as usize > self.buckets.len() {
            // Area covers more cells than are occupied.
            for (cc, bucket) in &self.buckets {
                if cc.x >= lo.x && cc.x <= hi.x && cc.y >= lo.y && cc.y <= hi.y {
                    out.extend_from_slice(bucket);
                }
            }
        } else {
            for cy in lo.y..=hi.y {
                for cx in lo.x..=hi.x {
                    if let Some(bucket) = self.buckets.get(&CellCoord { x: cx, y: cy }) {
                        out.extend_from_slice(bucket);
                    }
                }
            }
        }

        out.sort_unstable();
        out.dedup();
        out.retain(|&slot| self.bounds[slot].intersects(area));
    }
}
