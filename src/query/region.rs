use macroquad::prelude::*;

use crate::error::MapError;

/// The viewport, in world (pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Frame {
    /// Top-left corner.
    pub min: Vec2,
    /// Bottom-right corner.
    pub max: Vec2,
}

impl Frame {
    /// Frame from its four edges.
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Frame {
            min: vec2(min_x, min_y),
            max: vec2(max_x, max_y),
        }
    }

    /// Frame from two corners.
    pub fn from_corners(min: Vec2, max: Vec2) -> Self {
        Frame { min, max }
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    /// Vertical extent.
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// `(min_x, min_y, max_x, max_y)`.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (self.min.x, self.min.y, self.max.x, self.max.y)
    }

    /// Rejects frames with `min > max` on an axis or non-finite edges.
    pub fn validate(&self) -> Result<(), MapError> {
        let finite = self.min.is_finite() && self.max.is_finite();
        if !finite || self.min.x > self.max.x || self.min.y > self.max.y {
            return Err(MapError::InvalidBounds {
                min_x: self.min.x,
                min_y: self.min.y,
                max_x: self.max.x,
                max_y: self.max.y,
            });
        }
        Ok(())
    }
}

/// Half-open rectangle `[min, max)` in tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region {
    /// First column.
    pub min_x: i32,
    /// First row.
    pub min_y: i32,
    /// One past the last column.
    pub max_x: i32,
    /// One past the last row.
    pub max_y: i32,
}

impl Region {
    /// Region from its edges.
    pub const fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Region {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Smallest region covering every tile `frame` touches: minimums are
    /// floored, maximums ceiled.
    pub fn from_frame(frame: &Frame, tile_w: i32, tile_h: i32) -> Self {
        let tw = f64::from(tile_w);
        let th = f64::from(tile_h);
        Region {
            min_x: (f64::from(frame.min.x) / tw).floor() as i32,
            min_y: (f64::from(frame.min.y) / th).floor() as i32,
            max_x: (f64::from(frame.max.x) / tw).ceil() as i32,
            max_y: (f64::from(frame.max.y) / th).ceil() as i32,
        }
    }

    /// Horizontal span in tiles, saturating at `i32::MAX`.
    #[inline]
    pub fn width(&self) -> i32 {
        self.max_x.saturating_sub(self.min_x)
    }

    /// Vertical span in tiles, saturating at `i32::MAX`.
    #[inline]
    pub fn height(&self) -> i32 {
        self.max_y.saturating_sub(self.min_y)
    }

    /// Number of tiles covered, 0 for empty regions.
    pub fn area(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.width() as usize).saturating_mul(self.height() as usize)
    }

    /// True when the region covers no tile.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.max_x <= self.min_x || self.max_y <= self.min_y
    }

    /// Whether tile `(x, y)` lies inside.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x < self.max_x && y >= self.min_y && y < self.max_y
    }

    /// Whether both regions share at least one tile.
    pub fn intersects(&self, other: &Region) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }

    /// Overlap of both regions; may be empty.
    pub fn clip(&self, other: &Region) -> Region {
        Region {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }

    /// Each dimension differs from `other`'s by at most one tile.
    ///
    /// Only decides whether cache buffers are reused as-is; results are
    /// always recomputed when regions differ.
    pub fn capacity_compatible(&self, other: &Region) -> bool {
        self.width().abs_diff(other.width()) <= 1 && self.height().abs_diff(other.height()) <= 1
    }
}
