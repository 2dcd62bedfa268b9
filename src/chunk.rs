use std::collections::HashMap;

use crate::decode::content::decode_content_into;
use crate::error::DecodeError;
use crate::ir_map::{Compression, Encoding, IrPayload};
use crate::query::region::Region;
use crate::resolve::{TileData, TileResolver};
use crate::spatial::index::TileKey;

/// Cell storage of a chunk. The `Encoded` side keeps the previous
/// allocation (empty) so a recycled chunk decodes without reallocating.
#[derive(Debug)]
enum Cells {
    Encoded(Vec<u32>),
    Decoded(Vec<u32>),
}

/// Rectangular block of cells, decoded on first lookup.
#[derive(Debug)]
pub struct Chunk {
    bounds: Region,
    raw: String,
    encoding: Encoding,
    compression: Compression,
    cells: Cells,
    memo: HashMap<TileKey, TileData>,
}

impl Default for Chunk {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunk {
    /// An empty chunk with no payload.
    pub fn new() -> Self {
        Chunk {
            bounds: Region::default(),
            raw: String::new(),
            encoding: Encoding::Csv,
            compression: Compression::None,
            cells: Cells::Encoded(Vec::new()),
            memo: HashMap::new(),
        }
    }

    /// Points the chunk at a new payload covering `w * h` tiles at `(x, y)`.
    /// The payload text is copied into the chunk's own buffer.
    pub fn load(&mut self, x: i32, y: i32, w: i32, h: i32, payload: &IrPayload) {
        self.reset();
        self.bounds = Region::new(x, y, x.saturating_add(w), y.saturating_add(h));
        self.raw.push_str(&payload.content);
        self.encoding = payload.encoding;
        self.compression = payload.compression;
    }

    /// Drops payload, decoded cells and memo; keeps their allocations.
    pub fn reset(&mut self) {
        self.memo.clear();
        self.raw.clear();
        self.bounds = Region::default();
        if let Cells::Decoded(cells) = &mut self.cells {
            let mut cells = std::mem::take(cells);
            cells.clear();
            self.cells = Cells::Encoded(cells);
        }
    }

    /// Covered tiles, in tile coordinates.
    pub fn bounds(&self) -> Region {
        self.bounds
    }

    /// Whether the payload has been decoded yet.
    pub fn is_decoded(&self) -> bool {
        matches!(self.cells, Cells::Decoded(_))
    }

    /// Number of memoized tiles.
    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    #[cfg(test)]
    pub(crate) fn cell_capacity(&self) -> usize {
        match &self.cells {
            Cells::Encoded(c) | Cells::Decoded(c) => c.capacity(),
        }
    }

    fn decoded(&mut self) -> Result<&[u32], DecodeError> {
        if let Cells::Encoded(spare) = &mut self.cells {
            let mut buf = std::mem::take(spare);
            match decode_content_into(&self.raw, self.encoding, self.compression, &mut buf) {
                Ok(()) => self.cells = Cells::Decoded(buf),
                Err(e) => {
                    self.cells = Cells::Encoded(buf);
                    return Err(e);
                }
            }
        }
        match &self.cells {
            Cells::Decoded(cells) => Ok(cells.as_slice()),
            Cells::Encoded(_) => Ok(&[]),
        }
    }

    /// Tile at `(x, y)` (tile coordinates). `Ok(None)` when outside the
    /// chunk, empty, past the end of a short payload, or not owned by any
    /// tileset.
    pub fn tile_at(
        &mut self,
        x: i32,
        y: i32,
        resolver: &TileResolver<'_>,
    ) -> Result<Option<TileData>, DecodeError> {
        if !self.bounds.contains(x, y) {
            return Ok(None);
        }

        let lx = x - self.bounds.min_x;
        let ly = y - self.bounds.min_y;
        let key = TileKey::new(lx, ly);
        if let Some(tile) = self.memo.get(&key) {
            return Ok(Some(*tile));
        }

        let w = self.bounds.width() as usize;
        let idx = ly as usize * w + lx as usize;
        let cell = match self.decoded()?.get(idx) {
            Some(&cell) if cell != 0 => cell,
            _ => return Ok(None),
        };

        let tile = resolver.resolve(cell, x, y);
        if let Some(tile) = tile {
            self.memo.insert(key, tile);
        }
        Ok(tile)
    }

    /// Appends every tile of `area` that lies in this chunk, row by row.
    pub fn collect(
        &mut self,
        area: &Region,
        resolver: &TileResolver<'_>,
        out: &mut Vec<TileData>,
    ) -> Result<(), DecodeError> {
        let clipped = self.bounds.clip(area);
        if clipped.is_empty() {
            return Ok(());
        }
        for y in clipped.min_y..clipped.max_y {
            for x in clipped.min_x..clipped.max_x {
                if let Some(tile) = self.tile_at(x, y, resolver)? {
                    out.push(tile);
                }
            }
        }
        Ok(())
    }
}
