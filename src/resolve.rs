//! Turns packed cell values into [`TileData`] records.

use macroquad::prelude::*;

use crate::decode::gid::{FlipFlags, Gid};
use crate::ir_map::IrTileset;

/// One resolved tile, as returned by [`crate::Map::query`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileData {
    /// World position of the tile's top-left corner, layer offset included.
    pub pos: Vec2,
    /// Tile id local to its tileset.
    pub tile_id: u32,
    /// Index into the document's tileset list.
    pub tileset: usize,
    /// Orientation flags.
    pub flip: FlipFlags,
}

/// Finds the tileset owning `gid`: the last one whose `first_gid <= gid`.
///
/// Tilesets must be sorted ascending by `first_gid`.
pub fn tileset_for_gid(tilesets: &[IrTileset], gid: u32) -> Option<(usize, u32)> {
    tilesets
        .iter()
        .enumerate()
        .rev()
        .find(|(_, ts)| gid >= ts.first_gid)
        .map(|(i, ts)| (i, gid - ts.first_gid))
}

/// Map context needed to resolve a cell of one layer.
#[derive(Debug, Clone, Copy)]
pub struct TileResolver<'a> {
    /// Document tilesets, ascending by `first_gid`.
    pub tilesets: &'a [IrTileset],
    /// Tile width in pixels.
    pub tile_w: i32,
    /// Tile height in pixels.
    pub tile_h: i32,
    /// Added to every resolved position.
    pub offset: Vec2,
}

impl<'a> TileResolver<'a> {
    /// Resolves the cell at tile `(x, y)`. `None` for empty cells and ids no
    /// tileset owns.
    pub fn resolve(&self, cell: u32, x: i32, y: i32) -> Option<TileData> {
        let (gid, flip) = Gid(cell).decode();
        if gid == 0 {
            return None;
        }
        let (tileset, tile_id) = tileset_for_gid(self.tilesets, gid)?;
        Some(TileData {
            pos: vec2(
                x as f32 * self.tile_w as f32,
                y as f32 * self.tile_h as f32,
            ) + self.offset,
            tile_id,
            tileset,
            flip,
        })
    }
}
