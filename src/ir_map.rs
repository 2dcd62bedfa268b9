// src/ir_map.rs
use std::fmt;

use macroquad::prelude::*;
use serde::Deserialize;

/// Canonical, format-agnostic map document consumed by [`crate::Map`].
#[derive(Debug, Clone)]
pub struct IrMap {
    /// Map width in tiles (finite maps).
    pub width: i32,
    /// Map height in tiles (finite maps).
    pub height: i32,
    /// Tile width in pixels.
    pub tile_w: i32,
    /// Tile height in pixels.
    pub tile_h: i32,
    /// Unbounded, chunk based map.
    pub infinite: bool,
    /// Must be sorted by `first_gid`.
    pub tilesets: Vec<IrTileset>,
    /// Draw order: array order.
    pub layers: Vec<IrLayer>,
}

/// Reference to a tileset; the engine only needs its GID range start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrTileset {
    /// First global id owned by this tileset.
    pub first_gid: u32,
    /// Where renderers load the tileset from. Empty for embedded tilesets.
    pub source: String,
}

/// Layer payload text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Comma separated GIDs.
    #[default]
    Csv,
    /// Little-endian `u32` GIDs, base64 encoded, optionally compressed.
    Base64,
}

/// Compression applied to base64 payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Raw bytes.
    #[default]
    #[serde(rename = "")]
    None,
    /// gzip stream.
    Gzip,
    /// zlib stream.
    Zlib,
    /// zstd frame.
    Zstd,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Encoding::Csv => "csv",
            Encoding::Base64 => "base64",
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Zlib => "zlib",
            Compression::Zstd => "zstd",
        })
    }
}

/// Encoded cells of one finite layer or one chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IrPayload {
    /// Text encoding of `content`.
    pub encoding: Encoding,
    /// Compression under the base64 text.
    pub compression: Compression,
    /// The encoded text itself.
    pub content: String,
}

impl IrPayload {
    /// CSV payload built from already known GIDs.
    pub fn from_gids(gids: &[u32]) -> Self {
        let content = gids
            .iter()
            .map(|g| g.to_string())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            encoding: Encoding::Csv,
            compression: Compression::None,
            content,
        }
    }
}

/// Rectangular, independently encoded block of an infinite layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrChunk {
    /// Origin in tiles.
    pub x: i32,
    /// Origin in tiles.
    pub y: i32,
    /// Size in tiles.
    pub width: i32,
    /// Size in tiles.
    pub height: i32,
    /// Encoded cells, `width * height` of them.
    pub payload: IrPayload,
}

/// Tile storage of a layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IrLayerData {
    /// Whole layer in one payload (finite maps).
    Finite(IrPayload),
    /// Sparse chunks (infinite maps).
    Chunks(Vec<IrChunk>),
}

/// Bit set of layer state flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayerFlags(u8);

impl LayerFlags {
    /// Layer is drawn / queried.
    pub const VISIBLE: LayerFlags = LayerFlags(1 << 0);
    /// Layer is locked in the editor.
    pub const LOCKED: LayerFlags = LayerFlags(1 << 1);

    /// No flag set.
    pub const fn empty() -> Self {
        LayerFlags(0)
    }
    /// Every flag of `other` is set.
    #[inline]
    pub fn contains(self, other: LayerFlags) -> bool {
        self.0 & other.0 == other.0
    }
    /// Sets or clears `other`.
    #[inline]
    pub fn set(&mut self, other: LayerFlags, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }
}

impl std::ops::BitOr for LayerFlags {
    type Output = LayerFlags;
    fn bitor(self, rhs: LayerFlags) -> LayerFlags {
        LayerFlags(self.0 | rhs.0)
    }
}

/// A tile layer.
#[derive(Debug, Clone)]
pub struct IrLayer {
    /// Name given in the editor.
    pub name: String,
    /// Width in tiles (finite maps).
    pub width: i32,
    /// Height in tiles (finite maps).
    pub height: i32,
    /// Visibility and lock state.
    pub flags: LayerFlags,
    /// Pixel offset added to every tile position.
    pub offset: Vec2,
    /// Cell storage.
    pub data: IrLayerData,
}

impl IrLayer {
    /// `true` when the layer takes part in queries.
    pub fn is_visible(&self) -> bool {
        self.flags.contains(LayerFlags::VISIBLE)
    }

    /// `true` when the layer is locked in the editor.
    pub fn is_locked(&self) -> bool {
        self.flags.contains(LayerFlags::LOCKED)
    }
}
