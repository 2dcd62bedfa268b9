#![warn(missing_docs)]

//! Cached viewport queries over Tiled maps for Macroquad.
//!
//! A [`Map`] decodes layer data lazily, indexes the chunks of infinite maps
//! on a grid, and caches the tiles of the last queried region so a camera
//! that stays put (or jitters by a tile) costs next to nothing per frame.

mod chunk;
mod decode {
    pub mod content;
    pub mod gid;
}
mod error;
mod ir_map;
mod layer;
mod loader {
    pub mod json_loader;
}
mod map;
mod pool;
mod query {
    pub mod cache;
    pub mod iter;
    pub mod region;
}
mod resolve;
mod spatial {
    pub mod index;
}

pub use chunk::Chunk;
pub use decode::content::{decode_content, decode_content_into};
pub use decode::gid::{FlipFlags, Gid, FLIP_D, FLIP_H, FLIP_V, GID_MASK, ROTATE_HEX};
pub use error::{DecodeError, MapError};
pub use ir_map::{
    Compression, Encoding, IrChunk, IrLayer, IrLayerData, IrMap, IrPayload, IrTileset, LayerFlags,
};
pub use layer::Layer;
pub use loader::json_loader::{decode_map_file_to_ir, decode_map_str};
pub use map::{Map, MapBounds};
pub use pool::{Pool, PoolConfig, PoolStats};
pub use query::cache::{CacheOutcome, CacheStats, QueryCache};
pub use query::iter::{LayerTiles, TileSnapshot};
pub use query::region::{Frame, Region};
pub use resolve::{tileset_for_gid, TileData, TileResolver};
pub use spatial::index::{GridIndex, TileKey};
