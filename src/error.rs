use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::ir_map::Compression;

/// Errors produced by the map loader and the query engine.
#[derive(Debug, Error)]
pub enum MapError {
    /// A query or tileset lookup happened before any document was set.
    #[error("no map document set")]
    NoDocument,
    /// The document cannot back a tile map (no layers, zero tile size, ...).
    #[error("invalid map document: {0}")]
    InvalidDocument(String),
    /// Tileset index out of range.
    #[error("tileset {0} not found")]
    TilesetNotFound(usize),
    /// The tileset exists but has no source to load it from.
    #[error("tileset {0} has an empty source")]
    TilesetSourceEmpty(usize),
    /// The query frame has `min > max` on at least one axis.
    #[error("invalid frame bounds ({min_x}, {min_y}) .. ({max_x}, {max_y})")]
    InvalidBounds {
        /// Left edge.
        min_x: f32,
        /// Top edge.
        min_y: f32,
        /// Right edge.
        max_x: f32,
        /// Bottom edge.
        max_y: f32,
    },
    /// Layer or chunk payload could not be decoded.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// File I/O error while reading a map.
    #[error("reading {path}: {source}")]
    Io {
        /// File being read.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// Map JSON did not deserialize.
    #[error("parsing {path}: {source}")]
    Json {
        /// File being parsed (empty for in-memory input).
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The map file uses something the loader does not understand.
    #[error("invalid map: {0}")]
    InvalidMap(String),
}

/// Failure to turn an encoded payload into cell values.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A CSV token is not an unsigned integer.
    #[error("invalid CSV layer data: {token:?}")]
    InvalidCsv {
        /// The offending token, trimmed.
        token: String,
    },
    /// Payload is not valid base64.
    #[error("invalid base64 layer data: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decompressor rejected the stream.
    #[error("{compression} decompression failed: {source}")]
    Decompress {
        /// Compressor that failed.
        compression: Compression,
        /// Underlying error.
        source: io::Error,
    },
    /// Decoded byte length is not a multiple of 4.
    #[error("invalid base64 layer data length: {0}")]
    InvalidLength(usize),
}
