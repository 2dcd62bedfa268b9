// src/loader/json_loader.rs
use crate::error::MapError;
use crate::ir_map::*;
use log::debug;
use macroquad::prelude::*;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonData {
    Gids(Vec<u32>),
    Encoded(String),
}

#[derive(Deserialize)]
struct JsonChunk {
    data: JsonData,
    x: i32,
    y: i32,
    width: i32,
    height: i32,
}

#[derive(Deserialize)]
struct JsonLayer {
    #[serde(default)]
    data: Option<JsonData>,
    #[serde(default)]
    chunks: Vec<JsonChunk>,
    #[serde(default)]
    width: i32,
    #[serde(default)]
    height: i32,
    #[serde(default = "default_true")]
    visible: bool,
    #[serde(default)]
    locked: bool,
    #[serde(default)]
    offsetx: f32,
    #[serde(default)]
    offsety: f32,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    kind: Option<String>, // "tilelayer" expected here
    #[serde(default)]
    encoding: Option<Encoding>,
    #[serde(default)]
    compression: Option<Compression>,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize)]
struct JsonTilesetRef {
    firstgid: u32,
    #[serde(default)]
    source: String, // empty for embedded tilesets
}

#[derive(Deserialize)]
struct JsonMap {
    #[serde(default)]
    width: i32,
    #[serde(default)]
    height: i32,
    tilewidth: i32,
    tileheight: i32,
    #[serde(default)]
    infinite: bool,
    layers: Vec<JsonLayer>,
    #[serde(default)]
    tilesets: Vec<JsonTilesetRef>,
}

fn payload_to_ir(
    data: JsonData,
    encoding: Option<Encoding>,
    compression: Option<Compression>,
) -> IrPayload {
    match data {
        JsonData::Gids(gids) => IrPayload::from_gids(&gids),
        JsonData::Encoded(content) => IrPayload {
            encoding: encoding.unwrap_or(Encoding::Base64),
            compression: compression.unwrap_or_default(),
            content,
        },
    }
}

fn layer_to_ir(l: JsonLayer, infinite: bool) -> Result<IrLayer, MapError> {
    let mut flags = LayerFlags::empty();
    flags.set(LayerFlags::VISIBLE, l.visible);
    flags.set(LayerFlags::LOCKED, l.locked);

    let (encoding, compression) = (l.encoding, l.compression);
    let data = if infinite {
        IrLayerData::Chunks(
            l.chunks
                .into_iter()
                .map(|c| IrChunk {
                    x: c.x,
                    y: c.y,
                    width: c.width,
                    height: c.height,
                    payload: payload_to_ir(c.data, encoding, compression),
                })
                .collect(),
        )
    } else {
        let data = l.data.ok_or_else(|| {
            MapError::InvalidMap(format!("tile layer '{}' has no data", l.name))
        })?;
        IrLayerData::Finite(payload_to_ir(data, encoding, compression))
    };

    Ok(IrLayer {
        name: l.name,
        width: l.width,
        height: l.height,
        flags,
        offset: vec2(l.offsetx, l.offsety),
        data,
    })
}

fn map_to_ir(j: JsonMap) -> Result<IrMap, MapError> {
    let mut tilesets: Vec<IrTileset> = j
        .tilesets
        .into_iter()
        .map(|ts| IrTileset {
            first_gid: ts.firstgid,
            source: ts.source,
        })
        .collect();
    // Sort by first_gid so the owning tileset is the last one not above a gid
    tilesets.sort_by_key(|t| t.first_gid);

    let mut layers = Vec::with_capacity(j.layers.len());
    for l in j.layers {
        match l.kind.as_deref().unwrap_or("tilelayer") {
            "tilelayer" => layers.push(layer_to_ir(l, j.infinite)?),
            other => debug!("skipping {other} layer '{}'", l.name),
        }
    }

    Ok(IrMap {
        width: j.width,
        height: j.height,
        tile_w: j.tilewidth,
        tile_h: j.tileheight,
        infinite: j.infinite,
        tilesets,
        layers,
    })
}

/// Parses an in-memory Tiled JSON map.
pub fn decode_map_str(json: &str) -> Result<IrMap, MapError> {
    let j: JsonMap = serde_json::from_str(json).map_err(|source| MapError::Json {
        path: PathBuf::new(),
        source,
    })?;
    map_to_ir(j)
}

/// Reads and parses a Tiled JSON map file.
pub fn decode_map_file_to_ir(path: impl AsRef<Path>) -> Result<IrMap, MapError> {
    let p = path.as_ref();
    if p.extension().and_then(|e| e.to_str()) != Some("json") {
        return Err(MapError::InvalidMap(format!(
            "Map file must be a JSON file: {}",
            p.display()
        )));
    }

    let txt = std::fs::read_to_string(p).map_err(|source| MapError::Io {
        path: p.to_path_buf(),
        source,
    })?;
    let j: JsonMap = serde_json::from_str(&txt).map_err(|source| MapError::Json {
        path: p.to_path_buf(),
        source,
    })?;

    map_to_ir(j)
}
