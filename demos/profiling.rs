//! Headless scroll over a large synthetic infinite map.
//!
//! `RUST_LOG=debug cargo run --release --example profiling`

use std::sync::Arc;
use std::time::Instant;

use log::info;
use macroquad::prelude::*;
use macroquad_tiled_query::{
    Frame, IrChunk, IrLayer, IrLayerData, IrMap, IrPayload, IrTileset, LayerFlags, Map, Pool,
    PoolConfig,
};

const CHUNK: i32 = 16;
const CHUNKS_PER_SIDE: i32 = 64;
const TILE: i32 = 16;
const FRAMES: usize = 10_000;

fn synthetic_map(layers: usize) -> IrMap {
    let cells: Vec<u32> = (0..CHUNK * CHUNK).map(|i| (i % 7 + 1) as u32).collect();
    let payload = IrPayload::from_gids(&cells);
    let half = CHUNKS_PER_SIDE / 2;

    let chunks: Vec<IrChunk> = (-half..half)
        .flat_map(|cy| (-half..half).map(move |cx| (cx, cy)))
        .map(|(cx, cy)| IrChunk {
            x: cx * CHUNK,
            y: cy * CHUNK,
            width: CHUNK,
            height: CHUNK,
            payload: payload.clone(),
        })
        .collect();

    IrMap {
        width: 0,
        height: 0,
        tile_w: TILE,
        tile_h: TILE,
        infinite: true,
        tilesets: vec![IrTileset {
            first_gid: 1,
            source: "terrain.json".into(),
        }],
        layers: (0..layers)
            .map(|i| IrLayer {
                name: format!("layer{i}"),
                width: 0,
                height: 0,
                flags: LayerFlags::VISIBLE,
                offset: Vec2::ZERO,
                data: IrLayerData::Chunks(chunks.clone()),
            })
            .collect(),
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let pool = Arc::new(Pool::with_config(PoolConfig {
        prewarm_chunks: 1024,
        ..Default::default()
    }));

    let started = Instant::now();
    let mut map = Map::with_document(pool.clone(), Arc::new(synthetic_map(3)))?;
    info!(
        "built {} layers in {:?}, bounds {:?}",
        map.layer_count(),
        started.elapsed(),
        map.bounds()
    );

    let view = vec2(1280.0, 720.0);
    let mut tiles = 0usize;
    let started = Instant::now();
    for i in 0..FRAMES {
        // camera wobbles while drifting right
        let t = i as f32 * 0.37;
        let origin = vec2(t.sin() * 900.0 + t, t.cos() * 400.0);
        let frame = Frame::from_corners(origin, origin + view);
        tiles += map.query(frame)?.all().len();
    }
    let elapsed = started.elapsed();

    let stats = map.cache_stats();
    info!(
        "{FRAMES} frames in {:?} ({:?}/frame), {} tiles total",
        elapsed,
        elapsed / FRAMES as u32,
        tiles
    );
    info!(
        "cache: {} hits, {} reuses, {} rebuilds",
        stats.hits, stats.reuses, stats.rebuilds
    );

    drop(map);
    info!("pool after drop: {:?}", pool.stats());
    Ok(())
}
