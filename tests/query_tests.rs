// tests/query_tests.rs

use std::collections::HashSet;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use macroquad::prelude::vec2;
use macroquad_tiled_query::{
    CacheOutcome, Compression, Encoding, Frame, IrChunk, IrLayer, IrLayerData, IrMap, IrPayload,
    IrTileset, LayerFlags, Map, MapError, Pool, TileSnapshot,
};

fn gid_at(x: i32, y: i32) -> u32 {
    ((x + y) % 10 + 1) as u32
}

fn grid(w: i32, h: i32) -> Vec<u32> {
    let mut out = Vec::with_capacity((w * h) as usize);
    for y in 0..h {
        for x in 0..w {
            out.push(gid_at(x, y));
        }
    }
    out
}

fn tileset() -> Vec<IrTileset> {
    vec![IrTileset {
        first_gid: 1,
        source: "test.json".into(),
    }]
}

fn finite_doc(w: i32, h: i32, tile: i32, layers: usize) -> IrMap {
    IrMap {
        width: w,
        height: h,
        tile_w: tile,
        tile_h: tile,
        infinite: false,
        tilesets: tileset(),
        layers: (0..layers)
            .map(|i| IrLayer {
                name: format!("layer{i}"),
                width: w,
                height: h,
                flags: LayerFlags::VISIBLE,
                offset: vec2(0.0, 0.0),
                data: IrLayerData::Finite(IrPayload::from_gids(&grid(w, h))),
            })
            .collect(),
    }
}

fn infinite_doc(chunks: &[(i32, i32)], size: i32, tile: i32) -> IrMap {
    IrMap {
        width: 0,
        height: 0,
        tile_w: tile,
        tile_h: tile,
        infinite: true,
        tilesets: tileset(),
        layers: vec![IrLayer {
            name: "ground".into(),
            width: 0,
            height: 0,
            flags: LayerFlags::VISIBLE,
            offset: vec2(0.0, 0.0),
            data: IrLayerData::Chunks(
                chunks
                    .iter()
                    .map(|&(x, y)| IrChunk {
                        x,
                        y,
                        width: size,
                        height: size,
                        payload: IrPayload::from_gids(&grid(size, size)),
                    })
                    .collect(),
            ),
        }],
    }
}

fn query(map: &mut Map, frame: Frame) -> TileSnapshot {
    map.query(frame).expect("query").to_snapshot()
}

#[test]
fn same_frame_twice_hits_cache() {
    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(finite_doc(32, 32, 16, 2)))
        .unwrap();
    let frame = Frame::new(0.0, 0.0, 256.0, 256.0);

    let first = query(&mut map, frame);
    assert_eq!(map.last_outcome(), Some(CacheOutcome::Rebuilt));
    let second = query(&mut map, frame);
    assert_eq!(map.last_outcome(), Some(CacheOutcome::Hit));

    assert_eq!(first, second);
    assert_eq!(first.layer_count(), 2);
    assert_eq!(first.tile_count(), 2 * 16 * 16);
}

#[test]
fn jittered_query_matches_fresh_map() {
    let pool = Arc::new(Pool::new());
    let doc = Arc::new(finite_doc(64, 64, 16, 2));
    let mut map = Map::with_document(pool.clone(), doc.clone()).unwrap();

    // 21x16 tiles, then 22x16 one tile over
    query(&mut map, Frame::new(100.0, 100.0, 420.0, 340.0));
    let moved = Frame::new(117.0, 96.0, 452.0, 340.0);
    let jittered = query(&mut map, moved);
    assert_eq!(map.last_outcome(), Some(CacheOutcome::Reused));

    let mut fresh = Map::with_document(pool, doc).unwrap();
    assert_eq!(jittered, query(&mut fresh, moved));
}

#[test]
fn panning_across_the_map_stays_consistent() {
    let pool = Arc::new(Pool::new());
    let doc = Arc::new(finite_doc(64, 64, 16, 1));
    let mut map = Map::with_document(pool.clone(), doc.clone()).unwrap();

    for step in 0..40 {
        let x = step as f32 * 7.5;
        let frame = Frame::new(x, x * 0.5, x + 320.0, x * 0.5 + 240.0);
        let got = query(&mut map, frame);
        let mut fresh = Map::with_document(pool.clone(), doc.clone()).unwrap();
        assert_eq!(got, query(&mut fresh, frame), "step {step}");
    }
    let stats = map.cache_stats();
    assert_eq!(stats.hits + stats.reuses + stats.rebuilds, 40);
}

#[test]
fn empty_cells_are_never_returned() {
    // row 0: empty, gid 1, flipped empty; row 1: gid 2, gid 99, empty
    let mut doc = finite_doc(3, 2, 8, 1);
    doc.layers[0].data = IrLayerData::Finite(IrPayload::from_gids(&[0, 1, 0x8000_0000, 2, 99, 0]));
    doc.tilesets.push(IrTileset {
        first_gid: 100,
        source: "b.json".into(),
    });

    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();
    let snap = query(&mut map, Frame::new(-8.0, -8.0, 64.0, 64.0));
    let tiles = snap.iter().layer(0).unwrap();

    let positions: Vec<(f32, f32)> = tiles.iter().map(|t| (t.pos.x, t.pos.y)).collect();
    assert_eq!(positions, vec![(8.0, 0.0), (0.0, 8.0), (8.0, 8.0)]);
    assert_eq!(tiles[2].tile_id, 98);
    assert_eq!(tiles[2].tileset, 0);
}

#[test]
fn gid_below_every_tileset_is_dropped() {
    let mut doc = finite_doc(2, 1, 16, 1);
    doc.tilesets[0].first_gid = 5;
    doc.layers[0].data = IrLayerData::Finite(IrPayload::from_gids(&[4, 5]));

    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();
    let snap = query(&mut map, Frame::new(0.0, 0.0, 32.0, 16.0));
    let tiles = snap.iter().layer(0).unwrap();
    assert_eq!(tiles.len(), 1);
    assert_eq!(tiles[0].pos.x, 16.0);
    assert_eq!(tiles[0].tile_id, 0);
}

#[test]
fn document_swap_resets_state() {
    let pool = Arc::new(Pool::new());
    let mut map = Map::with_document(pool, Arc::new(finite_doc(32, 32, 16, 3))).unwrap();
    let frame = Frame::new(0.0, 0.0, 512.0, 512.0);
    assert_eq!(query(&mut map, frame).layer_count(), 3);

    // second document: a single layer of one distinct gid
    let mut doc2 = finite_doc(4, 4, 16, 1);
    doc2.tilesets[0].first_gid = 1;
    doc2.layers[0].data = IrLayerData::Finite(IrPayload::from_gids(&[7; 16]));
    map.set_document(Arc::new(doc2)).unwrap();

    assert_eq!(map.layer_count(), 1);
    assert_eq!(map.cached_region(), None);

    let snap = query(&mut map, frame);
    assert_eq!(map.last_outcome(), Some(CacheOutcome::Rebuilt));
    assert_eq!(snap.layer_count(), 1);
    assert_eq!(snap.tile_count(), 16);
    assert!(snap.iter().all().iter().all(|t| t.tile_id == 6));
}

#[test]
fn infinite_map_spans_adjacent_chunks_once() {
    let doc = infinite_doc(&[(0, 0), (16, 0)], 16, 16);
    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();

    let snap = query(&mut map, Frame::new(0.0, 0.0, 512.0, 256.0));
    let tiles = snap.iter().layer(0).unwrap();
    assert_eq!(tiles.len(), 2 * 16 * 16);

    let unique: HashSet<(i32, i32)> = tiles
        .iter()
        .map(|t| (t.pos.x as i32 / 16, t.pos.y as i32 / 16))
        .collect();
    assert_eq!(unique.len(), tiles.len());
    for x in 0..32 {
        for y in 0..16 {
            assert!(unique.contains(&(x, y)), "missing tile ({x}, {y})");
        }
    }
}

#[test]
fn infinite_map_boundary_column() {
    let doc = infinite_doc(&[(0, 0), (16, 0)], 16, 16);
    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();

    // exactly tiles x = 15 and x = 16 of row 0
    let snap = query(&mut map, Frame::new(240.0, 0.0, 272.0, 16.0));
    let xs: Vec<f32> = snap.iter().layer(0).unwrap().iter().map(|t| t.pos.x).collect();
    assert_eq!(xs, vec![240.0, 256.0]);
}

#[test]
fn infinite_map_with_negative_chunks() {
    let doc = infinite_doc(&[(-16, -16), (0, -16), (-16, 0), (0, 0)], 16, 8);
    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();
    assert_eq!(map.bounds().min_x, -128);

    let snap = query(&mut map, Frame::new(-8.0, -8.0, 8.0, 8.0));
    assert_eq!(snap.tile_count(), 4);
    // only chunks touched by the query are decoded
    let decoded = map.layers()[0]
        .chunks()
        .iter()
        .filter(|c| c.is_decoded())
        .count();
    assert_eq!(decoded, 4);

    query(&mut map, Frame::new(1.0, 1.0, 30.0, 30.0));
    assert_eq!(map.layers()[0].chunks()[0].memo_len(), 1);
}

#[test]
fn only_intersecting_chunks_decode() {
    let chunks: Vec<(i32, i32)> = (0..8)
        .flat_map(|x| (0..8).map(move |y| (x * 16, y * 16)))
        .collect();
    let doc = infinite_doc(&chunks, 16, 16);
    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();

    query(&mut map, Frame::new(0.0, 0.0, 320.0, 240.0));
    let decoded = map.layers()[0]
        .chunks()
        .iter()
        .filter(|c| c.is_decoded())
        .count();
    // 320x240 px at 16px tiles = 20x15 tiles -> 2x1 chunks
    assert_eq!(decoded, 2);
}

#[test]
fn compressed_layers_decode_through_the_map() {
    use flate2::write::GzEncoder;
    use std::io::Write;

    let cells = grid(4, 4);
    let bytes: Vec<u8> = cells.iter().flat_map(|c| c.to_le_bytes()).collect();
    let mut enc = GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(&bytes).unwrap();
    let content = STANDARD.encode(enc.finish().unwrap());

    let mut doc = finite_doc(4, 4, 16, 1);
    doc.layers[0].data = IrLayerData::Finite(IrPayload {
        encoding: Encoding::Base64,
        compression: Compression::Gzip,
        content,
    });

    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();
    let mut csv = Map::with_document(Arc::new(Pool::new()), Arc::new(finite_doc(4, 4, 16, 1)))
        .unwrap();
    let frame = Frame::new(0.0, 0.0, 64.0, 64.0);
    assert_eq!(query(&mut map, frame), query(&mut csv, frame));
}

#[test]
fn corrupt_payload_fails_the_query_and_invalidates() {
    let mut doc = finite_doc(2, 2, 16, 2);
    doc.layers[1].data = IrLayerData::Finite(IrPayload {
        encoding: Encoding::Csv,
        compression: Compression::None,
        content: "1,2,oops,4".into(),
    });
    let mut map = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();

    let err = map.query(Frame::new(0.0, 0.0, 32.0, 32.0)).unwrap_err();
    assert!(matches!(err, MapError::Decode(_)));
    assert_eq!(map.cached_region(), None);

    // still failing, never served from a half-built cache
    assert!(map.query(Frame::new(0.0, 0.0, 32.0, 32.0)).is_err());
    // map stays usable for lookups on healthy layers
    assert_eq!(map.tile_at(0, 1, 1).unwrap().map(|t| t.tile_id), Some(2));
}

#[test]
fn repeated_swaps_reuse_pooled_objects() {
    let pool = Arc::new(Pool::new());
    let mut map = Map::new(pool.clone());
    let finite = Arc::new(finite_doc(16, 16, 16, 2));
    let infinite = Arc::new(infinite_doc(&[(0, 0), (16, 0), (0, 16)], 16, 16));

    for i in 0..6 {
        let doc = if i % 2 == 0 { &finite } else { &infinite };
        map.set_document(doc.clone()).unwrap();
        assert_eq!(map.layer_count(), doc.layers.len());
        assert!(query(&mut map, Frame::new(0.0, 0.0, 256.0, 256.0)).tile_count() > 0);
        map.flush();
    }

    let stats = pool.stats();
    assert!(stats.free_layers >= 2);
    assert!(stats.free_chunks >= 3);
}

#[test]
fn maps_share_a_pool_across_threads() {
    let pool = Arc::new(Pool::new());
    let doc = Arc::new(finite_doc(32, 32, 16, 1));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let pool = pool.clone();
            let doc = doc.clone();
            std::thread::spawn(move || {
                let mut map = Map::with_document(pool, doc).unwrap();
                let x = i as f32 * 16.0;
                map.query(Frame::new(x, 0.0, x + 256.0, 256.0))
                    .unwrap()
                    .to_snapshot()
            })
        })
        .collect();

    for h in handles {
        assert_eq!(h.join().unwrap().tile_count(), 16 * 16);
    }
}

#[test]
fn zoomed_out_frames_return_only_map_tiles() {
    let mut finite = Map::with_document(Arc::new(Pool::new()), Arc::new(finite_doc(2, 2, 1, 1)))
        .unwrap();
    let snap = query(&mut finite, Frame::new(-1e9, -1e9, 1e9, 1e9));
    assert_eq!(snap.tile_count(), 4);

    let doc = infinite_doc(&[(-16, 0), (32, 16)], 16, 16);
    let mut infinite = Map::with_document(Arc::new(Pool::new()), Arc::new(doc)).unwrap();
    let snap = query(&mut infinite, Frame::new(-3e38, -3e38, 3e38, 3e38));
    assert_eq!(snap.tile_count(), 2 * 16 * 16);

    query(&mut infinite, Frame::new(-3e38, -3e38, 3e38, 3e38));
    assert_eq!(infinite.last_outcome(), Some(CacheOutcome::Hit));
}
