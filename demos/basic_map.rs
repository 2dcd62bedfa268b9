use std::sync::Arc;

use macroquad::prelude::*;
use macroquad_tiled_query::{Frame, Map, Pool, TileData};

fn window_conf() -> Conf {
    Conf {
        window_title: "Basic Map".into(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

const PALETTE: [Color; 6] = [DARKGREEN, GREEN, BROWN, DARKBROWN, GRAY, SKYBLUE];
const PAN_SPEED: f32 = 400.0;

fn tile_color(tile: &TileData) -> Color {
    let c = PALETTE[(tile.tile_id as usize + tile.tileset * 3) % PALETTE.len()];
    if tile.flip.is_empty() {
        c
    } else {
        Color::new(c.r * 0.7, c.g * 0.7, c.b * 0.7, 1.0)
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "assets/map.json".to_string());
    let mut map = Map::load(&path, Arc::new(Pool::new())).expect("Failed to load map");
    let (tw, th) = map
        .document()
        .map(|doc| (doc.tile_w as f32, doc.tile_h as f32))
        .expect("loaded map has a document");

    let mut camera = Vec2::ZERO;

    loop {
        let dt = get_frame_time();
        if is_key_down(KeyCode::Left) {
            camera.x -= PAN_SPEED * dt;
        }
        if is_key_down(KeyCode::Right) {
            camera.x += PAN_SPEED * dt;
        }
        if is_key_down(KeyCode::Up) {
            camera.y -= PAN_SPEED * dt;
        }
        if is_key_down(KeyCode::Down) {
            camera.y += PAN_SPEED * dt;
        }
        if is_key_pressed(KeyCode::F) {
            map.flush();
        }

        clear_background(BLACK);

        let view = Frame::from_corners(camera, camera + vec2(screen_width(), screen_height()));
        match map.query(view) {
            Ok(layers) => {
                for tiles in layers {
                    for tile in tiles {
                        let p = tile.pos - camera;
                        draw_rectangle(p.x, p.y, tw - 1.0, th - 1.0, tile_color(tile));
                    }
                }
            }
            Err(e) => log::error!("query failed: {e}"),
        }

        let stats = map.cache_stats();
        draw_text(
            &format!(
                "FPS: {}  hits {} reuses {} rebuilds {}",
                get_fps(),
                stats.hits,
                stats.reuses,
                stats.rebuilds
            ),
            20.0,
            30.0,
            30.0,
            RED,
        );

        next_frame().await;
    }
}
