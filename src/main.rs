use macroquad::prelude::*;
use tracing_subscriber::EnvFilter;

use automata_engine::{Camera as ViewCamera, EdgePolicy, Engine, LifeRule, RuleKind, presets};
use automata_engine::domain::{ALIVE_MAX, ALIVE_START, DEAD_MIN, DEAD_START};
use automata_engine::rendering::render_grid_no_clip_no_rotate;

const GRID_SIZE: usize = 512;
const DISPLAY_WIDTH: u32 = 800;
const DISPLAY_HEIGHT: u32 = 600;

fn window_conf() -> Conf {
    Conf {
        window_title: "Automata Engine".to_owned(),
        window_width: DISPLAY_WIDTH as i32,
        window_height: DISPLAY_HEIGHT as i32,
        window_resizable: false,
        ..Default::default()
    }
}

/// Two-state pen palette: fading blues for dead history, greens brightening
/// with age for live cells
fn build_palette() -> [u32; 256] {
    let mut palette = [0u32; 256];

    let rgba = |r: u32, g: u32, b: u32| r | (g << 8) | (b << 16) | (0xFF << 24);

    for pen in DEAD_MIN..=DEAD_START {
        let t = pen as u32 * 96 / DEAD_START as u32;
        palette[pen as usize] = rgba(0, t / 4, t);
    }
    for pen in ALIVE_START..=ALIVE_MAX {
        let t = (pen - ALIVE_START) as u32 * 155 / (ALIVE_MAX - ALIVE_START) as u32;
        palette[pen as usize] = rgba(0, 100 + t, 80);
    }
    palette
}

#[macroquad::main(window_conf)]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut engine = Engine::new(
        GRID_SIZE,
        GRID_SIZE,
        RuleKind::life(&LifeRule::conway()),
        EdgePolicy::Plane,
    );
    engine.randomize();

    let mut camera = ViewCamera::new();
    camera.centre_on(GRID_SIZE as f64 / 2.0, GRID_SIZE as f64 / 2.0);

    let palette = build_palette();
    let mut frame = vec![0u32; (DISPLAY_WIDTH * DISPLAY_HEIGHT) as usize];
    let mut x_offsets: Vec<u16> = Vec::new();

    let mut image = Image::gen_image_color(DISPLAY_WIDTH as u16, DISPLAY_HEIGHT as u16, BLACK);
    let texture = Texture2D::from_image(&image);
    texture.set_filter(FilterMode::Nearest);

    let mut running = true;
    let mut updates_per_second = 30.0f32;
    let mut update_timer = 0.0f32;
    let mut evolve_ms = 0.0f32;

    loop {
        // input
        if is_key_pressed(KeyCode::Space) {
            running = !running;
        }
        if is_key_pressed(KeyCode::R) {
            engine.randomize();
        }
        if is_key_pressed(KeyCode::G) {
            let glider = presets::glider();
            glider.place_on(&mut engine, GRID_SIZE as i32 / 2, GRID_SIZE as i32 / 2);
        }
        let (_, wheel) = mouse_wheel();
        if wheel > 0.0 {
            camera.zoom_in(1.25);
        } else if wheel < 0.0 {
            camera.zoom_out(1.25);
        }
        let pan_speed = 200.0 * get_frame_time() as f64;
        if is_key_down(KeyCode::Left) {
            camera.pan(-pan_speed, 0.0);
        }
        if is_key_down(KeyCode::Right) {
            camera.pan(pan_speed, 0.0);
        }
        if is_key_down(KeyCode::Up) {
            camera.pan(0.0, -pan_speed);
        }
        if is_key_down(KeyCode::Down) {
            camera.pan(0.0, pan_speed);
        }
        if is_key_down(KeyCode::Minus) {
            updates_per_second = (updates_per_second - 1.0).max(1.0);
        }
        if is_key_down(KeyCode::Equal) {
            updates_per_second = (updates_per_second + 1.0).min(120.0);
        }

        // advance the simulation on its own clock
        if running {
            update_timer += get_frame_time();
            if update_timer >= 1.0 / updates_per_second {
                let start = std::time::Instant::now();
                engine.step();
                evolve_ms = start.elapsed().as_secs_f32() * 1000.0;
                update_timer = 0.0;
            }
        }

        // project the grid into the framebuffer and blit
        let mask = (GRID_SIZE - 1) as u32;
        render_grid_no_clip_no_rotate(
            engine.colour_grid().as_slice(),
            GRID_SIZE,
            mask,
            mask,
            &palette,
            &mut frame,
            DISPLAY_WIDTH,
            DISPLAY_HEIGHT,
            &camera,
            &mut x_offsets,
        );

        let bytes = image.get_image_data_mut();
        for (dst, &src) in bytes.iter_mut().zip(frame.iter()) {
            *dst = src.to_le_bytes();
        }
        texture.update(&image);

        clear_background(BLACK);
        draw_texture(&texture, 0.0, 0.0, WHITE);

        let stats = engine.stats();
        let hud = format!(
            "gen {}  pop {}  +{} -{}  {:.2} ms  {:.0} gen/s  [space] run  [r] soup  [g] glider",
            engine.generation(),
            stats.population,
            stats.births,
            stats.deaths,
            evolve_ms,
            updates_per_second,
        );
        draw_text(&hud, 8.0, 16.0, 16.0, WHITE);

        next_frame().await;
    }
}
