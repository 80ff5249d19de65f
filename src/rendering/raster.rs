//! Rasteriser: projects a cell grid (or a pyramid level) through a camera
//! and palette into a 32-bit RGBA framebuffer.
//!
//! The no-clip fast path precomputes one source-x offset per display
//! column (wrapped with the grid's width mask) and renders whole display
//! rows in parallel. The clip path uses sentinel offsets instead: -2 marks a
//! column off the grid but inside the max grid, -1 a column off the max
//! grid; whole off-grid rows short-circuit to the two border colours. The
//! overlay paths additionally gather a marker grid and relabel markers
//! against the underlying cell before the palette lookup.

use rayon::prelude::*;

use crate::application::camera::Camera;
use crate::domain::annotated::overlay_state;

/// Sentinel for a pixel off the grid but inside the max grid
const OFF_GRID: i32 = -2;
/// Sentinel for a pixel beyond the max grid
const OFF_MAX_GRID: i32 = -1;

struct RowScan {
    dyx: f64,
    dyy: f64,
    sx: f64,
    sy: f64,
}

impl RowScan {
    fn new(camera: &Camera, display_width: u32, display_height: u32) -> Self {
        let dyx = 1.0 / camera.zoom;
        let dyy = (1.0 / camera.zoom) / camera.y_factor;
        Self {
            dyx,
            dyy,
            sx: -(display_width as f64 / 2.0) * dyx + camera.x_off,
            sy: -(display_height as f64 / 2.0) * dyy + camera.y_off,
        }
    }
}

/// Render with the grid wrapped through its width/height masks (torus
/// view); no clipping
pub fn render_grid_no_clip_no_rotate(
    grid: &[u8],
    grid_width: usize,
    width_mask: u32,
    height_mask: u32,
    palette: &[u32; 256],
    frame: &mut [u32],
    display_width: u32,
    display_height: u32,
    camera: &Camera,
    x_offsets: &mut Vec<u16>,
) {
    let scan = RowScan::new(camera, display_width, display_height);

    x_offsets.clear();
    x_offsets.extend((0..display_width).map(|i| {
        (((scan.sx + i as f64 * scan.dyx).floor() as i64) as u16) & width_mask as u16
    }));

    // display rows are independent: render them in parallel, batched to
    // keep scheduling overhead down
    let offsets: &[u16] = x_offsets;
    frame[..display_width as usize * display_height as usize]
        .par_chunks_mut(display_width as usize)
        .enumerate()
        .with_min_len(16)
        .for_each(|(h, out_row)| {
            let sy = scan.sy + h as f64 * scan.dyy;
            let yi = ((sy.floor() as i64) as u32) & height_mask;
            let row = &grid[yi as usize * grid_width..];

            for (dst, &xi) in out_row.iter_mut().zip(offsets.iter()) {
                *dst = palette[row[xi as usize] as usize];
            }
        });
}

/// Adjustment from grid coordinates to max-grid coordinates: the grid sits
/// centred inside the max grid, each doubling adding half the old size
fn max_grid_adjust(mut size: u32, max_grid_size: u32) -> i32 {
    let mut adjust = 0i32;
    while size < max_grid_size {
        adjust += (size >> 1) as i32;
        size <<= 1;
    }
    adjust
}

/// Render with clipping: pixels off the grid show the off-grid colour,
/// pixels beyond the max grid the off-max-grid colour
pub fn render_grid_clip_no_rotate(
    grid: &[u8],
    grid_width: usize,
    width_mask: u32,
    height_mask: u32,
    palette: &[u32; 256],
    frame: &mut [u32],
    display_width: u32,
    display_height: u32,
    camera: &Camera,
    max_grid_size: u32,
    off_max_grid: u32,
    x_offsets: &mut Vec<i32>,
    x_max_offsets: &mut Vec<i32>,
) {
    let scan = RowScan::new(camera, display_width, display_height);
    let off_grid_colour = palette[0];

    let xadj = max_grid_adjust(width_mask + 1, max_grid_size);
    let yadj = max_grid_adjust(height_mask + 1, max_grid_size);

    x_offsets.clear();
    x_max_offsets.clear();
    let mut x = scan.sx;
    for _ in 0..display_width {
        let xi = x.floor() as i32;
        let in_max = xi + xadj >= 0 && ((xi + xadj) as u32) < max_grid_size;

        if xi >= 0 && (xi as u32) <= width_mask {
            x_offsets.push(xi & width_mask as i32);
        } else if in_max {
            x_offsets.push(OFF_GRID);
        } else {
            x_offsets.push(OFF_MAX_GRID);
        }
        x_max_offsets.push(if in_max { 0 } else { OFF_MAX_GRID });

        x += scan.dyx;
    }

    let mut sy = scan.sy;
    let mut out = 0usize;
    for _ in 0..display_height {
        let yi = sy.floor() as i32;

        if yi >= 0 && (yi as u32) <= height_mask {
            let row = &grid[(yi as u32 & height_mask) as usize * grid_width..];
            for &xi in x_offsets.iter() {
                frame[out] = match xi {
                    OFF_MAX_GRID => off_max_grid,
                    OFF_GRID => off_grid_colour,
                    _ => palette[row[xi as usize] as usize],
                };
                out += 1;
            }
        } else if yi + yadj >= 0 && ((yi + yadj) as u32) < max_grid_size {
            // row off the grid but inside the max grid
            for &m in x_max_offsets.iter() {
                frame[out] = if m == OFF_MAX_GRID { off_max_grid } else { off_grid_colour };
                out += 1;
            }
        } else {
            for _ in 0..display_width {
                frame[out] = off_max_grid;
                out += 1;
            }
        }

        sy += scan.dyy;
    }
}

/// No-clip render of a grid with a History/Super overlay: markers relabel
/// against the underlying cell before the palette lookup
pub fn render_overlay_no_clip_no_rotate(
    grid: &[u8],
    grid_width: usize,
    overlay: &[u8],
    width_mask: u32,
    height_mask: u32,
    palette: &[u32; 256],
    frame: &mut [u32],
    display_width: u32,
    display_height: u32,
    camera: &Camera,
    alive_start: u8,
    x_offsets: &mut Vec<u16>,
) {
    let scan = RowScan::new(camera, display_width, display_height);

    x_offsets.clear();
    x_offsets.extend((0..display_width).map(|i| {
        (((scan.sx + i as f64 * scan.dyx).floor() as i64) as u16) & width_mask as u16
    }));

    let mut sy = scan.sy;
    let mut out = 0usize;
    for _ in 0..display_height {
        let yi = ((sy.floor() as i64) as u32) & height_mask;
        let row = &grid[yi as usize * grid_width..];
        let overlay_row = &overlay[yi as usize * grid_width..];

        for &xi in x_offsets.iter() {
            let cell = row[xi as usize];
            let marker = overlay_row[xi as usize];
            let shown = overlay_state(marker, cell >= alive_start, cell);
            frame[out] = palette[shown as usize];
            out += 1;
        }

        sy += scan.dyy;
    }
}

/// Clip render with overlay relabelling
pub fn render_overlay_clip_no_rotate(
    grid: &[u8],
    grid_width: usize,
    overlay: &[u8],
    width_mask: u32,
    height_mask: u32,
    palette: &[u32; 256],
    frame: &mut [u32],
    display_width: u32,
    display_height: u32,
    camera: &Camera,
    alive_start: u8,
    max_grid_size: u32,
    off_max_grid: u32,
    x_offsets: &mut Vec<i32>,
    x_max_offsets: &mut Vec<i32>,
) {
    let scan = RowScan::new(camera, display_width, display_height);
    let off_grid_colour = palette[0];

    let xadj = max_grid_adjust(width_mask + 1, max_grid_size);
    let yadj = max_grid_adjust(height_mask + 1, max_grid_size);

    x_offsets.clear();
    x_max_offsets.clear();
    let mut x = scan.sx;
    for _ in 0..display_width {
        let xi = x.floor() as i32;
        let in_max = xi + xadj >= 0 && ((xi + xadj) as u32) < max_grid_size;

        if xi >= 0 && (xi as u32) <= width_mask {
            x_offsets.push(xi & width_mask as i32);
        } else if in_max {
            x_offsets.push(OFF_GRID);
        } else {
            x_offsets.push(OFF_MAX_GRID);
        }
        x_max_offsets.push(if in_max { 0 } else { OFF_MAX_GRID });

        x += scan.dyx;
    }

    let mut sy = scan.sy;
    let mut out = 0usize;
    for _ in 0..display_height {
        let yi = sy.floor() as i32;

        if yi >= 0 && (yi as u32) <= height_mask {
            let base = (yi as u32 & height_mask) as usize * grid_width;
            let row = &grid[base..];
            let overlay_row = &overlay[base..];
            for &xi in x_offsets.iter() {
                frame[out] = match xi {
                    OFF_MAX_GRID => off_max_grid,
                    OFF_GRID => off_grid_colour,
                    _ => {
                        let cell = row[xi as usize];
                        let marker = overlay_row[xi as usize];
                        let shown = overlay_state(marker, cell >= alive_start, cell);
                        palette[shown as usize]
                    }
                };
                out += 1;
            }
        } else if yi + yadj >= 0 && ((yi + yadj) as u32) < max_grid_size {
            for &m in x_max_offsets.iter() {
                frame[out] = if m == OFF_MAX_GRID { off_max_grid } else { off_grid_colour };
                out += 1;
            }
        } else {
            for _ in 0..display_width {
                frame[out] = off_max_grid;
                out += 1;
            }
        }

        sy += scan.dyy;
    }
}
