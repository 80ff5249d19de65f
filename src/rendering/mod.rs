pub mod pyramid;
pub mod raster;

pub use pyramid::{ColourPyramid, PyramidLevel};
pub use raster::{
    render_grid_clip_no_rotate, render_grid_no_clip_no_rotate, render_overlay_clip_no_rotate,
    render_overlay_no_clip_no_rotate,
};
