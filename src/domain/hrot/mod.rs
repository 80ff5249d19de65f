//! Higher-Range Outer Totalistic rule family.
//!
//! Moore and von Neumann run a cumulative pre-pass (summed-area table /
//! cone prefix) and a fused update kernel; every other neighbourhood fills
//! the counts surface directly and shares the `update` pass.

pub mod border;
pub mod counts;
pub mod moore;
pub mod shapes;
pub mod update;
pub mod vn;

pub use border::{clear_hrot_outside, wrap_torus_hrot};
pub use counts::{clear_top_and_left, cumulative_moore_counts_2, cumulative_moore_counts_n};
pub use moore::{next_generation_hrot_moore_2, next_generation_hrot_moore_n};
pub use update::{update_grid_from_counts_2, update_grid_from_counts_n};
pub use vn::{
    VnContext, cumulative_vn_counts_2, cumulative_vn_counts_n, next_generation_hrot_vn_2,
    next_generation_hrot_vn_n,
};
