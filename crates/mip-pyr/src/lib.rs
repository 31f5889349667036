//! Mipmap chain generation with a 2x2 box filter.
//!
//! Size policy:
//! - Each level halves both axes with floor division, clamped at 1:
//!   `(max(1, w / 2), max(1, h / 2))`.
//! - A full chain has `floor(log2(max(w, h))) + 1` levels and always ends at
//!   1x1. An axis that reaches 1 stays there while the other keeps shrinking.
//!
//! Filtering:
//! - Each destination channel is the mean of its in-bounds 2x2 source block,
//!   rounded to nearest with ties up. An axis of length 1 contributes a single
//!   line, so such levels average pairs instead of blocks.
//! - Odd axes follow [`OddEdge`]: `Drop` ignores the unpaired trailing line,
//!   `Fold` merges it into the last output pixel.
//!
//! Ownership:
//! - Every level, level 0 included, is a freshly allocated [`Bitmap`]. The
//!   source is only read. [`MipChain::free`] consumes the chain, and a failed
//!   build releases whatever it had allocated before returning the error.

mod chain;
mod config;
mod downsample;

pub use chain::{MipChain, count_mip_levels, generate_level, generate_level_with_config};
pub use config::{MipConfig, OddEdge};
pub use downsample::{downsample2x2_box, next_level_dims, next_level_size};
pub use mip_core::{Bitmap, BitmapSource, BitmapView, Error};
