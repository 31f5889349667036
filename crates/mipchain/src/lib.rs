//! Umbrella crate for the `mipchain` workspace.
//!
//! Re-exports the bitmap primitives and the mipmap chain generator so callers
//! need a single dependency.

pub use mip_core::*;
pub use mip_pyr::*;
