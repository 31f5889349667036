//! Bitmap primitives shared by the mipmap chain generator.
//!
//! ## Layout
//! A bitmap is `width * height` pixels of `bytes_per_pixel` bytes each,
//! row-major with no row padding. Any padding a file format needs (BMP rows,
//! GPU upload pitch) belongs to the code writing that format.
//!
//! ## Ownership
//! [`Bitmap`] owns its buffer. [`BitmapView`] borrows an already validated
//! buffer, while [`BitmapSource`] is the raw caller-supplied description that
//! may still be missing pixels or carry zero dimensions.

mod bitmap;
mod error;

pub use bitmap::{Bitmap, BitmapSource, BitmapView, buffer_len};
pub use error::Error;
