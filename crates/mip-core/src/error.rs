use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid dimensions: {width}x{height} with {bytes_per_pixel} bytes per pixel")]
    InvalidDimensions {
        width: usize,
        height: usize,
        bytes_per_pixel: usize,
    },
    #[error("pixel buffer is missing")]
    NullBuffer,
    #[error("size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("out of memory: could not allocate {requested} bytes")]
    OutOfMemory { requested: usize },
}
