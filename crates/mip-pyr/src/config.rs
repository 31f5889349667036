/// How the trailing column/row of an odd-length axis is treated.
///
/// Halving floors, so an odd axis of length `2n + 1` always yields `n`
/// output pixels. The policy only decides whether the unpaired source line
/// contributes to the last output pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OddEdge {
    /// The unpaired column/row is not sampled.
    #[default]
    Drop,
    /// The last output pixel averages up to 3 source pixels along the axis.
    Fold,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MipConfig {
    pub odd_edge: OddEdge,
    /// Upper bound, in bytes, on all level buffers of one chain.
    ///
    /// Exceeding it fails generation with `Error::OutOfMemory` and releases
    /// every level allocated so far.
    pub memory_limit: Option<usize>,
}
