//! Error type for buffer construction and array interop.
//!
//! Filtering itself never fails; only the paths that wrap caller-supplied
//! storage or arrays validate their input.

/// Errors raised while building pixel buffers from external data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Backing storage is too small for the requested bounds.
    #[error("size mismatch: expected {expected} values, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Row stride cannot hold a full row of RGBA pixels.
    #[error("invalid stride {stride} for width {width} (need at least 4 * width)")]
    InvalidStride { stride: usize, width: usize },

    /// Array input with a channel count other than 1, 3 or 4.
    #[error("unsupported channel count: {0} (expected 1, 3 or 4)")]
    UnsupportedChannels(usize),
}
