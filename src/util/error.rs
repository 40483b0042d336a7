//! Error types for patchfill.

use thiserror::Error;

/// Result alias for patchfill operations.
pub type PatchFillResult<T> = std::result::Result<T, PatchFillError>;

/// Errors that can occur when running patchfill algorithms.
///
/// Variants fall into two families: precondition failures, reported at the
/// boundary of a public operation before any work is done, and exhaustion
/// failures, raised by the greedy inpainter when it cannot make progress.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PatchFillError {
    /// Width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The backing buffer does not hold enough elements.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// The image has a channel count the operation does not accept.
    #[error("unsupported channel count: expected {expected}, got {got}")]
    UnsupportedChannels { expected: &'static str, got: usize },
    /// Two inputs that must share a size do not.
    #[error("{context}: expected {expected:?}, got {got:?}")]
    SizeMismatch {
        context: &'static str,
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// The template does not fit inside the image.
    #[error("template {tpl_width}x{tpl_height} exceeds image {img_width}x{img_height}")]
    TemplateTooLarge {
        tpl_width: usize,
        tpl_height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// A scalar parameter is out of its valid range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),
    /// A stepping operation was called before `initialize`.
    #[error("inpainter has not been initialized")]
    NotInitialized,
    /// No eligible source patch exists for the selected target patch.
    #[error("no eligible source patch for target at ({x}, {y})")]
    SourceExhausted { x: usize, y: usize },
    /// Target pixels remain, but none of them borders the processable interior.
    #[error("fill front is empty while {remaining} target pixels remain")]
    FillFrontStalled { remaining: usize },
    /// Image decoding or encoding failed.
    #[error("image i/o failed: {reason}")]
    ImageIo { reason: String },
}

impl PatchFillError {
    /// Returns true for malformed inputs detected before any work is done.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidDimensions { .. }
                | Self::BufferTooSmall { .. }
                | Self::UnsupportedChannels { .. }
                | Self::SizeMismatch { .. }
                | Self::TemplateTooLarge { .. }
                | Self::InvalidParameter(_)
                | Self::NotInitialized
        )
    }

    /// Returns true when the inpainter ran out of usable source content.
    pub fn is_exhaustion(&self) -> bool {
        matches!(
            self,
            Self::SourceExhausted { .. } | Self::FillFrontStalled { .. }
        )
    }
}
