use thiserror::Error;

/// Errors that can occur while building a bitmap or tracing it.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum TraceError {
    #[error("bitmap of {width}x{height} pixels is too large to allocate")]
    BitmapTooLarge { width: usize, height: usize },

    #[error("raw bitmap buffer holds {actual} words, expected {expected}")]
    BufferLength { expected: usize, actual: usize },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("unknown turn policy: {0:?}")]
    UnknownTurnPolicy(String),
}
