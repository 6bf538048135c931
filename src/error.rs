//! Error types for the announcement renderer

use thiserror::Error;

/// Result type alias for render operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can escape a render call.
///
/// Asset, metrics and markup problems are recovered inside the pipeline and
/// never show up here; only conditions with no fallback do.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to initialize a renderer
    #[error("Renderer initialization failed: {0}")]
    InitializationError(String),

    /// Failed to build or fill the canvas
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// Failed to encode the finished canvas
    #[error("Image encoding failed: {0}")]
    EncodeError(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CDP-specific error
    #[cfg(feature = "cdp")]
    #[error("CDP error: {0}")]
    CdpError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodeError(err.to_string())
    }
}

#[cfg(feature = "cdp")]
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::CdpError(err.to_string())
    }
}
