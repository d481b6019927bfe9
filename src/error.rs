//! Error types for the background-removal client pipeline

use thiserror::Error;

/// Result type alias for client pipeline operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error taxonomy for the client pipeline
///
/// The variants mirror where in the pipeline a failure can occur: local input
/// validation (`UnsupportedType`, `InvalidUrl`), the remote submission
/// (`Processing`), decoding of the processed image (`ImageLoad`), and
/// encoding/saving of the final artifact (`Export`).
#[derive(Error, Debug)]
pub enum ClientError {
    /// Selected file is not one of the accepted image types
    #[error("Unsupported image type: {0}")]
    UnsupportedType(String),

    /// Candidate URL string is empty or does not parse as an absolute URL
    #[error("Invalid image URL: {0}")]
    InvalidUrl(String),

    /// Remote submission failure (transport, non-success status, malformed response)
    #[error("Processing failed: {0}")]
    Processing(String),

    /// Processed image bytes could not be fetched or decoded
    #[error("Image load error: {0}")]
    ImageLoad(String),

    /// Final artifact could not be encoded or written
    #[error("Export error: {0}")]
    Export(String),

    /// Transition request the state machine rejected, with the named reason
    #[error("Invalid session transition: {0}")]
    InvalidTransition(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format or processing errors from the image crate
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl ClientError {
    /// Create a new unsupported type error
    pub fn unsupported_type<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedType(msg.into())
    }

    /// Create a new invalid URL error
    pub fn invalid_url<S: Into<String>>(msg: S) -> Self {
        Self::InvalidUrl(msg.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create a new image load error
    pub fn image_load<S: Into<String>>(msg: S) -> Self {
        Self::ImageLoad(msg.into())
    }

    /// Create a new export error
    pub fn export<S: Into<String>>(msg: S) -> Self {
        Self::Export(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a processing error with transport context
    pub fn network_error(context: &str, error: &reqwest::Error) -> Self {
        Self::Processing(format!("{context}: {error}"))
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {operation} '{path_display}': {error}"),
        ))
    }

    /// Whether this error stays local to input validation and must not
    /// produce a `Failed` session
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::UnsupportedType(_) | Self::InvalidUrl(_))
    }
}
