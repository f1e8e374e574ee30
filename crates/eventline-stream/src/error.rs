//! Stream error types.

use std::convert::Infallible;

use eventline_core::LineError;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// A specialized `Result` type for stream operations.
pub type StreamResult<T> = std::result::Result<T, StreamError>;

/// Errors that end an event stream.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StreamError {
    /// The line source delivered a line that still contains a line break.
    #[error("Invalid line: {0}")]
    Line(#[from] LineError),

    /// Splitting bytes into lines failed: a line exceeded the configured
    /// maximum length, the bytes were not UTF-8, or the underlying I/O failed.
    #[error("Line framing failed: {0}")]
    Framing(#[from] LinesCodecError),
}

impl From<Infallible> for StreamError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl StreamError {
    /// Whether the error came from the line source rather than its content.
    pub fn is_framing(&self) -> bool {
        matches!(self, Self::Framing(_))
    }
}
