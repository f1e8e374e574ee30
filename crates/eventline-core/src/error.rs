//! Line error types.

use thiserror::Error;

/// A specialized `Result` type for line-level operations.
pub type LineResult<T> = std::result::Result<T, LineError>;

/// Errors raised when text cannot be carried on a single wire line.
///
/// This is the only failure the codec knows about. Unrecognized keys and
/// malformed `retry` values are not errors; they classify as
/// [`MessageLine::Unknown`](crate::MessageLine::Unknown).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum LineError {
    /// The text contains `\n` or `\r`.
    #[error("line break at byte {position} cannot be carried on a single line")]
    EmbeddedNewline {
        /// Byte offset of the first line break.
        position: usize,
    },
}

impl LineError {
    /// Byte offset of the offending character.
    pub fn position(&self) -> usize {
        match self {
            Self::EmbeddedNewline { position } => *position,
        }
    }
}
