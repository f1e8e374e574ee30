//! # eventline core
//!
//! Data model and line codec for Server-Sent Events (SSE) streams. The crate
//! does no I/O: it turns text lines into typed lines and events, and events
//! back into lines.
//!
//! ## Components
//!
//! - **Line codec**: [`MessageLine::parse`] and [`MessageLine::format`]
//! - **Assembly**: [`MessageEvent::assemble`] folds a line group into one event
//! - **Serialization**: [`MessageEvent::to_lines`], [`encode_event`]
//! - **Segmentation**: [`EventSegmenter`] groups a line stream on blank lines
//!   and carries the last event ID from one event to the next
//!
//! ## Usage
//!
//! ```rust
//! use eventline_core::{MessageEvent, encode_event, segment_lines};
//!
//! let event = MessageEvent::builder()
//!     .id("1")
//!     .event_type("status")
//!     .data("line one\nline two")
//!     .build()?;
//!
//! let wire = encode_event(&event);
//! assert_eq!(wire, "data: line one\ndata: line two\nid: 1\nevent: status\n\n");
//!
//! let received: Vec<_> = segment_lines(wire.lines()).collect::<Result<_, _>>()?;
//! assert_eq!(received, vec![event]);
//! # Ok::<(), eventline_core::LineError>(())
//! ```
//!
//! ## Errors
//!
//! The only failure is text containing a line break where a single line is
//! required ([`LineError::EmbeddedNewline`]). Unrecognized keys and malformed
//! `retry` values parse as [`MessageLine::Unknown`] and are ignored during
//! assembly.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod encoder;
pub mod error;
pub mod event;
pub mod line;
pub mod segmenter;

// Re-export main types
pub use encoder::{KEEPALIVE, encode_event, encode_lines};
pub use error::{LineError, LineResult};
pub use event::{MergeRule, MessageEvent, MessageEventBuilder};
pub use line::{FieldValue, LineKind, MessageLine, keys};
pub use segmenter::{EventSegmenter, Segmented, segment_lines};

/// HTTP header names and values used alongside event streams.
pub mod headers {
    /// Request header carrying the resume point on reconnect.
    pub const LAST_EVENT_ID: &str = "Last-Event-ID";

    /// Content-Type of an event stream.
    pub const CONTENT_TYPE_EVENT_STREAM: &str = "text/event-stream";

    /// Accept header value for event streams.
    pub const ACCEPT_EVENT_STREAM: &str = "text/event-stream";
}
