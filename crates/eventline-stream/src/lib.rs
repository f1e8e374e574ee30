//! # eventline stream
//!
//! Async adapters that drive the [`eventline_core`] codec from byte and line
//! sources. Connection management, retries, and backoff stay with the caller.
//!
//! - [`EventStream`] / [`LineStreamExt`]: any `Stream` of lines into a
//!   `Stream` of events
//! - [`EventReader`]: an `AsyncRead` into a `Stream` of events, framed by
//!   [`EventLineCodec`] on `\n`, `\r\n`, or `\r`
//! - [`EventWriter`]: events onto an `AsyncWrite`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use eventline_stream::{EventReader, EventWriter, StreamConfig};
//! use eventline_core::MessageEvent;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (client, server) = tokio::io::duplex(1024);
//!
//! let mut writer = EventWriter::new(server, &StreamConfig::default());
//! writer.write_event(&MessageEvent::builder().id("1").data("hello").build()?).await?;
//! drop(writer);
//!
//! let mut reader = EventReader::new(client, &StreamConfig::default())?;
//! while let Some(event) = reader.next_event().await {
//!     println!("{}", event?.data());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all
)]
#![deny(unsafe_code)]

mod codec;
pub mod config;
pub mod error;
mod reader;
mod stream;
mod writer;

pub use codec::EventLineCodec;
pub use config::{DEFAULT_MAX_LINE_LENGTH, StreamConfig};
pub use error::{StreamError, StreamResult};
pub use reader::EventReader;
pub use stream::{EventStream, LineStreamExt};
pub use writer::EventWriter;

// Re-export core types for convenience
pub use eventline_core::{FieldValue, LineError, MessageEvent, MessageLine};
