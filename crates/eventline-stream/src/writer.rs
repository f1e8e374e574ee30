//! Event writer over an `AsyncWrite` byte sink.

use eventline_core::{MessageEvent, MessageLine};
use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio_util::codec::{FramedWrite, LinesCodec};
use tracing::trace;

use crate::config::StreamConfig;
use crate::error::StreamResult;

/// Writes events to a byte sink such as an HTTP response body.
///
/// Each event is written as its lines followed by a blank line, every line
/// terminated by `\n`.
#[derive(Debug)]
pub struct EventWriter<W> {
    sink: FramedWrite<W, LinesCodec>,
    flush_each_event: bool,
    events_written: u64,
}

impl<W: AsyncWrite + Unpin> EventWriter<W> {
    /// Create a writer from `config`.
    pub fn new(writer: W, config: &StreamConfig) -> Self {
        Self {
            sink: FramedWrite::new(writer, LinesCodec::new()),
            flush_each_event: config.flush_each_event,
            events_written: 0,
        }
    }

    /// Write one event using the canonical line order of
    /// [`MessageEvent::to_lines`].
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Framing`](crate::StreamError::Framing) if the
    /// underlying writer fails.
    pub async fn write_event(&mut self, event: &MessageEvent) -> StreamResult<()> {
        trace!(
            id = event.id(),
            event_type = event.event_type(),
            "writing event"
        );
        self.write_group(&event.to_lines()).await
    }

    /// Write lines in the given order as one event group, followed by the
    /// blank line that completes it.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Framing`](crate::StreamError::Framing) if the
    /// underlying writer fails.
    pub async fn write_group(&mut self, lines: &[MessageLine]) -> StreamResult<()> {
        for line in lines {
            self.sink.feed(line.format()).await?;
        }
        self.sink.feed(String::new()).await?;
        self.events_written += 1;

        if self.flush_each_event {
            self.flush().await?;
        }
        Ok(())
    }

    /// Write a bare comment group to keep an idle connection open.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Framing`](crate::StreamError::Framing) if the
    /// underlying writer fails.
    pub async fn write_keepalive(&mut self) -> StreamResult<()> {
        self.sink.feed(String::from(":")).await?;
        self.sink.feed(String::new()).await?;
        self.flush().await
    }

    /// Flush buffered lines to the writer.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Framing`](crate::StreamError::Framing) if the
    /// underlying writer fails.
    pub async fn flush(&mut self) -> StreamResult<()> {
        SinkExt::<String>::flush(&mut self.sink).await?;
        Ok(())
    }

    /// Number of event groups written so far.
    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        self.sink.get_ref()
    }

    /// Take back the underlying writer. Call [`flush`](Self::flush) first
    /// when events are not flushed individually.
    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }
}
