//! Event reader over an `AsyncRead` byte source.

use std::pin::Pin;
use std::task::{Context, Poll};

use eventline_core::{FieldValue, MessageEvent};
use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tracing::debug;

use crate::codec::EventLineCodec;
use crate::config::StreamConfig;
use crate::error::StreamResult;
use crate::stream::EventStream;

pin_project! {
    /// Reads events from a byte source such as an HTTP response body.
    ///
    /// Bytes are split into lines by [`EventLineCodec`], which accepts `\n`,
    /// `\r\n` and a bare `\r` as terminators, then segmented into events.
    #[derive(Debug)]
    #[must_use = "streams do nothing unless polled"]
    pub struct EventReader<R> {
        #[pin]
        events: EventStream<FramedRead<R, EventLineCodec>>,
    }
}

impl<R: AsyncRead> EventReader<R> {
    /// Create a reader from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Line`](crate::StreamError::Line) if the
    /// configured resume point contains a line break.
    pub fn new(reader: R, config: &StreamConfig) -> StreamResult<Self> {
        let codec = match config.max_line_length {
            Some(max_length) => EventLineCodec::new_with_max_length(max_length),
            None => EventLineCodec::new(),
        };
        let last_event_id = config
            .last_event_id
            .clone()
            .map(FieldValue::new)
            .transpose()?;

        debug!(
            last_event_id = config.last_event_id.as_deref(),
            max_line_length = config.max_line_length,
            "opening event reader"
        );

        Ok(Self {
            events: EventStream::resume_from(FramedRead::new(reader, codec), last_event_id),
        })
    }

    /// The resume point after the events read so far.
    pub fn last_event_id(&self) -> Option<&str> {
        self.events.last_event_id()
    }

    /// Take back the byte source. Buffered, unread bytes are lost.
    pub fn into_inner(self) -> R {
        self.events.into_inner().into_inner()
    }
}

impl<R: AsyncRead + Unpin> EventReader<R> {
    /// Read the next event, or `None` once the source is exhausted.
    pub async fn next_event(&mut self) -> Option<StreamResult<MessageEvent>> {
        self.next().await
    }
}

impl<R: AsyncRead> Stream for EventReader<R> {
    type Item = StreamResult<MessageEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().events.poll_next(cx)
    }
}
