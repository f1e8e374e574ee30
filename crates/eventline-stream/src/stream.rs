//! `futures::Stream` adapter from lines to events.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use eventline_core::{EventSegmenter, FieldValue, MessageEvent};
use futures::Stream;
use futures::stream::FusedStream;
use pin_project_lite::pin_project;
use tracing::{debug, warn};

use crate::error::{StreamError, StreamResult};

pin_project! {
    /// Stream of events assembled from a stream of raw lines.
    ///
    /// Each item of the inner stream is one line without its terminator.
    /// The stream ends when the inner stream ends; a trailing group with no
    /// blank line after it is dropped. After the first error no further
    /// items are produced.
    #[derive(Debug)]
    #[must_use = "streams do nothing unless polled"]
    pub struct EventStream<S> {
        #[pin]
        lines: S,
        segmenter: EventSegmenter,
        done: bool,
    }
}

impl<S> EventStream<S> {
    /// Wrap a line stream, starting with no resume point.
    pub fn new(lines: S) -> Self {
        Self::resume_from(lines, None)
    }

    /// Wrap a line stream, resuming from an earlier connection's ID.
    pub fn resume_from(lines: S, last_event_id: Option<FieldValue>) -> Self {
        Self {
            lines,
            segmenter: EventSegmenter::resume_from(last_event_id),
            done: false,
        }
    }

    /// The resume point after the events produced so far.
    pub fn last_event_id(&self) -> Option<&str> {
        self.segmenter.last_event_id()
    }

    /// Borrow the inner line stream.
    pub fn get_ref(&self) -> &S {
        &self.lines
    }

    /// Take back the inner line stream.
    pub fn into_inner(self) -> S {
        self.lines
    }
}

impl<S, E> Stream for EventStream<S>
where
    S: Stream<Item = Result<String, E>>,
    StreamError: From<E>,
{
    type Item = StreamResult<MessageEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();
        if *this.done {
            return Poll::Ready(None);
        }

        loop {
            match ready!(this.lines.as_mut().poll_next(cx)) {
                Some(Ok(raw)) => match this.segmenter.push_line(&raw) {
                    Ok(Some(event)) => return Poll::Ready(Some(Ok(event))),
                    Ok(None) => {}
                    Err(err) => {
                        *this.done = true;
                        return Poll::Ready(Some(Err(err.into())));
                    }
                },
                Some(Err(err)) => {
                    *this.done = true;
                    let err = StreamError::from(err);
                    warn!(error = %err, "line source failed");
                    return Poll::Ready(Some(Err(err)));
                }
                None => {
                    *this.done = true;
                    let discarded = this.segmenter.discard_pending();
                    debug!(discarded, "line source ended");
                    return Poll::Ready(None);
                }
            }
        }
    }
}

impl<S, E> FusedStream for EventStream<S>
where
    S: Stream<Item = Result<String, E>>,
    StreamError: From<E>,
{
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// Adapters from line streams to event streams.
pub trait LineStreamExt: Stream + Sized {
    /// Assemble events from this stream of lines.
    fn events(self) -> EventStream<Self> {
        EventStream::new(self)
    }

    /// Assemble events, resuming from an earlier connection's ID.
    fn events_from(self, last_event_id: Option<FieldValue>) -> EventStream<Self> {
        EventStream::resume_from(self, last_event_id)
    }
}

impl<S: Stream> LineStreamExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use eventline_core::LineError;
    use futures::{StreamExt, TryStreamExt, stream};
    use std::convert::Infallible;

    fn lines(raw: &[&str]) -> impl Stream<Item = Result<String, Infallible>> + use<> {
        let owned: Vec<_> = raw.iter().map(|line| Ok(line.to_string())).collect();
        stream::iter(owned)
    }

    #[tokio::test]
    async fn test_two_events_then_end() {
        let events: Vec<_> = lines(&["data: hello", "", "data: world", "", "data: partial"])
            .events()
            .try_collect()
            .await
            .unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data(), "hello");
        assert_eq!(events[1].data(), "world");
    }

    #[tokio::test]
    async fn test_resume_point_is_tracked() {
        let resume = FieldValue::new("9").ok();
        let mut events = lines(&["data: a", "", "id: 10", ""]).events_from(resume);

        let first = events.next().await.unwrap().unwrap();
        assert_eq!(first.last_event_id(), Some("9"));
        assert_eq!(events.last_event_id(), Some("9"));

        events.next().await.unwrap().unwrap();
        assert_eq!(events.last_event_id(), Some("10"));
        assert!(events.next().await.is_none());
        assert!(events.is_terminated());
    }

    #[tokio::test]
    async fn test_invalid_line_ends_stream() {
        let mut events = lines(&["data: a\nb", "", "data: c", ""]).events();

        let err = events.next().await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            StreamError::Line(LineError::EmbeddedNewline { position: 7 })
        ));
        assert!(events.next().await.is_none());
    }

    #[tokio::test]
    async fn test_source_error_is_reported() {
        let source = stream::iter(vec![
            Ok(String::from("data: a")),
            Ok(String::new()),
            Err(LineError::EmbeddedNewline { position: 0 }),
        ]);
        let mut events = source.events();

        assert_eq!(events.next().await.unwrap().unwrap().data(), "a");
        assert!(events.next().await.unwrap().is_err());
        assert!(events.next().await.is_none());
    }

    #[test]
    fn test_pending_source_yields_pending() {
        let mut events = stream::pending::<Result<String, Infallible>>().events();
        tokio_test::assert_pending!(tokio_test::task::spawn(events.next()).poll());
    }
}
