//! Blank-line segmentation of a line stream into events.
//!
//! One [`EventSegmenter`] serves one logical connection. It buffers parsed
//! lines until a blank line arrives, assembles them into a [`MessageEvent`],
//! and threads the resume point forward from event to event. Lines left
//! over when the source ends never form an event: only a blank line
//! completes one.

use std::iter::FusedIterator;
use std::mem;

use tracing::{debug, trace, warn};

use crate::error::LineResult;
use crate::event::MessageEvent;
use crate::line::{FieldValue, MessageLine};

/// Per-connection state for turning raw lines into events.
#[derive(Clone, Debug, Default)]
pub struct EventSegmenter {
    pending: Vec<MessageLine>,
    last_event_id: Option<FieldValue>,
}

impl EventSegmenter {
    /// Create a segmenter with no resume point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a segmenter that resumes from an ID seen on an earlier
    /// connection.
    pub fn resume_from(last_event_id: Option<FieldValue>) -> Self {
        Self {
            pending: Vec::new(),
            last_event_id,
        }
    }

    /// Feed one raw line, without its line terminator.
    ///
    /// A blank line completes the pending group and returns the assembled
    /// event, even when nothing was pending. Any other line is buffered.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`](crate::LineError::EmbeddedNewline)
    /// if `raw` contains a line break. That means the line source split lines
    /// incorrectly; callers should stop feeding this segmenter.
    pub fn push_line(&mut self, raw: &str) -> LineResult<Option<MessageEvent>> {
        if raw.is_empty() {
            return Ok(Some(self.dispatch()));
        }

        let line = MessageLine::parse(raw).inspect_err(|err| {
            warn!(error = %err, pending = self.pending.len(), "rejected line from source");
        })?;
        trace!(key = line.key(), "buffered line");
        self.pending.push(line);
        Ok(None)
    }

    fn dispatch(&mut self) -> MessageEvent {
        let lines = mem::take(&mut self.pending);
        let line_count = lines.len();
        let event = MessageEvent::assemble(lines, self.last_event_id.clone());

        if let Some(id) = &event.id {
            self.last_event_id = Some(id.clone());
        }

        debug!(
            id = event.id(),
            event_type = event.event_type(),
            data_len = event.data().len(),
            lines = line_count,
            "assembled event"
        );
        event
    }

    /// The resume point to present when reconnecting.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Number of buffered lines waiting for a blank line.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drop buffered lines, returning how many were dropped.
    pub fn discard_pending(&mut self) -> usize {
        let discarded = self.pending.len();
        if discarded > 0 {
            debug!(lines = discarded, "discarding incomplete event");
            self.pending.clear();
        }
        discarded
    }

    /// End the connection, returning how many buffered lines were dropped.
    pub fn finish(mut self) -> usize {
        self.discard_pending()
    }

    /// Segment an iterator of raw lines, continuing from this segmenter's
    /// state.
    pub fn segment<I>(self, lines: I) -> Segmented<I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        Segmented {
            lines: lines.into_iter(),
            segmenter: self,
            done: false,
        }
    }
}

/// Lazy iterator of events over raw lines, from [`EventSegmenter::segment`]
/// or [`segment_lines`].
///
/// Yields one event per blank line. After an error it yields nothing more.
#[derive(Debug)]
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct Segmented<I> {
    lines: I,
    segmenter: EventSegmenter,
    done: bool,
}

impl<I> Segmented<I> {
    /// The resume point after the events yielded so far.
    pub fn last_event_id(&self) -> Option<&str> {
        self.segmenter.last_event_id()
    }

    /// Recover the segmenter, including any lines still pending.
    pub fn into_segmenter(self) -> EventSegmenter {
        self.segmenter
    }
}

impl<I> Iterator for Segmented<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = LineResult<MessageEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        for raw in self.lines.by_ref() {
            match self.segmenter.push_line(raw.as_ref()) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }

        self.done = true;
        self.segmenter.discard_pending();
        None
    }
}

impl<I> FusedIterator for Segmented<I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
}

/// Segment raw lines into events, starting with no resume point.
pub fn segment_lines<I>(lines: I) -> Segmented<I::IntoIter>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    EventSegmenter::new().segment(lines)
}
