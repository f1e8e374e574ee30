//! Event serialization.
//!
//! [`MessageEvent::to_lines`] expands an event into a fixed line order:
//!
//! ```text
//! data: <line1>
//! data: <line2>
//! id: <id>
//! event: <type>
//! retry: <ms>
//! : <comment>
//!
//! ```
//!
//! The protocol imposes no order; producers that need a different framing
//! build the `MessageLine` sequence themselves and use [`encode_lines`].

use crate::event::MessageEvent;
use crate::line::{FieldValue, MessageLine};

/// A bare comment group. Keeps idle connections open without producing an
/// event on the far side that carries any data.
pub const KEEPALIVE: &str = ":\n\n";

impl MessageEvent {
    /// Expand the event into lines for transmission.
    ///
    /// Data produces one line per `\n`, `\r\n`, or `\r` separated segment, and
    /// no line at all when empty. The terminating blank line is not included.
    pub fn to_lines(&self) -> Vec<MessageLine> {
        let mut lines = Vec::new();

        if !self.data.is_empty() {
            lines.extend(
                data_segments(&self.data)
                    .into_iter()
                    .map(|segment| MessageLine::Data(FieldValue::from_single_line(segment))),
            );
        }
        if let Some(id) = &self.id {
            lines.push(MessageLine::Id(id.clone()));
        }
        if let Some(event_type) = &self.event_type {
            lines.push(MessageLine::Event(event_type.clone()));
        }
        if let Some(millis) = self.retry {
            lines.push(MessageLine::Retry(millis));
        }
        lines.extend(self.comments.iter().cloned().map(MessageLine::Comment));

        lines
    }
}

/// Split data on `\n`, `\r\n`, and `\r`, keeping empty segments.
fn data_segments(data: &str) -> Vec<&str> {
    let bytes = data.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                segments.push(&data[start..i]);
                i += 1;
                start = i;
            }
            b'\r' => {
                segments.push(&data[start..i]);
                i += if bytes.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                start = i;
            }
            _ => i += 1,
        }
    }
    segments.push(&data[start..]);

    segments
}

/// Encode lines as one event group: each line followed by `\n`, then the
/// blank line that completes the event.
pub fn encode_lines<'a, I>(lines: I) -> String
where
    I: IntoIterator<Item = &'a MessageLine>,
{
    let mut output = String::new();
    for line in lines {
        output.push_str(&line.format());
        output.push('\n');
    }
    output.push('\n');
    output
}

/// Encode an event as wire text, including the terminating blank line.
pub fn encode_event(event: &MessageEvent) -> String {
    encode_lines(&event.to_lines())
}
