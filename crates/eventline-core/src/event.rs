//! Event records and the fold that assembles them from lines.
//!
//! An event is the group of lines between two blank lines. Lines combine
//! per field class according to [`MergeRule`]:
//!
//! | line | rule | field |
//! |---|---|---|
//! | `event`, `retry` | [`MergeRule::LastWins`] | `event_type`, `retry` |
//! | `id` | [`MergeRule::LastWins`] | `id` and `last_event_id` together |
//! | `data` | [`MergeRule::JoinLines`] | `data`, joined with `\n` |
//! | comment | [`MergeRule::Append`] | `comments` |
//! | unknown | [`MergeRule::Ignore`] | none |

use serde::{Deserialize, Serialize};

use crate::error::LineResult;
use crate::line::{FieldValue, MessageLine};

/// How repeated lines of one kind combine into an event field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MergeRule {
    /// The last occurrence replaces any earlier one.
    LastWins,
    /// Every occurrence is kept in order and joined with `\n`.
    JoinLines,
    /// Every occurrence is appended to a list, duplicates included.
    Append,
    /// The line contributes nothing.
    Ignore,
}

/// One application-level message.
///
/// Whenever [`id`](Self::id) is set, [`last_event_id`](Self::last_event_id)
/// holds the same value. The only way to set the ID is
/// [`observe_id`](Self::observe_id), which writes both, so the pair cannot
/// disagree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "EventFields")]
pub struct MessageEvent {
    pub(crate) data: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) event_type: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) id: Option<FieldValue>,
    #[serde(rename = "lastEventID", skip_serializing_if = "Option::is_none")]
    pub(crate) last_event_id: Option<FieldValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) retry: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) comments: Vec<FieldValue>,
}

/// Wire shape of a serialized [`MessageEvent`]; the ID pairing is restored
/// on the way in.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventFields {
    #[serde(default)]
    data: String,
    #[serde(default)]
    event_type: Option<FieldValue>,
    #[serde(default)]
    id: Option<FieldValue>,
    #[serde(default, rename = "lastEventID")]
    last_event_id: Option<FieldValue>,
    #[serde(default)]
    retry: Option<i64>,
    #[serde(default)]
    comments: Vec<FieldValue>,
}

impl From<EventFields> for MessageEvent {
    fn from(fields: EventFields) -> Self {
        let mut event = Self {
            data: fields.data,
            event_type: fields.event_type,
            id: None,
            last_event_id: fields.last_event_id,
            retry: fields.retry,
            comments: fields.comments,
        };
        if let Some(id) = fields.id {
            event.observe_id(id);
        }
        event
    }
}

impl MessageEvent {
    /// Create an event carrying only data.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Create a builder that validates single-line fields on `build`.
    pub fn builder() -> MessageEventBuilder {
        MessageEventBuilder::new()
    }

    /// Fold lines, in arrival order, into one event.
    ///
    /// `last_event_id` is the resume point carried over from earlier events
    /// or a previous connection. It survives unless an `id` line appears, in
    /// which case the last such line sets both the ID and the resume point.
    pub fn assemble<I>(lines: I, last_event_id: Option<FieldValue>) -> Self
    where
        I: IntoIterator<Item = MessageLine>,
    {
        let mut fold = Fold::new(last_event_id);
        for line in lines {
            fold.apply(line);
        }
        fold.finish()
    }

    /// [`assemble`](Self::assemble) over borrowed lines.
    pub fn assemble_ref<'a, I>(lines: I, last_event_id: Option<FieldValue>) -> Self
    where
        I: IntoIterator<Item = &'a MessageLine>,
    {
        Self::assemble(lines.into_iter().cloned(), last_event_id)
    }

    /// Record an observed ID. It becomes both the event ID and the resume
    /// point, superseding whatever resume point was carried before.
    pub fn observe_id(&mut self, id: FieldValue) {
        self.last_event_id = Some(id.clone());
        self.id = Some(id);
    }

    /// The event data; lines are separated by `\n`.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Take the data.
    pub fn into_data(self) -> String {
        self.data
    }

    /// The event type.
    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    /// The ID of this event.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// The ID to present when reconnecting.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Reconnection delay in milliseconds.
    pub fn retry(&self) -> Option<i64> {
        self.retry
    }

    /// Comments in arrival order.
    pub fn comments(&self) -> &[FieldValue] {
        &self.comments
    }

    /// Replace the data.
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the event type.
    pub fn with_event_type(mut self, event_type: FieldValue) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Set the ID, which is also the resume point.
    pub fn with_id(mut self, id: FieldValue) -> Self {
        self.observe_id(id);
        self
    }

    /// Set the resume point. Has no effect once an ID is set, since the ID
    /// is the resume point.
    pub fn with_last_event_id(mut self, last_event_id: Option<FieldValue>) -> Self {
        if self.id.is_none() {
            self.last_event_id = last_event_id;
        }
        self
    }

    /// Set the reconnection delay.
    pub fn with_retry(mut self, millis: i64) -> Self {
        self.retry = Some(millis);
        self
    }

    /// Append a comment.
    pub fn with_comment(mut self, comment: FieldValue) -> Self {
        self.comments.push(comment);
        self
    }
}

/// Accumulator for one pass of [`MessageEvent::assemble`].
struct Fold {
    event: MessageEvent,
    data: Vec<String>,
}

impl Fold {
    fn new(last_event_id: Option<FieldValue>) -> Self {
        Self {
            event: MessageEvent {
                last_event_id,
                ..MessageEvent::default()
            },
            data: Vec::new(),
        }
    }

    fn apply(&mut self, line: MessageLine) {
        match line.kind().merge_rule() {
            MergeRule::LastWins => self.replace(line),
            MergeRule::JoinLines | MergeRule::Append => self.accumulate(line),
            MergeRule::Ignore => {}
        }
    }

    fn replace(&mut self, line: MessageLine) {
        match line {
            MessageLine::Event(event_type) => self.event.event_type = Some(event_type),
            MessageLine::Retry(millis) => self.event.retry = Some(millis),
            MessageLine::Id(id) => self.event.observe_id(id),
            _ => {}
        }
    }

    fn accumulate(&mut self, line: MessageLine) {
        match line {
            MessageLine::Data(text) => self.data.push(text.into_string()),
            MessageLine::Comment(text) => self.event.comments.push(text),
            _ => {}
        }
    }

    fn finish(mut self) -> MessageEvent {
        self.event.data = self.data.join("\n");
        self.event
    }
}

/// Builder for events whose single-line fields come from unchecked text.
#[derive(Clone, Debug, Default)]
pub struct MessageEventBuilder {
    data: String,
    event_type: Option<String>,
    id: Option<String>,
    last_event_id: Option<String>,
    retry: Option<i64>,
    comments: Vec<String>,
}

impl MessageEventBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the data. It may span lines.
    pub fn data(mut self, data: impl Into<String>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the event type.
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Set the event ID.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Set the resume point. Overridden by [`id`](Self::id) when both are set.
    pub fn last_event_id(mut self, last_event_id: impl Into<String>) -> Self {
        self.last_event_id = Some(last_event_id.into());
        self
    }

    /// Set the reconnection delay in milliseconds.
    pub fn retry(mut self, millis: i64) -> Self {
        self.retry = Some(millis);
        self
    }

    /// Append a comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comments.push(comment.into());
        self
    }

    /// Build the event.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`](crate::LineError::EmbeddedNewline)
    /// if the event type, ID, resume point, or a comment spans lines.
    pub fn build(self) -> LineResult<MessageEvent> {
        let mut event = MessageEvent {
            data: self.data,
            event_type: self.event_type.map(FieldValue::new).transpose()?,
            id: None,
            last_event_id: self.last_event_id.map(FieldValue::new).transpose()?,
            retry: self.retry,
            comments: self
                .comments
                .into_iter()
                .map(FieldValue::new)
                .collect::<LineResult<_>>()?,
        };
        if let Some(id) = self.id {
            event.observe_id(FieldValue::new(id)?);
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LineError;
    use pretty_assertions::assert_eq;

    fn text(value: &str) -> FieldValue {
        FieldValue::new(value).unwrap()
    }

    fn lines(raw: &[&str]) -> Vec<MessageLine> {
        raw.iter().map(|r| MessageLine::parse(r).unwrap()).collect()
    }

    #[test]
    fn test_assemble_id_sets_resume_point() {
        let event = MessageEvent::assemble([MessageLine::Id(text("X"))], None);
        assert_eq!(event.id(), Some("X"));
        assert_eq!(event.last_event_id(), Some("X"));
        assert_eq!(event.data(), "");
    }

    #[test]
    fn test_assemble_empty_keeps_carried_id() {
        let event = MessageEvent::assemble(Vec::<MessageLine>::new(), Some(text("P")));
        assert_eq!(event.id(), None);
        assert_eq!(event.last_event_id(), Some("P"));
        assert_eq!(event.data(), "");
        assert_eq!(event.event_type(), None);
        assert_eq!(event.retry(), None);
        assert!(event.comments().is_empty());
    }

    #[test]
    fn test_assemble_id_overrides_carried_id() {
        let event = MessageEvent::assemble(lines(&["id: new"]), Some(text("old")));
        assert_eq!(event.last_event_id(), Some("new"));
    }

    #[test]
    fn test_assemble_joins_data() {
        let event = MessageEvent::assemble(lines(&["data: a", "data: b"]), None);
        assert_eq!(event.data(), "a\nb");

        let event = MessageEvent::assemble(lines(&["data", "data"]), None);
        assert_eq!(event.data(), "\n");
    }

    #[test]
    fn test_assemble_ignores_unknown() {
        let with_unknown = MessageEvent::assemble(lines(&["x: y", "retry: soon"]), None);
        assert_eq!(with_unknown, MessageEvent::assemble(Vec::<MessageLine>::new(), None));
    }

    #[test]
    fn test_assemble_many_of_each_kind() {
        let lines = lines(&[
            "id: some ID",
            "data: some data",
            "retry: 123",
            "event: some event",
            ": some comment",
            "some: unknown",
            "id: some other ID",
            "data: some more data",
            "retry: 456",
            "event: some other event",
            ": some other comment",
            "some: more unknown",
            ": some comment",
        ]);

        let actual = MessageEvent::assemble(lines, Some(text("last ID")));
        let expected = MessageEvent::builder()
            .data("some data\nsome more data")
            .event_type("some other event")
            .id("some other ID")
            .retry(456)
            .comment("some comment")
            .comment("some other comment")
            .comment("some comment")
            .build()
            .unwrap();

        assert_eq!(actual, expected);
        assert_eq!(actual.last_event_id(), Some("some other ID"));
    }

    #[test]
    fn test_assemble_ref_matches_owned() {
        let lines = lines(&["event: e", "data: d"]);
        assert_eq!(
            MessageEvent::assemble_ref(&lines, None),
            MessageEvent::assemble(lines.clone(), None)
        );
    }

    #[test]
    fn test_id_and_resume_point_cannot_disagree() {
        let event = MessageEvent::new("d")
            .with_last_event_id(Some(text("P")))
            .with_id(text("X"));
        assert_eq!(event.last_event_id(), Some("X"));

        let event = event.with_last_event_id(Some(text("P")));
        assert_eq!(event.last_event_id(), Some("X"));

        let event = MessageEvent::builder()
            .id("X")
            .last_event_id("P")
            .build()
            .unwrap();
        assert_eq!(event.last_event_id(), Some("X"));
    }

    #[test]
    fn test_builder_validates_single_line_fields() {
        assert_eq!(
            MessageEvent::builder().id("a\nb").build(),
            Err(LineError::EmbeddedNewline { position: 1 })
        );
        assert!(MessageEvent::builder().event_type("\r").build().is_err());
        assert!(MessageEvent::builder().comment("x\ny").build().is_err());
        assert!(MessageEvent::builder().data("multi\nline").build().is_ok());
    }

    #[test]
    fn test_serde_restores_id_pairing() {
        let event: MessageEvent =
            serde_json::from_str(r#"{"data":"d","id":"X","lastEventID":"P"}"#).unwrap();
        assert_eq!(event.id(), Some("X"));
        assert_eq!(event.last_event_id(), Some("X"));

        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"data":"d","id":"X","lastEventID":"X"}"#);

        let resumed: MessageEvent =
            serde_json::from_str(r#"{"data":"d","lastEventID":"P"}"#).unwrap();
        assert_eq!(resumed.id(), None);
        assert_eq!(resumed.last_event_id(), Some("P"));

        let empty: MessageEvent = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, MessageEvent::default());
    }
}
