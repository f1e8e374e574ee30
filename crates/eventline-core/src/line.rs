//! Single-line codec.
//!
//! Every line of an event stream has one of three shapes:
//!
//! ```text
//! key: value      field line (one leading space after the colon is dropped)
//! : value         comment (empty key)
//! key             field with an empty value
//! ```
//!
//! [`MessageLine::parse`] classifies a raw line and never rejects it for its
//! content; the only failure is a raw line that still contains a line break.
//! [`MessageLine::format`] is the inverse and always writes exactly one space
//! after the colon, so `"event:  x"` parses to `Event(" x")` and formats back
//! as `"event:  x"`, while `"event:x"` formats as `"event: x"`.

use core::fmt;
use core::ops::Deref;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LineError, LineResult};
use crate::event::MergeRule;

/// Recognized field keys.
pub mod keys {
    /// Event type field.
    pub const EVENT: &str = "event";

    /// Data field; repeated lines are joined with `\n`.
    pub const DATA: &str = "data";

    /// Event ID field, also the resume point.
    pub const ID: &str = "id";

    /// Reconnection delay in milliseconds.
    pub const RETRY: &str = "retry";

    /// Comment lines carry an empty key.
    pub const COMMENT: &str = "";
}

/// Text that fits on one wire line: it contains neither `\n` nor `\r`.
///
/// Only those two characters end a line on the wire, so other Unicode
/// line separators such as U+000B, U+000C, U+0085, U+2028 and U+2029 are
/// ordinary text here and pass through unchanged.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct FieldValue(String);

impl FieldValue {
    /// Validate `value` as single-line text.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `value` contains `\n` or `\r`.
    pub fn new(value: impl Into<String>) -> LineResult<Self> {
        let value = value.into();
        check_single_line(&value)?;
        Ok(Self(value))
    }

    /// The empty value.
    pub fn empty() -> Self {
        Self(String::new())
    }

    /// Wrap a slice already known to be free of line breaks.
    pub(crate) fn from_single_line(value: &str) -> Self {
        debug_assert!(check_single_line(value).is_ok());
        Self(value.to_owned())
    }

    /// Borrow the text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Take the text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Deref for FieldValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for FieldValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FieldValue {
    type Error = LineError;

    fn try_from(value: String) -> LineResult<Self> {
        Self::new(value)
    }
}

impl TryFrom<&str> for FieldValue {
    type Error = LineError;

    fn try_from(value: &str) -> LineResult<Self> {
        Self::new(value)
    }
}

impl FromStr for FieldValue {
    type Err = LineError;

    fn from_str(s: &str) -> LineResult<Self> {
        Self::new(s)
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        value.0
    }
}

impl PartialEq<str> for FieldValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for FieldValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Reject text holding a line break, reporting where the first one sits.
pub(crate) fn check_single_line(text: &str) -> LineResult<()> {
    match text.find(|c: char| c == '\n' || c == '\r') {
        Some(position) => Err(LineError::EmbeddedNewline { position }),
        None => Ok(()),
    }
}

/// Field class a line folds into when events are assembled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineKind {
    /// `event`
    Event,
    /// `data`
    Data,
    /// `id`
    Id,
    /// `retry` with an integer value
    Retry,
    /// empty key
    Comment,
    /// anything else, including a non-integer `retry`
    Unknown,
}

impl LineKind {
    /// The merge policy applied to lines of this kind.
    pub const fn merge_rule(self) -> MergeRule {
        match self {
            Self::Event | Self::Id | Self::Retry => MergeRule::LastWins,
            Self::Data => MergeRule::JoinLines,
            Self::Comment => MergeRule::Append,
            Self::Unknown => MergeRule::Ignore,
        }
    }
}

/// A line in the raw stream of events.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLine {
    /// The type of the event.
    Event(FieldValue),

    /// One line of data. An event may carry several.
    Data(FieldValue),

    /// The event ID, which also becomes the resume point.
    Id(FieldValue),

    /// Reconnection delay in milliseconds.
    Retry(i64),

    /// A comment. Consumers conventionally ignore these; they are kept for
    /// introspection and keepalives.
    Comment(FieldValue),

    /// An unrecognized key, or a `retry` whose value is not an integer.
    /// Consumers must ignore these, so they are never an error.
    Unknown {
        /// The key exactly as received.
        key: FieldValue,
        /// The value after the single optional leading space was removed.
        value: FieldValue,
    },
}

impl MessageLine {
    /// Parse one raw line.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `raw` contains `\n` or `\r`.
    /// Every other input classifies successfully.
    pub fn parse(raw: &str) -> LineResult<Self> {
        check_single_line(raw)?;

        let (key, value) = match raw.split_once(':') {
            Some((key, value)) => (key, value.strip_prefix(' ').unwrap_or(value)),
            None => (raw, ""),
        };
        let value = FieldValue::from_single_line(value);

        Ok(match key {
            keys::COMMENT => Self::Comment(value),
            keys::EVENT => Self::Event(value),
            keys::ID => Self::Id(value),
            keys::DATA => Self::Data(value),
            keys::RETRY => match value.parse::<i64>() {
                Ok(millis) => Self::Retry(millis),
                Err(_) => Self::unknown_from_parts(key, value),
            },
            _ => Self::unknown_from_parts(key, value),
        })
    }

    fn unknown_from_parts(key: &str, value: FieldValue) -> Self {
        Self::Unknown {
            key: FieldValue::from_single_line(key),
            value,
        }
    }

    /// Format the line for the wire, without a trailing line break.
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// An `event` line.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `value` spans lines.
    pub fn event(value: impl Into<String>) -> LineResult<Self> {
        FieldValue::new(value).map(Self::Event)
    }

    /// A `data` line.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `value` spans lines.
    pub fn data(value: impl Into<String>) -> LineResult<Self> {
        FieldValue::new(value).map(Self::Data)
    }

    /// An `id` line.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `value` spans lines.
    pub fn id(value: impl Into<String>) -> LineResult<Self> {
        FieldValue::new(value).map(Self::Id)
    }

    /// A `retry` line.
    pub fn retry(millis: i64) -> Self {
        Self::Retry(millis)
    }

    /// A comment line.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `value` spans lines.
    pub fn comment(value: impl Into<String>) -> LineResult<Self> {
        FieldValue::new(value).map(Self::Comment)
    }

    /// A line with an arbitrary key.
    ///
    /// Formatting such a line and parsing it again yields a different variant
    /// when `key` is one of [`keys`], or contains `:`.
    ///
    /// # Errors
    ///
    /// Returns [`LineError::EmbeddedNewline`] if `key` or `value` spans lines.
    pub fn unknown(key: impl Into<String>, value: impl Into<String>) -> LineResult<Self> {
        Ok(Self::Unknown {
            key: FieldValue::new(key)?,
            value: FieldValue::new(value)?,
        })
    }

    /// The field class of this line.
    pub fn kind(&self) -> LineKind {
        match self {
            Self::Event(_) => LineKind::Event,
            Self::Data(_) => LineKind::Data,
            Self::Id(_) => LineKind::Id,
            Self::Retry(_) => LineKind::Retry,
            Self::Comment(_) => LineKind::Comment,
            Self::Unknown { .. } => LineKind::Unknown,
        }
    }

    /// The key written on the wire.
    pub fn key(&self) -> &str {
        match self {
            Self::Event(_) => keys::EVENT,
            Self::Data(_) => keys::DATA,
            Self::Id(_) => keys::ID,
            Self::Retry(_) => keys::RETRY,
            Self::Comment(_) => keys::COMMENT,
            Self::Unknown { key, .. } => key,
        }
    }
}

impl fmt::Display for MessageLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Event(value) | Self::Data(value) | Self::Id(value) | Self::Comment(value) => {
                write!(f, "{}: {value}", self.key())
            }
            Self::Retry(millis) => write!(f, "{}: {millis}", keys::RETRY),
            Self::Unknown { key, value } => write!(f, "{key}: {value}"),
        }
    }
}

impl FromStr for MessageLine {
    type Err = LineError;

    fn from_str(s: &str) -> LineResult<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> MessageLine {
        MessageLine::parse(raw).unwrap()
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::new(value).unwrap()
    }

    #[test]
    fn test_parse_event() {
        let line = parse("event: some event");
        assert_eq!(line, MessageLine::Event(text("some event")));
        assert_eq!(line.format(), "event: some event");
    }

    #[test]
    fn test_parse_strips_only_one_space() {
        assert_eq!(
            parse("event:  some event"),
            MessageLine::Event(text(" some event"))
        );
        assert_eq!(parse("data:   x"), MessageLine::Data(text("  x")));
    }

    #[test]
    fn test_parse_without_space() {
        assert_eq!(parse("data:value"), MessageLine::Data(text("value")));
        assert_eq!(parse("data:value").format(), "data: value");
    }

    #[test]
    fn test_parse_only_first_colon_splits() {
        assert_eq!(
            parse("data: {\"a\": 1}"),
            MessageLine::Data(text("{\"a\": 1}"))
        );
        assert_eq!(parse("id: a:b"), MessageLine::Id(text("a:b")));
    }

    #[test]
    fn test_parse_retry() {
        assert_eq!(parse("retry: 123"), MessageLine::Retry(123));
        assert_eq!(parse("retry: -5"), MessageLine::Retry(-5));
    }

    #[test]
    fn test_parse_malformed_retry_is_unknown() {
        assert_eq!(
            parse("retry: 12.3"),
            MessageLine::Unknown {
                key: text("retry"),
                value: text("12.3"),
            }
        );
        assert_eq!(
            parse("retry:  123"),
            MessageLine::Unknown {
                key: text("retry"),
                value: text(" 123"),
            }
        );
        assert_eq!(
            parse("retry: 99999999999999999999"),
            MessageLine::Unknown {
                key: text("retry"),
                value: text("99999999999999999999"),
            }
        );
    }

    #[test]
    fn test_parse_comment() {
        assert_eq!(parse(":some text"), MessageLine::Comment(text("some text")));
        assert_eq!(
            parse(":  some text"),
            MessageLine::Comment(text(" some text"))
        );
        assert_eq!(parse(":"), MessageLine::Comment(FieldValue::empty()));
        assert_eq!(parse(":x").format(), ": x");
    }

    #[test]
    fn test_parse_key_without_colon() {
        assert_eq!(parse("data"), MessageLine::Data(FieldValue::empty()));
        assert_eq!(parse("id"), MessageLine::Id(FieldValue::empty()));
        assert_eq!(
            parse("retry"),
            MessageLine::Unknown {
                key: text("retry"),
                value: FieldValue::empty(),
            }
        );
        assert_eq!(
            parse("hello"),
            MessageLine::Unknown {
                key: text("hello"),
                value: FieldValue::empty(),
            }
        );
    }

    #[test]
    fn test_parse_unknown_keeps_key_verbatim() {
        let line = parse("Event: x");
        assert_eq!(
            line,
            MessageLine::Unknown {
                key: text("Event"),
                value: text("x"),
            }
        );
        assert_eq!(line.format(), "Event: x");
        assert_eq!(line.key(), "Event");
    }

    #[test]
    fn test_parse_spaces_around_key_make_it_unknown() {
        for (raw, key) in [("event :x", "event "), (" event:x", " event"), (" :x", " ")] {
            assert_eq!(
                parse(raw),
                MessageLine::Unknown {
                    key: text(key),
                    value: text("x"),
                }
            );
        }
    }

    #[test]
    fn test_parse_keeps_trailing_space() {
        assert_eq!(parse("event: x "), MessageLine::Event(text("x ")));
        assert_eq!(
            parse("retry: 123 "),
            MessageLine::Unknown {
                key: text("retry"),
                value: text("123 "),
            }
        );
    }

    #[test]
    fn test_other_unicode_separators_are_text() {
        assert_eq!(
            parse("data: a\u{2028}b\u{85}c"),
            MessageLine::Data(text("a\u{2028}b\u{85}c"))
        );
        assert!(FieldValue::new("\u{b}\u{c}\u{2029}").is_ok());
    }

    #[test]
    fn test_parse_rejects_line_breaks() {
        assert_eq!(
            MessageLine::parse("data: a\nb"),
            Err(LineError::EmbeddedNewline { position: 7 })
        );
        assert!(MessageLine::parse("data: a\r").is_err());
        assert!("\n".parse::<MessageLine>().is_err());
    }

    #[test]
    fn test_format_each_variant() {
        assert_eq!(MessageLine::data("x").unwrap().format(), "data: x");
        assert_eq!(MessageLine::id("7").unwrap().format(), "id: 7");
        assert_eq!(MessageLine::retry(3000).format(), "retry: 3000");
        assert_eq!(MessageLine::comment("").unwrap().format(), ": ");
        assert_eq!(
            MessageLine::unknown("foo", "bar").unwrap().to_string(),
            "foo: bar"
        );
    }

    #[test]
    fn test_constructors_reject_line_breaks() {
        assert!(MessageLine::event("a\nb").is_err());
        assert!(MessageLine::data("a\rb").is_err());
        assert!(MessageLine::id("\n").is_err());
        assert!(MessageLine::comment("x\n").is_err());
        assert!(MessageLine::unknown("k\n", "v").is_err());
        assert!(MessageLine::unknown("k", "v\n").is_err());
    }

    #[test]
    fn test_field_value() {
        let value = FieldValue::new("abc").unwrap();
        assert_eq!(value, "abc");
        assert_eq!(value.len(), 3);
        assert_eq!(String::from(value), "abc");
        assert_eq!(
            FieldValue::try_from("a\r\nb"),
            Err(LineError::EmbeddedNewline { position: 1 })
        );
    }

    #[test]
    fn test_field_value_serde_revalidates() {
        let value: FieldValue = serde_json::from_str("\"ok\"").unwrap();
        assert_eq!(value, "ok");
        assert!(serde_json::from_str::<FieldValue>("\"a\\nb\"").is_err());
    }

    #[test]
    fn test_line_serde() {
        let line = MessageLine::unknown("k", "v").unwrap();
        let json = serde_json::to_string(&line).unwrap();
        assert_eq!(json, r#"{"unknown":{"key":"k","value":"v"}}"#);
        assert_eq!(serde_json::from_str::<MessageLine>(&json).unwrap(), line);
        assert_eq!(
            serde_json::to_string(&MessageLine::retry(5)).unwrap(),
            r#"{"retry":5}"#
        );
    }

    #[test]
    fn test_kind_and_merge_rules() {
        assert_eq!(parse("event: a").kind(), LineKind::Event);
        assert_eq!(parse("retry: x").kind(), LineKind::Unknown);
        assert_eq!(LineKind::Data.merge_rule(), MergeRule::JoinLines);
        assert_eq!(LineKind::Comment.merge_rule(), MergeRule::Append);
        assert_eq!(LineKind::Unknown.merge_rule(), MergeRule::Ignore);
        for kind in [LineKind::Event, LineKind::Id, LineKind::Retry] {
            assert_eq!(kind.merge_rule(), MergeRule::LastWins);
        }
    }
}
