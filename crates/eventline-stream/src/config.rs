//! Configuration for event readers and writers.

use serde::{Deserialize, Serialize};

/// Default upper bound on a single line, in bytes.
pub const DEFAULT_MAX_LINE_LENGTH: usize = 64 * 1024;

/// Configuration shared by [`EventReader`](crate::EventReader) and
/// [`EventWriter`](crate::EventWriter).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Resume point from an earlier connection, seeded into the reader.
    ///
    /// Default: none
    pub last_event_id: Option<String>,

    /// Maximum length of one line in bytes. `None` means unbounded.
    ///
    /// Default: 64 KiB
    pub max_line_length: Option<usize>,

    /// Whether the writer flushes after every event.
    ///
    /// Default: true
    pub flush_each_event: bool,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            last_event_id: None,
            max_line_length: Some(DEFAULT_MAX_LINE_LENGTH),
            flush_each_event: true,
        }
    }
}

impl StreamConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume from the given event ID.
    pub fn with_last_event_id(mut self, last_event_id: impl Into<String>) -> Self {
        self.last_event_id = Some(last_event_id.into());
        self
    }

    /// Limit line length, or lift the limit with `None`.
    pub fn with_max_line_length(mut self, max_line_length: Option<usize>) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    /// Choose whether the writer flushes after every event.
    pub fn with_flush_each_event(mut self, flush_each_event: bool) -> Self {
        self.flush_each_event = flush_each_event;
        self
    }
}
