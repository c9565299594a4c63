use chatwire_types::Message;
use chrono::{DateTime, Utc};
use tracing::warn;

/// Read position of one session in the message history.
///
/// Ordered by `(timestamp, last_id)`. `last_id` breaks ties between messages
/// sharing a millisecond so that neither side of a poll boundary is skipped
/// or repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub timestamp: DateTime<Utc>,
    pub last_id: Option<i32>,
}

impl Default for Cursor {
    /// The earliest representable instant: a fresh session replays the
    /// whole backlog.
    fn default() -> Self {
        Self {
            timestamp: DateTime::<Utc>::MIN_UTC,
            last_id: None,
        }
    }
}

impl Cursor {
    pub fn at(message: &Message) -> Self {
        Self {
            timestamp: message.timestamp,
            last_id: Some(message.id),
        }
    }

    /// Whether `message` lies strictly after this watermark. Without a
    /// `last_id` the comparison is on the timestamp alone.
    pub fn admits(&self, message: &Message) -> bool {
        match self.last_id {
            Some(id) => {
                message.timestamp > self.timestamp
                    || (message.timestamp == self.timestamp && message.id > id)
            }
            None => message.timestamp > self.timestamp,
        }
    }
}

#[derive(Debug, Default)]
pub struct CursorTracker {
    current: Cursor,
}

impl CursorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Cursor {
        self.current
    }

    /// Move the watermark to `message`. Never moves backwards; returns
    /// whether the watermark changed.
    pub fn advance(&mut self, message: &Message) -> bool {
        let next = Cursor::at(message);
        if next <= self.current {
            warn!(
                current = ?self.current,
                requested = ?next,
                "Ignoring cursor regression"
            );
            return false;
        }
        self.current = next;
        true
    }
}
