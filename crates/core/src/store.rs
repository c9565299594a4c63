//! Narrow read/write interface the delivery subsystem consumes.
//!
//! [`crate::db::DbManager`] is the production implementation; tests plug in
//! in-memory stores.

use chatwire_types::Message;

use crate::{db::DbError, stream::Cursor};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),
    #[error("Store query failed: {0}")]
    Query(String),
}

impl From<DbError> for StoreError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::ConnectionError(_) => StoreError::Unavailable(e.to_string()),
            other => StoreError::Query(other.to_string()),
        }
    }
}

/// Durable, append-only message log.
///
/// Implementations must be safe for many concurrent readers alongside the
/// write path.
pub trait MessageStore: Send + Sync {
    fn insert(&self, sender_id: i32, content: &str) -> Result<Message, StoreError>;

    /// All messages, descending `(timestamp, id)`.
    fn list_all(&self) -> Result<Vec<Message>, StoreError>;

    /// Messages strictly after `cursor`, ascending `(timestamp, id)`.
    /// An empty result is not an error.
    fn list_since(&self, cursor: &Cursor) -> Result<Vec<Message>, StoreError>;
}

/// Resolves sender ids to display names.
pub trait UserDirectory: Send + Sync {
    /// Never fails: an unresolvable sender yields
    /// [`chatwire_types::UNKNOWN_USERNAME`].
    fn username_for(&self, sender_id: i32) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_failures_map_to_unavailable() {
        let err: StoreError = DbError::ConnectionError("refused".into()).into();
        assert!(matches!(err, StoreError::Unavailable(_)));

        let err: StoreError = DbError::CorruptMessage(3).into();
        assert_eq!(
            err,
            StoreError::Query("Stored message 3 has an out-of-range timestamp".into())
        );
    }
}
