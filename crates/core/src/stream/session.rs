use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

use crate::stream::{Cursor, CursorTracker};

/// Frames queued for one client connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFrame {
    /// A serialized `OutboundEvent`.
    Event(String),
    /// Terminal notification; nothing follows it.
    Error(String),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The client went away.
    Cancelled,
    /// The store failed a query; the client was notified once.
    StoreFailed,
    /// A push to the client transport failed.
    TransportFailed,
}

/// What a finished session leaves behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSummary {
    pub id: Uuid,
    pub end: SessionEnd,
    pub cursor: Cursor,
    pub delivered: usize,
}

/// Server-side state of one open streaming connection.
///
/// The transport is the sending half of a bounded channel whose receiving
/// half feeds the HTTP response body. Dropping the body (client disconnect)
/// closes the channel, which is the session's cancellation signal.
#[derive(Debug)]
pub struct StreamSession {
    id: Uuid,
    cursor: CursorTracker,
    transport: mpsc::Sender<StreamFrame>,
    delivered: usize,
}

impl StreamSession {
    pub fn open(transport: mpsc::Sender<StreamFrame>) -> Self {
        let id = Uuid::new_v4();
        info!(session_id = %id, "Stream session opened");
        Self {
            id,
            cursor: CursorTracker::new(),
            transport,
            delivered: 0,
        }
    }

    /// Open a session together with the receiver its frames arrive on.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StreamFrame>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::open(tx), rx)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cursor(&self) -> &CursorTracker {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut CursorTracker {
        &mut self.cursor
    }

    /// Non-blocking check of the cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        self.transport.is_closed()
    }

    /// Resolves once the client has gone away.
    pub async fn cancelled(&self) {
        self.transport.closed().await
    }

    /// Queue one event for the client. Waits while the client is behind.
    pub async fn push_event(&mut self, json: String) -> Result<(), SessionEnd> {
        self.transport
            .send(StreamFrame::Event(json))
            .await
            .map_err(|_| SessionEnd::TransportFailed)?;
        self.delivered += 1;
        Ok(())
    }

    /// Queue the terminal error notification. Best effort: the client may
    /// already be gone.
    pub async fn push_error(&self, message: String) {
        let _ = self.transport.send(StreamFrame::Error(message)).await;
    }

    /// Tear the session down. Consumes the session, so it runs once.
    pub fn close(self, end: SessionEnd) -> SessionSummary {
        let summary = SessionSummary {
            id: self.id,
            end,
            cursor: self.cursor.current(),
            delivered: self.delivered,
        };
        drop(self.transport);
        info!(
            session_id = %summary.id,
            reason = ?summary.end,
            delivered = %summary.delivered,
            "Stream session closed"
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dropping_receiver_signals_cancellation() {
        let (session, rx) = StreamSession::channel(4);
        assert!(!session.is_cancelled());

        drop(rx);
        assert!(session.is_cancelled());
        // Must resolve immediately once the receiver is gone.
        tokio::time::timeout(std::time::Duration::from_millis(100), session.cancelled())
            .await
            .expect("cancellation should be observable");
    }

    #[tokio::test]
    async fn test_push_counts_and_fails_after_disconnect() {
        let (mut session, mut rx) = StreamSession::channel(4);
        session.push_event("{}".to_string()).await.unwrap();
        assert_eq!(rx.recv().await, Some(StreamFrame::Event("{}".to_string())));

        drop(rx);
        assert_eq!(
            session.push_event("{}".to_string()).await,
            Err(SessionEnd::TransportFailed)
        );

        let summary = session.close(SessionEnd::TransportFailed);
        assert_eq!(summary.delivered, 1);
        assert_eq!(summary.cursor, Cursor::default());
    }

    #[tokio::test]
    async fn test_close_ends_the_frame_stream() {
        let (session, mut rx) = StreamSession::channel(4);
        session.push_error("boom".to_string()).await;
        let summary = session.close(SessionEnd::StoreFailed);

        assert_eq!(summary.end, SessionEnd::StoreFailed);
        assert_eq!(rx.recv().await, Some(StreamFrame::Error("boom".to_string())));
        assert_eq!(rx.recv().await, None);
    }
}
