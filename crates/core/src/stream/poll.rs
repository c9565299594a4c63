use std::{collections::HashMap, sync::Arc, time::Duration};

use chatwire_types::{Message, OutboundEvent};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::{
    store::{MessageStore, StoreError, UserDirectory},
    stream::{Cursor, SessionEnd, SessionSummary, StreamSession},
};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    /// Pause between store queries. Trades delivery latency for store load.
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Drives one [`StreamSession`]: query the store past the cursor, push what
/// came back in order, advance the cursor, sleep, repeat.
///
/// Terminates on client cancellation, on the first store error (after
/// notifying the client once) or on the first failed push. There are no
/// retries; a client resumes by reconnecting.
#[derive(Clone)]
pub struct PollLoop {
    store: Arc<dyn MessageStore>,
    users: Arc<dyn UserDirectory>,
    config: PollConfig,
}

impl PollLoop {
    pub fn new(
        store: Arc<dyn MessageStore>,
        users: Arc<dyn UserDirectory>,
        config: PollConfig,
    ) -> Self {
        Self {
            store,
            users,
            config,
        }
    }

    /// Run the loop on its own task.
    pub fn spawn(self, session: StreamSession) -> JoinHandle<SessionSummary> {
        tokio::spawn(async move { self.run(session).await })
    }

    pub async fn run(&self, mut session: StreamSession) -> SessionSummary {
        let end = self.drive(&mut session).await;
        session.close(end)
    }

    async fn drive(&self, session: &mut StreamSession) -> SessionEnd {
        loop {
            if session.is_cancelled() {
                return SessionEnd::Cancelled;
            }

            let cursor = session.cursor().current();
            let batch = match self.fetch(cursor).await {
                Ok(batch) => batch,
                Err(e) => {
                    error!(session_id = %session.id(), error = %e, "Failed to fetch new messages");
                    session
                        .push_error("failed to fetch new messages".to_string())
                        .await;
                    return SessionEnd::StoreFailed;
                }
            };

            if !batch.is_empty()
                && let Err(end) = self.deliver(session, batch).await
            {
                return end;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = session.cancelled() => return SessionEnd::Cancelled,
            }
        }
    }

    async fn fetch(&self, cursor: Cursor) -> Result<Vec<Message>, StoreError> {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || store.list_since(&cursor))
            .await
            .map_err(|e| StoreError::Unavailable(format!("store task failed: {}", e)))?
    }

    /// Push `batch` in order, then move the cursor to its last message.
    async fn deliver(
        &self,
        session: &mut StreamSession,
        batch: Vec<Message>,
    ) -> Result<(), SessionEnd> {
        let count = batch.len();
        let events = self.resolve(batch).await;

        let mut last = None;
        for (message, event) in events {
            match serde_json::to_string(&event) {
                Ok(json) => session.push_event(json).await?,
                Err(e) => {
                    warn!(
                        session_id = %session.id(),
                        message_id = %message.id,
                        error = %e,
                        "Skipping message that failed to serialize"
                    );
                }
            }
            last = Some(message);
        }

        if let Some(last) = last {
            session.cursor_mut().advance(&last);
        }
        debug!(
            session_id = %session.id(),
            count = %count,
            cursor = ?session.cursor().current(),
            "Delivered batch"
        );
        Ok(())
    }

    /// Attach a display name to every message. Lookups run off the async
    /// runtime, once per distinct sender.
    async fn resolve(&self, batch: Vec<Message>) -> Vec<(Message, OutboundEvent)> {
        let users = Arc::clone(&self.users);
        let mut senders: Vec<i32> = batch.iter().map(|m| m.sender_id).collect();
        senders.sort_unstable();
        senders.dedup();

        let names = tokio::task::spawn_blocking(move || {
            senders
                .into_iter()
                .map(|id| (id, users.username_for(id)))
                .collect::<HashMap<i32, String>>()
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Username resolution failed, using placeholders");
            HashMap::new()
        });

        batch
            .into_iter()
            .map(|message| {
                let username = names
                    .get(&message.sender_id)
                    .cloned()
                    .unwrap_or_else(|| chatwire_types::UNKNOWN_USERNAME.to_string());
                let event = OutboundEvent::new(&message, username);
                (message, event)
            })
            .collect()
    }
}
