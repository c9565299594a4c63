//! Real-time delivery: turns the polled message store into a push feed.
//!
//! One [`StreamSession`] per open client connection, driven by one
//! [`PollLoop`] task. Sessions share nothing but the store.
//!
//! ```text
//! client ── GET /api/events ──> StreamSession { cursor, transport }
//!                                     │
//!                     PollLoop ── list_since(cursor) ──> MessageStore
//!                        │
//!                        └─ data: {"username", "content", "timestamp"}
//! ```

pub mod cursor;
pub mod poll;
pub mod session;

pub use cursor::{Cursor, CursorTracker};
pub use poll::{DEFAULT_POLL_INTERVAL, PollConfig, PollLoop};
pub use session::{SessionEnd, SessionSummary, StreamFrame, StreamSession};
