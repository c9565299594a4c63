//! Wire and domain types shared by the chatwire server and its clients.
//!
//! Both the snapshot endpoint (`GET /api/messages`) and the event stream
//! (`GET /api/events`) format timestamps through [`timestamp`], so the two
//! outputs always agree on representation.

pub mod health;
pub mod messages;
pub mod timestamp;
pub mod users;

pub use health::{HealthReport, HealthStatus};
pub use messages::{Message, NewMessageRequest, OutboundEvent};
pub use users::{Credentials, LoginResponse, UserCreated};

/// Display name substituted when a sender's username cannot be resolved.
pub const UNKNOWN_USERNAME: &str = "unknown";
