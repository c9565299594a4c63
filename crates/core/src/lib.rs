//! Server side of chatwire: the SQLite store, the live delivery subsystem and
//! the HTTP API that exposes both.

pub mod api;
pub mod auth;
pub mod db;
pub mod store;
pub mod stream;

pub use api::{ApiState, ServerConfig, start_server};
pub use db::{DbError, DbManager};
pub use stream::PollConfig;
