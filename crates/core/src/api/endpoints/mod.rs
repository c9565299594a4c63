pub mod events;
pub mod health;
pub mod messages;
pub mod users;

use axum::extract::rejection::JsonRejection;
use tracing::debug;

use crate::api::ApiError;

/// Run store or hashing work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Malformed JSON bodies are reported as 400 regardless of the rejection kind.
pub(crate) fn invalid_body(rejection: JsonRejection) -> ApiError {
    debug!(error = %rejection, "Rejected request body");
    ApiError::InvalidRequest
}
