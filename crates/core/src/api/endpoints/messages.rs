use axum::{Extension, Json, extract::rejection::JsonRejection, http::StatusCode};
use chatwire_types::{Message, NewMessageRequest};
use tracing::{debug, info};

use crate::api::{
    ApiError, ApiState,
    endpoints::{blocking, invalid_body},
};

/// GET /api/messages - every stored message, most recent first
pub async fn list(Extension(state): Extension<ApiState>) -> Result<Json<Vec<Message>>, ApiError> {
    let store = state.message_store();
    let messages = blocking(move || Ok(store.list_all()?)).await?;
    debug!(count = %messages.len(), "Returning message snapshot");
    Ok(Json(messages))
}

/// POST /api/new/message - append a message on behalf of a named user
pub async fn create(
    Extension(state): Extension<ApiState>,
    payload: Result<Json<NewMessageRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = payload.map_err(invalid_body)?;
    if !request.is_complete() {
        return Err(ApiError::InvalidRequest);
    }

    let db = state.db_manager.clone();
    let store = state.message_store();
    let message = blocking(move || {
        let user = db
            .find_user(request.username.trim())?
            .ok_or(ApiError::UserNotFound)?;
        Ok(store.insert(user.id, &request.content)?)
    })
    .await?;

    info!(
        message_id = %message.id,
        sender_id = %message.sender_id,
        "Message stored"
    );
    Ok(StatusCode::CREATED)
}
