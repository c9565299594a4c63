use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::error;

use crate::{auth::PasswordError, db::DbError, store::StoreError};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Invalid request data")]
    InvalidRequest,
    #[error("User not found")]
    UserNotFound,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("Username or password is incorrect")]
    InvalidCredentials,
    #[error(transparent)]
    Db(DbError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::UsernameTaken => ApiError::UsernameTaken,
            other => ApiError::Db(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, err_type) = match &self {
            ApiError::InvalidRequest => (
                StatusCode::BAD_REQUEST,
                "invalid_request",
                "invalid_request_error",
            ),
            ApiError::UserNotFound => (
                StatusCode::NOT_FOUND,
                "user_not_found",
                "invalid_request_error",
            ),
            ApiError::UsernameTaken => (
                StatusCode::CONFLICT,
                "username_taken",
                "invalid_request_error",
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "authentication_error",
            ),
            ApiError::Db(_) | ApiError::Store(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store_error",
                "api_error",
            ),
            ApiError::Password(_) | ApiError::Task(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "api_error",
            ),
        };

        // Server-side causes are logged, not echoed to the client.
        let message = if status.is_server_error() {
            error!(error = %self, "Request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": {
                "code": code,
                "message": message,
                "type": err_type,
            }
        });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_username_maps_to_conflict() {
        let err: ApiError = DbError::UsernameTaken.into();
        assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_store_failures_are_internal_errors() {
        let err: ApiError = StoreError::Unavailable("down".into()).into();
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
