use axum::{Extension, Json, extract::rejection::JsonRejection, http::StatusCode};
use chatwire_types::{Credentials, LoginResponse, UserCreated};
use tracing::info;

use crate::{
    api::{
        ApiError, ApiState,
        endpoints::{blocking, invalid_body},
    },
    auth::{hash_password, verify_password},
};

/// POST /api/create/user - register a user with a hashed password
pub async fn create(
    Extension(state): Extension<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<UserCreated>), ApiError> {
    let Json(credentials) = payload.map_err(invalid_body)?;
    if !credentials.is_complete() {
        return Err(ApiError::InvalidRequest);
    }

    let db = state.db_manager.clone();
    let created = blocking(move || {
        let username = credentials.username.trim().to_string();
        let password_hash = hash_password(&credentials.password)?;
        let id = db.insert_user(&username, &password_hash)?;
        Ok(UserCreated { id, username })
    })
    .await?;

    info!(user_id = %created.id, username = %created.username, "User created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/login - check a username/password pair
pub async fn login(
    Extension(state): Extension<ApiState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(credentials) = payload.map_err(invalid_body)?;
    if !credentials.is_complete() {
        return Err(ApiError::InvalidRequest);
    }

    let db = state.db_manager.clone();
    let response = blocking(move || {
        let Some(user) = db.find_user(credentials.username.trim())? else {
            return Err(ApiError::InvalidCredentials);
        };
        if !verify_password(&credentials.password, &user.password_hash)? {
            return Err(ApiError::InvalidCredentials);
        }
        Ok(LoginResponse {
            message: "login successful".to_string(),
            username: user.username,
        })
    })
    .await;

    match &response {
        Ok(ok) => info!(username = %ok.username, "User logged in"),
        Err(ApiError::InvalidCredentials) => info!("Rejected login attempt"),
        Err(_) => {}
    }
    response.map(Json)
}
