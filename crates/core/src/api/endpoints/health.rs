use axum::{Extension, Json, http::StatusCode};
use chatwire_types::{HealthReport, HealthStatus};
use tracing::warn;

use crate::api::{ApiError, ApiState, endpoints::blocking};

/// GET /health - liveness plus a round trip to the store
pub async fn handler(Extension(state): Extension<ApiState>) -> (StatusCode, Json<HealthReport>) {
    let db = state.db_manager.clone();
    report(blocking(move || Ok(db.ping()?)).await)
}

fn report(store_check: Result<(), ApiError>) -> (StatusCode, Json<HealthReport>) {
    match store_check {
        Ok(()) => (StatusCode::OK, Json(HealthReport::new(HealthStatus::Healthy))),
        Err(e) => {
            warn!(error = %e, "Health check could not reach the store");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport::new(HealthStatus::Unavailable)),
            )
        }
    }
}
