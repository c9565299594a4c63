pub mod endpoints;
pub mod error;
pub mod frontend;
pub mod middleware;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Extension, Router,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};

pub use error::ApiError;

use crate::{
    db::DbManager,
    store::{MessageStore, UserDirectory},
    stream::PollConfig,
};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_FRONTEND_DIR: &str = "./frontend";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub poll: PollConfig,
    pub frontend_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            poll: PollConfig::default(),
            frontend_dir: PathBuf::from(DEFAULT_FRONTEND_DIR),
        }
    }
}

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct ApiState {
    pub db_manager: Arc<DbManager>,
    pub poll: PollConfig,
    pub frontend_dir: Arc<PathBuf>,
}

impl ApiState {
    pub fn new(db_manager: Arc<DbManager>, config: &ServerConfig) -> Self {
        Self {
            db_manager,
            poll: config.poll,
            frontend_dir: Arc::new(config.frontend_dir.clone()),
        }
    }

    pub fn message_store(&self) -> Arc<dyn MessageStore> {
        self.db_manager.clone()
    }

    pub fn user_directory(&self) -> Arc<dyn UserDirectory> {
        self.db_manager.clone()
    }
}

/// Build the chat API router.
pub fn create_router(state: ApiState) -> Router<()> {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(endpoints::health::handler))
        .route("/api/messages", get(endpoints::messages::list))
        .route("/api/new/message", post(endpoints::messages::create))
        .route("/api/create/user", post(endpoints::users::create))
        .route("/api/login", post(endpoints::users::login))
        .route("/api/events", get(endpoints::events::handler))
        .fallback(frontend::serve_frontend)
        .layer(Extension(state))
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(cors_layer)
}

/// Serve the API on `0.0.0.0:port` until the listener fails.
pub async fn start_server(state: ApiState, port: u16) -> std::io::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Starting chatwire server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use serde_json::Value;
    use tempfile::TempDir;
    use tower::ServiceExt;

    use super::*;

    pub(crate) fn create_test_app() -> (TempDir, Router, Arc<DbManager>) {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = dir.path().join("chatwire.db");
        let db = Arc::new(
            DbManager::local(db_path.to_str().unwrap()).expect("Failed to open database"),
        );

        let frontend_dir = dir.path().join("frontend");
        std::fs::create_dir_all(frontend_dir.join("docs")).unwrap();
        std::fs::write(frontend_dir.join("index.html"), "<h1>chat</h1>").unwrap();
        std::fs::write(frontend_dir.join("script.js"), "console.log(1);").unwrap();
        std::fs::write(frontend_dir.join("docs").join("index.html"), "docs").unwrap();

        let config = ServerConfig {
            port: 0,
            poll: PollConfig {
                interval: Duration::from_millis(20),
            },
            frontend_dir,
        };
        let app = create_router(ApiState::new(Arc::clone(&db), &config));
        (dir, app, db)
    }

    pub(crate) fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub(crate) async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn get(app: Router, uri: &str) -> Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, app, _db) = create_test_app();
        let response = get(app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["service"], "chatwire");
    }

    #[tokio::test]
    async fn test_bundled_frontend_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let db = Arc::new(DbManager::local(dir.path().join("chatwire.db").to_str().unwrap()).unwrap());
        let config = ServerConfig {
            frontend_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../frontend"),
            ..ServerConfig::default()
        };
        let app = create_router(ApiState::new(db, &config));

        let response = get(app.clone(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app, "/script.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let script = String::from_utf8(bytes.to_vec()).unwrap();
        for endpoint in ["/api/events", "/api/new/message", "/api/login", "/api/create/user"] {
            assert!(script.contains(endpoint), "client does not use {}", endpoint);
        }
    }

    #[tokio::test]
    async fn test_frontend_index_and_assets() {
        let (_dir, app, _db) = create_test_app();

        let response = get(app.clone(), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/html"
        );

        let response = get(app.clone(), "/script.js").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .unwrap()
                .to_str()
                .unwrap()
                .contains("javascript")
        );

        let response = get(app.clone(), "/docs").await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = get(app, "/missing.css").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_frontend_rejects_traversal() {
        let (_dir, app, _db) = create_test_app();
        let response = get(app, "/../chatwire.db").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_allows_any_origin() {
        let (_dir, app, _db) = create_test_app();
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(header::ORIGIN, "http://example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "*"
        );
    }
}
