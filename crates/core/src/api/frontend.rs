use std::path::{Path, PathBuf};

use axum::{
    Extension,
    body::Body,
    extract::Request,
    http::{Method, Response, StatusCode, header},
};
use mime_guess::from_path;
use tracing::debug;

use crate::api::ApiState;

/// Serve the chat frontend from the configured directory.
///
/// `/` maps to `index.html`; `/foo` falls back to `/foo/index.html`.
pub async fn serve_frontend(Extension(state): Extension<ApiState>, req: Request) -> Response<Body> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return status_only(StatusCode::METHOD_NOT_ALLOWED);
    }

    let Some(relative) = sanitize(req.uri().path()) else {
        debug!(path = %req.uri().path(), "Rejected frontend path");
        return status_only(StatusCode::NOT_FOUND);
    };

    let candidates = if relative.as_os_str().is_empty() {
        vec![PathBuf::from("index.html")]
    } else {
        vec![relative.clone(), relative.join("index.html")]
    };

    for candidate in candidates {
        let full = state.frontend_dir.join(&candidate);
        if let Ok(bytes) = tokio::fs::read(&full).await {
            let mime = from_path(&full).first_or_octet_stream();
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, mime.as_ref())
                .body(Body::from(bytes))
                .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR));
        }
    }

    status_only(StatusCode::NOT_FOUND)
}

/// Turn a URI path into a relative file path, refusing anything that could
/// climb out of the frontend directory.
fn sanitize(path: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return None,
            s if s.contains('\\') || Path::new(s).is_absolute() => return None,
            s => out.push(s),
        }
    }
    Some(out)
}

fn status_only(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("/"), Some(PathBuf::new()));
        assert_eq!(
            sanitize("/css/./app.css"),
            Some(PathBuf::from("css").join("app.css"))
        );
        assert_eq!(sanitize("/../etc/passwd"), None);
        assert_eq!(sanitize("/a/../../b"), None);
        assert_eq!(sanitize("/a\\..\\b"), None);
    }
}
