use std::{net::SocketAddr, time::Instant};

use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::{debug, info};

/// Log every request on arrival and again with its status, size and latency.
///
/// The remote address is only known when the server was started with
/// `into_make_service_with_connect_info`.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    debug!(method = %method, uri = %uri, remote = %remote, "Request received");

    let response = next.run(req).await;

    info!(
        method = %method,
        uri = %uri,
        remote = %remote,
        status = %response.status().as_u16(),
        bytes = %response_size(&response).map_or_else(|| "-".to_string(), |n| n.to_string()),
        elapsed_ms = %start.elapsed().as_millis(),
        "Request handled"
    );
    response
}

/// Body size from `Content-Length`, else from the body's exact size hint.
/// Streamed bodies (the event feed) have neither.
fn response_size(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok()?.parse().ok())
        .or_else(|| response.body().size_hint().exact())
}
