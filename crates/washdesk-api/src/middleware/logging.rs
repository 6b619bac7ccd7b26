use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use super::client_ip::{client_ip, peer_addr};

/// Request logging middleware
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let ip = client_ip(req.headers(), peer_addr(&req));
    let start = Instant::now();

    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        client_ip = %ip,
        duration_ms = %duration.as_millis(),
        "Request processed"
    );

    response
}
