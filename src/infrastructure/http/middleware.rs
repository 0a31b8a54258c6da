//! HTTP Middleware
//!
//! 请求耗时与 HTTP 状态码错误日志

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use super::handlers::USER_ID_HEADER;

/// HTTP 状态码错误日志中间件
///
/// 4xx 记 warn，5xx 记 error。
/// 业务错误（errno != 0）走 HTTP 200，在 ApiError::into_response() 中记录
pub async fn error_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let has_user = request.headers().contains_key(USER_ID_HEADER);
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis() as u64;

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms,
            has_user = has_user,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms,
            has_user = has_user,
            "HTTP client error"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/broken", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(axum::middleware::from_fn(error_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder()
            .uri(uri)
            .header(USER_ID_HEADER, "user-1")
            .body(Body::empty())
            .unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        assert_eq!(status_of("/ok").await, StatusCode::OK);
        assert_eq!(status_of("/missing").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("/broken").await, StatusCode::BAD_GATEWAY);
    }
}
