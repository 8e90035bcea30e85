//! HTTP surface for stage-relay.
//!
//! Maps the four operations onto versioned routes and adds health and
//! metrics endpoints. Request bodies are passed to the dispatcher untouched.

pub mod health;
mod metrics;

use crate::dispatcher::{Reply, Status};
use crate::server::StageRelay;
use axum::{
    body::Bytes,
    extract::DefaultBodyLimit,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Router,
};
use stage_types::Operation;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

pub use health::HealthStatus;

/// Build the HTTP router with all endpoints.
pub fn build_router(relay: Arc<StageRelay>) -> Router {
    let max_body_size = relay.config().server.max_body_size;

    Router::new()
        .route("/v1/copy", post(copy_handler))
        .route("/v1/move", delete(move_handler))
        .route("/v1/paste", get(paste_handler))
        .route("/v1/list", get(list_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(Extension(relay))
}

/// Serve the router on `listener` until `shutdown` resolves.
pub async fn serve<F>(relay: Arc<StageRelay>, listener: TcpListener, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(relay))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn copy_handler(Extension(relay): Extension<Arc<StageRelay>>, body: Bytes) -> Response {
    dispatch(relay, Operation::Copy, body).await
}

async fn move_handler(Extension(relay): Extension<Arc<StageRelay>>, body: Bytes) -> Response {
    dispatch(relay, Operation::Move, body).await
}

async fn paste_handler(Extension(relay): Extension<Arc<StageRelay>>, body: Bytes) -> Response {
    dispatch(relay, Operation::Paste, body).await
}

async fn list_handler(Extension(relay): Extension<Arc<StageRelay>>, body: Bytes) -> Response {
    dispatch(relay, Operation::List, body).await
}

/// Run the dispatcher on a blocking worker thread.
///
/// Once started, the dispatch runs to completion even if the caller goes away.
async fn dispatch(relay: Arc<StageRelay>, op: Operation, body: Bytes) -> Response {
    match tokio::task::spawn_blocking(move || relay.handle(op, &body)).await {
        Ok(reply) => reply_response(op, reply),
        Err(e) => {
            tracing::error!(%op, error = %e, "dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn status_code(op: Operation, status: Status) -> StatusCode {
    match status {
        Status::Success if op == Operation::Copy => StatusCode::ACCEPTED,
        Status::Success => StatusCode::OK,
        Status::BadRequest => StatusCode::BAD_REQUEST,
        Status::NotFound => StatusCode::NOT_FOUND,
        Status::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reply_response(op: Operation, reply: Reply) -> Response {
    let code = status_code(op, reply.status);
    if reply.body.is_empty() {
        return code.into_response();
    }
    (
        code,
        [(CONTENT_TYPE, "application/octet-stream")],
        reply.body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use stage_core::{generate_key_pair, PrivateKey, SharedKey};
    use stage_types::{CopyRequest, EntryId, ListRequest, WireMessage, LIST_SIGNED_BYTES};
    use tower::util::ServiceExt;

    struct TestRelay {
        relay: Arc<StageRelay>,
        shared_key: SharedKey,
        private_key: PrivateKey,
    }

    fn test_relay() -> TestRelay {
        let shared_key = SharedKey::generate().unwrap();
        let (public_key, private_key) = generate_key_pair();
        let mut config = Config::new(shared_key.clone(), public_key);
        config.server.max_body_size = 4096;
        TestRelay {
            relay: Arc::new(StageRelay::from_config(config).unwrap()),
            shared_key,
            private_key,
        }
    }

    fn request(method: Method, uri: &str, body: Vec<u8>) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn copy_returns_accepted_with_sealed_id() {
        let t = test_relay();
        let body = t
            .shared_key
            .seal(
                &CopyRequest {
                    content: b"hello".to_vec(),
                    signature: t.private_key.sign(b"hello"),
                }
                .to_bytes()
                .unwrap(),
            )
            .unwrap();

        let response = build_router(t.relay.clone())
            .oneshot(request(Method::POST, "/v1/copy", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
        let sealed = body_bytes(response).await;
        let id = EntryId::from_bytes(&t.shared_key.open(&sealed).unwrap()).unwrap();
        assert_eq!(t.relay.store().list_all().unwrap(), vec![id]);
    }

    #[tokio::test]
    async fn list_returns_ok() {
        let t = test_relay();
        let body = t
            .shared_key
            .seal(
                &ListRequest {
                    signature: t.private_key.sign(LIST_SIGNED_BYTES),
                }
                .to_bytes()
                .unwrap(),
            )
            .unwrap();

        let response = build_router(t.relay.clone())
            .oneshot(request(Method::GET, "/v1/list", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn garbage_body_is_bad_request_with_empty_body() {
        let t = test_relay();
        let response = build_router(t.relay.clone())
            .oneshot(request(Method::DELETE, "/v1/move", b"garbage".to_vec()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(body_bytes(response).await.is_empty());
    }

    #[tokio::test]
    async fn wrong_method_is_rejected() {
        let t = test_relay();
        let response = build_router(t.relay.clone())
            .oneshot(request(Method::GET, "/v1/copy", Vec::new()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn oversized_body_never_reaches_dispatcher() {
        let t = test_relay();
        let response = build_router(t.relay.clone())
            .oneshot(request(Method::POST, "/v1/copy", vec![0u8; 8192]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            t.relay
                .metrics()
                .bytes_received
                .load(std::sync::atomic::Ordering::Relaxed),
            0
        );
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let t = test_relay();
        let response = build_router(t.relay.clone())
            .oneshot(request(Method::GET, "/health", Vec::new()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let status: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
        assert_eq!(status["status"], "ok");
        assert_eq!(status["entries"], 0);
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_ok() {
        let t = test_relay();
        let response = build_router(t.relay.clone())
            .oneshot(request(Method::GET, "/metrics", Vec::new()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.contains("stagebox_entries 0"));
    }

    #[test]
    fn copy_success_is_accepted_others_ok() {
        assert_eq!(
            status_code(Operation::Copy, Status::Success),
            StatusCode::ACCEPTED
        );
        for op in [Operation::Move, Operation::Paste, Operation::List] {
            assert_eq!(status_code(op, Status::Success), StatusCode::OK);
        }
        assert_eq!(
            status_code(Operation::Move, Status::NotFound),
            StatusCode::NOT_FOUND
        );
    }
}
