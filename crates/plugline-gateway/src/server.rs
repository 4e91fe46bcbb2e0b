// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.

use std::time::Instant;

use axum::{Router, routing::get};
use plugline_core::{InboundEvent, PluglineError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Health state for the unauthenticated health endpoint.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Queue feeding the agent loop.
    pub inbound_tx: mpsc::Sender<InboundEvent>,
    /// Token expected in the subscription handshake. `None` rejects every handshake.
    pub verify_token: Option<String>,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors GatewayConfig from plugline-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Routes:
/// - GET /webhook (subscription handshake)
/// - POST /webhook (message intake)
/// - GET /health
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route(
            "/webhook",
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .route("/health", get(handlers::get_health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds and serves until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), PluglineError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PluglineError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| PluglineError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Gateway server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn state(capacity: usize) -> (GatewayState, mpsc::Receiver<InboundEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = GatewayState {
            inbound_tx: tx,
            verify_token: Some("secret".into()),
            health: HealthState {
                start_time: Instant::now(),
            },
        };
        (state, rx)
    }

    fn webhook_body() -> String {
        serde_json::json!({
            "object": "whatsapp_business_account",
            "entry": [{"changes": [{"value": {"messages": [
                {"from": "2348011111111", "id": "wamid.1", "type": "text", "text": {"body": "hi"}},
                {"from": "2348022222222", "id": "wamid.2", "type": "text", "text": {"body": "menu"}}
            ]}}]}]
        })
        .to_string()
    }

    fn post(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/webhook")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(resp: axum::response::Response) -> String {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn handshake_echoes_challenge() {
        let (state, _rx) = state(1);
        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=secret&hub.challenge=1158201444")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_text(resp).await, "1158201444");
    }

    #[tokio::test]
    async fn handshake_rejects_wrong_token() {
        let (state, _rx) = state(1);
        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .uri("/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn post_queues_every_message() {
        let (state, mut rx) = state(8);
        let resp = build_router(state).oneshot(post(webhook_body())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.message_id.0, "wamid.1");
        assert_eq!(second.sender.as_str(), "2348022222222");
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let (state, _rx) = state(1);
        let resp = build_router(state)
            .oneshot(post("{not json".into()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn foreign_object_is_404() {
        let (state, _rx) = state(1);
        let resp = build_router(state)
            .oneshot(post(r#"{"object":"page","entry":[]}"#.into()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn closed_queue_is_503() {
        let (state, rx) = state(1);
        drop(rx);
        let resp = build_router(state).oneshot(post(webhook_body())).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn health_reports_version() {
        let (state, _rx) = state(1);
        let resp = build_router(state)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
        assert!(json["uptime_secs"].is_u64());
    }
}
