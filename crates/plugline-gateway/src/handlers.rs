// SPDX-FileCopyrightText: 2026 Plugline Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the webhook gateway.

use std::time::Duration;

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use plugline_whatsapp::{WebhookError, parse_webhook, verify_subscription};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::server::GatewayState;

/// How long intake waits for room in the queue before giving up.
const QUEUE_TIMEOUT: Duration = Duration::from_secs(5);

/// Query parameters of the subscription handshake.
#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
        .into_response()
}

/// GET /webhook
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(params): Query<VerifyParams>,
) -> Response {
    match verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        state.verify_token.as_deref(),
    ) {
        Some(challenge) => {
            tracing::info!("webhook subscription verified");
            (StatusCode::OK, challenge.to_string()).into_response()
        }
        None => {
            warn!(mode = ?params.mode, "webhook verification rejected");
            error_response(StatusCode::FORBIDDEN, "invalid webhook verification token")
        }
    }
}

/// POST /webhook
///
/// Parses the delivery, queues every message, and acknowledges without
/// waiting for processing.
pub async fn receive_webhook(State(state): State<GatewayState>, body: Bytes) -> Response {
    let events = match parse_webhook(&body) {
        Ok(events) => events,
        Err(WebhookError::Malformed(e)) => {
            warn!(error = %e, "malformed webhook payload");
            return error_response(StatusCode::BAD_REQUEST, "malformed payload");
        }
        Err(e @ WebhookError::UnexpectedObject(_)) => {
            warn!(error = %e, "webhook for unexpected object");
            return error_response(StatusCode::NOT_FOUND, e.to_string());
        }
    };

    debug!(count = events.len(), "webhook delivery received");
    for event in events {
        match tokio::time::timeout(QUEUE_TIMEOUT, state.inbound_tx.send(event)).await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => {
                error!("agent loop not accepting events");
                return error_response(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "agent loop not accepting events",
                );
            }
            Err(_) => {
                error!("inbound queue full");
                return error_response(StatusCode::SERVICE_UNAVAILABLE, "inbound queue full");
            }
        }
    }

    StatusCode::OK.into_response()
}

/// GET /health
pub async fn get_health(State(state): State<GatewayState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.health.start_time.elapsed().as_secs(),
    })
}
