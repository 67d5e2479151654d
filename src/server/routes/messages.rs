use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::server::dto::{bad_body, validate_send};
use crate::server::error::error_body;
use crate::server::extract::{ApiKeyAuth, JwtAuth};
use crate::server::state::AppState;
use crate::types::{timestamp_now, CampaignWebhook, MessageRequest, MessageResponse, Platform};

/// Header carrying the hex HMAC-SHA256 of a webhook body
pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// `POST /messages/send`
pub async fn send(
    State(state): State<AppState>,
    ApiKeyAuth(key): ApiKeyAuth,
    payload: std::result::Result<Json<MessageRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>> {
    let Json(request) = payload.map_err(bad_body)?;
    validate_send(&request)?;

    info!(key = %key.name, platform = %request.platform, "Send request received");
    Ok(Json(state.dispatch.send(&request).await))
}

/// `POST /messages/listmonk`
pub async fn listmonk(
    State(state): State<AppState>,
    ApiKeyAuth(key): ApiKeyAuth,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>> {
    if state.auth.requires_webhook_signature() {
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| Error::unauthorized("Webhook signature is required"))?;
        if !state.auth.verify_webhook_signature(&body, signature) {
            warn!(key = %key.name, "Rejected webhook with invalid signature");
            return Err(Error::unauthorized("Invalid webhook signature"));
        }
    }

    let webhook: CampaignWebhook = serde_json::from_slice(&body)?;
    Ok(Json(state.dispatch.send_campaign(&webhook).await))
}

/// `GET /messages/status`
pub async fn status_all(State(state): State<AppState>, _auth: JwtAuth) -> Json<Value> {
    let statuses = state.registry.status_all().await;
    Json(json!({
        "success": true,
        "data": statuses,
        "timestamp": timestamp_now(),
    }))
}

/// `GET /messages/status/{platform}`
pub async fn status_one(
    State(state): State<AppState>,
    _auth: JwtAuth,
    Path(platform): Path<String>,
) -> Result<Json<Value>> {
    let platform: Platform = platform.parse()?;
    let status = state.registry.status_of(platform).await;
    Ok(Json(json!({
        "success": true,
        "data": status,
        "timestamp": timestamp_now(),
    })))
}

/// `GET /messages/platforms`
pub async fn platforms(State(state): State<AppState>, _auth: JwtAuth) -> Json<Value> {
    let capabilities: Vec<_> = state
        .registry
        .connectors()
        .iter()
        .map(|connector| connector.capabilities().clone())
        .collect();
    Json(json!({
        "success": true,
        "data": capabilities,
        "timestamp": timestamp_now(),
    }))
}

/// `POST /messages/initialize`
pub async fn initialize(State(state): State<AppState>, _auth: JwtAuth) -> Response {
    match state.registry.initialize_all().await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "All platforms initialized successfully",
            "timestamp": timestamp_now(),
        }))
        .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, Json(error_body(&e.message))).into_response(),
    }
}
