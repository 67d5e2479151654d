use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::Json,
};
use serde_json::{json, Value};

use crate::auth::{ApiKeyInfo, LoginResponse};
use crate::error::Result;
use crate::server::dto::{bad_body, validate_create_api_key, CreateApiKeyDto, LoginDto};
use crate::server::extract::JwtAuth;
use crate::server::state::AppState;
use crate::types::timestamp_now;

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginDto>, JsonRejection>,
) -> Result<Json<LoginResponse>> {
    let Json(credentials) = payload.map_err(bad_body)?;
    let response = state.auth.login(&credentials.username, &credentials.password)?;
    Ok(Json(response))
}

/// `GET /auth/api-keys`
pub async fn list_api_keys(State(state): State<AppState>, _auth: JwtAuth) -> Json<Vec<ApiKeyInfo>> {
    Json(state.auth.api_keys().list().await)
}

/// `POST /auth/api-keys`
pub async fn create_api_key(
    State(state): State<AppState>,
    _auth: JwtAuth,
    payload: std::result::Result<Json<CreateApiKeyDto>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiKeyInfo>)> {
    let Json(dto) = payload.map_err(bad_body)?;
    validate_create_api_key(&dto)?;
    let created = state.auth.api_keys().create(dto.name.trim(), dto.permissions).await;
    Ok((StatusCode::CREATED, Json(created)))
}

/// `DELETE /auth/api-keys/{key}`
pub async fn revoke_api_key(
    State(state): State<AppState>,
    _auth: JwtAuth,
    Path(key): Path<String>,
) -> Json<Value> {
    let revoked = state.auth.api_keys().revoke(&key).await;
    Json(json!({
        "success": revoked,
        "message": if revoked { "API key revoked" } else { "API key not found" },
    }))
}

/// `GET /auth/profile`
pub async fn profile(JwtAuth(claims): JwtAuth) -> Json<Value> {
    Json(json!({
        "user": claims,
        "timestamp": timestamp_now(),
    }))
}
