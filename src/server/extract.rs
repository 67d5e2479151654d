//! Authentication extractors

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::auth::{ApiKeyInfo, Claims};
use crate::error::Error;

use super::state::AppState;

/// Request authenticated with an active API key
pub struct ApiKeyAuth(pub ApiKeyInfo);

/// Request authenticated with a valid bearer JWT
pub struct JwtAuth(pub Claims);

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// API key from `Authorization: Bearer`, `X-API-Key`, then `?api_key=`
pub fn extract_api_key(parts: &Parts) -> Option<String> {
    if let Some(key) = bearer_token(parts) {
        return Some(key.to_string());
    }

    if let Some(key) = parts
        .headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return Some(key.to_string());
    }

    let query = parts.uri.query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(name, _)| name == "api_key")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

impl FromRequestParts<AppState> for ApiKeyAuth {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let key = extract_api_key(parts).ok_or_else(|| Error::unauthorized("API key is required"))?;
        let info = state
            .auth
            .api_keys()
            .validate(&key)
            .await
            .ok_or_else(|| Error::unauthorized("Invalid or inactive API key"))?;
        Ok(ApiKeyAuth(info))
    }
}

impl FromRequestParts<AppState> for JwtAuth {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| Error::unauthorized("Bearer token is required"))?;
        let claims = state
            .auth
            .verify_token(token)
            .map_err(|_| Error::unauthorized("Invalid or expired token"))?;
        Ok(JwtAuth(claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn test_api_key_sources() {
        let p = parts(
            Request::builder()
                .uri("/x?api_key=query-key")
                .header("authorization", "Bearer bearer-key")
                .header("x-api-key", "header-key")
                .body(())
                .unwrap(),
        );
        assert_eq!(extract_api_key(&p).as_deref(), Some("bearer-key"));

        let p = parts(
            Request::builder()
                .uri("/x?api_key=query-key")
                .header("x-api-key", "header-key")
                .body(())
                .unwrap(),
        );
        assert_eq!(extract_api_key(&p).as_deref(), Some("header-key"));

        let p = parts(Request::builder().uri("/x?foo=1&api_key=query-key").body(()).unwrap());
        assert_eq!(extract_api_key(&p).as_deref(), Some("query-key"));

        let p = parts(Request::builder().uri("/x").body(()).unwrap());
        assert_eq!(extract_api_key(&p), None);
    }
}
