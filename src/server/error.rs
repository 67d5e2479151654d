use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::error::Error;
use crate::types::timestamp_now;

/// Uniform `{success: false, error, timestamp}` body
pub fn error_body(message: &str) -> serde_json::Value {
    json!({
        "success": false,
        "error": message,
        "timestamp": timestamp_now(),
    })
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.code.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(error_body(&self.message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_error_status_codes() {
        let response = Error::invalid_argument("bad").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = Error::unauthorized("no").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = Error::new(ErrorCode::Configuration, "oops").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
