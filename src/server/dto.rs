//! Request bodies and their validation

use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use url::Url;

use crate::error::{Error, Result};
use crate::types::MessageRequest;

const MAX_TO_LEN: usize = 255;
const MAX_MESSAGE_LEN: usize = 4096;
const MAX_CAPTION_LEN: usize = 1024;
const MAX_FILENAME_LEN: usize = 255;

#[derive(Debug, Clone, Deserialize)]
pub struct LoginDto {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyDto {
    pub name: String,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
}

/// Map a JSON body rejection to a 400
pub fn bad_body(rejection: JsonRejection) -> Error {
    Error::invalid_argument(rejection.body_text())
}

/// Structural limits on a send request, independent of the platform
pub fn validate_send(request: &MessageRequest) -> Result<()> {
    let mut problems = Vec::new();

    let to_len = request.to.chars().count();
    if to_len == 0 || to_len > MAX_TO_LEN {
        problems.push(format!("to must be between 1 and {MAX_TO_LEN} characters"));
    }
    let message_len = request.message.chars().count();
    if message_len == 0 || message_len > MAX_MESSAGE_LEN {
        problems.push(format!("message must be between 1 and {MAX_MESSAGE_LEN} characters"));
    }
    if let Some(media_url) = &request.media_url {
        if !is_http_url(media_url) {
            problems.push("mediaUrl must be an http(s) URL".to_string());
        }
    }
    if request.caption.as_ref().is_some_and(|c| c.chars().count() > MAX_CAPTION_LEN) {
        problems.push(format!("caption must be at most {MAX_CAPTION_LEN} characters"));
    }
    if request.filename.as_ref().is_some_and(|f| f.chars().count() > MAX_FILENAME_LEN) {
        problems.push(format!("filename must be at most {MAX_FILENAME_LEN} characters"));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(Error::invalid_argument(problems.join(", ")))
    }
}

pub fn validate_create_api_key(dto: &CreateApiKeyDto) -> Result<()> {
    if dto.name.trim().is_empty() {
        return Err(Error::invalid_argument("name must not be empty"));
    }
    Ok(())
}

fn is_http_url(value: &str) -> bool {
    Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false)
}
