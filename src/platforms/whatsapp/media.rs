use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use url::Url;

use crate::error::{Error, ErrorCode, Result};

use super::types::MediaPayload;

const DEFAULT_MIMETYPE: &str = "application/octet-stream";

/// Bounds on a single media download
#[derive(Debug, Clone, Copy)]
pub struct MediaLimits {
    pub timeout: Duration,
    pub max_bytes: u64,
}

impl Default for MediaLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_bytes: 16 * 1024 * 1024,
        }
    }
}

fn too_large(max_bytes: u64) -> Error {
    Error::invalid_argument(format!("Media exceeds the maximum size of {max_bytes} bytes"))
}

/// Download a media URL and encode it for the bridge
///
/// # Arguments
/// * `http_client` - HTTP client used for the download
/// * `media_url` - Absolute URL of the media
/// * `filename` - Filename override; defaults to the last URL path segment
/// * `limits` - Request timeout and body size cap
///
/// # Returns
/// A Result containing the base64 payload or an Error
pub async fn fetch_media(
    http_client: &Client,
    media_url: &str,
    filename: Option<&str>,
    limits: MediaLimits,
) -> Result<MediaPayload> {
    let mut response = http_client
        .get(media_url)
        .timeout(limits.timeout)
        .send()
        .await
        .map_err(|e| Error::new(ErrorCode::NetworkError, format!("Failed to download media: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::new(
            ErrorCode::NetworkError,
            format!("Failed to download media: HTTP {status}"),
        )
        .with_http_status(status.as_u16()));
    }

    let mimetype = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_MIMETYPE.to_string());

    if response.content_length().is_some_and(|len| len > limits.max_bytes) {
        return Err(too_large(limits.max_bytes));
    }

    // Content-Length may be absent or wrong; enforce the cap while streaming
    let mut bytes = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(|e| {
        Error::new(ErrorCode::NetworkError, format!("Failed to read media body: {e}"))
    })? {
        if bytes.len() as u64 + chunk.len() as u64 > limits.max_bytes {
            return Err(too_large(limits.max_bytes));
        }
        bytes.extend_from_slice(&chunk);
    }

    let filename = filename
        .filter(|f| !f.is_empty())
        .map(String::from)
        .or_else(|| filename_from_url(media_url));

    Ok(MediaPayload {
        mimetype,
        data: STANDARD.encode(&bytes),
        filename,
    })
}

/// Last non-empty path segment of a URL
pub fn filename_from_url(media_url: &str) -> Option<String> {
    let url = Url::parse(media_url).ok()?;
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
        .map(String::from)
}
