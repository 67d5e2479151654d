use reqwest::{Client, StatusCode};
use url::Url;

use crate::error::{Error, ErrorCode, Result};

/// Slack Web API client for a single bot token
pub struct SlackClient {
    /// HTTP client for Web API calls
    pub(crate) http_client: Client,
    /// Base URL for the Web API (e.g., "https://slack.com/api/")
    base_url: Url,
    /// Bot token (xoxb-...)
    token: String,
}

impl SlackClient {
    /// Create a new Slack client
    ///
    /// # Arguments
    /// * `base_url` - The Web API base URL (e.g., "https://slack.com/api/")
    /// * `token` - Bot token sent as a bearer token on every call
    ///
    /// # Returns
    /// A Result containing the SlackClient or an Error
    pub fn new(base_url: &str, token: impl Into<String>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            Error::new(ErrorCode::Configuration, format!("Invalid Slack API URL: {e}"))
        })?;

        let http_client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url,
            token: token.into(),
        })
    }

    /// Build the full URL for a Web API method
    ///
    /// # Arguments
    /// * `method` - The API method name (e.g., "chat.postMessage")
    pub fn api_url(&self, method: &str) -> String {
        let method = method.trim_start_matches('/');
        let base = self.base_url.as_str().trim_end_matches('/');
        format!("{base}/{method}")
    }

    /// Call a Web API method with a JSON body
    ///
    /// # Arguments
    /// * `method` - The API method name
    /// * `body` - The request body (will be serialized to JSON)
    ///
    /// # Returns
    /// A Result containing the reqwest::Response or an Error
    pub async fn post<T: serde::Serialize>(&self, method: &str, body: &T) -> Result<reqwest::Response> {
        let url = self.api_url(method);
        self.http_client
            .post(&url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::new(ErrorCode::NetworkError, format!("{method} request failed: {e}")))
    }

    /// Check the response envelope and extract the JSON body
    ///
    /// Slack answers HTTP 200 with `{"ok": false, "error": "..."}` for most
    /// failures, so the `ok` flag decides success, not the status code.
    pub async fn handle_response<T: serde::de::DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let code = if status == StatusCode::TOO_MANY_REQUESTS {
                ErrorCode::RateLimited
            } else {
                ErrorCode::NetworkError
            };
            return Err(Error::new(
                code,
                format!("Slack API request failed with status {status}: {error_text}"),
            )
            .with_http_status(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::new(ErrorCode::Unknown, format!("Failed to parse response: {e}")))?;

        if body.get("ok").and_then(|ok| ok.as_bool()) != Some(true) {
            let error = body
                .get("error")
                .and_then(|e| e.as_str())
                .unwrap_or("unknown_error");
            return Err(Error::new(ErrorCode::BackendError, error).with_http_status(status.as_u16()));
        }

        serde_json::from_value(body)
            .map_err(|e| Error::new(ErrorCode::Unknown, format!("Failed to parse response: {e}")))
    }
}
