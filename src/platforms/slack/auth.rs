use crate::error::{Error, ErrorCode, Result};

use super::client::SlackClient;
use super::types::AuthTestResponse;

impl SlackClient {
    /// Verify the bot token with `auth.test`
    ///
    /// # Returns
    /// A Result containing the workspace/bot identity or an Error
    ///
    /// # Note
    /// Any rejection (`ok: false`, HTTP failure, network error) is reported as
    /// `AuthenticationFailed` with the Slack error text.
    pub async fn auth_test(&self) -> Result<AuthTestResponse> {
        let result = match self.post("auth.test", &serde_json::json!({})).await {
            Ok(response) => self.handle_response::<AuthTestResponse>(response).await,
            Err(e) => Err(e),
        };

        result.map_err(|e| {
            Error::new(
                ErrorCode::AuthenticationFailed,
                format!("Slack authentication failed: {}", e.message),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_auth_test_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/auth.test")
            .match_header("authorization", "Bearer xoxb-good")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"url":"https://acme.slack.com/","team":"Acme","user":"gateway","team_id":"T1","user_id":"U1"}"#)
            .create_async()
            .await;

        let client = SlackClient::new(&server.url(), "xoxb-good").unwrap();
        let auth = client.auth_test().await.unwrap();
        assert_eq!(auth.team.as_deref(), Some("Acme"));
        assert_eq!(auth.user_id.as_deref(), Some("U1"));
        assert!(auth.bot_id.is_none());
    }

    #[tokio::test]
    async fn test_auth_test_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/auth.test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":false,"error":"invalid_auth"}"#)
            .create_async()
            .await;

        let client = SlackClient::new(&server.url(), "xoxb-bad").unwrap();
        let err = client.auth_test().await.unwrap_err();
        assert_eq!(err.code, ErrorCode::AuthenticationFailed);
        assert_eq!(err.message, "Slack authentication failed: invalid_auth");
    }
}
