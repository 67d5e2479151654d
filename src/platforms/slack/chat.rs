use crate::error::Result;

use super::client::SlackClient;
use super::types::{Block, PostMessageRequest, PostMessageResponse, TextObject};

impl SlackClient {
    /// Post a message with `chat.postMessage`
    ///
    /// # Arguments
    /// * `request` - Channel plus text and/or blocks
    ///
    /// # Returns
    /// A Result containing the posted message's channel and `ts`, or an Error
    pub async fn post_message(&self, request: &PostMessageRequest) -> Result<PostMessageResponse> {
        let response = self.post("chat.postMessage", request).await?;
        self.handle_response(response).await
    }

    /// Post a plain text message
    pub async fn post_text(&self, channel: &str, text: &str) -> Result<PostMessageResponse> {
        self.post_message(&PostMessageRequest::text(channel, text)).await
    }

    /// Post an inline image, with the caption as a section above it
    pub async fn post_image(
        &self,
        channel: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<PostMessageResponse> {
        let fallback = caption.unwrap_or("Image");
        let request = PostMessageRequest::blocks(channel, image_blocks(image_url, caption), fallback);
        self.post_message(&request).await
    }
}

/// Block layout for an image message
///
/// An optional mrkdwn section holding the caption, then the image block whose
/// alt text is the caption or "Image".
pub fn image_blocks(image_url: &str, caption: Option<&str>) -> Vec<Block> {
    let caption = caption.filter(|c| !c.is_empty());
    let mut blocks = Vec::with_capacity(2);

    if let Some(caption) = caption {
        blocks.push(Block::Section {
            text: TextObject::mrkdwn(caption),
        });
    }

    blocks.push(Block::Image {
        image_url: image_url.to_string(),
        alt_text: caption.unwrap_or("Image").to_string(),
    });

    blocks
}

/// Text used for media Slack cannot embed (documents, audio, video)
pub fn file_link_text(filename: Option<&str>, caption: Option<&str>, url: &str) -> String {
    let filename = filename.filter(|f| !f.is_empty()).unwrap_or("File");
    let mut text = format!("📎 *{filename}*\n");
    if let Some(caption) = caption.filter(|c| !c.is_empty()) {
        text.push_str(caption);
        text.push('\n');
    }
    text.push_str(url);
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[test]
    fn test_image_blocks_with_caption() {
        let blocks = image_blocks("https://example.com/a.png", Some("Quarterly chart"));
        assert_eq!(blocks.len(), 2);

        let value = serde_json::to_value(&blocks).unwrap();
        assert_eq!(
            value,
            json!([
                {"type": "section", "text": {"type": "mrkdwn", "text": "Quarterly chart"}},
                {"type": "image", "image_url": "https://example.com/a.png", "alt_text": "Quarterly chart"}
            ])
        );
    }

    #[test]
    fn test_image_blocks_without_caption() {
        let blocks = image_blocks("https://example.com/a.png", None);
        assert_eq!(
            blocks,
            vec![Block::Image {
                image_url: "https://example.com/a.png".into(),
                alt_text: "Image".into(),
            }]
        );
    }

    #[test]
    fn test_file_link_text() {
        assert_eq!(
            file_link_text(Some("report.pdf"), Some("Q3 numbers"), "https://example.com/r.pdf"),
            "📎 *report.pdf*\nQ3 numbers\nhttps://example.com/r.pdf"
        );
        assert_eq!(
            file_link_text(None, None, "https://example.com/r.pdf"),
            "📎 *File*\nhttps://example.com/r.pdf"
        );
    }

    #[tokio::test]
    async fn test_post_image_sends_blocks_and_fallback() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("POST", "/chat.postMessage")
            .match_body(Matcher::PartialJson(json!({
                "channel": "C123",
                "text": "Image",
                "blocks": [{"type": "image", "image_url": "https://example.com/a.png", "alt_text": "Image"}]
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true,"channel":"C123","ts":"1700000000.000100"}"#)
            .create_async()
            .await;

        let client = SlackClient::new(&server.url(), "xoxb-test").unwrap();
        let posted = client
            .post_image("C123", "https://example.com/a.png", None)
            .await
            .unwrap();
        assert_eq!(posted.ts, "1700000000.000100");
        m.assert_async().await;
    }
}
