use reqwest::Method;

use super::{ApiClient, Host};
use crate::chat::message::WireMessage;
use crate::error::Result;

impl ApiClient {
    /// Fetches the message history with one friend from the chat server.
    ///
    /// Issued once per conversation-open; the result is merged with live
    /// messages by the chat session. Payloads use the same field shape as
    /// inbound real-time messages and are not assumed to arrive sorted.
    pub async fn chat_history(&self, token: &str, friend_id: u64) -> Result<Vec<WireMessage>> {
        let path = format!("/chat/{}", friend_id);
        let request = self.request(Method::GET, Host::Chat, &path, Some(token));
        self.execute(request, "Failed to load chat history").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_chat_history_parses_wire_messages() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/chat/9")
            .with_status(200)
            .with_body(
                r#"[
                    {"id": "1", "type": "text", "text": "hi", "sender_id": 9,
                     "created_at": "2026-08-01T10:00:00Z"},
                    {"id": "2", "type": "image", "file_url": "http://files/a.png",
                     "file_name": "a.png", "sender_id": 5,
                     "created_at": "2026-08-01T10:01:00Z"}
                ]"#,
            )
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), &server.url());
        let history = client.chat_history("tok", 9).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history[0].text.as_deref(), Some("hi"));
        assert_eq!(history[1].file_url.as_deref(), Some("http://files/a.png"));
    }
}
