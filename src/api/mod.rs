//! HTTP API surface.
//!
//! One [`ApiClient`] wraps a shared `reqwest::Client` and talks to the two
//! backend hosts: the main API (auth, users, friends, goals) and the chat
//! server (message history, file upload). Every authenticated request carries
//! a bearer token supplied by the caller; requests and responses are logged
//! at debug level. Failures are normalized: transport failures become
//! [`StrideError::Network`], non-2xx responses become [`StrideError::Api`]
//! carrying the server's `message` when the body has one and an
//! endpoint-specific fallback otherwise.

mod auth;
mod chat;
mod friends;
mod goals;
mod upload;
mod users;

pub use auth::LoginResponse;
pub use goals::GoalPage;
pub use upload::UploadResponse;

use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StrideError};

/// Which backend host a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Host {
    Api,
    Chat,
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    api_url: String,
    chat_url: String,
}

/// Envelope for endpoints that wrap their payload in `{data, message}`.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl ApiClient {
    /// Default timeout for HTTP requests.
    pub(crate) fn default_timeout() -> Duration {
        Duration::from_secs(10)
    }

    pub fn new(api_url: &str, chat_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Self::default_timeout())
            .build()
            .expect("reqwest client construction only fails on TLS misconfiguration");

        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            chat_url: chat_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    pub(crate) fn request(
        &self,
        method: Method,
        host: Host,
        path: &str,
        token: Option<&str>,
    ) -> RequestBuilder {
        let base = match host {
            Host::Api => &self.api_url,
            Host::Chat => &self.chat_url,
        };
        let url = format!("{}{}", base, path);

        tracing::debug!(
            target: "stride::api",
            "Request: {} {}",
            method,
            url
        );

        let mut request = self.http.request(method, &url);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        request
    }

    /// Sends the request and decodes a JSON body, normalizing failures.
    /// `fallback` is the user-facing message used when the server rejects the
    /// request without a `message` field in the body.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<T> {
        let response = request.send().await?;
        let response = Self::check_status(response, fallback).await?;
        Ok(response.json().await?)
    }

    /// Like [`execute`](Self::execute) but discards the response body. Used
    /// for endpoints whose success payload carries nothing the client needs.
    pub(crate) async fn execute_empty(
        &self,
        request: RequestBuilder,
        fallback: &str,
    ) -> Result<()> {
        let response = request.send().await?;
        Self::check_status(response, fallback).await?;
        Ok(())
    }

    async fn check_status(response: Response, fallback: &str) -> Result<Response> {
        let status = response.status();
        tracing::debug!(
            target: "stride::api",
            "Response: {} {}",
            status,
            response.url()
        );

        if status.is_success() {
            return Ok(response);
        }

        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| fallback.to_string());

        Err(StrideError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bearer_token_attached() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/friends")
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), &server.url());
        let friends = client.friends("token-123").await.unwrap();

        assert!(friends.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_message_is_preserved() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/friends")
            .with_status(403)
            .with_body(r#"{"message": "Not allowed"}"#)
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), &server.url());
        let err = client.friends("token").await.unwrap_err();

        match err {
            StrideError::Api { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Not allowed");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_message_when_body_has_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/friends")
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let client = ApiClient::new(&server.url(), &server.url());
        let err = client.friends("token").await.unwrap_err();

        match err {
            StrideError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Failed to fetch friends list");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client = ApiClient::new("http://example.com/", "http://chat.example.com/");
        assert_eq!(client.api_url(), "http://example.com");
        assert_eq!(client.chat_url(), "http://chat.example.com");
    }
}
