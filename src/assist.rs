//! Goal assistant backed by an OpenAI-compatible chat-completions endpoint.
//!
//! Two features ride on it: generating a step list for a freshly described
//! goal, and answering free-form questions in the context of an existing
//! goal. The endpoint, key, and model come from configuration; no key ships
//! in the binary.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StrideError};
use crate::types::Goal;

const DEFAULT_MODEL: &str = "anthropic/claude-3-opus-20240229";

#[derive(Debug, Clone)]
pub struct AssistClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

impl AssistClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Builds a client from `STRIDE_ASSIST_URL` / `STRIDE_ASSIST_API_KEY`.
    /// Returns `None` when no key is configured; the assistant features are
    /// simply absent then.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("STRIDE_ASSIST_API_KEY").ok()?;
        let base_url = std::env::var("STRIDE_ASSIST_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        Some(Self::new(&base_url, &api_key))
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(target: "stride::assist", "Assistant request: {}", url);

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: 0.7,
            max_tokens: 200,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(StrideError::Api {
                status: status.as_u16(),
                message: "Assistant request failed".to_string(),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default())
    }

    /// Suggests a list of concrete steps for a goal being created.
    pub async fn generate_steps(
        &self,
        name: &str,
        category: &str,
        description: &str,
    ) -> Result<Vec<String>> {
        let prompt = format!(
            "You are a goal-setting assistant. Help structure this goal:\n\
             Name: {}\nCategory: {}\nDescription: {}\n\n\
             Give a list of concrete steps to achieve this goal, with no \
             introduction or commentary, one step per line.",
            name, category, description
        );
        let text = self.chat(&prompt).await?;
        Ok(parse_step_lines(&text))
    }

    /// Answers a free-form question in the context of an existing goal.
    pub async fn ask(&self, goal: &Goal, question: &str) -> Result<String> {
        let prompt = format!(
            "You are a goal-setting assistant. The user's goal:\n\
             Name: {}\nDescription: {}\n\n\
             The user asks: {}\n\n\
             Give advice that takes the goal and its current step into account.",
            goal.name, goal.description, question
        );
        self.chat(&prompt).await
    }
}

/// Splits assistant output into step titles: one per line, leading list
/// numbering stripped, blank lines dropped.
fn parse_step_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_ascii_digit())
                .trim_start_matches('.')
                .trim()
        })
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}
