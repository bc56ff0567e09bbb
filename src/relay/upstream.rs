//! Wire types for the two upstream provider APIs.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate` (local generation).
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    /// Always false: ask for one JSON document instead of NDJSON chunks.
    pub stream: bool,
}

/// Non-streaming `/api/generate` response. Other fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
}

/// Body of `POST /chat/completions` (OpenAI-compatible).
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message<'a>>,
    pub temperature: f64,
}

/// A chat message.
#[derive(Debug, Clone, Serialize)]
pub struct Message<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

/// Chat completion response, reduced to the fields the relay reads.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

/// A completion choice.
#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

/// Assistant message of a choice. `content` is null for tool-call answers.
#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Single-turn request carrying `prompt` as the only user message.
    pub fn single_user_turn(model: &'a str, prompt: &'a str, temperature: f64) -> Self {
        Self {
            model,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
            temperature,
        }
    }
}

impl ChatCompletionResponse {
    /// Text of the first choice, if the upstream produced one.
    pub fn into_first_content(self) -> Option<String> {
        self.choices.into_iter().next()?.message.content
    }
}
