// SPDX-License-Identifier: Apache-2.0

//! AI request/response types.
//!
//! Wire structures for the Anthropic Messages API and OpenAI-compatible chat
//! completions, plus the [`FixResult`] parsed out of the model's reply.

use serde::{Deserialize, Serialize};

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role: "system", "user", or "assistant".
    pub role: String,
    /// Message content.
    pub content: String,
}

impl ChatMessage {
    /// A message with the given role.
    #[must_use]
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

/// Request body for chat completions APIs.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// Model identifier.
    pub model: String,
    /// List of messages in the conversation.
    pub messages: Vec<ChatMessage>,
    /// Maximum tokens in response.
    pub max_tokens: u32,
    /// Temperature for response randomness.
    pub temperature: f32,
}

/// Response from chat completions APIs.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// List of choices (usually just one).
    pub choices: Vec<Choice>,
}

/// A single choice in the chat completion response.
#[derive(Debug, Deserialize)]
pub struct Choice {
    /// The generated message.
    pub message: ChatMessage,
}

/// Request body for the Anthropic Messages API.
#[derive(Debug, Serialize)]
pub struct MessagesRequest {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens in response.
    pub max_tokens: u32,
    /// Temperature for response randomness.
    pub temperature: f32,
    /// System prompt (top-level, not a message).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// User/assistant turns.
    pub messages: Vec<ChatMessage>,
}

/// Response from the Anthropic Messages API.
#[derive(Debug, Deserialize)]
pub struct MessagesResponse {
    /// Content blocks; only `text` blocks carry output.
    pub content: Vec<ContentBlock>,
}

/// One content block of a Messages API response.
#[derive(Debug, Deserialize)]
pub struct ContentBlock {
    /// Block type (e.g., "text").
    #[serde(rename = "type")]
    pub block_type: String,
    /// Text of a `text` block.
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Concatenated text of all `text` blocks.
    #[must_use]
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect()
    }
}

/// A whole-file replacement proposed by the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: String,
    /// Complete new file contents.
    pub content: String,
}

/// Outcome of one fix generation attempt.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FixResult {
    /// Whether the reply parsed and proposed at least one change.
    pub success: bool,
    /// Proposed file changes.
    pub changes: Vec<FileChange>,
    /// Human-readable summary of the fix.
    pub description: String,
    /// The model's explanation, or a raw-reply excerpt when parsing failed.
    pub reasoning: String,
    /// How to verify the fix, when the model provided one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_plan: Option<String>,
    /// Why the attempt failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FixResult {
    /// A failed result carrying `error` and diagnostic `reasoning`.
    #[must_use]
    pub fn failed(error: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            success: false,
            reasoning: reasoning.into(),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Paths of all changed files, in reply order.
    #[must_use]
    pub fn changed_paths(&self) -> Vec<String> {
        self.changes.iter().map(|c| c.path.clone()).collect()
    }
}
