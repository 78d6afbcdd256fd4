// SPDX-License-Identifier: Apache-2.0

//! Generic AI client for all registered providers.
//!
//! Provides a single `AiClient` struct that works with any AI provider
//! registered in the provider registry. See [`super::registry`] for available providers.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use super::provider::AiProvider;
use super::registry::{ProviderConfig, WireFormat, get_provider};
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, MessagesRequest, MessagesResponse,
};
use crate::config::AiConfig;
use crate::error::AutofixError;

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Generic AI client for all providers.
///
/// Holds HTTP client, API key, and model configuration for reuse across multiple requests.
#[derive(Debug)]
pub struct AiClient {
    /// Provider configuration from registry.
    provider: &'static ProviderConfig,
    /// HTTP client with configured timeout.
    http: Client,
    /// API key for provider authentication.
    api_key: SecretString,
    /// Model name.
    model: String,
    /// Maximum tokens for API responses.
    max_tokens: u32,
    /// Temperature for API requests.
    temperature: f32,
}

impl AiClient {
    /// Creates a new AI client with a provided API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is not in the registry or the HTTP
    /// client cannot be built.
    pub fn with_api_key(
        provider_name: &str,
        api_key: SecretString,
        config: &AiConfig,
    ) -> Result<Self> {
        let provider = get_provider(provider_name).ok_or_else(|| AutofixError::Config {
            message: format!("Unknown AI provider: {provider_name}"),
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            provider,
            http,
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    /// Registry entry this client talks to.
    #[must_use]
    pub fn provider(&self) -> &'static ProviderConfig {
        self.provider
    }

    fn request(&self) -> RequestBuilder {
        let req = self
            .http
            .post(self.provider.api_url)
            .header("Content-Type", "application/json");

        match self.provider.wire {
            WireFormat::AnthropicMessages => req
                .header("x-api-key", self.api_key.expose_secret())
                .header("anthropic-version", ANTHROPIC_VERSION),
            WireFormat::ChatCompletions => {
                let req = req.header(
                    "Authorization",
                    format!("Bearer {}", self.api_key.expose_secret()),
                );
                if self.provider.name == "openrouter" {
                    req.header("HTTP-Referer", "https://github.com/autofix-dev/autofix")
                        .header("X-Title", "Autofix")
                } else {
                    req
                }
            }
        }
    }

    /// Maps non-success statuses to typed errors. 401 and 429 get dedicated variants.
    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status.as_u16() == 401 {
            return Err(AutofixError::AI {
                message: format!(
                    "Invalid {} API key. Check your {} environment variable.",
                    self.provider.display_name, self.provider.api_key_env
                ),
                status: Some(401),
                provider: self.provider.name.to_string(),
            }
            .into());
        }

        if status.as_u16() == 429 {
            warn!("Rate limited by {} API", self.provider.name);
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0);
            debug!(retry_after, "Parsed Retry-After header");
            return Err(AutofixError::RateLimited {
                provider: self.provider.name.to_string(),
                retry_after,
            }
            .into());
        }

        let error_body = response.text().await.unwrap_or_default();
        Err(AutofixError::AI {
            message: format!(
                "{} API error (HTTP {}): {}",
                self.provider.display_name,
                status.as_u16(),
                crate::utils::truncate(&error_body, 500)
            ),
            status: Some(status.as_u16()),
            provider: self.provider.name.to_string(),
        }
        .into())
    }

    fn messages_request(&self, system: &str, prompt: &str) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            system: (!system.is_empty()).then(|| system.to_string()),
            messages: vec![ChatMessage::new("user", prompt)],
        }
    }

    fn chat_request(&self, system: &str, prompt: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if !system.is_empty() {
            messages.push(ChatMessage::new("system", system));
        }
        messages.push(ChatMessage::new("user", prompt));
        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl AiProvider for AiClient {
    fn name(&self) -> &str {
        self.provider.name
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String> {
        let send_context = || format!("Failed to send request to {} API", self.provider.name);
        let parse_context = || format!("Failed to parse {} API response", self.provider.name);

        match self.provider.wire {
            WireFormat::AnthropicMessages => {
                let response = self
                    .request()
                    .json(&self.messages_request(system, prompt))
                    .send()
                    .await
                    .with_context(send_context)?;
                let body: MessagesResponse = self
                    .check_status(response)
                    .await?
                    .json()
                    .await
                    .with_context(parse_context)?;
                Ok(body.text())
            }
            WireFormat::ChatCompletions => {
                let response = self
                    .request()
                    .json(&self.chat_request(system, prompt))
                    .send()
                    .await
                    .with_context(send_context)?;
                let body: ChatCompletionResponse = self
                    .check_status(response)
                    .await?
                    .json()
                    .await
                    .with_context(parse_context)?;
                body.choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .context("No response from AI model")
            }
        }
    }
}
