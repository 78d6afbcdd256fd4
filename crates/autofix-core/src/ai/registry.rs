// SPDX-License-Identifier: Apache-2.0

//! Static registry of supported AI providers.
//!
//! Each entry names the endpoint, the environment variable holding the API
//! key and the wire format spoken by that endpoint.
//!
//! # Examples
//!
//! ```
//! use autofix_core::ai::registry::{WireFormat, get_provider};
//!
//! let provider = get_provider("anthropic").unwrap();
//! assert_eq!(provider.api_key_env, "ANTHROPIC_API_KEY");
//! assert_eq!(provider.wire, WireFormat::AnthropicMessages);
//! ```

/// Request/response shape of a provider endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireFormat {
    /// Anthropic Messages API (`/v1/messages`).
    AnthropicMessages,
    /// OpenAI-compatible chat completions.
    ChatCompletions,
}

/// Configuration for an AI provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Provider identifier (lowercase, used in config files)
    pub name: &'static str,

    /// Human-readable provider name for UI display
    pub display_name: &'static str,

    /// Full endpoint URL
    pub api_url: &'static str,

    /// Environment variable name for API key
    pub api_key_env: &'static str,

    /// Model used when the configured provider changes but the model does not
    pub default_model: &'static str,

    /// Wire format of the endpoint
    pub wire: WireFormat,
}

/// Static registry of all supported AI providers
pub static PROVIDERS: &[ProviderConfig] = &[
    ProviderConfig {
        name: "anthropic",
        display_name: "Anthropic",
        api_url: "https://api.anthropic.com/v1/messages",
        api_key_env: "ANTHROPIC_API_KEY",
        default_model: "claude-sonnet-4-5",
        wire: WireFormat::AnthropicMessages,
    },
    ProviderConfig {
        name: "openrouter",
        display_name: "OpenRouter",
        api_url: "https://openrouter.ai/api/v1/chat/completions",
        api_key_env: "OPENROUTER_API_KEY",
        default_model: "anthropic/claude-sonnet-4.5",
        wire: WireFormat::ChatCompletions,
    },
    ProviderConfig {
        name: "openai",
        display_name: "OpenAI",
        api_url: "https://api.openai.com/v1/chat/completions",
        api_key_env: "OPENAI_API_KEY",
        default_model: "gpt-4.1",
        wire: WireFormat::ChatCompletions,
    },
];

/// Retrieves a provider configuration by name (case-sensitive, lowercase).
#[must_use]
pub fn get_provider(name: &str) -> Option<&'static ProviderConfig> {
    PROVIDERS.iter().find(|p| p.name == name)
}

/// Returns all available providers.
#[must_use]
pub fn all_providers() -> &'static [ProviderConfig] {
    PROVIDERS
}
