// SPDX-License-Identifier: Apache-2.0

//! Error types for Autofix.
//!
//! Uses `thiserror` for deriving `std::error::Error` implementations.
//! Application code should use `anyhow::Result` for top-level error handling.

use thiserror::Error;

/// Errors that can occur during Autofix operations.
#[derive(Error, Debug)]
pub enum AutofixError {
    /// GitHub API error from octocrab.
    #[error("GitHub API error: {message}")]
    GitHub {
        /// Error message.
        message: String,
    },

    /// Linear API error (GraphQL or transport).
    #[error("Linear API error: {message}")]
    Linear {
        /// Error message.
        message: String,
    },

    /// AI provider error (Anthropic, `OpenRouter`, etc.).
    #[error("AI provider error: {message}")]
    AI {
        /// Error message from the AI provider.
        message: String,
        /// Optional HTTP status code from the provider.
        status: Option<u16>,
        /// Name of the AI provider (e.g., `anthropic`).
        provider: String,
    },

    /// Rate limit exceeded on an AI provider. Never retried.
    #[error("Rate limit exceeded on {provider}, retry after {retry_after}s")]
    RateLimited {
        /// Name of the provider that rate limited.
        provider: String,
        /// Number of seconds the provider asked us to wait.
        retry_after: u64,
    },

    /// Required credentials or target repository are missing.
    #[error("Missing required configuration: {}", missing.join(", "))]
    MissingCredentials {
        /// Names of the missing environment variables or settings.
        missing: Vec<String>,
    },

    /// Configuration file error.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },

    /// A git command failed.
    #[error("git {command} failed: {message}")]
    Git {
        /// The git subcommand that failed (e.g., `push`).
        command: String,
        /// Captured stderr or spawn error.
        message: String,
    },

    /// A file path returned by the model points outside the checkout.
    #[error("Refusing to write outside the checkout: {path}")]
    InvalidPath {
        /// The offending path.
        path: String,
    },

    /// Network/HTTP error from reqwest.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl From<octocrab::Error> for AutofixError {
    fn from(err: octocrab::Error) -> Self {
        AutofixError::GitHub {
            message: err.to_string(),
        }
    }
}

impl From<config::ConfigError> for AutofixError {
    fn from(err: config::ConfigError) -> Self {
        AutofixError::Config {
            message: err.to_string(),
        }
    }
}
