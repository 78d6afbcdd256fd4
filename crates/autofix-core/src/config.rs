// SPDX-License-Identifier: Apache-2.0

//! Configuration management for Autofix.
//!
//! Provides layered configuration from files and environment variables.
//! Uses XDG-compliant paths with environment variable support.
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Well-known unprefixed variables (`GITHUB_REPO`, `LINEAR_WEBHOOK_SECRET`, `PORT`)
//! 2. Environment variables (prefix: `AUTOFIX_`)
//! 3. Config file: `~/.config/autofix/config.toml`
//! 4. Built-in defaults
//!
//! # Examples
//!
//! ```bash
//! # Override AI model via environment variable
//! AUTOFIX_AI__MODEL=claude-opus-4-1 autofix fix ENG-42
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AutofixError;

/// Environment variable naming the default target repository (`owner/name`).
pub const DEFAULT_REPO_ENV: &str = "GITHUB_REPO";

/// Environment variable holding the Linear webhook signing secret.
pub const WEBHOOK_SECRET_ENV: &str = "LINEAR_WEBHOOK_SECRET";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// AI provider settings.
    pub ai: AiConfig,
    /// GitHub settings.
    pub github: GitHubConfig,
    /// Linear settings.
    pub linear: LinearConfig,
    /// Repository resolution and checkout settings.
    pub repos: ReposConfig,
    /// Context assembly settings.
    pub context: ContextConfig,
    /// Webhook server settings.
    pub webhook: WebhookConfig,
}

/// AI provider settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// AI provider name from the registry (e.g., "anthropic", "openrouter").
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Maximum tokens for the model reply.
    pub max_tokens: u32,
    /// Sampling temperature (0.0-1.0).
    pub temperature: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-5".to_string(),
            timeout_seconds: 120,
            max_tokens: 8192,
            temperature: 0.2,
        }
    }
}

/// GitHub settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Branch pull requests are opened against.
    pub base_branch: String,
    /// Prefix for fix branches; the lower-cased issue identifier is appended.
    pub branch_prefix: String,
    /// API request timeout in seconds.
    pub api_timeout_seconds: u64,
    /// Author name recorded on fix commits.
    pub commit_author_name: String,
    /// Author email recorded on fix commits.
    pub commit_author_email: String,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            base_branch: "main".to_string(),
            branch_prefix: "autofix/".to_string(),
            api_timeout_seconds: 30,
            commit_author_name: "autofix[bot]".to_string(),
            commit_author_email: "autofix-bot@users.noreply.github.com".to_string(),
        }
    }
}

/// Linear settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// GraphQL endpoint.
    pub api_url: String,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.linear.app/graphql".to_string(),
        }
    }
}

/// Repository resolution and checkout settings.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ReposConfig {
    /// Fallback repository (`owner/name`) when nothing else matches.
    pub default: Option<String>,
    /// Team key, name or id mapped to a repository (`owner/name`).
    pub teams: HashMap<String, String>,
    /// Directory that holds checkouts; defaults to `<data_dir>/repos`.
    pub workspace_dir: Option<PathBuf>,
}

impl ReposConfig {
    /// Directory under which `<owner>/<name>` checkouts are kept.
    #[must_use]
    pub fn workspace_dir(&self) -> PathBuf {
        self.workspace_dir
            .clone()
            .unwrap_or_else(|| data_dir().join("repos"))
    }
}

/// Context assembly settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Project notes document, relative to the checkout root.
    pub notes_path: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            notes_path: "AGENTS.md".to_string(),
        }
    }
}

/// Webhook server settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Label that marks an issue for automated fixing.
    pub trigger_label: String,
    /// Shared signing secret; signature checks are skipped when unset.
    pub secret: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            trigger_label: "autofix".to_string(),
            secret: None,
        }
    }
}

/// Returns the Autofix configuration directory.
///
/// Respects the `XDG_CONFIG_HOME` environment variable if set,
/// otherwise defaults to `~/.config/autofix`.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return PathBuf::from(xdg_config).join("autofix");
    }
    home_dir().join(".config").join("autofix")
}

/// Returns the Autofix data directory.
///
/// Respects the `XDG_DATA_HOME` environment variable if set,
/// otherwise defaults to `~/.local/share/autofix`.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Ok(xdg_data) = std::env::var("XDG_DATA_HOME")
        && !xdg_data.is_empty()
    {
        return PathBuf::from(xdg_data).join("autofix");
    }
    home_dir().join(".local").join("share").join("autofix")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(std::env::temp_dir)
}

/// Returns the path to the configuration file.
#[must_use]
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Load application configuration.
///
/// Loads from config file (if exists) and environment variables.
/// Environment variables use the prefix `AUTOFIX_` and double underscore
/// for nested keys (e.g., `AUTOFIX_AI__MODEL`).
///
/// # Errors
///
/// Returns `AutofixError::Config` if the config file exists but is invalid.
pub fn load_config() -> Result<AppConfig, AutofixError> {
    let config_path = config_file_path();

    let config = Config::builder()
        // Load from config file (optional - may not exist)
        .add_source(File::with_name(config_path.to_string_lossy().as_ref()).required(false))
        // Override with environment variables
        .add_source(
            Environment::with_prefix("AUTOFIX")
                .separator("__")
                .try_parsing(true),
        )
        .set_override_option("repos.default", non_empty_env(DEFAULT_REPO_ENV))?
        .set_override_option("webhook.secret", non_empty_env(WEBHOOK_SECRET_ENV))?
        .set_override_option("webhook.port", non_empty_env("PORT"))?
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    Ok(app_config)
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
