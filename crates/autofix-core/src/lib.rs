// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Autofix Core
//!
//! Core library for Autofix - turn labeled issues into pull requests.
//!
//! This crate provides reusable components for:
//! - Signal extraction from free-text bug reports
//! - Token-budgeted context assembly from a repository checkout
//! - Fix generation through a language model (Anthropic, OpenAI-compatible)
//! - Applying a fix: branch, commit, push, pull request
//! - Linear issue fetching and status comments
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use autofix_core::{
//!     AiClient, Credentials, EnvTokenProvider, GitCli, LinearClient, OctocrabHost, Pipeline,
//!     PipelineSettings, get_provider, github::create_client_with_token, linear::IssueTracker,
//!     load_config, resolve_repository,
//! };
//! use anyhow::Result;
//!
//! # async fn example() -> Result<()> {
//! let config = load_config()?;
//! let provider = get_provider(&config.ai.provider).expect("known provider");
//! let creds = Credentials::resolve(&EnvTokenProvider, provider.api_key_env)?;
//!
//! let linear = Arc::new(LinearClient::new(
//!     &config.linear.api_url,
//!     creds.linear_key.clone(),
//!     config.github.api_timeout_seconds,
//! )?);
//! let issue = linear.fetch_issue("ENG-42").await?;
//! let repo = resolve_repository(&issue, &config.repos).expect("repository");
//!
//! let pipeline = Pipeline::builder()
//!     .ai(Arc::new(AiClient::with_api_key(provider.name, creds.ai_key.clone(), &config.ai)?))
//!     .host(Arc::new(OctocrabHost::new(create_client_with_token(
//!         &creds.github_token,
//!         config.github.api_timeout_seconds,
//!     )?)))
//!     .tracker(linear)
//!     .git(Arc::new(GitCli::new(
//!         creds.github_token.clone(),
//!         &config.github.commit_author_name,
//!         &config.github.commit_author_email,
//!     )))
//!     .settings(PipelineSettings::from_config(&config))
//!     .build();
//!
//! let outcome = pipeline.run(&issue, &repo).await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`signals`] - Heuristic extraction of paths, errors and symbols
//! - [`context`] - Context bundle assembly under a token budget
//! - [`ai`] - Providers, prompt rendering and reply parsing
//! - [`apply`] - Branch, commit, push and pull request
//! - [`pipeline`] - End-to-end run and repository resolution
//! - [`git`], [`github`], [`linear`] - External services

// ============================================================================
// Authentication
// ============================================================================

pub use auth::{Credentials, EnvTokenProvider, TokenProvider};

// ============================================================================
// Error Handling
// ============================================================================

pub use error::AutofixError;

/// Convenience Result type for Autofix operations.
///
/// This is equivalent to `std::result::Result<T, AutofixError>`.
pub type Result<T> = std::result::Result<T, AutofixError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    AiConfig, AppConfig, ContextConfig, GitHubConfig, LinearConfig, ReposConfig, WebhookConfig,
    config_dir, config_file_path, data_dir, load_config,
};

// ============================================================================
// Domain Types
// ============================================================================

pub use issue::{Issue, RepoSource, RepositoryRef, TeamRef};

// ============================================================================
// Context Assembly
// ============================================================================

pub use context::{ContextAssembler, ContextBundle, DEFAULT_TOKEN_BUDGET};
pub use signals::{Signals, extract_signals};

// ============================================================================
// Fix Generation
// ============================================================================

pub use ai::{AiClient, AiProvider, FileChange, FixResult, ProviderConfig, get_provider};

// ============================================================================
// External Services
// ============================================================================

pub use git::{GitBackend, GitCli};
pub use github::{CodeHost, OctocrabHost, PullRequestRef};
pub use linear::{IssueTracker, LinearClient, WebhookEvent};

// ============================================================================
// Pipeline
// ============================================================================

pub use apply::{ApplyOutcome, apply_fix, branch_name};
pub use pipeline::{
    OutcomeStatus, Pipeline, PipelineOutcome, PipelineSettings, resolve_repository,
};

// ============================================================================
// Utilities
// ============================================================================

pub use utils::{estimate_tokens, truncate, truncate_with_suffix};

// ============================================================================
// Modules
// ============================================================================

pub mod ai;
pub mod apply;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod git;
pub mod github;
pub mod issue;
pub mod linear;
pub mod pipeline;
pub mod signals;
pub mod utils;
