// SPDX-License-Identifier: Apache-2.0

//! Credential resolution for the three external services.
//!
//! The `TokenProvider` trait abstracts where secrets come from so the CLI,
//! the webhook server and tests can each supply their own source. The
//! default [`EnvTokenProvider`] reads process environment variables.

use secrecy::SecretString;

use crate::error::AutofixError;

/// Environment variable for the Linear API key.
pub const LINEAR_API_KEY_ENV: &str = "LINEAR_API_KEY";

/// Environment variables checked (in order) for the GitHub token.
pub const GITHUB_TOKEN_ENVS: &[&str] = &["GITHUB_TOKEN", "GH_TOKEN"];

/// Provides GitHub, Linear and AI provider credentials.
///
/// Implementations return `None` when a credential is not available.
pub trait TokenProvider: Send + Sync {
    /// Retrieves the GitHub API token.
    fn github_token(&self) -> Option<SecretString>;

    /// Retrieves the Linear API key.
    fn linear_key(&self) -> Option<SecretString>;

    /// Retrieves the API key stored under the given AI provider variable.
    fn ai_key(&self, env_var: &str) -> Option<SecretString>;
}

/// Resolves credentials from process environment variables.
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvTokenProvider;

fn non_empty_var(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::from)
}

impl TokenProvider for EnvTokenProvider {
    fn github_token(&self) -> Option<SecretString> {
        GITHUB_TOKEN_ENVS.iter().find_map(|name| non_empty_var(name))
    }

    fn linear_key(&self) -> Option<SecretString> {
        non_empty_var(LINEAR_API_KEY_ENV)
    }

    fn ai_key(&self, env_var: &str) -> Option<SecretString> {
        non_empty_var(env_var)
    }
}

/// The full set of secrets a fix run needs.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Key for the configured AI provider.
    pub ai_key: SecretString,
    /// GitHub token used for the API and for git transport.
    pub github_token: SecretString,
    /// Linear API key.
    pub linear_key: SecretString,
}

impl Credentials {
    /// Resolves every credential, reporting all missing ones at once.
    ///
    /// # Errors
    ///
    /// Returns `AutofixError::MissingCredentials` naming each absent variable.
    pub fn resolve(provider: &dyn TokenProvider, ai_key_env: &str) -> Result<Self, AutofixError> {
        let ai_key = provider.ai_key(ai_key_env);
        let github_token = provider.github_token();
        let linear_key = provider.linear_key();

        let mut missing = Vec::new();
        if ai_key.is_none() {
            missing.push(ai_key_env.to_string());
        }
        if github_token.is_none() {
            missing.push(GITHUB_TOKEN_ENVS.join(" or "));
        }
        if linear_key.is_none() {
            missing.push(LINEAR_API_KEY_ENV.to_string());
        }

        match (ai_key, github_token, linear_key) {
            (Some(ai_key), Some(github_token), Some(linear_key)) => Ok(Self {
                ai_key,
                github_token,
                linear_key,
            }),
            _ => Err(AutofixError::MissingCredentials { missing }),
        }
    }
}
