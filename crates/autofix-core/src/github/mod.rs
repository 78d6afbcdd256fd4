// SPDX-License-Identifier: Apache-2.0

//! GitHub integration module.
//!
//! Client construction, `owner/repo` parsing and detection of repository
//! URLs inside free text.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use octocrab::Octocrab;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, instrument};

pub mod pulls;

pub use pulls::{CodeHost, OctocrabHost, PullRequestRef};

static REPO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:www\.)?github\.com/([A-Za-z0-9_.-]+)/([A-Za-z0-9_.-]+)")
        .expect("repository url pattern is valid")
});

/// Parses an owner/repo string to extract owner and repo.
///
/// Validates format: exactly one `/`, non-empty parts.
///
/// # Errors
///
/// Returns an error if the format is invalid.
pub fn parse_owner_repo(s: &str) -> Result<(String, String)> {
    let parts: Vec<&str> = s.trim().split('/').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        anyhow::bail!(
            "Invalid owner/repo format.\n\
             Expected: owner/repo\n\
             Got: {s}"
        );
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}

/// Finds the first GitHub repository URL in `text` and returns `(owner, name)`.
///
/// A trailing `.git` is stripped. Links to GitHub pages that are not
/// repositories (`/orgs/...`, `/settings/...`) are skipped.
///
/// # Examples
///
/// ```
/// use autofix_core::github::repo_from_text;
///
/// let text = "Broken since https://github.com/acme/web.git/pull/3 landed";
/// assert_eq!(
///     repo_from_text(text),
///     Some(("acme".to_string(), "web".to_string()))
/// );
/// ```
#[must_use]
pub fn repo_from_text(text: &str) -> Option<(String, String)> {
    const RESERVED_OWNERS: &[&str] = &[
        "orgs", "settings", "features", "marketplace", "topics", "sponsors", "login", "apps",
    ];

    REPO_URL.captures_iter(text).find_map(|caps| {
        let owner = caps.get(1)?.as_str();
        let name = caps.get(2)?.as_str();
        let name = name.strip_suffix(".git").unwrap_or(name).trim_end_matches('.');
        if name.is_empty() || RESERVED_OWNERS.contains(&owner.to_ascii_lowercase().as_str()) {
            return None;
        }
        Some((owner.to_string(), name.to_string()))
    })
}

/// Creates an authenticated Octocrab client using a provided token.
///
/// # Errors
///
/// Returns an error if the Octocrab client cannot be built.
#[instrument(skip(token))]
pub fn create_client_with_token(token: &SecretString, timeout_seconds: u64) -> Result<Octocrab> {
    let timeout = Some(Duration::from_secs(timeout_seconds));
    let client = Octocrab::builder()
        .personal_token(token.expose_secret().to_string())
        .set_connect_timeout(timeout)
        .set_read_timeout(timeout)
        .build()
        .context("Failed to build GitHub client")?;

    debug!("Created authenticated GitHub client");
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_repo_valid() {
        let (owner, repo) = parse_owner_repo("acme/web").unwrap();
        assert_eq!(owner, "acme");
        assert_eq!(repo, "web");
    }

    #[test]
    fn test_parse_owner_repo_invalid() {
        assert!(parse_owner_repo("acme").is_err());
        assert!(parse_owner_repo("acme/").is_err());
        assert!(parse_owner_repo("a/b/c").is_err());
    }

    #[test]
    fn test_repo_from_text_finds_first_url() {
        let text = "See https://github.com/acme/api/issues/4 and github.com/other/thing";
        assert_eq!(
            repo_from_text(text),
            Some(("acme".to_string(), "api".to_string()))
        );
    }

    #[test]
    fn test_repo_from_text_trims_sentence_punctuation() {
        assert_eq!(
            repo_from_text("Repo: https://github.com/acme/web."),
            Some(("acme".to_string(), "web".to_string()))
        );
    }

    #[test]
    fn test_repo_from_text_skips_non_repository_pages() {
        let text = "https://github.com/orgs/acme then https://github.com/acme/site";
        assert_eq!(
            repo_from_text(text),
            Some(("acme".to_string(), "site".to_string()))
        );
    }

    #[test]
    fn test_repo_from_text_none() {
        assert_eq!(repo_from_text("no links here"), None);
        assert_eq!(repo_from_text("https://gitlab.com/acme/web"), None);
    }
}
