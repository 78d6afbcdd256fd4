// SPDX-License-Identifier: Apache-2.0

//! Change application: branch, write, commit, push, pull request.
//!
//! Steps run in strict order and the first failure aborts the rest. Nothing
//! is rolled back; a branch that was created or pushed stays behind.

use std::fmt::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::ai::FixResult;
use crate::config::GitHubConfig;
use crate::context::resolve_in_checkout;
use crate::error::AutofixError;
use crate::git::GitBackend;
use crate::github::CodeHost;
use crate::issue::{Issue, RepositoryRef};

/// Maximum characters of the PR title.
const MAX_PR_TITLE_CHARS: usize = 100;

/// What a successful application produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    /// Branch the fix was committed to.
    pub branch: String,
    /// Commit hash.
    pub commit: String,
    /// Pull request URL.
    pub pr_url: String,
    /// Pull request number.
    pub pr_number: u64,
    /// Paths written, in reply order.
    pub files: Vec<String>,
}

/// Branch name for an issue: `prefix` + lower-cased identifier.
///
/// # Examples
///
/// ```
/// use autofix_core::apply::branch_name;
///
/// assert_eq!(branch_name("autofix/", "ENG-42"), "autofix/eng-42");
/// ```
#[must_use]
pub fn branch_name(prefix: &str, identifier: &str) -> String {
    let slug: String = identifier
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    format!("{prefix}{slug}")
}

/// Commit message embedding the issue title, the model's reasoning and the issue link.
#[must_use]
pub fn commit_message(issue: &Issue, fix: &FixResult) -> String {
    let mut message = format!("fix: {}\n\n", issue.title);
    let _ = writeln!(message, "{}\n", fix.reasoning.trim());
    if issue.url.is_empty() {
        let _ = write!(message, "Issue: {}", issue.identifier);
    } else {
        let _ = write!(message, "Issue: {}", issue.url);
    }
    message
}

/// Pull request title.
#[must_use]
pub fn pr_title(issue: &Issue) -> String {
    crate::utils::truncate(
        &format!("fix({}): {}", issue.identifier, issue.title),
        MAX_PR_TITLE_CHARS,
    )
}

/// Pull request body.
#[must_use]
pub fn pr_body(issue: &Issue, fix: &FixResult) -> String {
    let mut body = String::new();

    body.push_str("## Issue\n");
    if issue.url.is_empty() {
        let _ = writeln!(body, "{}: {}\n", issue.identifier, issue.title);
    } else {
        let _ = writeln!(body, "[{}]({}): {}\n", issue.identifier, issue.url, issue.title);
    }

    let _ = writeln!(body, "## Description\n{}\n", fix.description.trim());
    let _ = writeln!(body, "## Reasoning\n{}\n", fix.reasoning.trim());

    body.push_str("## Changed files\n");
    for change in &fix.changes {
        let _ = writeln!(body, "- `{}`", change.path);
    }
    body.push('\n');

    if let Some(plan) = &fix.test_plan {
        let _ = writeln!(body, "## Test plan\n{}\n", plan.trim());
    }

    body.push_str("---\n_Opened automatically by autofix. Review before merging._\n");
    body
}

/// Applies `fix` to the checkout at `checkout` and opens a pull request.
///
/// # Errors
///
/// Returns `AutofixError::InvalidPath` if any change points outside the
/// checkout (nothing is touched in that case), otherwise the error of the
/// first failing step.
#[instrument(skip_all, fields(issue = %issue.identifier, repo = %repo))]
pub async fn apply_fix(
    git: &dyn GitBackend,
    host: &dyn CodeHost,
    settings: &GitHubConfig,
    repo: &RepositoryRef,
    checkout: &Path,
    issue: &Issue,
    fix: &FixResult,
) -> Result<ApplyOutcome> {
    let mut targets = Vec::with_capacity(fix.changes.len());
    for change in &fix.changes {
        let target =
            resolve_in_checkout(checkout, &change.path).ok_or_else(|| AutofixError::InvalidPath {
                path: change.path.clone(),
            })?;
        targets.push((target, change));
    }

    let branch = branch_name(&settings.branch_prefix, &issue.identifier);
    git.create_branch(checkout, &branch).await?;
    info!(branch = %branch, "Created branch");

    for (target, change) in &targets {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tokio::fs::write(target, &change.content)
            .await
            .with_context(|| format!("Failed to write {}", change.path))?;
        debug!(path = %change.path, bytes = change.content.len(), "Wrote file");
    }

    let files = fix.changed_paths();
    let commit = git
        .commit(checkout, &files, &commit_message(issue, fix))
        .await?;
    info!(commit = %commit, files = files.len(), "Committed fix");

    git.push(checkout, &branch).await?;
    info!(branch = %branch, "Pushed branch");

    let pr = host
        .open_pull_request(
            repo,
            &branch,
            &settings.base_branch,
            &pr_title(issue),
            &pr_body(issue, fix),
        )
        .await?;

    Ok(ApplyOutcome {
        branch,
        commit,
        pr_url: pr.url,
        pr_number: pr.number,
        files,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::FileChange;

    fn issue() -> Issue {
        Issue::builder()
            .identifier("ENG-42".to_string())
            .title("Fix typo".to_string())
            .url("https://linear.app/acme/issue/ENG-42".to_string())
            .build()
    }

    fn fix() -> FixResult {
        FixResult {
            success: true,
            changes: vec![FileChange {
                path: "src/a.ts".to_string(),
                content: "x".to_string(),
            }],
            description: "Corrects the greeting".to_string(),
            reasoning: "Helo is misspelled".to_string(),
            test_plan: Some("Load the page".to_string()),
            error: None,
        }
    }

    #[test]
    fn branch_name_is_lowercased_and_sanitized() {
        assert_eq!(branch_name("autofix/", "ENG-42"), "autofix/eng-42");
        assert_eq!(branch_name("fix-", "LOCAL 1"), "fix-local-1");
    }

    #[test]
    fn commit_message_embeds_title_reasoning_and_url() {
        let message = commit_message(&issue(), &fix());
        assert!(message.starts_with("fix: Fix typo\n\n"));
        assert!(message.contains("Helo is misspelled"));
        assert!(message.ends_with("Issue: https://linear.app/acme/issue/ENG-42"));
    }

    #[test]
    fn pr_body_lists_everything() {
        let body = pr_body(&issue(), &fix());
        assert!(body.contains("[ENG-42](https://linear.app/acme/issue/ENG-42)"));
        assert!(body.contains("## Description\nCorrects the greeting"));
        assert!(body.contains("## Reasoning\nHelo is misspelled"));
        assert!(body.contains("- `src/a.ts`"));
        assert!(body.contains("## Test plan\nLoad the page"));
    }

    #[test]
    fn pr_title_is_bounded() {
        let mut issue = issue();
        issue.title = "t".repeat(300);
        assert_eq!(pr_title(&issue).chars().count(), MAX_PR_TITLE_CHARS);
    }
}
