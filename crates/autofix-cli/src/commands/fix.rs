// SPDX-License-Identifier: Apache-2.0

//! `autofix fix` - generate a fix and open a pull request.

use std::path::Path;

use anyhow::{Result, bail};
use autofix_core::AppConfig;
use tracing::info;

use super::{connect, load_issue, maybe_spinner, preflight, target_repository};
use crate::cli::{IssueArgs, OutputContext};
use crate::output;

/// Runs the pipeline for one issue and renders the outcome.
///
/// A failed outcome is rendered first and then returned as an error so the
/// process exits non-zero.
pub async fn run(
    target: &IssueArgs,
    repo_path: Option<&Path>,
    dry_run: bool,
    ctx: &OutputContext,
    config: &AppConfig,
) -> Result<()> {
    let creds = preflight(config)?;
    let session = connect(config, &creds, dry_run)?;

    let issue = load_issue(target, &session.linear, ctx).await?;
    let repo = target_repository(&issue, config)?;
    info!(issue = %issue.identifier, repo = %repo, source = ?repo.source, "Resolved target");

    let spinner = maybe_spinner(ctx, &format!("Fixing {} in {repo}...", issue.identifier));
    let outcome = match repo_path {
        Some(checkout) => {
            session
                .pipeline
                .run_in_checkout(&issue, &repo, checkout)
                .await
        }
        None => session.pipeline.run(&issue, &repo).await,
    };
    if let Some(s) = spinner {
        s.finish_and_clear();
    }

    output::render(&outcome, ctx)?;

    if outcome.status == autofix_core::OutcomeStatus::Failed {
        bail!(
            "{}",
            outcome
                .error
                .unwrap_or_else(|| format!("Fix for {} failed", outcome.issue))
        );
    }
    Ok(())
}
