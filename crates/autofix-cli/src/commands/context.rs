// SPDX-License-Identifier: Apache-2.0

//! `autofix context` - show what would be sent to the model.

use std::path::{Path, PathBuf};

use anyhow::Result;
use autofix_core::AppConfig;
use autofix_core::context::{CommitRecord, SearchHit};

use super::{connect, load_issue, maybe_spinner, preflight, target_repository};
use crate::cli::{IssueArgs, OutputContext};
use crate::output::{self, ContextReport};

/// Assembles the context bundle for an issue without calling the model.
pub async fn run(
    target: &IssueArgs,
    repo_path: Option<&Path>,
    ctx: &OutputContext,
    config: &AppConfig,
) -> Result<()> {
    let creds = preflight(config)?;
    let session = connect(config, &creds, true)?;

    let issue = load_issue(target, &session.linear, ctx).await?;
    let repo = target_repository(&issue, config)?;

    let checkout: PathBuf = match repo_path {
        Some(path) => path.to_path_buf(),
        None => {
            let spinner = maybe_spinner(ctx, &format!("Syncing {repo}..."));
            let synced = session.pipeline.sync_checkout(&repo).await;
            if let Some(s) = spinner {
                s.finish_and_clear();
            }
            synced?
        }
    };

    let bundle = session.pipeline.assemble(&issue, &checkout).await;
    let report = ContextReport {
        issue: issue.identifier.clone(),
        repository: repo.full_name(),
        files: bundle
            .files
            .iter()
            .map(|f| (f.path.clone(), f.size))
            .collect(),
        search_hits: bundle.search_hits.iter().map(SearchHit::render).collect(),
        commits: bundle.commits.iter().map(CommitRecord::render).collect(),
        estimated_tokens: bundle.estimated_tokens,
        budget: bundle.budget,
    };
    output::render(&report, ctx)
}
