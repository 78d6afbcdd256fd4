// SPDX-License-Identifier: Apache-2.0

//! Pull request creation.
//!
//! [`CodeHost`] is the seam the change applier opens pull requests through;
//! [`OctocrabHost`] implements it against the GitHub REST API.

use anyhow::{Context, Result};
use async_trait::async_trait;
use octocrab::Octocrab;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::issue::RepositoryRef;

/// A pull request that was opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestRef {
    /// Pull request number.
    pub number: u64,
    /// Web URL of the pull request.
    pub url: String,
}

/// Source-hosting operations needed to publish a fix.
#[async_trait]
pub trait CodeHost: Send + Sync {
    /// Opens a pull request from `head` into `base`.
    async fn open_pull_request(
        &self,
        repo: &RepositoryRef,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRef>;
}

/// [`CodeHost`] backed by Octocrab.
#[derive(Debug, Clone)]
pub struct OctocrabHost {
    client: Octocrab,
}

impl OctocrabHost {
    /// Wraps an authenticated client.
    #[must_use]
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CodeHost for OctocrabHost {
    #[instrument(skip(self, title, body), fields(repo = %repo, head = %head, base = %base))]
    async fn open_pull_request(
        &self,
        repo: &RepositoryRef,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequestRef> {
        debug!("Creating pull request");

        let pr = self
            .client
            .pulls(&repo.owner, &repo.name)
            .create(title, head, base)
            .body(body)
            .send()
            .await
            .map_err(crate::error::AutofixError::from)
            .with_context(|| format!("Failed to open pull request for {head} in {repo}"))?;

        let url = pr.html_url.map_or_else(
            || format!("https://github.com/{}/pull/{}", repo.full_name(), pr.number),
            |u| u.to_string(),
        );

        info!(number = pr.number, url = %url, "Pull request opened");
        Ok(PullRequestRef {
            number: pr.number,
            url,
        })
    }
}
