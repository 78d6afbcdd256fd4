// SPDX-License-Identifier: Apache-2.0

//! The fix pipeline: checkout, context, generation, application, report.
//!
//! Every external service is injected as a trait object so the CLI, the
//! webhook server and tests can each wire their own. A run never returns an
//! error: every terminal state becomes a [`PipelineOutcome`], and tracked
//! issues receive exactly one comment describing it.

use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bon::Builder;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::ai::{AiProvider, FixResult};
use crate::apply::{ApplyOutcome, apply_fix};
use crate::config::{AppConfig, GitHubConfig, ReposConfig};
use crate::context::{ContextAssembler, ContextBundle, DEFAULT_TOKEN_BUDGET};
use crate::git::GitBackend;
use crate::github::{CodeHost, repo_from_text};
use crate::issue::{Issue, RepoSource, RepositoryRef};
use crate::linear::IssueTracker;
use crate::utils::truncate;

/// Characters of reasoning quoted in a failure comment.
const FAILURE_REASONING_CHARS: usize = 500;

/// Resolves the repository an issue refers to. First match wins:
/// a GitHub URL in the description, the team mapping, the default.
#[must_use]
pub fn resolve_repository(issue: &Issue, repos: &ReposConfig) -> Option<RepositoryRef> {
    if let Some((owner, name)) = repo_from_text(&issue.description) {
        return Some(RepositoryRef {
            owner,
            name,
            source: RepoSource::IssueUrl,
        });
    }

    if let Some(team) = &issue.team {
        let mapped = [&team.key, &team.name, &team.id]
            .into_iter()
            .filter(|candidate| !candidate.is_empty())
            .find_map(|candidate| {
                repos.teams.get(candidate.as_str()).or_else(|| {
                    repos
                        .teams
                        .iter()
                        .filter(|(team_ref, _)| team_ref.eq_ignore_ascii_case(candidate))
                        .min_by(|a, b| a.0.cmp(b.0))
                        .map(|(_, repo)| repo)
                })
            });
        if let Some(repo) = mapped {
            match RepositoryRef::parse(repo, RepoSource::TeamMapping) {
                Ok(repo) => return Some(repo),
                Err(e) => warn!(team = %team.key, error = %e, "Ignoring invalid team mapping"),
            }
        }
    }

    let default = repos.default.as_deref()?;
    match RepositoryRef::parse(default, RepoSource::Default) {
        Ok(repo) => Some(repo),
        Err(e) => {
            warn!(error = %e, "Ignoring invalid default repository");
            None
        }
    }
}

/// Settings a pipeline run needs from configuration.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Branching, commit identity and base branch.
    pub github: GitHubConfig,
    /// Project notes path inside each checkout.
    pub notes_path: String,
    /// Directory holding `<owner>/<name>` checkouts.
    pub workspace_dir: PathBuf,
    /// Context token budget.
    pub token_budget: usize,
    /// Generate the fix but do not apply it or comment.
    pub dry_run: bool,
}

impl PipelineSettings {
    /// Settings derived from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            github: config.github.clone(),
            notes_path: config.context.notes_path.clone(),
            workspace_dir: config.repos.workspace_dir(),
            token_budget: DEFAULT_TOKEN_BUDGET,
            dry_run: false,
        }
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    /// A pull request was opened.
    Fixed,
    /// A fix was generated but not applied.
    DryRun,
    /// The run stopped early.
    Failed,
}

/// The step a failed run stopped at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Cloning or updating the checkout.
    Checkout,
    /// Calling the model or parsing its reply.
    Generate,
    /// Branch, write, commit, push or pull request.
    Apply,
}

/// Size of the context that was sent to the model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContextStats {
    /// Files included.
    pub files: usize,
    /// Search hits included.
    pub search_hits: usize,
    /// Commits included.
    pub commits: usize,
    /// Estimated tokens.
    pub estimated_tokens: usize,
    /// Budget.
    pub budget: usize,
}

impl From<&ContextBundle> for ContextStats {
    fn from(bundle: &ContextBundle) -> Self {
        Self {
            files: bundle.files.len(),
            search_hits: bundle.search_hits.len(),
            commits: bundle.commits.len(),
            estimated_tokens: bundle.estimated_tokens,
            budget: bundle.budget,
        }
    }
}

/// JSON-serializable summary of a run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineOutcome {
    /// Terminal state.
    pub status: OutcomeStatus,
    /// Issue identifier.
    pub issue: String,
    /// Target repository.
    pub repository: RepositoryRef,
    /// Where a failed run stopped.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<FailureStage>,
    /// Error text of a failed run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Context statistics, once assembled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextStats>,
    /// The model's fix, once generated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fix: Option<FixResult>,
    /// Branch, commit and pull request of an applied fix.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<ApplyOutcome>,
    /// Whether the issue comment was posted.
    pub comment_posted: bool,
}

impl PipelineOutcome {
    fn new(issue: &Issue, repo: &RepositoryRef, status: OutcomeStatus) -> Self {
        Self {
            status,
            issue: issue.identifier.clone(),
            repository: repo.clone(),
            stage: None,
            error: None,
            context: None,
            fix: None,
            applied: None,
            comment_posted: false,
        }
    }

    fn failed(mut self, stage: FailureStage, error: String) -> Self {
        self.status = OutcomeStatus::Failed;
        self.stage = Some(stage);
        self.error = Some(error);
        self
    }

    /// Whether a pull request was opened.
    #[must_use]
    pub fn is_fixed(&self) -> bool {
        self.status == OutcomeStatus::Fixed
    }
}

/// Markdown comment for a successful run.
#[must_use]
pub fn success_comment(applied: &ApplyOutcome, fix: &FixResult) -> String {
    let mut body = String::from("**Autofix opened a pull request**\n\n");
    let _ = writeln!(body, "Pull request: {}", applied.pr_url);
    let _ = writeln!(body, "Branch: `{}`\n", applied.branch);
    let _ = writeln!(body, "{}\n", fix.description.trim());
    body.push_str("Changed files:\n");
    for path in &applied.files {
        let _ = writeln!(body, "- `{path}`");
    }
    body
}

/// Markdown comment for a failed run.
#[must_use]
pub fn failure_comment(error: &str, reasoning: Option<&str>) -> String {
    let mut body = String::from("**Autofix could not fix this issue**\n\n");
    let _ = writeln!(body, "Error: {error}");
    if let Some(reasoning) = reasoning.map(str::trim).filter(|r| !r.is_empty()) {
        let _ = writeln!(
            body,
            "\nReasoning:\n> {}",
            truncate(reasoning, FAILURE_REASONING_CHARS).replace('\n', "\n> ")
        );
    }
    body.push_str("\nA human will need to take a look.");
    body
}

/// Runs fixes against injected services.
#[derive(Builder)]
pub struct Pipeline {
    ai: Arc<dyn AiProvider>,
    host: Arc<dyn CodeHost>,
    tracker: Arc<dyn IssueTracker>,
    git: Arc<dyn GitBackend>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// Where the checkout of `repo` lives.
    #[must_use]
    pub fn checkout_path(&self, repo: &RepositoryRef) -> PathBuf {
        self.settings
            .workspace_dir
            .join(&repo.owner)
            .join(&repo.name)
    }

    /// Assembles the context bundle for `issue` from `checkout`.
    pub async fn assemble(&self, issue: &Issue, checkout: &Path) -> ContextBundle {
        ContextAssembler::new(self.git.as_ref(), &self.settings.notes_path)
            .with_budget(self.settings.token_budget)
            .assemble(issue, checkout)
            .await
    }

    /// Clones `repo` into the workspace, or resets an existing checkout to
    /// the base branch, and returns its path.
    pub async fn sync_checkout(&self, repo: &RepositoryRef) -> anyhow::Result<PathBuf> {
        let checkout = self.checkout_path(repo);
        self.git
            .sync_checkout(repo, &checkout, &self.settings.github.base_branch)
            .await?;
        Ok(checkout)
    }

    /// Clones or updates the checkout of `repo`, then runs the fix in it.
    #[instrument(skip(self, issue), fields(issue = %issue.identifier, repo = %repo))]
    pub async fn run(&self, issue: &Issue, repo: &RepositoryRef) -> PipelineOutcome {
        let checkout = match self.sync_checkout(repo).await {
            Ok(checkout) => checkout,
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                let outcome = PipelineOutcome::new(issue, repo, OutcomeStatus::Failed)
                    .failed(FailureStage::Checkout, format!("{e:#}"));
                return self.report(issue, outcome).await;
            }
        };
        self.run_in_checkout(issue, repo, &checkout).await
    }

    /// Runs the fix in an existing checkout.
    #[instrument(skip(self, issue, checkout), fields(issue = %issue.identifier, repo = %repo))]
    pub async fn run_in_checkout(
        &self,
        issue: &Issue,
        repo: &RepositoryRef,
        checkout: &Path,
    ) -> PipelineOutcome {
        let mut outcome = PipelineOutcome::new(issue, repo, OutcomeStatus::Failed);

        let bundle = self.assemble(issue, checkout).await;
        outcome.context = Some(ContextStats::from(&bundle));
        info!(
            estimated_tokens = bundle.estimated_tokens,
            files = bundle.files.len(),
            "Context assembled"
        );

        let fix = match self.ai.generate_fix(&bundle).await {
            Ok(fix) => fix,
            Err(e) => {
                warn!(error = %e, "Fix generation failed");
                let outcome = outcome.failed(FailureStage::Generate, format!("{e:#}"));
                return self.report(issue, outcome).await;
            }
        };

        if !fix.success {
            let error = fix
                .error
                .clone()
                .unwrap_or_else(|| "Fix generation failed".to_string());
            outcome.fix = Some(fix);
            return self
                .report(issue, outcome.failed(FailureStage::Generate, error))
                .await;
        }

        if self.settings.dry_run {
            info!(changes = fix.changes.len(), "Dry run, not applying");
            outcome.status = OutcomeStatus::DryRun;
            outcome.fix = Some(fix);
            return outcome;
        }

        let applied = apply_fix(
            self.git.as_ref(),
            self.host.as_ref(),
            &self.settings.github,
            repo,
            checkout,
            issue,
            &fix,
        )
        .await;
        outcome.fix = Some(fix);

        match applied {
            Ok(applied) => {
                info!(pr = %applied.pr_url, "Fix applied");
                outcome.status = OutcomeStatus::Fixed;
                outcome.applied = Some(applied);
                self.report(issue, outcome).await
            }
            Err(e) => {
                warn!(error = %e, "Applying fix failed");
                self.report(issue, outcome.failed(FailureStage::Apply, format!("{e:#}")))
                    .await
            }
        }
    }

    /// Posts the outcome comment on tracked issues. Comment failures only warn.
    async fn report(&self, issue: &Issue, mut outcome: PipelineOutcome) -> PipelineOutcome {
        if !issue.is_tracked() {
            return outcome;
        }

        let body = match (&outcome.applied, &outcome.fix) {
            (Some(applied), Some(fix)) => success_comment(applied, fix),
            (_, fix) => failure_comment(
                outcome.error.as_deref().unwrap_or("unknown error"),
                fix.as_ref().map(|f| f.reasoning.as_str()),
            ),
        };

        match self.tracker.post_comment(issue, &body).await {
            Ok(()) => outcome.comment_posted = true,
            Err(e) => warn!(error = %e, "Failed to post issue comment"),
        }
        outcome
    }
}
