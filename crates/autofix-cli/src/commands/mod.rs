// SPDX-License-Identifier: Apache-2.0

//! Command handlers for the Autofix CLI.

pub mod context;
pub mod fix;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use autofix_core::config::DEFAULT_REPO_ENV;
use autofix_core::github::create_client_with_token;
use autofix_core::{
    AiClient, AppConfig, AutofixError, Credentials, EnvTokenProvider, GitCli, Issue,
    IssueTracker, LinearClient, OctocrabHost, Pipeline, PipelineSettings, RepositoryRef,
    get_provider, resolve_repository,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use crate::cli::{Commands, IssueArgs, OutputContext};

/// Creates a styled spinner (only if interactive).
fn maybe_spinner(ctx: &OutputContext, message: &str) -> Option<ProgressBar> {
    if ctx.is_interactive() {
        let s = ProgressBar::new_spinner();
        s.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .expect("Invalid spinner template"),
        );
        s.set_message(message.to_string());
        s.enable_steady_tick(Duration::from_millis(100));
        Some(s)
    } else {
        None
    }
}

/// Dispatch to the appropriate command handler.
pub async fn run(command: Commands, ctx: OutputContext, config: &AppConfig) -> Result<()> {
    match command {
        Commands::Fix {
            target,
            repo_path,
            dry_run,
        } => fix::run(&target, repo_path.as_deref(), dry_run, &ctx, config).await,
        Commands::Context { target, repo_path } => {
            context::run(&target, repo_path.as_deref(), &ctx, config).await
        }
    }
}

/// Services wired for one CLI invocation.
pub(crate) struct Session {
    pub pipeline: Pipeline,
    pub linear: Arc<LinearClient>,
}

/// Checks every credential and the target repository up front, reporting
/// all missing values in one error.
pub(crate) fn preflight(config: &AppConfig) -> Result<Credentials> {
    let provider = get_provider(&config.ai.provider).ok_or_else(|| AutofixError::Config {
        message: format!("Unknown AI provider: {}", config.ai.provider),
    })?;

    let resolved = Credentials::resolve(&EnvTokenProvider, provider.api_key_env);
    let repo_missing = config.repos.default.is_none();

    match resolved {
        Ok(creds) if !repo_missing => Ok(creds),
        Ok(_) => Err(AutofixError::MissingCredentials {
            missing: vec![DEFAULT_REPO_ENV.to_string()],
        }
        .into()),
        Err(AutofixError::MissingCredentials { mut missing }) => {
            if repo_missing {
                missing.push(DEFAULT_REPO_ENV.to_string());
            }
            Err(AutofixError::MissingCredentials { missing }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Builds the pipeline and its clients from configuration and credentials.
pub(crate) fn connect(config: &AppConfig, creds: &Credentials, dry_run: bool) -> Result<Session> {
    let timeout = config.github.api_timeout_seconds;

    let ai = AiClient::with_api_key(&config.ai.provider, creds.ai_key.clone(), &config.ai)?;
    let octocrab = create_client_with_token(&creds.github_token, timeout)?;
    let linear = Arc::new(LinearClient::new(
        &config.linear.api_url,
        creds.linear_key.clone(),
        timeout,
    )?);
    let git = GitCli::new(
        creds.github_token.clone(),
        &config.github.commit_author_name,
        &config.github.commit_author_email,
    );

    let mut settings = PipelineSettings::from_config(config);
    settings.dry_run = dry_run;

    let pipeline = Pipeline::builder()
        .ai(Arc::new(ai))
        .host(Arc::new(OctocrabHost::new(octocrab)))
        .tracker(linear.clone())
        .git(Arc::new(git))
        .settings(settings)
        .build();

    debug!(provider = %config.ai.provider, model = %config.ai.model, "Pipeline ready");
    Ok(Session { pipeline, linear })
}

/// Fetches the Linear issue, or builds a local one from `--description`.
pub(crate) async fn load_issue(
    target: &IssueArgs,
    linear: &LinearClient,
    ctx: &OutputContext,
) -> Result<Issue> {
    if let Some(description) = &target.description {
        return Ok(Issue::local(target.title.as_deref(), description));
    }

    let identifier = target
        .issue
        .as_deref()
        .context("An issue identifier or --description is required")?;
    let spinner = maybe_spinner(ctx, &format!("Fetching {identifier}..."));
    let issue = linear.fetch_issue(identifier).await;
    if let Some(s) = spinner {
        s.finish_and_clear();
    }
    Ok(issue?)
}

/// Resolves the repository for `issue`, failing when nothing matches.
pub(crate) fn target_repository(issue: &Issue, config: &AppConfig) -> Result<RepositoryRef> {
    resolve_repository(issue, &config.repos).ok_or_else(|| {
        AutofixError::MissingCredentials {
            missing: vec![DEFAULT_REPO_ENV.to_string()],
        }
        .into()
    })
}
