// SPDX-License-Identifier: Apache-2.0

//! Binary entry point for the Autofix webhook server.

use std::sync::Arc;

use anyhow::{Context, Result};
use autofix_core::github::create_client_with_token;
use autofix_core::{
    AiClient, Credentials, EnvTokenProvider, GitCli, LinearClient, OctocrabHost, Pipeline,
    PipelineSettings, get_provider, load_config,
};
use autofix_server::{AppState, run_http};
use clap::Parser;
use secrecy::SecretString;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Autofix webhook server.
#[derive(Parser)]
#[command(name = "autofix-server", version, about)]
struct Args {
    /// Address to bind (overrides webhook.host)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides webhook.port and PORT)
    #[arg(long, short = 'p')]
    port: Option<u16>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("autofix=info,octocrab=error,reqwest=error"))
        .expect("valid default filter directives");
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = load_config().context("Failed to load configuration")?;
    let provider = get_provider(&config.ai.provider)
        .with_context(|| format!("Unknown AI provider: {}", config.ai.provider))?;
    let creds = Credentials::resolve(&EnvTokenProvider, provider.api_key_env)?;

    let timeout = config.github.api_timeout_seconds;
    let pipeline = Pipeline::builder()
        .ai(Arc::new(AiClient::with_api_key(
            provider.name,
            creds.ai_key.clone(),
            &config.ai,
        )?))
        .host(Arc::new(OctocrabHost::new(create_client_with_token(
            &creds.github_token,
            timeout,
        )?)))
        .tracker(Arc::new(LinearClient::new(
            &config.linear.api_url,
            creds.linear_key.clone(),
            timeout,
        )?))
        .git(Arc::new(GitCli::new(
            creds.github_token.clone(),
            &config.github.commit_author_name,
            &config.github.commit_author_email,
        )))
        .settings(PipelineSettings::from_config(&config))
        .build();

    if config.webhook.secret.is_none() {
        tracing::warn!("No webhook secret configured; signatures will not be checked");
    }

    let state = Arc::new(AppState {
        pipeline,
        repos: config.repos.clone(),
        trigger_label: config.webhook.trigger_label.clone(),
        secret: config.webhook.secret.clone().map(SecretString::from),
    });

    let host = args.host.unwrap_or(config.webhook.host);
    let port = args.port.unwrap_or(config.webhook.port);
    run_http(&host, port, state).await
}
