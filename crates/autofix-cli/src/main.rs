// SPDX-License-Identifier: Apache-2.0

//! Autofix - turn labeled issues into pull requests.
//!
//! Fetches an issue, assembles repository context within a token budget,
//! asks a language model for a fix and opens a pull request with it.

mod cli;
mod commands;
mod errors;
mod logging;
mod output;

use anyhow::{Context, Result};
use autofix_core::ai::get_provider;
use autofix_core::config;
use clap::Parser;
use tracing::debug;

use crate::cli::{Cli, OutputContext};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let output_ctx = OutputContext::from_cli(cli.output);

    let mut config = config::load_config().context("Failed to load configuration")?;
    debug!("Configuration loaded successfully");

    if let Some(repo) = &cli.repo {
        config.repos.default = Some(repo.clone());
        debug!("Overriding target repository to: {repo}");
    }

    if let Some(provider) = &cli.provider {
        let entry = get_provider(provider)
            .ok_or_else(|| anyhow::anyhow!("Unknown AI provider: {provider}"))?;
        config.ai.provider.clone_from(provider);
        if cli.model.is_none() {
            config.ai.model = entry.default_model.to_string();
        }
        debug!("Overriding AI provider to: {provider}");
    }

    if let Some(model) = &cli.model {
        config.ai.model.clone_from(model);
        debug!("Overriding AI model to: {model}");
    }

    match commands::run(cli.command, output_ctx, &config).await {
        Ok(()) => Ok(()),
        Err(e) => {
            let formatted = errors::format_error(&e);
            eprintln!("Error: {formatted}");
            Err(e)
        }
    }
}
