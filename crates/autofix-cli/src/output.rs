// SPDX-License-Identifier: Apache-2.0

//! Output rendering for CLI commands.
//!
//! Command handlers return data; this module handles presentation in text
//! or JSON.

use std::io::{self, Write};

use anyhow::{Context, Result};
use autofix_core::pipeline::{FailureStage, OutcomeStatus, PipelineOutcome};
use console::style;
use serde::Serialize;

use crate::cli::{OutputContext, OutputFormat};

/// Trait for types that can be rendered in multiple output formats.
pub trait Renderable: Serialize {
    /// Render as human-readable text to the given writer.
    fn render_text(&self, w: &mut dyn Write, ctx: &OutputContext) -> io::Result<()>;
}

/// Generic render function. JSON goes through serde, text through the trait.
pub fn render<T: Renderable>(result: &T, ctx: &OutputContext) -> Result<()> {
    match ctx.format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(result).context("Failed to serialize to JSON")?;
            println!("{json}");
        }
        OutputFormat::Text => {
            result
                .render_text(&mut io::stdout(), ctx)
                .context("Failed to render text")?;
        }
    }
    Ok(())
}

/// Context summary printed by `autofix context`.
#[derive(Debug, Serialize)]
pub struct ContextReport {
    /// Issue identifier.
    pub issue: String,
    /// Repository in `owner/name` form.
    pub repository: String,
    /// Included files with their estimated token counts.
    pub files: Vec<(String, usize)>,
    /// Search hits rendered as `file:line: text`.
    pub search_hits: Vec<String>,
    /// Commit summaries.
    pub commits: Vec<String>,
    /// Estimated tokens of the assembled context.
    pub estimated_tokens: usize,
    /// Token budget it was assembled under.
    pub budget: usize,
}

fn stage_label(stage: Option<FailureStage>) -> &'static str {
    match stage {
        Some(FailureStage::Checkout) => "checkout",
        Some(FailureStage::Generate) => "fix generation",
        Some(FailureStage::Apply) => "apply",
        None => "run",
    }
}

impl Renderable for PipelineOutcome {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        match self.status {
            OutcomeStatus::Fixed => {
                writeln!(
                    w,
                    "{} {} fixed in {}",
                    style("✓").green().bold(),
                    style(&self.issue).bold(),
                    self.repository
                )?;
                if let Some(applied) = &self.applied {
                    writeln!(w, "  Pull request: {}", style(&applied.pr_url).cyan())?;
                    writeln!(w, "  Branch:       {}", applied.branch)?;
                    writeln!(w, "  Commit:       {}", applied.commit)?;
                }
            }
            OutcomeStatus::DryRun => {
                writeln!(
                    w,
                    "{} {} (dry run, nothing pushed)",
                    style("•").yellow().bold(),
                    style(&self.issue).bold()
                )?;
            }
            OutcomeStatus::Failed => {
                writeln!(
                    w,
                    "{} {} failed during {}",
                    style("✗").red().bold(),
                    style(&self.issue).bold(),
                    stage_label(self.stage)
                )?;
                if let Some(error) = &self.error {
                    writeln!(w, "  {}", style(error).red())?;
                }
            }
        }

        if let Some(fix) = &self.fix {
            if !fix.description.is_empty() {
                writeln!(w, "\n{}", fix.description.trim())?;
            }
            if !fix.changes.is_empty() {
                writeln!(w, "\n{}", style("Changes:").bold())?;
                for change in &fix.changes {
                    writeln!(w, "  {} ({} bytes)", change.path, change.content.len())?;
                }
            }
            if !fix.reasoning.is_empty() {
                writeln!(w, "\n{}\n  {}", style("Reasoning:").bold(), fix.reasoning.trim())?;
            }
            if let Some(plan) = &fix.test_plan {
                writeln!(w, "\n{}\n  {}", style("Test plan:").bold(), plan.trim())?;
            }
        }

        if let Some(stats) = &self.context {
            writeln!(
                w,
                "\n{}",
                style(format!(
                    "Context: {} files, {} search hits, {} commits, ~{}/{} tokens",
                    stats.files,
                    stats.search_hits,
                    stats.commits,
                    stats.estimated_tokens,
                    stats.budget
                ))
                .dim()
            )?;
        }
        if self.comment_posted {
            writeln!(w, "{}", style("Posted a comment on the issue.").dim())?;
        }
        Ok(())
    }
}

impl Renderable for ContextReport {
    fn render_text(&self, w: &mut dyn Write, _ctx: &OutputContext) -> io::Result<()> {
        writeln!(
            w,
            "{} in {}",
            style(&self.issue).bold(),
            self.repository
        )?;

        writeln!(w, "\n{} ({})", style("Files").bold(), self.files.len())?;
        for (path, size) in &self.files {
            writeln!(w, "  {path} (~{size} tokens)")?;
        }

        writeln!(
            w,
            "\n{} ({})",
            style("Search hits").bold(),
            self.search_hits.len()
        )?;
        for hit in &self.search_hits {
            writeln!(w, "  {hit}")?;
        }

        writeln!(w, "\n{} ({})", style("Commits").bold(), self.commits.len())?;
        for commit in &self.commits {
            writeln!(w, "  {commit}")?;
        }

        writeln!(
            w,
            "\nEstimated tokens: {} / {}",
            self.estimated_tokens, self.budget
        )
    }
}
