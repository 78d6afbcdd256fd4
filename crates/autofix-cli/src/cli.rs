// SPDX-License-Identifier: Apache-2.0

//! Command-line interface definition for Autofix.
//!
//! Uses clap's derive API for declarative CLI parsing.

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Output format for CLI results.
#[derive(Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with colors (default)
    #[default]
    Text,
    /// JSON output for programmatic consumption
    Json,
}

/// Global output configuration passed to commands.
#[derive(Clone)]
pub struct OutputContext {
    /// Output format (text, json)
    pub format: OutputFormat,
    /// Whether stdout is a terminal (TTY)
    pub is_tty: bool,
}

impl OutputContext {
    /// Creates an `OutputContext` from CLI arguments.
    pub fn from_cli(format: OutputFormat) -> Self {
        Self {
            format,
            is_tty: std::io::stdout().is_terminal(),
        }
    }

    /// Returns true if interactive elements (spinners, colors) should be shown.
    pub fn is_interactive(&self) -> bool {
        self.is_tty && matches!(self.format, OutputFormat::Text)
    }
}

/// Autofix - turn labeled issues into pull requests.
///
/// Fetches a Linear issue (or takes a freeform description), gathers
/// repository context within a token budget, asks a language model for a
/// fix and opens a GitHub pull request with it.
#[derive(Parser)]
#[command(name = "autofix")]
#[command(version, about, long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Output format (text, json)
    #[arg(long, short = 'o', global = true, default_value = "text", value_enum)]
    pub output: OutputFormat,

    /// Enable verbose output (debug-level logging)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Override configured AI provider (anthropic, openrouter, openai)
    #[arg(long, global = true)]
    pub provider: Option<String>,

    /// Override configured AI model
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Target repository (owner/name); overrides GITHUB_REPO
    #[arg(long, global = true, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// What to fix: a Linear issue or a freeform description.
#[derive(Args, Clone)]
pub struct IssueArgs {
    /// Linear issue identifier (e.g., ENG-42)
    #[arg(
        value_name = "ISSUE_ID",
        required_unless_present = "description",
        conflicts_with = "description"
    )]
    pub issue: Option<String>,

    /// Freeform bug description instead of a Linear issue
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Title for a freeform description (defaults to its first line)
    #[arg(long, requires = "description")]
    pub title: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a fix and open a pull request
    Fix {
        /// Issue to fix
        #[command(flatten)]
        target: IssueArgs,

        /// Use an existing checkout instead of cloning into the workspace
        #[arg(long, value_name = "DIR")]
        repo_path: Option<PathBuf>,

        /// Generate the fix but do not push, open a PR or comment
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the context that would be sent to the model
    Context {
        /// Issue to assemble context for
        #[command(flatten)]
        target: IssueArgs,

        /// Use an existing checkout instead of cloning into the workspace
        #[arg(long, value_name = "DIR")]
        repo_path: Option<PathBuf>,
    },
}
