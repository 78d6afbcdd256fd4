// SPDX-License-Identifier: Apache-2.0

//! AI provider trait and fix generation.
//!
//! Defines the `AiProvider` trait that every model backend implements. The
//! default [`AiProvider::generate_fix`] renders the context bundle into a
//! prompt, makes exactly one completion call and parses the reply.

use std::fmt::Write;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::parse::parse_fix_reply;
use super::types::FixResult;
use crate::context::ContextBundle;

/// System prompt sent with every fix request.
pub const SYSTEM_PROMPT: &str = "You are a senior software engineer fixing bugs in an existing \
codebase. You make the smallest change that fixes the reported problem, preserve the project's \
style, and never invent files you have not been shown unless the fix requires a new file.";

/// Reply contract appended to every prompt.
const REPLY_INSTRUCTIONS: &str = "## Instructions\n\
Fix the bug described above. Reply with exactly one JSON object and nothing else, using this schema:\n\
{\n  \"reasoning\": \"What causes the bug and why the change fixes it\",\n  \"description\": \"One-paragraph summary suitable for a pull request\",\n  \"changes\": [\n    {\"path\": \"relative/path/to/file\", \"content\": \"the COMPLETE new file contents\"}\n  ],\n  \"testPlan\": \"How a reviewer can verify the fix\"\n}\n\
Rules:\n\
- Each change replaces the whole file; include every line, not a diff.\n\
- Paths are relative to the repository root.\n\
- If you cannot determine a fix, return an empty `changes` array and explain why in `reasoning`.\n";

/// A language model backend.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "anthropic", "openrouter").
    fn name(&self) -> &str;

    /// Returns the model name.
    fn model(&self) -> &str;

    /// Sends one completion request and returns the reply text.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success HTTP status.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;

    /// Generates a fix for the issue in `bundle`.
    ///
    /// Transport and API errors propagate; reply problems are reported
    /// inside the returned [`FixResult`].
    #[instrument(skip(self, bundle), fields(issue = %bundle.issue.identifier, provider = %self.name()))]
    async fn generate_fix(&self, bundle: &ContextBundle) -> Result<FixResult> {
        let prompt = build_fix_prompt(bundle);
        debug!(
            model = %self.model(),
            prompt_chars = prompt.len(),
            "Calling {} API",
            self.name()
        );

        let reply = self.complete(SYSTEM_PROMPT, &prompt).await?;
        debug!(response_length = reply.len(), "Received AI response");

        let result = parse_fix_reply(&reply);
        info!(
            success = result.success,
            changes = result.changes.len(),
            "Parsed fix reply"
        );
        Ok(result)
    }
}

/// Renders a context bundle into the user prompt.
#[must_use]
pub fn build_fix_prompt(bundle: &ContextBundle) -> String {
    let mut prompt = String::new();

    prompt.push_str("## Project Context\n");
    let _ = writeln!(prompt, "{}\n", bundle.notes.trim_end());

    prompt.push_str("## Bug Report\n");
    let _ = writeln!(prompt, "{}\n", bundle.issue_text.trim_end());

    prompt.push_str("## Relevant Files\n");
    if bundle.files.is_empty() {
        prompt.push_str("[No files referenced in the issue could be read]\n\n");
    }
    for file in &bundle.files {
        let _ = writeln!(prompt, "### {}\n```\n{}\n```\n", file.path, file.content.trim_end());
    }

    prompt.push_str("## Search Results\n");
    if bundle.search_hits.is_empty() {
        prompt.push_str("[No search results]\n");
    }
    for hit in &bundle.search_hits {
        let _ = writeln!(prompt, "- {}", hit.render());
    }
    prompt.push('\n');

    prompt.push_str("## Recent Commits\n");
    if bundle.commits.is_empty() {
        prompt.push_str("[No commit history available]\n");
    }
    for commit in &bundle.commits {
        let _ = writeln!(prompt, "- {}", commit.render());
    }
    prompt.push('\n');

    prompt.push_str(REPLY_INSTRUCTIONS);
    prompt
}
