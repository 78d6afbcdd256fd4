// SPDX-License-Identifier: Apache-2.0

//! Types that make up a context bundle.

use serde::{Deserialize, Serialize};

use crate::issue::Issue;

/// A repository file included verbatim in the prompt.
#[derive(Debug, Clone, Serialize)]
pub struct FileEntry {
    /// Path relative to the checkout root.
    pub path: String,
    /// Full file contents.
    pub content: String,
    /// Estimated size in tokens.
    pub size: usize,
}

/// A single line matching the code search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    /// Path relative to the checkout root.
    pub file: String,
    /// 1-based line number.
    pub line: usize,
    /// The matching line, trimmed.
    pub text: String,
}

impl SearchHit {
    /// The hit as rendered in the prompt.
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}:{}: {}", self.file, self.line, self.text)
    }
}

/// Metadata of one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Abbreviated commit hash.
    pub id: String,
    /// Subject line.
    pub message: String,
    /// Author name.
    pub author: String,
    /// Author date (ISO 8601).
    pub timestamp: String,
}

impl CommitRecord {
    /// The commit as rendered in the prompt.
    #[must_use]
    pub fn render(&self) -> String {
        format!(
            "{} {} ({}, {})",
            self.id, self.message, self.author, self.timestamp
        )
    }
}

/// The size-bounded input handed to the language model.
///
/// Built once per fix attempt and discarded after the prompt is rendered.
#[derive(Debug, Clone, Serialize)]
pub struct ContextBundle {
    /// Project notes document (or a placeholder), clipped to its share.
    pub notes: String,
    /// The issue being fixed.
    pub issue: Issue,
    /// Rendered bug report for the prompt, clipped to its share.
    pub issue_text: String,
    /// Mentioned files, in extraction order.
    pub files: Vec<FileEntry>,
    /// Code search hits for the first error string.
    pub search_hits: Vec<SearchHit>,
    /// Most recent commits, newest first.
    pub commits: Vec<CommitRecord>,
    /// Cumulative estimated size in tokens.
    pub estimated_tokens: usize,
    /// Budget the bundle was assembled against.
    pub budget: usize,
}
