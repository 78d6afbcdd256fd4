// SPDX-License-Identifier: Apache-2.0

//! Token-budgeted context assembly.
//!
//! Builds a [`ContextBundle`] from an issue and a repository checkout. Entries
//! are added in strict priority order, each category capped at a share of the
//! total budget:
//!
//! | Category | Added while the running total stays within |
//! |---|---|
//! | project notes, issue text | always (clipped to 10% and 20%) |
//! | mentioned files | 70% |
//! | code search hits | 80% |
//! | recent commits | 85% |
//!
//! Nothing in here fails: unreadable files, search problems and git errors
//! degrade to "skip this item".

mod search;
mod types;

use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, instrument, warn};

pub use search::{EXCLUDED_DIRS, SEARCH_EXTENSIONS, search_checkout};
pub use types::{CommitRecord, ContextBundle, FileEntry, SearchHit};

use crate::git::GitBackend;
use crate::issue::Issue;
use crate::signals::extract_signals;
use crate::utils::{clip_to_tokens, estimate_tokens};

/// Total token budget for one bundle.
pub const DEFAULT_TOKEN_BUDGET: usize = 100_000;

/// Share of the budget the project notes may take.
pub const NOTES_SHARE_PCT: usize = 10;
/// Share of the budget the issue text may take.
pub const ISSUE_SHARE_PCT: usize = 20;
/// Running-total ceiling while adding mentioned files.
pub const FILES_SHARE_PCT: usize = 70;
/// Running-total ceiling while adding search hits.
pub const SEARCH_SHARE_PCT: usize = 80;
/// Running-total ceiling while adding commits.
pub const COMMITS_SHARE_PCT: usize = 85;

/// Maximum search hits kept.
pub const MAX_SEARCH_HITS: usize = 20;
/// Number of recent commits fetched.
pub const MAX_COMMITS: usize = 5;

/// Assembles context bundles against a fixed token budget.
pub struct ContextAssembler<'a> {
    git: &'a dyn GitBackend,
    notes_path: String,
    budget: usize,
}

impl<'a> ContextAssembler<'a> {
    /// Creates an assembler reading project notes from `notes_path` (relative to the checkout).
    #[must_use]
    pub fn new(git: &'a dyn GitBackend, notes_path: &str) -> Self {
        Self {
            git,
            notes_path: notes_path.to_string(),
            budget: DEFAULT_TOKEN_BUDGET,
        }
    }

    /// Overrides the token budget.
    #[must_use]
    pub fn with_budget(mut self, budget: usize) -> Self {
        self.budget = budget;
        self
    }

    fn share(&self, pct: usize) -> usize {
        self.budget * pct / 100
    }

    /// Builds the bundle for `issue` from the checkout at `checkout`.
    #[instrument(skip(self, issue), fields(issue = %issue.identifier, checkout = %checkout.display()))]
    pub async fn assemble(&self, issue: &Issue, checkout: &Path) -> ContextBundle {
        let notes = clip_to_tokens(
            &self.load_notes(checkout).await,
            self.share(NOTES_SHARE_PCT),
        );
        let issue_text = clip_to_tokens(&render_issue(issue), self.share(ISSUE_SHARE_PCT));
        let mut total = estimate_tokens(&notes) + estimate_tokens(&issue_text);

        let signals = extract_signals(&issue.full_text());
        debug!(
            files = signals.file_paths.len(),
            errors = signals.error_messages.len(),
            functions = signals.function_names.len(),
            "Extracted issue signals"
        );

        let mut files = Vec::new();
        let files_cap = self.share(FILES_SHARE_PCT);
        for path in &signals.file_paths {
            let Some(full_path) = resolve_in_checkout(checkout, path) else {
                debug!(path = %path, "Skipping path outside checkout");
                continue;
            };
            let content = match tokio::fs::read_to_string(&full_path).await {
                Ok(content) => content,
                Err(e) => {
                    debug!(path = %path, error = %e, "Skipping unreadable file");
                    continue;
                }
            };
            let size = estimate_tokens(&content);
            if total + size > files_cap {
                debug!(path = %path, size, total, "File budget reached");
                break;
            }
            total += size;
            files.push(FileEntry {
                path: path.clone(),
                content,
                size,
            });
        }

        let mut search_hits = Vec::new();
        let search_cap = self.share(SEARCH_SHARE_PCT);
        if let Some(needle) = signals.error_messages.first()
            && total < search_cap
        {
            for hit in self.search(checkout, needle).await {
                let size = estimate_tokens(&hit.render());
                if total + size > search_cap {
                    break;
                }
                total += size;
                search_hits.push(hit);
            }
        }

        let mut commits = Vec::new();
        let commits_cap = self.share(COMMITS_SHARE_PCT);
        if total < commits_cap {
            match self.git.recent_commits(checkout, MAX_COMMITS).await {
                Ok(records) => {
                    for commit in records.into_iter().take(MAX_COMMITS) {
                        let size = estimate_tokens(&commit.render());
                        if total + size > commits_cap {
                            break;
                        }
                        total += size;
                        commits.push(commit);
                    }
                }
                Err(e) => warn!(error = %e, "Skipping commit history"),
            }
        }

        debug!(
            files = files.len(),
            search_hits = search_hits.len(),
            commits = commits.len(),
            estimated_tokens = total,
            budget = self.budget,
            "Context assembled"
        );

        ContextBundle {
            notes,
            issue: issue.clone(),
            issue_text,
            files,
            search_hits,
            commits,
            estimated_tokens: total,
            budget: self.budget,
        }
    }

    async fn load_notes(&self, checkout: &Path) -> String {
        let path = checkout.join(&self.notes_path);
        match tokio::fs::read_to_string(&path).await {
            Ok(notes) => notes,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "Project notes unavailable");
                format!("[No project notes found at {}]", self.notes_path)
            }
        }
    }

    async fn search(&self, checkout: &Path, needle: &str) -> Vec<SearchHit> {
        let root = checkout.to_path_buf();
        let needle = needle.to_string();
        match tokio::task::spawn_blocking(move || search_checkout(&root, &needle, MAX_SEARCH_HITS))
            .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(error = %e, "Code search aborted");
                Vec::new()
            }
        }
    }
}

/// Renders the bug-report block of the prompt.
fn render_issue(issue: &Issue) -> String {
    let mut text = String::new();
    let _ = writeln!(text, "Identifier: {}", issue.identifier);
    let _ = writeln!(text, "Title: {}", issue.title);
    if issue.priority > 0 {
        let _ = writeln!(text, "Priority: {}", issue.priority);
    }
    if !issue.labels.is_empty() {
        let _ = writeln!(text, "Labels: {}", issue.labels.join(", "));
    }
    if !issue.url.is_empty() {
        let _ = writeln!(text, "URL: {}", issue.url);
    }
    text.push('\n');
    if issue.description.trim().is_empty() {
        text.push_str("[No description provided]");
    } else {
        text.push_str(&issue.description);
    }
    text
}

/// Joins a relative path onto the checkout, refusing absolute paths and `..`.
pub(crate) fn resolve_in_checkout(checkout: &Path, rel: &str) -> Option<PathBuf> {
    let rel_path = Path::new(rel);
    let safe = !rel.is_empty()
        && rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    safe.then(|| checkout.join(rel_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::fs;

    use crate::issue::RepositoryRef;

    /// Git backend that only serves canned history.
    struct HistoryOnly {
        commits: Vec<CommitRecord>,
        fail: bool,
    }

    #[async_trait]
    impl GitBackend for HistoryOnly {
        async fn sync_checkout(&self, _: &RepositoryRef, _: &Path, _: &str) -> Result<()> {
            unimplemented!()
        }

        async fn recent_commits(&self, _: &Path, limit: usize) -> Result<Vec<CommitRecord>> {
            if self.fail {
                anyhow::bail!("not a git repository");
            }
            Ok(self.commits.iter().take(limit).cloned().collect())
        }

        async fn create_branch(&self, _: &Path, _: &str) -> Result<()> {
            unimplemented!()
        }

        async fn commit(&self, _: &Path, _: &[String], _: &str) -> Result<String> {
            unimplemented!()
        }

        async fn push(&self, _: &Path, _: &str) -> Result<()> {
            unimplemented!()
        }
    }

    fn history(n: usize) -> HistoryOnly {
        HistoryOnly {
            commits: (0..n)
                .map(|i| CommitRecord {
                    id: format!("c{i:06}"),
                    message: format!("commit {i}"),
                    author: "Ada".to_string(),
                    timestamp: "2026-01-01T00:00:00Z".to_string(),
                })
                .collect(),
            fail: false,
        }
    }

    fn issue(description: &str) -> Issue {
        Issue::builder()
            .identifier("ENG-1".to_string())
            .title("Bug".to_string())
            .description(description.to_string())
            .build()
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn includes_notes_files_hits_and_commits() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "AGENTS.md", "Use tabs.");
        write(dir.path(), "src/a.ts", "export const greet = 'Helo';\n");
        write(dir.path(), "src/b.ts", "throw new Error('Error: Invalid token');\n");
        let git = history(8);

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(
                &issue("Broken in src/a.ts\nError: Invalid token"),
                dir.path(),
            )
            .await;

        assert_eq!(bundle.notes, "Use tabs.");
        assert_eq!(bundle.files.len(), 1);
        assert_eq!(bundle.files[0].path, "src/a.ts");
        assert_eq!(bundle.commits.len(), MAX_COMMITS);
        assert_eq!(bundle.search_hits.len(), 1);
        assert_eq!(bundle.search_hits[0].file, "src/b.ts");
        assert!(bundle.estimated_tokens <= bundle.budget);
    }

    #[tokio::test]
    async fn missing_notes_use_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let git = history(0);

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(&issue("nothing here"), dir.path())
            .await;

        assert!(bundle.notes.contains("No project notes found"));
        assert!(bundle.files.is_empty());
    }

    #[tokio::test]
    async fn search_runs_for_first_error_string() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/auth.js", "// Invalid token\nfoo();\n");
        let git = history(0);

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(&issue("Invalid token"), dir.path())
            .await;
        // No "error"-like line was extracted, so no search happens.
        assert!(bundle.search_hits.is_empty());

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(&issue("Invalid token error"), dir.path())
            .await;
        assert!(bundle.search_hits.is_empty());

        write(dir.path(), "src/err.js", "log('Invalid token error');\n");
        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(&issue("Invalid token error"), dir.path())
            .await;
        assert_eq!(bundle.search_hits.len(), 1);
        assert_eq!(bundle.search_hits[0].file, "src/err.js");
        assert_eq!(bundle.search_hits[0].line, 1);
    }

    #[tokio::test]
    async fn unreadable_and_escaping_paths_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/ok.rs", "fn ok() {}");
        let git = history(0);

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(
                &issue("see src/missing.rs and ../secret.rs and src/ok.rs"),
                dir.path(),
            )
            .await;

        let paths: Vec<_> = bundle.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["src/ok.rs"]);
    }

    #[tokio::test]
    async fn file_inclusion_stops_at_seventy_percent() {
        let dir = tempfile::tempdir().unwrap();
        let git = history(0);
        let budget = 1_000;
        let text = "Files: a.rs b.rs c.rs d.rs";

        // Baseline with none of the files present.
        let base = ContextAssembler::new(&git, "AGENTS.md")
            .with_budget(budget)
            .assemble(&issue(text), dir.path())
            .await
            .estimated_tokens;
        let cap = budget * FILES_SHARE_PCT / 100;
        assert!(base + 400 < cap);

        // a and b land exactly on the cap; c is a single token and overshoots.
        write(dir.path(), "a.rs", &"a".repeat(200 * 4));
        write(dir.path(), "b.rs", &"b".repeat((cap - base - 200) * 4));
        write(dir.path(), "c.rs", "c");
        write(dir.path(), "d.rs", "d");

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .with_budget(budget)
            .assemble(&issue(text), dir.path())
            .await;

        let paths: Vec<_> = bundle.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.rs", "b.rs"]);
        assert_eq!(bundle.estimated_tokens, cap);
    }

    #[tokio::test]
    async fn oversized_inputs_never_exceed_budget() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "AGENTS.md", &"n".repeat(2_000_000));
        write(dir.path(), "big.py", &"x".repeat(500_000));
        write(dir.path(), "src/hit.py", &"raise ValueError('boom')\n".repeat(100));
        let git = history(10);
        let description = format!("big.py\nValueError('boom')\n{}", "y".repeat(200_000));

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(&issue(&description), dir.path())
            .await;

        assert!(bundle.estimated_tokens <= DEFAULT_TOKEN_BUDGET);
        assert!(estimate_tokens(&bundle.notes) <= DEFAULT_TOKEN_BUDGET * NOTES_SHARE_PCT / 100);
        assert!(
            estimate_tokens(&bundle.issue_text) <= DEFAULT_TOKEN_BUDGET * ISSUE_SHARE_PCT / 100
        );
        assert!(bundle.files.is_empty());
    }

    #[tokio::test]
    async fn commit_failure_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let git = HistoryOnly {
            commits: vec![],
            fail: true,
        };

        let bundle = ContextAssembler::new(&git, "AGENTS.md")
            .assemble(&issue("anything"), dir.path())
            .await;
        assert!(bundle.commits.is_empty());
    }

    #[test]
    fn resolve_rejects_escaping_paths() {
        let root = Path::new("/repo");
        assert_eq!(
            resolve_in_checkout(root, "src/a.ts"),
            Some(PathBuf::from("/repo/src/a.ts"))
        );
        assert!(resolve_in_checkout(root, "../etc/passwd").is_none());
        assert!(resolve_in_checkout(root, "/etc/passwd").is_none());
        assert!(resolve_in_checkout(root, "").is_none());
    }
}
