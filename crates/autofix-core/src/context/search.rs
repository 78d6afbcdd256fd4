// SPDX-License-Identifier: Apache-2.0

//! Plain substring search over a checkout.
//!
//! The walk is iterative (`walkdir`) and prunes hidden entries and
//! build-artifact or dependency directories before descending into them.

use std::path::Path;

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use super::types::SearchHit;

/// File extensions considered source code.
pub const SEARCH_EXTENSIONS: &[&str] = &[
    "ts", "tsx", "js", "jsx", "mjs", "cjs", "py", "rs", "go", "java", "kt", "rb", "php", "cs",
    "swift", "c", "h", "cpp", "hpp",
];

/// Directory names never descended into.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    "target",
    "dist",
    "build",
    "out",
    "vendor",
    "__pycache__",
    "coverage",
];

/// Maximum characters kept from a matching line.
const MAX_HIT_CHARS: usize = 300;

fn is_excluded(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && EXCLUDED_DIRS.contains(&name.as_ref()))
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SEARCH_EXTENSIONS.contains(&ext))
}

/// Finds lines containing `needle` (case-sensitive) in source files under `root`.
///
/// Files are visited in file-name order so results are deterministic. Unreadable
/// or non-UTF-8 files are skipped. Returns at most `limit` hits.
#[must_use]
pub fn search_checkout(root: &Path, needle: &str, limit: usize) -> Vec<SearchHit> {
    let mut hits = Vec::new();
    if needle.is_empty() || limit == 0 {
        return hits;
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && has_source_extension(e.path()));

    for entry in walker {
        let Ok(content) = std::fs::read_to_string(entry.path()) else {
            debug!(path = %entry.path().display(), "Skipping unreadable file");
            continue;
        };
        let rel = entry
            .path()
            .strip_prefix(root)
            .unwrap_or(entry.path())
            .to_string_lossy()
            .replace('\\', "/");

        for (idx, line) in content.lines().enumerate() {
            if line.contains(needle) {
                hits.push(SearchHit {
                    file: rel.clone(),
                    line: idx + 1,
                    text: crate::utils::truncate(line.trim(), MAX_HIT_CHARS),
                });
                if hits.len() >= limit {
                    return hits;
                }
            }
        }
    }

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn finds_matches_with_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "src/a.ts", "const x = 1;\nthrow new Error('boom');\n");

        let hits = search_checkout(dir.path(), "boom", 20);
        assert_eq!(
            hits,
            vec![SearchHit {
                file: "src/a.ts".to_string(),
                line: 2,
                text: "throw new Error('boom');".to_string(),
            }]
        );
    }

    #[test]
    fn match_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.py", "raise Boom()\n");
        assert!(search_checkout(dir.path(), "boom", 20).is_empty());
    }

    #[test]
    fn skips_excluded_and_hidden_directories() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "node_modules/lib/index.js", "needle");
        write(dir.path(), "target/debug/gen.rs", "needle");
        write(dir.path(), ".git/hooks/pre-commit.py", "needle");
        write(dir.path(), ".hidden.js", "needle");
        write(dir.path(), "src/keep.js", "needle");

        let hits = search_checkout(dir.path(), "needle", 20);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].file, "src/keep.js");
    }

    #[test]
    fn skips_non_source_extensions() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "README.md", "needle");
        write(dir.path(), "data.json", "needle");
        assert!(search_checkout(dir.path(), "needle", 20).is_empty());
    }

    #[test]
    fn stops_at_limit() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.rs", &"needle\n".repeat(50));

        let hits = search_checkout(dir.path(), "needle", 20);
        assert_eq!(hits.len(), 20);
        assert_eq!(hits.last().unwrap().line, 20);
    }

    #[test]
    fn empty_needle_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.rs", "anything");
        assert!(search_checkout(dir.path(), "", 20).is_empty());
    }
}
