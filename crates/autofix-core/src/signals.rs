// SPDX-License-Identifier: Apache-2.0

//! Heuristic signal extraction from free-text issue descriptions.
//!
//! Pulls candidate file paths, error lines, function names and stack-trace
//! lines out of text with regular expressions. Best effort only: there is no
//! parsing and no false-positive elimination beyond a keyword filter.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Maximum length kept for a single error or stack-trace line.
const MAX_LINE_CHARS: usize = 300;

static FILE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)(?:^|[\s"'`(\[<,])((?:\.{1,2}/)?(?:[\w@.-]+/)*[\w@-][\w@.-]*\.(?:tsx|ts|jsx|js|mjs|cjs|py|rs|go|java|kt|rb|php|cs|swift|cpp|hpp|c|h|json|ya?ml|toml|md|scss|css|html|vue|svelte|sql)\b)(?::\d+(?::\d+)?)?"#,
    )
    .expect("file path pattern is valid")
});

static ERROR_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\w*(?:error|exception)\b|\bpanicked at\b|\bfailed with\b|\buncaught\b")
        .expect("error line pattern is valid")
});

static STACK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:at\s+\S+.*|File\s+"[^"]+",\s+line\s+\d+.*|\d+:\s+0x[0-9a-fA-F]+.*)$"#)
        .expect("stack line pattern is valid")
});

static FUNCTION_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:function|def|fn|func)\s+([A-Za-z_$][\w$]*)")
        .expect("function declaration pattern is valid")
});

static FUNCTION_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_$][\w$]*)\(").expect("function call pattern is valid")
});

/// Words that look like calls in prose or code but are never interesting symbols.
const NOT_FUNCTIONS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "function", "typeof", "sizeof", "match",
    "await", "new", "super", "import", "require", "fn", "def", "func",
];

/// Signals extracted from an issue's text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Signals {
    /// Candidate file paths, in order of first mention.
    pub file_paths: Vec<String>,
    /// Candidate error-message lines.
    pub error_messages: Vec<String>,
    /// Candidate function or symbol names.
    pub function_names: Vec<String>,
    /// Candidate stack-trace lines.
    pub stack_traces: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

/// Strips list bullets and quote markers that commonly prefix pasted lines.
fn clean_line(line: &str) -> String {
    let trimmed = line
        .trim()
        .trim_start_matches(['>', '-', '*'])
        .trim()
        .trim_matches('`')
        .trim();
    crate::utils::prefix_chars(trimmed, MAX_LINE_CHARS)
}

/// Extracts every kind of signal from `text`. Never fails.
#[must_use]
pub fn extract_signals(text: &str) -> Signals {
    let mut signals = Signals::default();

    for caps in FILE_PATH.captures_iter(text) {
        if let Some(path) = caps.get(1) {
            let path = path.as_str().trim_start_matches("./");
            push_unique(&mut signals.file_paths, path.to_string());
        }
    }

    for line in text.lines() {
        if STACK_LINE.is_match(line) {
            push_unique(&mut signals.stack_traces, clean_line(line));
        } else if ERROR_LINE.is_match(line) {
            push_unique(&mut signals.error_messages, clean_line(line));
        }
    }

    for caps in FUNCTION_DECL
        .captures_iter(text)
        .chain(FUNCTION_CALL.captures_iter(text))
    {
        if let Some(name) = caps.get(1) {
            let name = name.as_str();
            if !NOT_FUNCTIONS.contains(&name) {
                push_unique(&mut signals.function_names, name.to_string());
            }
        }
    }

    signals
}
