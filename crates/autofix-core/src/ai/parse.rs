// SPDX-License-Identifier: Apache-2.0

//! Extraction and validation of the structured reply.
//!
//! Models wrap the JSON object in prose or code fences often enough that the
//! reply cannot be parsed directly. [`extract_json_object`] finds the first
//! balanced `{...}` that parses as a JSON object, tracking string literals so
//! braces inside values do not end the object early.

use serde_json::Value;
use tracing::debug;

use super::types::{FileChange, FixResult};
use crate::utils::prefix_chars;

/// Characters of the raw reply kept as diagnostic reasoning on failure.
pub const RAW_EXCERPT_CHARS: usize = 500;

/// Maximum opening braces tried as object starts.
const MAX_CANDIDATES: usize = 32;

/// Error recorded when the reply proposes no changes.
pub const NO_CHANGES_ERROR: &str = "Model could not produce a fix (no changes proposed)";

/// Returns the end (exclusive) of the balanced object starting at `start`,
/// which must index a `{`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locates the first JSON object embedded in `text`.
///
/// Tries each `{` in order and returns the first balanced slice that parses
/// as an object. When none does, falls back to the slice from the first `{`
/// to the last `}` so the caller can report the parse error.
///
/// # Examples
///
/// ```
/// use autofix_core::ai::extract_json_object;
///
/// let reply = "Here you go:\n```json\n{\"a\": \"}\"}\n```\nDone {really}.";
/// assert_eq!(extract_json_object(reply), Some("{\"a\": \"}\"}"));
/// assert_eq!(extract_json_object("no braces"), None);
/// ```
#[must_use]
pub fn extract_json_object(text: &str) -> Option<&str> {
    let first = text.find('{')?;

    for (start, _) in text.match_indices('{').take(MAX_CANDIDATES) {
        if let Some(end) = balanced_end(text, start) {
            let candidate = &text[start..end];
            if serde_json::from_str::<Value>(candidate).is_ok_and(|v| v.is_object()) {
                return Some(candidate);
            }
        }
    }

    let last = text.rfind('}')?;
    (last > first).then(|| &text[first..=last])
}

fn string_field<'a>(object: &'a serde_json::Map<String, Value>, key: &str) -> Option<&'a str> {
    object.get(key).and_then(Value::as_str)
}

fn parse_change(value: &Value) -> Option<FileChange> {
    let object = value.as_object()?;
    Some(FileChange {
        path: string_field(object, "path")?.to_string(),
        content: string_field(object, "content")?.to_string(),
    })
}

/// Parses a model reply into a [`FixResult`]. Never fails.
///
/// Structural problems produce a failed result whose reasoning is the first
/// 500 characters of `raw`. A well-formed reply with an empty `changes`
/// list produces a failed result carrying [`NO_CHANGES_ERROR`] and the
/// model's own reasoning.
#[must_use]
pub fn parse_fix_reply(raw: &str) -> FixResult {
    let excerpt = || prefix_chars(raw, RAW_EXCERPT_CHARS);

    let Some(candidate) = extract_json_object(raw) else {
        return FixResult::failed("No JSON object found in model reply", excerpt());
    };

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            debug!(error = %e, "Model reply is not valid JSON");
            return FixResult::failed(format!("Model reply is not valid JSON: {e}"), excerpt());
        }
    };

    let Some(object) = value.as_object() else {
        return FixResult::failed("Model reply is not a JSON object", excerpt());
    };

    let mut missing = Vec::new();
    let reasoning = string_field(object, "reasoning");
    let description = string_field(object, "description");
    let changes = object.get("changes").and_then(Value::as_array);
    if reasoning.is_none() {
        missing.push("reasoning");
    }
    if description.is_none() {
        missing.push("description");
    }
    if changes.is_none() {
        missing.push("changes");
    }
    let (Some(reasoning), Some(description), Some(changes)) = (reasoning, description, changes)
    else {
        return FixResult::failed(
            format!(
                "Model reply is missing required field(s): {}",
                missing.join(", ")
            ),
            excerpt(),
        );
    };

    let mut parsed = Vec::with_capacity(changes.len());
    for (idx, change) in changes.iter().enumerate() {
        let Some(change) = parse_change(change) else {
            return FixResult::failed(
                format!("changes[{idx}] must be an object with string `path` and `content`"),
                excerpt(),
            );
        };
        parsed.push(change);
    }

    let test_plan = string_field(object, "testPlan")
        .or_else(|| string_field(object, "test_plan"))
        .filter(|plan| !plan.trim().is_empty())
        .map(str::to_string);

    if parsed.is_empty() {
        return FixResult {
            success: false,
            changes: Vec::new(),
            description: description.to_string(),
            reasoning: reasoning.to_string(),
            test_plan,
            error: Some(NO_CHANGES_ERROR.to_string()),
        };
    }

    FixResult {
        success: true,
        changes: parsed,
        description: description.to_string(),
        reasoning: reasoning.to_string(),
        test_plan,
        error: None,
    }
}
