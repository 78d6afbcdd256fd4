// SPDX-License-Identifier: Apache-2.0

//! Text utilities: character-safe truncation and the token estimate used
//! for context budgeting.

/// Characters per estimated token.
pub const CHARS_PER_TOKEN: usize = 4;

/// Estimates the token count of `text` as one token per four characters, rounded up.
///
/// This is a coarse approximation, not a tokenizer.
///
/// # Examples
///
/// ```
/// use autofix_core::utils::estimate_tokens;
///
/// assert_eq!(estimate_tokens(""), 0);
/// assert_eq!(estimate_tokens("abcd"), 1);
/// assert_eq!(estimate_tokens("abcde"), 2);
/// ```
#[must_use]
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(CHARS_PER_TOKEN)
}

/// Truncates text to a maximum length with a custom suffix.
///
/// Uses character count (not byte count) to safely handle multi-byte UTF-8.
/// The suffix is included in the max length calculation.
///
/// # Examples
///
/// ```
/// use autofix_core::utils::truncate_with_suffix;
///
/// let text = "This is a very long string that needs truncation";
/// let result = truncate_with_suffix(text, 20, "... [more]");
/// assert!(result.ends_with("... [more]"));
/// assert!(result.chars().count() <= 20);
/// ```
#[must_use]
pub fn truncate_with_suffix(text: &str, max_len: usize, suffix: &str) -> String {
    let char_count = text.chars().count();
    if char_count <= max_len {
        text.to_string()
    } else {
        let suffix_len = suffix.chars().count();
        let truncate_at = max_len.saturating_sub(suffix_len);
        let truncated: String = text.chars().take(truncate_at).collect();
        format!("{truncated}{suffix}")
    }
}

/// Truncates text to a maximum length with default ellipsis suffix "...".
///
/// # Examples
///
/// ```
/// use autofix_core::utils::truncate;
///
/// assert_eq!(truncate("Hello", 10), "Hello");
/// assert!(truncate("This is a very long title", 10).ends_with("..."));
/// ```
#[must_use]
pub fn truncate(text: &str, max_len: usize) -> String {
    truncate_with_suffix(text, max_len, "...")
}

/// Returns the first `max_chars` characters of `text` without any suffix.
#[must_use]
pub fn prefix_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

/// Clips `text` so that its token estimate is at most `max_tokens`.
///
/// A marker naming the original size is appended when clipping happens;
/// the marker is counted against the limit.
#[must_use]
pub fn clip_to_tokens(text: &str, max_tokens: usize) -> String {
    if estimate_tokens(text) <= max_tokens {
        return text.to_string();
    }
    let suffix = format!(
        "\n[... truncated, original length {} chars]",
        text.chars().count()
    );
    truncate_with_suffix(text, max_tokens * CHARS_PER_TOKEN, &suffix)
}
