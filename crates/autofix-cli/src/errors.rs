// SPDX-License-Identifier: Apache-2.0

//! CLI-specific error formatting with user-friendly hints.
//!
//! Downcasts `anyhow::Error` to `AutofixError` and appends a tip for each
//! error kind. Anything else is printed with its full context chain.

use std::fmt::Write;

use anyhow::Error;
use autofix_core::error::AutofixError;

/// Formats an error for CLI display with helpful hints.
pub fn format_error(error: &Error) -> String {
    let Some(err) = error.downcast_ref::<AutofixError>() else {
        return format!("{error:#}");
    };

    match err {
        AutofixError::MissingCredentials { missing } => {
            let mut msg = String::from("Missing required configuration:\n");
            for name in missing {
                let _ = writeln!(msg, "  - {name}");
            }
            msg.push_str(
                "\nTip: Export the variables above. The target repository can also be given with --repo.",
            );
            msg
        }
        AutofixError::RateLimited {
            provider,
            retry_after,
        } => {
            if *retry_after > 0 {
                format!(
                    "{err}\n\nTip: {provider} asked to wait {retry_after}s. Try again after that."
                )
            } else {
                format!("{err}\n\nTip: Wait a moment and try again.")
            }
        }
        AutofixError::AI {
            status, provider, ..
        } => {
            let api_key_env = autofix_core::ai::get_provider(provider)
                .map_or("ANTHROPIC_API_KEY", |p| p.api_key_env);
            let mut msg = err.to_string();
            if *status == Some(401) {
                let _ = write!(msg, "\n\nTip: Check your {api_key_env} environment variable.");
            } else {
                msg.push_str("\n\nTip: This may be a temporary provider issue. Try again in a moment.");
            }
            msg
        }
        AutofixError::Config { .. } => format!(
            "{err}\n\nTip: Check your config file at {}",
            autofix_core::config::config_file_path().display()
        ),
        AutofixError::GitHub { .. } => {
            format!("{err}\n\nTip: Check that GITHUB_TOKEN can push to the target repository.")
        }
        AutofixError::Linear { .. } => {
            format!("{err}\n\nTip: Check LINEAR_API_KEY and the issue identifier.")
        }
        AutofixError::Git { .. } => {
            format!("{err}\n\nTip: Make sure git is installed and the repository is reachable.")
        }
        AutofixError::InvalidPath { .. } => {
            format!("{err}\n\nTip: The model proposed an unsafe path. Nothing was written.")
        }
        AutofixError::Network(_) => {
            format!("{err}\n\nTip: Check your internet connection and try again.")
        }
    }
}
