// SPDX-License-Identifier: Apache-2.0

//! AI integration module.
//!
//! Turns a context bundle into a [`FixResult`] with one model call. The
//! [`AiProvider`] trait is the seam; [`AiClient`] implements it for every
//! provider in the [`registry`].

pub mod client;
pub mod parse;
pub mod provider;
pub mod registry;
pub mod types;

pub use client::AiClient;
pub use parse::{NO_CHANGES_ERROR, extract_json_object, parse_fix_reply};
pub use provider::{AiProvider, SYSTEM_PROMPT, build_fix_prompt};
pub use registry::{ProviderConfig, WireFormat, all_providers, get_provider};
pub use types::{FileChange, FixResult};
