// SPDX-License-Identifier: Apache-2.0

//! Domain types shared across the pipeline: the triggering issue and the
//! repository it resolves to.

use std::fmt;

use anyhow::Result;
use bon::Builder;
use serde::{Deserialize, Serialize};

/// Team an issue belongs to in the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    /// Tracker-internal team id.
    pub id: String,
    /// Short team key (e.g., "ENG").
    pub key: String,
    /// Human-readable team name.
    pub name: String,
}

/// An issue that triggered a fix attempt. Immutable once received.
#[derive(Debug, Clone, Serialize, Deserialize, Builder)]
pub struct Issue {
    /// Tracker-internal id used for mutations; `None` for local issues.
    pub tracker_id: Option<String>,
    /// Human-facing identifier (e.g., "ENG-42").
    pub identifier: String,
    /// Issue title.
    pub title: String,
    /// Free-text description (markdown).
    #[builder(default)]
    pub description: String,
    /// Numeric priority (0 = none, 1 = urgent ... 4 = low).
    #[builder(default)]
    pub priority: u8,
    /// Label names.
    #[builder(default)]
    pub labels: Vec<String>,
    /// Canonical URL.
    #[builder(default)]
    pub url: String,
    /// Owning team, when known.
    pub team: Option<TeamRef>,
}

impl Issue {
    /// Builds an issue from a freeform description supplied on the command line.
    ///
    /// The identifier is derived from the current UTC time so branch names stay unique.
    #[must_use]
    pub fn local(title: Option<&str>, description: &str) -> Self {
        let title = title.map_or_else(
            || {
                description
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty())
                    .map_or_else(
                        || "Manual fix request".to_string(),
                        |l| crate::utils::truncate(l, 80),
                    )
            },
            str::to_string,
        );
        Issue::builder()
            .identifier(format!("LOCAL-{}", chrono::Utc::now().format("%Y%m%d%H%M%S")))
            .title(title)
            .description(description.to_string())
            .build()
    }

    /// Whether this issue lives in the tracker (and can receive comments).
    #[must_use]
    pub fn is_tracked(&self) -> bool {
        self.tracker_id.is_some()
    }

    /// Title and description joined, as scanned for signals.
    #[must_use]
    pub fn full_text(&self) -> String {
        format!("{}\n\n{}", self.title, self.description)
    }

    /// Whether the issue carries `label` (case-insensitive).
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }
}

/// Which resolution rule produced a [`RepositoryRef`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RepoSource {
    /// A GitHub URL found in the issue description.
    IssueUrl,
    /// The static team-to-repository mapping.
    TeamMapping,
    /// The globally configured default repository.
    Default,
}

/// Owner + name pair identifying where a fix is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryRef {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
    /// How this reference was resolved.
    pub source: RepoSource,
}

impl RepositoryRef {
    /// Parses an `owner/name` string.
    ///
    /// # Errors
    ///
    /// Returns an error if the format is invalid.
    pub fn parse(s: &str, source: RepoSource) -> Result<Self> {
        let (owner, name) = crate::github::parse_owner_repo(s)?;
        Ok(Self {
            owner,
            name,
            source,
        })
    }

    /// `owner/name`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
