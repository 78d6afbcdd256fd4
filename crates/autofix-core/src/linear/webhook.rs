// SPDX-License-Identifier: Apache-2.0

//! Linear webhook payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::issue::{Issue, TeamRef};

/// Actions that can trigger a fix.
const FIX_ACTIONS: &[&str] = &["create", "update"];

/// A webhook delivery envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event action ("create", "update", "remove").
    pub action: String,
    /// Entity type ("Issue", "Comment", ...).
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Entity payload; its shape depends on `entity_type`.
    #[serde(default)]
    pub data: Value,
}

/// A label as delivered in issue payloads.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelData {
    /// Label name.
    pub name: String,
}

/// Issue fields of an `Issue` webhook payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueData {
    /// Tracker-internal id.
    pub id: String,
    /// Human-facing identifier.
    pub identifier: String,
    /// Title.
    pub title: String,
    /// Markdown description.
    #[serde(default)]
    pub description: Option<String>,
    /// Priority (0-4, delivered as a number).
    #[serde(default)]
    pub priority: Option<f64>,
    /// Canonical URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Labels currently on the issue.
    #[serde(default)]
    pub labels: Vec<LabelData>,
    /// Owning team.
    #[serde(default)]
    pub team: Option<TeamRef>,
    /// Owning team id, present even when `team` is not expanded.
    #[serde(default)]
    pub team_id: Option<String>,
}

/// Clamps Linear's numeric priority to 0 (none) through 4 (low).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn priority_level(priority: Option<f64>) -> u8 {
    priority.map_or(0, |p| p.round().clamp(0.0, 4.0) as u8)
}

impl WebhookEvent {
    /// Whether this is an issue creation or update.
    #[must_use]
    pub fn is_issue_change(&self) -> bool {
        self.entity_type == "Issue" && FIX_ACTIONS.contains(&self.action.as_str())
    }

    /// Decodes the issue carried by this event.
    ///
    /// # Errors
    ///
    /// Returns an error if `data` is not a well-formed issue payload.
    pub fn issue(&self) -> serde_json::Result<Issue> {
        let data = IssueData::deserialize(&self.data)?;
        Ok(data.into())
    }
}

impl From<IssueData> for Issue {
    fn from(data: IssueData) -> Self {
        let team = data.team.or_else(|| {
            data.team_id.map(|id| TeamRef {
                id,
                key: String::new(),
                name: String::new(),
            })
        });

        Issue::builder()
            .tracker_id(data.id)
            .identifier(data.identifier)
            .title(data.title)
            .description(data.description.unwrap_or_default())
            .priority(priority_level(data.priority))
            .labels(data.labels.into_iter().map(|l| l.name).collect())
            .url(data.url.unwrap_or_default())
            .maybe_team(team)
            .build()
    }
}
