// SPDX-License-Identifier: Apache-2.0

//! Linear integration module.
//!
//! [`IssueTracker`] is the seam the pipeline reports back through;
//! [`LinearClient`] implements it with GraphQL over `reqwest`.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};

pub mod webhook;

pub use webhook::{IssueData, LabelData, WebhookEvent};

use crate::error::AutofixError;
use crate::issue::{Issue, TeamRef};

const ISSUE_QUERY: &str = r"query Issue($id: String!) {
  issue(id: $id) {
    id
    identifier
    title
    description
    priority
    url
    labels { nodes { name } }
    team { id key name }
  }
}";

const COMMENT_MUTATION: &str = r"mutation CommentCreate($issueId: String!, $body: String!) {
  commentCreate(input: { issueId: $issueId, body: $body }) {
    success
  }
}";

/// Issue-tracker operations needed by the pipeline.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetches an issue by its human-facing identifier (e.g., "ENG-42").
    async fn fetch_issue(&self, identifier: &str) -> Result<Issue>;

    /// Posts a markdown comment on `issue`.
    async fn post_comment(&self, issue: &Issue, body: &str) -> Result<()>;
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct IssueQueryData {
    issue: Option<IssueNode>,
}

#[derive(Debug, Deserialize)]
struct IssueNode {
    id: String,
    identifier: String,
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    priority: Option<f64>,
    url: String,
    labels: LabelConnection,
    team: Option<TeamRef>,
}

#[derive(Debug, Deserialize)]
struct LabelConnection {
    nodes: Vec<LabelData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentCreateData {
    comment_create: CommentCreatePayload,
}

#[derive(Debug, Deserialize)]
struct CommentCreatePayload {
    success: bool,
}

impl From<IssueNode> for Issue {
    fn from(node: IssueNode) -> Self {
        Issue::builder()
            .tracker_id(node.id)
            .identifier(node.identifier)
            .title(node.title)
            .description(node.description.unwrap_or_default())
            .priority(webhook::priority_level(node.priority))
            .labels(node.labels.nodes.into_iter().map(|l| l.name).collect())
            .url(node.url)
            .maybe_team(node.team)
            .build()
    }
}

/// Linear GraphQL client.
#[derive(Debug, Clone)]
pub struct LinearClient {
    http: Client,
    api_url: String,
    api_key: SecretString,
}

impl LinearClient {
    /// Creates a client for the GraphQL endpoint at `api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_url: &str, api_key: SecretString, timeout_seconds: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.to_string(),
            api_key,
        })
    }

    async fn graphql<T: DeserializeOwned>(&self, query: &str, variables: Value) -> Result<T> {
        let response = self
            .http
            .post(&self.api_url)
            .header("Authorization", self.api_key.expose_secret())
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(AutofixError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AutofixError::Linear {
                message: format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    crate::utils::truncate(&body, 500)
                ),
            }
            .into());
        }

        let envelope: GraphQlResponse<T> = response
            .json()
            .await
            .context("Failed to parse Linear API response")?;
        decode_envelope(envelope)
    }
}

fn decode_envelope<T>(envelope: GraphQlResponse<T>) -> Result<T> {
    if !envelope.errors.is_empty() {
        let messages: Vec<_> = envelope.errors.into_iter().map(|e| e.message).collect();
        return Err(AutofixError::Linear {
            message: messages.join("; "),
        }
        .into());
    }
    envelope.data.ok_or_else(|| {
        AutofixError::Linear {
            message: "Response contained no data".to_string(),
        }
        .into()
    })
}

#[async_trait]
impl IssueTracker for LinearClient {
    #[instrument(skip(self))]
    async fn fetch_issue(&self, identifier: &str) -> Result<Issue> {
        debug!("Fetching issue from Linear");
        let data: IssueQueryData = self
            .graphql(ISSUE_QUERY, json!({ "id": identifier }))
            .await?;
        let node = data.issue.ok_or_else(|| AutofixError::Linear {
            message: format!("Issue {identifier} not found"),
        })?;
        Ok(node.into())
    }

    #[instrument(skip(self, issue, body), fields(issue = %issue.identifier))]
    async fn post_comment(&self, issue: &Issue, body: &str) -> Result<()> {
        let issue_id = issue
            .tracker_id
            .as_deref()
            .context("Issue has no tracker id; cannot comment")?;

        let data: CommentCreateData = self
            .graphql(
                COMMENT_MUTATION,
                json!({ "issueId": issue_id, "body": body }),
            )
            .await?;
        if !data.comment_create.success {
            return Err(AutofixError::Linear {
                message: format!("commentCreate was rejected for {}", issue.identifier),
            }
            .into());
        }

        debug!("Comment posted");
        Ok(())
    }
}
