// SPDX-License-Identifier: Apache-2.0

//! `POST /webhook` handler.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use autofix_core::pipeline::PipelineOutcome;
use autofix_core::{WebhookEvent, resolve_repository};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::AppState;
use crate::error::ApiError;
use crate::signature::{self, SIGNATURE_HEADER};

/// Body of every 200 response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// `ignored` or `processed`.
    pub status: &'static str,
    /// Short explanation.
    pub message: String,
    /// Pipeline outcome, present when the event was processed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<PipelineOutcome>,
}

impl WebhookResponse {
    fn ignored(message: impl Into<String>) -> Json<Self> {
        let message = message.into();
        debug!(reason = %message, "Ignoring webhook event");
        Json(Self {
            status: "ignored",
            message,
            outcome: None,
        })
    }
}

/// Verifies, filters and processes one Linear delivery.
pub(crate) async fn handle(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.secret {
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok());
        if !signature::verify(secret, &body, header) {
            warn!("Rejected webhook with invalid signature");
            return Err(ApiError::Unauthorized);
        }
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Malformed webhook payload: {e}")))?;

    if !event.is_issue_change() {
        return Ok(WebhookResponse::ignored(format!(
            "{} {} events are not handled",
            event.entity_type, event.action
        )));
    }

    let issue = event
        .issue()
        .map_err(|e| ApiError::BadRequest(format!("Malformed issue payload: {e}")))?;

    if !issue.has_label(&state.trigger_label) {
        return Ok(WebhookResponse::ignored(format!(
            "{} does not carry the '{}' label",
            issue.identifier, state.trigger_label
        )));
    }

    let repo = resolve_repository(&issue, &state.repos).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "Could not determine a repository for {}",
            issue.identifier
        ))
    })?;
    info!(issue = %issue.identifier, repo = %repo, source = ?repo.source, "Processing webhook");

    let task_state = Arc::clone(&state);
    let outcome = tokio::spawn(async move { task_state.pipeline.run(&issue, &repo).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Pipeline task failed: {e}")))?;

    Ok(Json(WebhookResponse {
        status: "processed",
        message: format!("{} finished as {:?}", outcome.issue, outcome.status),
        outcome: Some(outcome),
    }))
}
