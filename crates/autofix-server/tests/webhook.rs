// SPDX-License-Identifier: Apache-2.0

//! Webhook router driven in-process with fake services.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use autofix_core::config::GitHubConfig;
use autofix_core::context::CommitRecord;
use autofix_core::{
    AiProvider, CodeHost, GitBackend, Issue, IssueTracker, Pipeline, PipelineSettings,
    PullRequestRef, ReposConfig, RepositoryRef,
};
use autofix_server::signature::{SIGNATURE_HEADER, sign};
use autofix_server::{AppState, router};
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

const FIX_REPLY: &str = r#"{"reasoning":"'Helo' is misspelled","description":"Correct the greeting","changes":[{"path":"src/a.ts","content":"export const greeting = 'Hello';\n"}]}"#;

/// Counts every outbound call across all fakes.
#[derive(Default)]
struct Calls {
    ai: AtomicUsize,
    prs: AtomicUsize,
    comments: AtomicUsize,
    git: AtomicUsize,
}

impl Calls {
    fn total(&self) -> usize {
        self.ai.load(Ordering::SeqCst)
            + self.prs.load(Ordering::SeqCst)
            + self.comments.load(Ordering::SeqCst)
            + self.git.load(Ordering::SeqCst)
    }
}

struct FakeAi {
    calls: Arc<Calls>,
    panic: bool,
}

#[async_trait]
impl AiProvider for FakeAi {
    fn name(&self) -> &str {
        "fake"
    }

    fn model(&self) -> &str {
        "fake-model"
    }

    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        self.calls.ai.fetch_add(1, Ordering::SeqCst);
        assert!(!self.panic, "provider exploded");
        Ok(FIX_REPLY.to_string())
    }
}

struct FakeHost(Arc<Calls>);

#[async_trait]
impl CodeHost for FakeHost {
    async fn open_pull_request(
        &self,
        repo: &RepositoryRef,
        _head: &str,
        _base: &str,
        _title: &str,
        _body: &str,
    ) -> Result<PullRequestRef> {
        self.0.prs.fetch_add(1, Ordering::SeqCst);
        Ok(PullRequestRef {
            number: 1,
            url: format!("https://github.com/{}/pull/1", repo.full_name()),
        })
    }
}

struct FakeTracker(Arc<Calls>);

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn fetch_issue(&self, identifier: &str) -> Result<Issue> {
        anyhow::bail!("no issue {identifier}")
    }

    async fn post_comment(&self, _issue: &Issue, _body: &str) -> Result<()> {
        self.0.comments.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct FakeGit(Arc<Calls>);

#[async_trait]
impl GitBackend for FakeGit {
    async fn sync_checkout(&self, _repo: &RepositoryRef, dest: &Path, _base: &str) -> Result<()> {
        self.0.git.fetch_add(1, Ordering::SeqCst);
        std::fs::create_dir_all(dest.join("src"))?;
        std::fs::write(dest.join("src/a.ts"), "export const greeting = 'Helo';\n")?;
        Ok(())
    }

    async fn recent_commits(&self, _checkout: &Path, _limit: usize) -> Result<Vec<CommitRecord>> {
        Ok(Vec::new())
    }

    async fn create_branch(&self, _checkout: &Path, _branch: &str) -> Result<()> {
        self.0.git.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn commit(&self, _checkout: &Path, _paths: &[String], _message: &str) -> Result<String> {
        self.0.git.fetch_add(1, Ordering::SeqCst);
        Ok("deadbeef".to_string())
    }

    async fn push(&self, _checkout: &Path, _branch: &str) -> Result<()> {
        self.0.git.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct Server {
    app: axum::Router,
    calls: Arc<Calls>,
    _workspace: tempfile::TempDir,
}

fn server(secret: Option<&str>, default_repo: Option<&str>, panic: bool) -> Server {
    let calls = Arc::new(Calls::default());
    let workspace = tempfile::tempdir().unwrap();
    let pipeline = Pipeline::builder()
        .ai(Arc::new(FakeAi {
            calls: calls.clone(),
            panic,
        }))
        .host(Arc::new(FakeHost(calls.clone())))
        .tracker(Arc::new(FakeTracker(calls.clone())))
        .git(Arc::new(FakeGit(calls.clone())))
        .settings(PipelineSettings {
            github: GitHubConfig::default(),
            notes_path: "AGENTS.md".to_string(),
            workspace_dir: workspace.path().to_path_buf(),
            token_budget: 100_000,
            dry_run: false,
        })
        .build();

    let state = Arc::new(AppState {
        pipeline,
        repos: ReposConfig {
            default: default_repo.map(str::to_string),
            teams: HashMap::from([("ENG".to_string(), "acme/web".to_string())]),
            workspace_dir: None,
        },
        trigger_label: "autofix".to_string(),
        secret: secret.map(SecretString::from),
    });

    Server {
        app: router(state),
        calls,
        _workspace: workspace,
    }
}

fn event(labels: &[&str], team_key: &str, description: &str) -> Value {
    json!({
        "action": "update",
        "type": "Issue",
        "data": {
            "id": "uuid-7",
            "identifier": "ENG-7",
            "title": "Fix typo",
            "description": description,
            "priority": 2,
            "url": "https://linear.app/acme/issue/ENG-7",
            "labels": labels.iter().map(|name| json!({ "name": name })).collect::<Vec<_>>(),
            "team": { "id": "t-1", "key": team_key, "name": "Engineering" }
        }
    })
}

fn post(body: &[u8], signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header(SIGNATURE_HEADER, sig);
    }
    builder.body(Body::from(body.to_vec())).unwrap()
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn non_post_is_method_not_allowed() {
    let s = server(None, Some("acme/web"), false);
    let request = Request::builder()
        .method("GET")
        .uri("/webhook")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&s.app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(s.calls.total(), 0);
}

#[tokio::test]
async fn bad_signature_is_unauthorized() {
    let s = server(Some("whsec"), Some("acme/web"), false);
    let body = event(&["autofix"], "ENG", "File: src/a.ts").to_string();

    let (status, _) = send(&s.app, post(body.as_bytes(), None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let wrong = sign(&SecretString::from("other"), body.as_bytes());
    let (status, json) = send(&s.app, post(body.as_bytes(), Some(&wrong))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "Invalid webhook signature");
    assert_eq!(s.calls.total(), 0);
}

#[tokio::test]
async fn unlabeled_issue_is_ignored_without_outbound_calls() {
    let s = server(None, Some("acme/web"), false);
    let body = event(&["bug"], "ENG", "File: src/a.ts").to_string();
    let (status, json) = send(&s.app, post(body.as_bytes(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ignored");
    assert_eq!(s.calls.total(), 0);
}

#[tokio::test]
async fn non_issue_events_are_ignored() {
    let s = server(None, Some("acme/web"), false);
    let body = json!({ "action": "create", "type": "Comment", "data": {} }).to_string();
    let (status, json) = send(&s.app, post(body.as_bytes(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ignored");
    assert_eq!(s.calls.total(), 0);
}

#[tokio::test]
async fn malformed_payload_is_bad_request() {
    let s = server(None, Some("acme/web"), false);
    let (status, json) = send(&s.app, post(b"{not json", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("Malformed"));
    assert_eq!(s.calls.total(), 0);
}

#[tokio::test]
async fn unresolvable_repository_is_bad_request() {
    let s = server(None, None, false);
    let body = event(&["autofix"], "OPS", "No links here").to_string();
    let (status, json) = send(&s.app, post(body.as_bytes(), None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(
        json["error"]
            .as_str()
            .unwrap()
            .contains("Could not determine a repository for ENG-7")
    );
    assert_eq!(s.calls.total(), 0);
}

#[tokio::test]
async fn signed_labeled_issue_is_processed() {
    let s = server(Some("whsec"), None, false);
    let body = event(
        &["AutoFix"],
        "ENG",
        "File: src/a.ts says 'Helo' should be 'Hello'",
    )
    .to_string();
    let sig = sign(&SecretString::from("whsec"), body.as_bytes());

    let (status, json) = send(&s.app, post(body.as_bytes(), Some(&sig))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "processed");
    let outcome = &json["outcome"];
    assert_eq!(outcome["status"], "fixed");
    assert_eq!(outcome["repository"]["owner"], "acme");
    assert_eq!(outcome["repository"]["name"], "web");
    assert_eq!(outcome["repository"]["source"], "team_mapping");
    assert_eq!(outcome["applied"]["branch"], "autofix/eng-7");
    assert_eq!(outcome["comment_posted"], true);

    assert_eq!(s.calls.ai.load(Ordering::SeqCst), 1);
    assert_eq!(s.calls.prs.load(Ordering::SeqCst), 1);
    assert_eq!(s.calls.comments.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn url_in_description_beats_team_mapping() {
    let s = server(None, Some("acme/fallback"), false);
    let body = event(
        &["autofix"],
        "ENG",
        "Broken in https://github.com/acme/api/blob/main/src/a.ts",
    )
    .to_string();
    let (status, json) = send(&s.app, post(body.as_bytes(), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["outcome"]["repository"]["name"], "api");
}

#[tokio::test]
async fn pipeline_panic_is_internal_error() {
    let s = server(None, Some("acme/web"), true);
    let body = event(&["autofix"], "ENG", "File: src/a.ts").to_string();
    let (status, json) = send(&s.app, post(body.as_bytes(), None)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().starts_with("Internal error"));
}

#[tokio::test]
async fn health_reports_ok() {
    let s = server(None, None, false);
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&s.app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!({ "status": "ok" }));
}
