//! Shared harness for HTTP integration tests.
//!
//! Builds the production router over the in-memory store, a recording mailer
//! and a scripted identity provider, so no database or network is needed.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use passgate_api::auth::oauth::{ExternalIdentity, GoogleConfig, IdentityProvider, ProviderError};
use passgate_api::config::{RateLimitConfig, ServerConfig};
use passgate_api::email::{EmailError, Mailer};
use passgate_api::router::build_app_router;
use passgate_api::state::AppState;
use passgate_db::{MemoryStore, Repositories};
use tokio::sync::Mutex;
use tower::ServiceExt;

pub const BASE_URL: &str = "http://passgate.test";

/// Build a test `ServerConfig` with safe defaults and a generous rate limit.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_url: BASE_URL.to_string(),
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        rate_limit: RateLimitConfig {
            per_second: 1_000,
            burst: 1_000,
            trust_forwarded: true,
        },
        google: GoogleConfig::default(),
        email: None,
    }
}

// ---------------------------------------------------------------------------
// Collaborator fakes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl SentEmail {
    /// The `token=` query value of the link in the body.
    pub fn token(&self) -> String {
        let start = self.body.find("token=").expect("email carries a token link") + "token=".len();
        self.body[start..]
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect()
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingMailer {
    pub async fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), EmailError> {
        self.sent.lock().await.push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: html_body.to_string(),
        });
        Ok(())
    }
}

/// Identity provider answering every code with a fixed identity.
pub struct ScriptedProvider {
    pub identity: Option<ExternalIdentity>,
}

#[async_trait]
impl IdentityProvider for ScriptedProvider {
    fn authorization_url(&self, state: &str) -> Result<String, ProviderError> {
        Ok(format!("https://accounts.example.test/auth?state={state}"))
    }

    async fn exchange_code(&self, code: &str) -> Result<String, ProviderError> {
        if code.is_empty() {
            return Err(ProviderError::Rejected {
                status: 400,
                body: "invalid_grant".into(),
            });
        }
        Ok(format!("access-{code}"))
    }

    async fn fetch_identity(&self, _access_token: &str) -> Result<ExternalIdentity, ProviderError> {
        self.identity
            .clone()
            .ok_or_else(|| ProviderError::Malformed("no identity scripted".into()))
    }
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with(test_config(), None)
    }

    pub fn with_identity(email: &str, name: &str) -> Self {
        Self::with(
            test_config(),
            Some(ExternalIdentity {
                email: email.to_string(),
                name: name.to_string(),
            }),
        )
    }

    pub fn with(config: ServerConfig, identity: Option<ExternalIdentity>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::assemble(
            config,
            Repositories::in_memory(store.clone()),
            mailer.clone(),
            Arc::new(ScriptedProvider { identity }),
        );
        let router = build_app_router(state).expect("test config is valid");
        Self {
            router,
            store,
            mailer,
        }
    }

    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::get(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::post(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register a user through the API and return its session token.
pub async fn register(app: Router, email: &str, password: &str, name: &str) -> String {
    let response = post_json(
        app,
        "/api/v1/register",
        serde_json::json!({ "email": email, "password": password, "name": name }),
    )
    .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    body_json(response).await["data"]["token"]
        .as_str()
        .expect("token in data")
        .to_string()
}
