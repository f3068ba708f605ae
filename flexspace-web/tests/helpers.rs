//! Shared fixtures for the API integration tests
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use flexspace_applications::StorageBackend;
use flexspace_web::auth::email::RecordingNotifier;
use flexspace_web::{create_app, AppState};
use flexspace_core::FlexSpaceConfig;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::{Arc, LazyLock};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@flexspace.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

// Ensure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// In-process application over in-memory storage
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub outbox: RecordingNotifier,
    pub uploads: TempDir,
}

impl TestApp {
    pub async fn new() -> Self {
        LazyLock::force(&TRACING);

        let uploads = tempfile::tempdir().unwrap();
        let mut config = FlexSpaceConfig::default();
        config.server.upload_dir = uploads.path().to_path_buf();

        let outbox = RecordingNotifier::new();
        let state = AppState::with_parts(
            config,
            StorageBackend::memory(),
            Arc::new(outbox.clone()),
        );
        state
            .users
            .ensure_admin("Admin", ADMIN_EMAIL, ADMIN_PASSWORD)
            .await
            .unwrap();

        Self {
            router: create_app(state.clone()),
            state,
            outbox,
            uploads,
        }
    }

    /// Send one request; an empty response body comes back as `Value::Null`
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(create_request(method, uri, body, token))
            .await
            .unwrap();
        let status = response.status();
        (status, extract_json(response).await)
    }

    pub async fn register(&self, name: &str, email: &str, password: &str) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/api/auth/register",
                Some(json!({ "name": name, "email": email, "password": password })),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.request(
            "POST",
            "/api/auth/login",
            Some(json!({ "email": email, "password": password })),
            None,
        )
        .await
    }

    /// Register a fresh user and return their access token and id
    pub async fn user_token(&self, email: &str) -> (String, i64) {
        let body = self.register("Test User", email, "password1").await;
        (
            body["accessToken"].as_str().unwrap().to_string(),
            body["user"]["id"].as_i64().unwrap(),
        )
    }

    pub async fn admin_token(&self) -> String {
        let (status, body) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(status, StatusCode::OK);
        body["accessToken"].as_str().unwrap().to_string()
    }

    pub async fn create_room(&self, admin_token: &str, slug: &str, price_hour: f64) -> Value {
        let (status, body) = self
            .request(
                "POST",
                "/api/rooms",
                Some(json!({
                    "slug": slug,
                    "name": format!("Room {}", slug),
                    "type": "meeting",
                    "capacity": 6,
                    "priceHour": price_hour,
                    "amenities": ["wifi", "whiteboard"]
                })),
                Some(admin_token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create room failed: {}", body);
        body
    }

    /// Token version embedded in an access token
    pub fn token_version(&self, access_token: &str) -> i64 {
        self.state
            .tokens
            .verify_access(access_token)
            .unwrap()
            .token_version
    }
}

pub fn create_request(
    method: &str,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }

    if let Some(body) = body {
        builder = builder.header("Content-Type", "application/json");
        builder
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    }
}

pub async fn extract_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Application served on a real socket, for multipart and static file tests
pub struct SpawnedApp {
    pub address: String,
    pub client: reqwest::Client,
    pub app: TestApp,
}

pub async fn spawn_app() -> SpawnedApp {
    let app = TestApp::new().await;

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let router = app.router.clone();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    SpawnedApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        app,
    }
}
