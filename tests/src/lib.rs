//! In-process client for driving the full API router in tests.

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use shared_utils::test_utils::TestConfig;
use vetclinic_api::router::create_router;

/// A decoded response: status plus JSON body (`Null` when empty).
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// Test client with authentication capabilities
#[derive(Clone)]
pub struct ApiTestClient {
    app: Router,
    auth_token: Option<String>,
}

impl ApiTestClient {
    /// Fresh router over empty in-memory tables.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    pub fn with_config(config: TestConfig) -> Self {
        Self {
            app: create_router(config.to_state()),
            auth_token: None,
        }
    }

    /// Another client against the same server, unauthenticated.
    pub fn anonymous(&self) -> Self {
        Self {
            app: self.app.clone(),
            auth_token: None,
        }
    }

    pub fn token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Registers an account through `/api/auth/signup` and returns a client
    /// holding its session token.
    pub async fn signup(&self, name: &str, email: &str, role: &str, specialty: Option<&str>) -> (Self, Value) {
        let response = self
            .anonymous()
            .post(
                "/api/auth/signup",
                json!({
                    "name": name,
                    "email": email,
                    "password": "correct-horse",
                    "role": role,
                    "specialty": specialty,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "signup failed: {}", response.body);

        let user = response.data()["user"].clone();
        let token = response.data()["token"].as_str().map(str::to_string);
        (
            Self {
                app: self.app.clone(),
                auth_token: token,
            },
            user,
        )
    }

    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ApiResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = &self.auth_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request should build");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        ApiResponse { status, body }
    }

    pub async fn get(&self, path: &str) -> ApiResponse {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&self, path: &str, body: Value) -> ApiResponse {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put(&self, path: &str, body: Value) -> ApiResponse {
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> ApiResponse {
        self.request(Method::DELETE, path, None).await
    }
}

impl Default for ApiTestClient {
    fn default() -> Self {
        Self::new()
    }
}
