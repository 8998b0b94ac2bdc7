use assert_matches::assert_matches;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use auth_cell::models::{AuthError, LoginRequest, SignupRequest, EMAIL_EXISTS};
use auth_cell::router::auth_routes;
use auth_cell::services::identity::IdentityService;
use shared_models::auth::Role;
use shared_utils::jwt::validate_token;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn signup_request(email: &str) -> SignupRequest {
    SignupRequest {
        name: "Dana Whitfield".to_string(),
        email: email.to_string(),
        password: "hunter22".to_string(),
        phone: Some("5557654321".to_string()),
        role: None,
        specialty: Some("Dermatology".to_string()),
    }
}

async fn send(app: Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn signup_issues_token_for_new_patient() {
    let config = TestConfig::default();
    let state = config.to_state();
    let service = IdentityService::new(&state);

    let session = service.signup(signup_request("  Dana@Example.com ")).await.unwrap();

    assert_eq!(session.user.email, "dana@example.com");
    assert_eq!(session.user.role, Role::Patient);
    assert!(session.user.specialty.is_none());
    assert_eq!(session.expires_in, 3600);

    let user = validate_token(&session.token, &config.jwt_secret).unwrap();
    assert_eq!(user.id, session.user.id);
}

#[tokio::test]
async fn duplicate_email_is_rejected_case_insensitively() {
    let state = TestConfig::default().to_state();
    let service = IdentityService::new(&state);

    service.signup(signup_request("dana@example.com")).await.unwrap();
    let err = service.signup(signup_request("DANA@example.com")).await.unwrap_err();

    assert_matches!(err, AuthError::EmailExists);
}

#[tokio::test]
async fn login_hides_which_credential_was_wrong() {
    let state = TestConfig::default().to_state();
    let service = IdentityService::new(&state);
    service.signup(signup_request("dana@example.com")).await.unwrap();

    let wrong_password = service
        .login(LoginRequest {
            email: "dana@example.com".to_string(),
            password: "not-the-one".to_string(),
        })
        .await
        .unwrap_err();
    let unknown_email = service
        .login(LoginRequest {
            email: "nobody@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap_err();

    assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    assert_matches!(wrong_password, AuthError::InvalidCredentials);

    let session = service
        .login(LoginRequest {
            email: "Dana@example.com".to_string(),
            password: "hunter22".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.email, "dana@example.com");
}

#[tokio::test]
async fn signup_route_returns_created_envelope() {
    let state = TestConfig::default().to_state();
    let app = auth_routes(state);

    let body = json!({
        "name": "Dr. Ortiz",
        "email": "ortiz@example.com",
        "password": "scalpel9",
        "role": "DOCTOR",
        "specialty": "Orthopedics"
    });
    let (status, value) = send(app.clone(), Method::POST, "/signup", None, Some(body.clone())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["user"]["role"], "DOCTOR");
    assert_eq!(value["data"]["user"]["specialty"], "Orthopedics");
    assert!(value["data"]["token"].is_string());
    assert!(value["data"]["user"].get("password_hash").is_none());

    let (status, value) = send(app, Method::POST, "/signup", None, Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(value["code"], EMAIL_EXISTS);
}

#[tokio::test]
async fn signup_route_reports_weak_password() {
    let state = TestConfig::default().to_state();
    let app = auth_routes(state);

    let body = json!({
        "name": "Dana Whitfield",
        "email": "dana@example.com",
        "password": "abc"
    });
    let (status, value) = send(app, Method::POST, "/signup", None, Some(body)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(value["success"], false);
    assert_eq!(value["code"], "WEAK_PASSWORD");
}

#[tokio::test]
async fn me_requires_a_live_account() {
    let config = TestConfig::default();
    let state = config.to_state();
    let app = auth_routes(state.clone());

    let (status, _) = send(app.clone(), Method::GET, "/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let ghost = TestUser::patient("ghost@example.com");
    let token = ghost.token(&config.jwt_secret);
    let (status, value) = send(app.clone(), Method::GET, "/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(value["message"], "User not found");

    let service = IdentityService::new(&state);
    let session = service.signup(signup_request("dana@example.com")).await.unwrap();
    let (status, value) = send(app.clone(), Method::GET, "/me", Some(&session.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["data"]["user"]["email"], "dana@example.com");

    let (status, value) = send(app, Method::POST, "/logout", Some(&session.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["message"], "Logout successful");
}

#[tokio::test]
async fn token_introspection() {
    let config = TestConfig::default();
    let app = auth_routes(config.to_state());
    let user = TestUser::doctor("vet@example.com");

    let token = JwtTestUtils::create_test_token(&user, &config.jwt_secret, Some(1));
    let (status, value) = send(app.clone(), Method::POST, "/validate", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["valid"], true);
    assert_eq!(value["role"], "DOCTOR");

    let expired = JwtTestUtils::create_expired_token(&user, &config.jwt_secret);
    let (status, _) = send(app.clone(), Method::POST, "/validate", Some(&expired), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, value) = send(app.clone(), Method::POST, "/verify", Some(&expired), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["valid"], false);

    let (status, _) = send(app, Method::POST, "/verify", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
