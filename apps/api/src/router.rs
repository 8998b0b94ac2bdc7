use std::sync::Arc;

use axum::{
    Json,
    Router,
    routing::get,
};
use serde_json::{json, Value};

use appointment_cell::router::appointment_routes;
use auth_cell::router::auth_routes;
use prescription_cell::router::prescription_routes;
use review_cell::router::review_routes;
use shared_database::AppState;
use user_cell::router::user_routes;

async fn health() -> Json<Value> {
    Json(json!({
        "success": true,
        "message": "Veterinary clinic API is healthy"
    }))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .nest("/auth", auth_routes(state.clone()))
        .nest("/appointments", appointment_routes(state.clone()))
        .nest("/prescriptions", prescription_routes(state.clone()))
        .nest("/reviews", review_routes(state.clone()))
        .nest("/users", user_routes(state));

    Router::new()
        .route("/", get(|| async { "Veterinary clinic API is running!" }))
        .nest("/api", api)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    use shared_utils::test_utils::TestConfig;

    #[tokio::test]
    async fn health_endpoints_answer_without_auth() {
        let app = create_router(TestConfig::default().to_state());

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["success"], true);
    }

    #[tokio::test]
    async fn cell_routes_require_a_token() {
        let app = create_router(TestConfig::default().to_state());

        for uri in ["/api/appointments", "/api/prescriptions", "/api/reviews", "/api/users/doctors"] {
            let response = app
                .clone()
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
