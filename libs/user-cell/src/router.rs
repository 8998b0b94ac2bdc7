use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, put},
    Router,
};

use shared_database::AppState;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn user_routes(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route("/doctors", get(handlers::list_doctors))
        .route("/patients", get(handlers::list_patients))
        .route(
            "/{user_id}",
            get(handlers::get_user)
                .put(handlers::update_profile)
                .delete(handlers::delete_account),
        )
        .route("/{user_id}/password", put(handlers::update_password))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(protected_routes)
        .with_state(state)
}
