pub mod status;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use status::StatusState;

pub fn build_status_router(status_state: StatusState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any);

    Router::new()
        .route("/status", get(status::get_status))
        .route("/vote", post(status::post_vote))
        .layer(middleware::from_fn_with_state(
            status_state.clone(),
            status::require_bearer_token,
        ))
        .layer(cors)
        .with_state(status_state)
}
