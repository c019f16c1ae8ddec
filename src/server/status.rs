use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::mpsc;

use crate::types::{SharedState, StatusSnapshot};
use crate::vote::VoteRequest;

#[derive(Clone)]
pub struct StatusState {
    pub token: String,
    pub state: SharedState,
    pub vote_tx: mpsc::Sender<VoteRequest>,
}

/// Axum middleware: require `Authorization: Bearer <token>` header.
pub async fn require_bearer_token(
    State(status): State<StatusState>,
    req: Request,
    next: Next,
) -> Response {
    let auth = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match auth {
        Some(value) if value == format!("Bearer {}", status.token) => next.run(req).await,
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

pub async fn get_status(State(status): State<StatusState>) -> Json<StatusSnapshot> {
    let snapshot = status.state.lock().snapshot();
    Json(snapshot)
}

pub async fn post_vote(
    State(status): State<StatusState>,
    Json(request): Json<VoteRequest>,
) -> StatusCode {
    let vote_type = request.vote_type();
    match status.vote_tx.try_send(request) {
        Ok(()) => {
            tracing::info!("queued {} vote", vote_type.as_str());
            StatusCode::ACCEPTED
        }
        Err(e) => {
            tracing::warn!("vote queue unavailable: {e}");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
