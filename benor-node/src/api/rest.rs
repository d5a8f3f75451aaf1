//! rest.rs
//!
//! Per-node REST surface: health probe, state introspection, vote ingress
//! and the start/stop control endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;
use tracing::warn;

use benor_common::{BenorError, NodeId, Value, Vote};
use benor_consensus::{ConsensusNode, StateSnapshot};

#[derive(Clone)]
pub struct AppState {
    pub node: Arc<ConsensusNode>,
}

/// Wire body of `POST /message`. `value` stays optional here so a `null`
/// or missing value can be rejected with a proper error payload instead of
/// a bare deserialization failure.
#[derive(Deserialize)]
struct VotePayload {
    #[serde(rename = "senderId")]
    sender_id: NodeId,
    #[serde(default)]
    value: Option<Value>,
    round: u64,
}

pub fn router(node: Arc<ConsensusNode>) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/state", get(get_state))
        .route("/message", post(post_message))
        .route("/start", get(get_start))
        .route("/stop", get(get_stop))
        .with_state(AppState { node })
}

/// Serves one node's API on an already-bound listener. Binding happens in
/// the launcher so the readiness gate only opens once every port is live.
pub async fn serve(node: Arc<ConsensusNode>, listener: TcpListener) -> std::io::Result<()> {
    axum::serve(listener, router(node)).await
}

async fn get_status(State(state): State<AppState>) -> (StatusCode, &'static str) {
    match state.node.health().await {
        Ok(()) => (StatusCode::OK, "live"),
        Err(BenorError::NodeFaulty) => (StatusCode::INTERNAL_SERVER_ERROR, "faulty"),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "stopped"),
    }
}

async fn get_state(State(state): State<AppState>) -> Json<StateSnapshot> {
    Json(state.node.snapshot().await)
}

async fn post_message(
    State(state): State<AppState>,
    payload: Result<Json<VotePayload>, JsonRejection>,
) -> (StatusCode, Json<serde_json::Value>) {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(
                "🚨 Node {} received a malformed vote: {}",
                state.node.id,
                rejection.body_text()
            );
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Invalid vote received" })),
            );
        }
    };

    let Some(value) = payload.value else {
        warn!(
            "🚨 Node {} received an invalid vote from node {}",
            state.node.id, payload.sender_id
        );
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Invalid vote received" })),
        );
    };

    let vote = Vote::new(payload.sender_id, value, payload.round);
    match state.node.handle_vote(vote).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Vote received" }))),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
    }
}

async fn get_start(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    match state.node.clone().start().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "message": "Consensus started" }))),
        Err(e) => (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() }))),
    }
}

async fn get_stop(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    state.node.kill().await;
    (StatusCode::OK, Json(json!({ "message": "Consensus stopped" })))
}
