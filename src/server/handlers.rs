//! HTTP request handlers for the REST API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{new_session_id, ApiState};
use crate::core::conversation::RoleCounts;
use crate::core::message::Turn;
use crate::core::notify::EmailResult;
use crate::core::session::TurnError;

/// Build all API routes.
pub fn api_routes() -> Router<ApiState> {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
        .route("/sessions/{id}/messages", post(post_message))
        .route("/sessions/{id}/turns", delete(purge_session))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionCreated {
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub id: String,
    pub turns: Vec<Turn>,
    pub counts: RoleCounts,
}

#[derive(Debug, Deserialize)]
pub struct PostMessage {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct MessageReply {
    pub reply: String,
    pub email: Option<EmailResult>,
    pub counts: RoleCounts,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
}

fn unknown_session(id: &str) -> (StatusCode, Json<ApiError>) {
    api_error(StatusCode::NOT_FOUND, format!("unknown session: {id}"))
}

async fn create_session(State(state): State<ApiState>) -> ApiResult<SessionCreated> {
    let id = new_session_id().map_err(|err| {
        api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("could not generate session id: {err}"),
        )
    })?;
    state.insert_session(&id);
    Ok(Json(SessionCreated { id }))
}

async fn get_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<SessionView> {
    let (turns, counts) = state
        .existing_session(&id)
        .map(|session| (session.turns(), session.counts()))
        .unwrap_or_default();
    Json(SessionView { id, turns, counts })
}

async fn post_message(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<PostMessage>,
) -> ApiResult<MessageReply> {
    let session = state
        .existing_session(&id)
        .ok_or_else(|| unknown_session(&id))?;
    match session.handle_turn(&body.content).await {
        Ok(outcome) => Ok(Json(MessageReply {
            reply: outcome.reply,
            email: outcome.email,
            counts: session.counts(),
        })),
        Err(err @ TurnError::EmptyInput) => Err(api_error(StatusCode::BAD_REQUEST, err.to_string())),
        Err(err @ TurnError::NotConfigured) => {
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, err.to_string()))
        }
    }
}

async fn purge_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Json<SessionView> {
    if let Some(session) = state.existing_session(&id) {
        session.purge().await;
    }
    Json(SessionView {
        id,
        turns: Vec::new(),
        counts: RoleCounts::default(),
    })
}

async fn delete_session(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ApiError>)> {
    if state.remove_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(unknown_session(&id))
    }
}

/// Returns basic health status and version.
pub(super) async fn health_check(State(state): State<ApiState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "chat_enabled": state.app.chat_enabled(),
        "sessions": state.session_count(),
    }))
}
