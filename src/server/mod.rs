//! JSON HTTP API over chat sessions.
//!
//! Every session id maps to its own [`ChatSession`]; sessions never share a
//! conversation log. Only `POST /api/sessions` creates entries and
//! `DELETE /api/sessions/{id}` removes them. The presentation layer is
//! expected to live elsewhere.

mod handlers;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::core::app::AppContext;
use crate::core::session::ChatSession;

/// Shared state accessible by all API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub app: AppContext,
    sessions: Arc<Mutex<HashMap<String, Arc<ChatSession>>>>,
}

impl ApiState {
    pub fn new(app: AppContext) -> Self {
        Self {
            app,
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register a fresh session under `id`, replacing any previous one.
    pub fn insert_session(&self, id: &str) -> Arc<ChatSession> {
        let session = Arc::new(self.app.new_session());
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), session.clone());
        session
    }

    /// Existing session for `id`, without creating one.
    pub fn existing_session(&self, id: &str) -> Option<Arc<ChatSession>> {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Drop the session for `id`. Returns false when it did not exist.
    pub fn remove_session(&self, id: &str) -> bool {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Random 128-bit session id rendered as hex.
pub fn new_session_id() -> Result<String, getrandom::Error> {
    let mut bytes = [0u8; 16];
    getrandom::fill(&mut bytes)?;
    Ok(bytes.iter().map(|b| format!("{b:02x}")).collect())
}

/// Build the API router with all routes.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .nest("/api", handlers::api_routes())
        .route("/health", axum::routing::get(handlers::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until `shutdown` is cancelled.
pub async fn serve(
    app: AppContext,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");
    serve_on(listener, app, shutdown).await
}

pub async fn serve_on(
    listener: tokio::net::TcpListener,
    app: AppContext,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let router = build_router(ApiState::new(app));
    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
mod tests;
