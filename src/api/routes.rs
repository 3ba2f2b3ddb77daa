//! HTTP routes.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use super::types::{ChatReply, ChatRequest, ErrorResponse, HealthResponse};
use crate::agent::{Agent, AgentError};
use crate::llm::LlmError;

/// Shared state for all handlers.
pub struct AppState {
    pub agent: Agent,
    /// System prompt, built once from the persona at startup
    pub system_prompt: String,
    /// Cancelled when the server shuts down; every chat runs under a child token
    pub shutdown: CancellationToken,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn chat(
    State(state): State<Arc<AppState>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            tracing::warn!("Rejected chat request: {}", rejection.body_text());
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid chat request: {}", rejection.body_text()),
            );
        }
    };

    if request.message.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Please enter a message.".to_string());
    }

    let history = request.history_messages();
    let cancel = state.shutdown.child_token();

    match state
        .agent
        .chat(&state.system_prompt, &history, &request.message, &cancel)
        .await
    {
        Ok(outcome) => Json(ChatReply {
            reply: outcome.content,
            rounds: outcome.rounds,
        })
        .into_response(),
        Err(e) => {
            tracing::error!("Chat failed: {}", e);
            error_response(status_for(&e), e.user_message())
        }
    }
}

fn status_for(err: &AgentError) -> StatusCode {
    match err {
        AgentError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        AgentError::Provider(LlmError::RateLimited(_)) => StatusCode::TOO_MANY_REQUESTS,
        AgentError::Provider(_) => StatusCode::BAD_GATEWAY,
        AgentError::LoopBudgetExceeded { .. } => StatusCode::GATEWAY_TIMEOUT,
        AgentError::Cancelled { .. } => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorResponse { error: message })).into_response()
}
