//! HTTP API for the persona chatbot.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `POST /api/chat` - Answer a message given the prior history

mod routes;
pub mod types;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::agent::{persona_system_prompt, Agent};
use crate::config::Config;

pub use routes::{router, AppState};

/// Load the persona, build the agent and serve until the process is stopped.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let system_prompt = persona_system_prompt(&config)?;
    let agent = Agent::from_config(&config)?;

    tracing::info!(
        "Serving persona {} with {} tools",
        config.persona_name,
        agent.tools().len()
    );

    let shutdown = CancellationToken::new();
    let state = Arc::new(AppState {
        agent,
        system_prompt,
        shutdown: shutdown.clone(),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on {}", addr);

    tokio::spawn(cancel_on_ctrl_c(shutdown.clone()));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// In-flight chats observe the same token and end with `AgentError::Cancelled`.
async fn cancel_on_ctrl_c(shutdown: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested, cancelling in-flight chats"),
        Err(e) => {
            tracing::error!("Cannot listen for shutdown signal: {}", e);
            return;
        }
    }
    shutdown.cancel();
}
