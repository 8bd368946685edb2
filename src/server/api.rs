//! Router construction and server entry point

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use super::handlers::{
    delete_model, get_job, get_model, health_check, list_models, queue_status, store_model,
    submit_training,
};
use super::state::AppState;
use super::{Result, ServerError};

/// Build the API router over the given state
pub fn router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;
    Router::new()
        .route("/health", get(health_check))
        .route("/training", post(submit_training))
        .route("/training/:id", get(get_job))
        .route("/queue", get(queue_status))
        .route("/models", get(list_models).post(store_model))
        .route("/models/:id", get(get_model).delete(delete_model))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Bind and serve until shutdown
pub async fn serve(state: AppState) -> Result<()> {
    let address = state.config.address;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|e| ServerError::Bind(format!("{address}: {e}")))?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}
