//! HTTP gateway: router construction and server startup.

pub mod handlers;
pub mod normalize;
pub mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub use normalize::{NormalizedError, normalize};
pub use state::AppState;

/// Build the outbound API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/transfers", post(handlers::post_transfers))
        .route("/transfers/{transfer_id}", put(handlers::put_transfers))
        .route("/accounts", post(handlers::post_accounts))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("outbound gateway listening on http://{addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
