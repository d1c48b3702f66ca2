use std::sync::Arc;

use anyhow::Context;

use outbound_gateway::config::AppConfig;
use outbound_gateway::gateway::{self, AppState};
use outbound_gateway::logging;
use outbound_gateway::store::InMemoryStore;
use outbound_gateway::switch::HttpSwitchClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());
    let config = AppConfig::load(&env);

    // Guard must stay alive for the process lifetime
    let _log_guard = logging::init_logging(&config);
    tracing::info!(
        env = %env,
        switch = %config.switch.endpoint,
        auto_accept_quotes = config.workflow.auto_accept_quotes,
        "starting outbound gateway v{}",
        env!("CARGO_PKG_VERSION")
    );

    let switch = Arc::new(
        HttpSwitchClient::new(&config.switch).context("failed to build switch client")?,
    );
    let store = Arc::new(InMemoryStore::new());
    let state = Arc::new(AppState::new(store, switch, config.workflow.clone()));

    gateway::run_server(&config.gateway.host, config.gateway.port, state).await
}
