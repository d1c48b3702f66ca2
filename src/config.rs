use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub switch: SwitchConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

/// Settlement switch peer endpoint and timing
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SwitchConfig {
    pub endpoint: String,
    pub request_timeout_ms: u64,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:4000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

/// Workflow pacing and acceptance behavior.
///
/// With `auto_accept_quotes` disabled, transfers pause at
/// `AWAITING_ACCEPTANCE` after quoting and must be resumed with a
/// `PUT /transfers/{id}`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct WorkflowConfig {
    pub auto_accept_party: bool,
    pub auto_accept_quotes: bool,
    /// Budget for each individual switch interaction
    pub stage_timeout_ms: u64,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            auto_accept_party: true,
            auto_accept_quotes: true,
            stage_timeout_ms: 30_000,
        }
    }
}

impl AppConfig {
    pub fn load(env: &str) -> Self {
        let config_path = format!("config/{}.yaml", env);
        let content = fs::read_to_string(&config_path)
            .unwrap_or_else(|_| panic!("Failed to read config file: {}", config_path));
        serde_yaml::from_str(&content).expect("Failed to parse config yaml")
    }
}
