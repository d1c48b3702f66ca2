//! Outbound Transfer Gateway
//!
//! HTTP boundary over resumable, multi-stage transfer workflows that
//! coordinate asynchronously with an external settlement switch.
//!
//! # Modules
//!
//! - [`workflow`] - transfer and accounts workflow controllers, stages, errors
//! - [`store`] - workflow state persistence and the per-id run registry
//! - [`switch`] - settlement switch client (HTTP + scripted mock)
//! - [`gateway`] - axum router, handlers, error normalization
//! - [`config`] - YAML-backed process configuration
//! - [`logging`] - tracing setup

pub mod config;
pub mod gateway;
pub mod logging;
pub mod store;
pub mod switch;
pub mod workflow;

// Convenient re-exports at crate root
pub use config::{AppConfig, SwitchConfig, WorkflowConfig};
pub use gateway::{AppState, NormalizedError, create_router, run_server};
pub use store::{InMemoryStore, RunRegistry, StoreError, WorkflowStore};
pub use switch::{HttpSwitchClient, MockSwitch, SwitchClient, SwitchError};
pub use workflow::{
    AccountSpec, AccountsStage, AccountsState, AccountsWorkflow, TransferRequest, TransferStage,
    TransferState, TransferWorkflow, WorkflowError, WorkflowId,
};
