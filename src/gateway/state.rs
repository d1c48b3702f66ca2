//! Gateway shared state.
//!
//! Controllers are constructed per request from these injected collaborators;
//! nothing is read from ambient globals.

use std::sync::Arc;

use crate::config::WorkflowConfig;
use crate::store::{RunRegistry, WorkflowStore};
use crate::switch::SwitchClient;

#[derive(Clone)]
pub struct AppState {
    /// Workflow state persistence, shared across requests and stages
    pub store: Arc<dyn WorkflowStore>,
    /// Settlement switch client
    pub switch: Arc<dyn SwitchClient>,
    /// At-most-one-concurrent-run bookkeeping per workflow identifier
    pub runs: RunRegistry,
    pub workflow: WorkflowConfig,
}

impl AppState {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        switch: Arc<dyn SwitchClient>,
        workflow: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            switch,
            runs: RunRegistry::new(),
            workflow,
        }
    }
}
