//! Accounts (participant provisioning) workflow controller.
//!
//! Single-shot: provisions every account specification in order and returns
//! the aggregate per-account outcome. No pause/resume semantics.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::store::WorkflowStore;
use crate::switch::SwitchClient;

use super::error::WorkflowError;
use super::state::{AccountsStage, LastError};
use super::types::WorkflowId;

/// One participant account to provision at the switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSpec {
    pub id_type: String,
    pub id_value: String,
    pub currency: String,
}

/// Per-account provisioning outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResult {
    pub id_type: String,
    pub id_value: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<LastError>,
}

/// Aggregate state of one provisioning workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountsState {
    pub workflow_id: WorkflowId,
    pub stage: AccountsStage,
    pub accounts: Vec<AccountSpec>,
    pub results: Vec<AccountResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AccountsState {
    fn new(workflow_id: WorkflowId, accounts: Vec<AccountSpec>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            workflow_id,
            stage: AccountsStage::Created,
            accounts,
            results: Vec::new(),
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

pub(crate) fn store_key(id: WorkflowId) -> String {
    format!("accounts_{id}")
}

pub struct AccountsWorkflow {
    store: Arc<dyn WorkflowStore>,
    switch: Arc<dyn SwitchClient>,
    config: WorkflowConfig,
    state: Option<AccountsState>,
}

impl AccountsWorkflow {
    pub fn new(
        store: Arc<dyn WorkflowStore>,
        switch: Arc<dyn SwitchClient>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            store,
            switch,
            config,
            state: None,
        }
    }

    pub fn state(&self) -> Option<&AccountsState> {
        self.state.as_ref()
    }

    /// Construct workflow state seeded with the account specifications and
    /// persist the initial record.
    pub async fn initialize(&mut self, accounts: Vec<AccountSpec>) -> Result<(), WorkflowError> {
        if accounts.is_empty() {
            return Err(WorkflowError::validation(
                "accounts payload must contain at least one account spec",
            ));
        }

        let state = AccountsState::new(WorkflowId::new(), accounts);
        self.persist(&state).await?;
        info!(
            workflow_id = %state.workflow_id,
            count = state.accounts.len(),
            "accounts workflow created"
        );
        self.state = Some(state);
        Ok(())
    }

    /// Execute provisioning for every account specification in order.
    ///
    /// A per-account switch rejection is recorded in the aggregate result
    /// rather than aborting the pass; the overall stage is non-success when
    /// any account failed. Infrastructure failures still raise.
    pub async fn run(&mut self) -> Result<AccountsState, WorkflowError> {
        let mut state = self
            .state
            .take()
            .ok_or_else(|| WorkflowError::unspecified("run() called before initialize()"))?;

        let result = self.drive(&mut state).await;
        self.state = Some(state.clone());
        match result {
            Ok(()) => Ok(state),
            // Whatever partial state existed at failure time rides along
            Err(err) => Err(err.with_accounts_state(state)),
        }
    }

    async fn drive(&self, state: &mut AccountsState) -> Result<(), WorkflowError> {
        state.stage = AccountsStage::Provisioning;
        state.touch();
        self.persist(state).await?;

        let timeout = Duration::from_millis(self.config.stage_timeout_ms);
        for spec in state.accounts.clone() {
            let result = self.provision(&spec, timeout).await;
            state.results.push(result);
        }

        let failed = state.results.iter().filter(|r| !r.success).count();
        state.stage = if failed == 0 {
            AccountsStage::Completed
        } else {
            AccountsStage::Errored
        };
        if failed > 0 {
            state.last_error = Some(LastError {
                message: format!("{failed} of {} accounts failed", state.results.len()),
                remote_code: None,
            });
        }
        state.touch();
        self.persist(state).await?;

        info!(
            workflow_id = %state.workflow_id,
            stage = %state.stage,
            failed,
            "accounts workflow finished"
        );
        Ok(())
    }

    async fn provision(&self, spec: &AccountSpec, timeout: Duration) -> AccountResult {
        // Structural problems in a single spec are per-account failures, not
        // whole-request failures.
        if let Err(message) = validate_spec(spec) {
            return AccountResult {
                id_type: spec.id_type.clone(),
                id_value: spec.id_value.clone(),
                success: false,
                error: Some(LastError {
                    message,
                    remote_code: None,
                }),
            };
        }

        let outcome = tokio::time::timeout(timeout, self.switch.create_participant(spec)).await;
        let error = match outcome {
            Ok(Ok(())) => None,
            Ok(Err(err)) => Some(LastError {
                message: err.to_string(),
                remote_code: err.code(),
            }),
            Err(_) => Some(LastError {
                message: format!("provisioning timed out after {}ms", timeout.as_millis()),
                remote_code: None,
            }),
        };

        if let Some(ref err) = error {
            warn!(
                id_value = %spec.id_value,
                "account provisioning failed: {}",
                err.message
            );
        }

        AccountResult {
            id_type: spec.id_type.clone(),
            id_value: spec.id_value.clone(),
            success: error.is_none(),
            error,
        }
    }

    async fn persist(&self, state: &AccountsState) -> Result<(), WorkflowError> {
        let value = serde_json::to_value(state)
            .map_err(|e| WorkflowError::unspecified(format!("state serialization failed: {e}")))?;
        self.store.put(&store_key(state.workflow_id), value).await?;
        Ok(())
    }
}

fn validate_spec(spec: &AccountSpec) -> Result<(), String> {
    if spec.id_type.trim().is_empty() || spec.id_value.trim().is_empty() {
        return Err("account idType/idValue must be present".into());
    }
    if spec.currency.len() != 3 || !spec.currency.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(format!("invalid currency '{}'", spec.currency));
    }
    Ok(())
}
