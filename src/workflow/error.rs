//! Workflow error taxonomy.
//!
//! Every failure from `initialize`, `load`, or `run` propagates to the HTTP
//! boundary as a single `WorkflowError` carrying its HTTP status, message and
//! the workflow state snapshot at the point of failure (when available).
//! Controllers never swallow errors; the boundary does no interpretation of
//! its own beyond the normalizer's uniform extraction.

use std::fmt;

use axum::http::StatusCode;
use thiserror::Error;

use crate::store::StoreError;
use crate::switch::SwitchError;

use super::accounts::AccountsState;
use super::state::{LastError, TransferStage, TransferState};

/// Tagged error kind per taxonomy entry
#[derive(Debug, Clone, Error)]
pub enum ErrorKind {
    /// Malformed input to `initialize`; never retried
    #[error("invalid request: {0}")]
    Validation(String),

    /// `load()` given an unknown identifier
    #[error("transfer {0} not found")]
    NotFound(String),

    /// Concurrent `run()` attempted on an identifier already executing
    #[error("transfer {0} is already executing")]
    Conflict(String),

    /// The switch returned a structured error during a stage. The remote
    /// numeric code was resolved when this variant was constructed.
    #[error("{message}")]
    RemoteProtocol {
        message: String,
        code: Option<u32>,
    },

    /// A stage exceeded its allotted duration; workflow left as last persisted
    #[error("{stage} stage timed out after {timeout_ms}ms")]
    Timeout {
        stage: TransferStage,
        timeout_ms: u64,
    },

    /// The state store failed
    #[error("state store failure: {0}")]
    Store(String),

    /// Catch-all
    #[error("{0}")]
    Unspecified(String),
}

/// State record attached to a failure, from whichever workflow raised it
#[derive(Debug, Clone)]
pub enum StateSnapshot {
    Transfer(Box<TransferState>),
    Accounts(Box<AccountsState>),
}

impl StateSnapshot {
    /// Serialize for the client-facing error body
    pub fn to_value(&self) -> Option<serde_json::Value> {
        match self {
            Self::Transfer(s) => serde_json::to_value(s).ok(),
            Self::Accounts(s) => serde_json::to_value(s).ok(),
        }
    }

    fn last_error(&self) -> Option<&LastError> {
        match self {
            Self::Transfer(s) => s.last_error.as_ref(),
            Self::Accounts(s) => s.last_error.as_ref(),
        }
    }
}

/// A workflow failure: kind plus the state snapshot at failure time
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct WorkflowError {
    kind: ErrorKind,
    state: Option<StateSnapshot>,
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Validation(message.into()))
    }

    pub fn not_found(id: impl fmt::Display) -> Self {
        Self::from_kind(ErrorKind::NotFound(id.to_string()))
    }

    pub fn conflict(id: impl fmt::Display) -> Self {
        Self::from_kind(ErrorKind::Conflict(id.to_string()))
    }

    /// Build from a switch failure, resolving the remote code once here
    pub fn remote(err: &SwitchError) -> Self {
        Self::from_kind(ErrorKind::RemoteProtocol {
            message: err.to_string(),
            code: err.code(),
        })
    }

    pub fn timeout(stage: TransferStage, timeout_ms: u64) -> Self {
        Self::from_kind(ErrorKind::Timeout { stage, timeout_ms })
    }

    pub fn unspecified(message: impl Into<String>) -> Self {
        Self::from_kind(ErrorKind::Unspecified(message.into()))
    }

    fn from_kind(kind: ErrorKind) -> Self {
        Self { kind, state: None }
    }

    /// Attach the transfer state at the point of failure
    pub fn with_state(mut self, state: TransferState) -> Self {
        self.state = Some(StateSnapshot::Transfer(Box::new(state)));
        self
    }

    /// Attach the accounts state at the point of failure
    pub fn with_accounts_state(mut self, state: AccountsState) -> Self {
        self.state = Some(StateSnapshot::Accounts(Box::new(state)));
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn snapshot(&self) -> Option<&StateSnapshot> {
        self.state.as_ref()
    }

    pub fn state(&self) -> Option<&TransferState> {
        match &self.state {
            Some(StateSnapshot::Transfer(s)) => Some(s),
            _ => None,
        }
    }

    pub fn accounts_state(&self) -> Option<&AccountsState> {
        match &self.state {
            Some(StateSnapshot::Accounts(s)) => Some(s),
            _ => None,
        }
    }

    /// HTTP status class for this error
    pub fn http_status(&self) -> StatusCode {
        match &self.kind {
            ErrorKind::Validation(_) => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound(_) => StatusCode::NOT_FOUND,
            ErrorKind::Conflict(_) => StatusCode::CONFLICT,
            ErrorKind::RemoteProtocol { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorKind::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Remote-assigned numeric error code, when the switch supplied one.
    ///
    /// Falls back to the code recorded against the attached state, so an
    /// error wrapped around an already-errored workflow still reports it.
    pub fn remote_code(&self) -> Option<u32> {
        match &self.kind {
            ErrorKind::RemoteProtocol { code, .. } => *code,
            _ => self
                .state
                .as_ref()
                .and_then(|s| s.last_error())
                .and_then(|e| e.remote_code),
        }
    }
}

impl From<StoreError> for WorkflowError {
    fn from(err: StoreError) -> Self {
        Self::from_kind(ErrorKind::Store(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::state::LastError;
    use crate::workflow::types::{Party, PartyIdInfo, TransferRequest, WorkflowId};

    fn dummy_state() -> TransferState {
        TransferState::new(
            WorkflowId::new(),
            TransferRequest {
                home_transaction_id: None,
                from: Party {
                    id_type: "MSISDN".into(),
                    id_value: "1".into(),
                    display_name: None,
                    fsp_id: None,
                },
                to: PartyIdInfo {
                    id_type: "MSISDN".into(),
                    id_value: "2".into(),
                },
                amount_type: None,
                currency: "USD".into(),
                amount: "1.00".into(),
                transaction_type: None,
                note: None,
            },
        )
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            WorkflowError::validation("bad").http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            WorkflowError::not_found("x").http_status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            WorkflowError::conflict("x").http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            WorkflowError::timeout(TransferStage::Quoting, 100).http_status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            WorkflowError::unspecified("boom").http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_remote_code_resolved_at_construction() {
        let switch_err = SwitchError::Protocol {
            message: "payee FSP rejected quote".into(),
            code: Some(5100),
        };
        let err = WorkflowError::remote(&switch_err);
        assert_eq!(err.remote_code(), Some(5100));
        assert_eq!(err.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_remote_code_falls_back_to_state() {
        let mut state = dummy_state();
        state.last_error = Some(LastError {
            message: "earlier failure".into(),
            remote_code: Some(3204),
        });
        let err = WorkflowError::unspecified("wrapper").with_state(state);
        assert_eq!(err.remote_code(), Some(3204));
    }

    #[test]
    fn test_accounts_snapshot_attached() {
        let now = chrono::Utc::now().timestamp_millis();
        let state = AccountsState {
            workflow_id: WorkflowId::new(),
            stage: crate::workflow::AccountsStage::Provisioning,
            accounts: vec![],
            results: vec![],
            last_error: Some(LastError {
                message: "1 of 2 accounts failed".into(),
                remote_code: Some(3204),
            }),
            created_at: now,
            updated_at: now,
        };
        let err = WorkflowError::unspecified("persist failed").with_accounts_state(state.clone());

        assert!(err.state().is_none());
        assert_eq!(err.accounts_state().unwrap().workflow_id, state.workflow_id);
        assert_eq!(err.remote_code(), Some(3204));
        let value = err.snapshot().unwrap().to_value().unwrap();
        assert!(value.get("workflowId").is_some());
    }

    #[test]
    fn test_with_state_snapshot() {
        let state = dummy_state();
        let id = state.transfer_id;
        let err = WorkflowError::timeout(TransferStage::Executing, 500).with_state(state);
        assert_eq!(err.state().unwrap().transfer_id, id);
        assert!(err.to_string().contains("EXECUTING"));
    }
}
