//! Workflow stage enums and the persisted state records.
//!
//! `TransferState` is the full serialized record of one transfer workflow
//! instance. It is owned by the controller while executing and written to the
//! store after every observable transition, so a later request (possibly in
//! another process) can reload it by identifier.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::types::{Authorization, Fulfilment, Party, Quote, TransferRequest, WorkflowId};

/// Transfer workflow stages.
///
/// `AWAITING_ACCEPTANCE` is the only stage from which `run()` returns without
/// reaching a terminal stage, and the only stage a `load()` + `run()` is
/// expected to resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStage {
    Created,
    DiscoveringParty,
    Quoting,
    AwaitingAcceptance,
    Authorizing,
    Executing,
    Completed,
    Errored,
}

impl TransferStage {
    /// Terminal stages never advance again
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferStage::Completed | TransferStage::Errored)
    }

    /// Only the quote-acceptance pause may escape a `run()` non-terminally
    #[inline]
    pub fn is_pause(&self) -> bool {
        matches!(self, TransferStage::AwaitingAcceptance)
    }

    /// Ordering used to enforce monotonic transitions within one run
    pub(crate) fn rank(&self) -> u8 {
        match self {
            TransferStage::Created => 0,
            TransferStage::DiscoveringParty => 1,
            TransferStage::Quoting => 2,
            TransferStage::AwaitingAcceptance => 3,
            TransferStage::Authorizing => 4,
            TransferStage::Executing => 5,
            TransferStage::Completed => 6,
            TransferStage::Errored => 6,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStage::Created => "CREATED",
            TransferStage::DiscoveringParty => "DISCOVERING_PARTY",
            TransferStage::Quoting => "QUOTING",
            TransferStage::AwaitingAcceptance => "AWAITING_ACCEPTANCE",
            TransferStage::Authorizing => "AUTHORIZING",
            TransferStage::Executing => "EXECUTING",
            TransferStage::Completed => "COMPLETED",
            TransferStage::Errored => "ERRORED",
        }
    }
}

impl fmt::Display for TransferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accounts workflow stages (single-shot, no pause)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountsStage {
    Created,
    Provisioning,
    Completed,
    Errored,
}

impl AccountsStage {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, AccountsStage::Completed | AccountsStage::Errored)
    }
}

impl fmt::Display for AccountsStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AccountsStage::Created => "CREATED",
            AccountsStage::Provisioning => "PROVISIONING",
            AccountsStage::Completed => "COMPLETED",
            AccountsStage::Errored => "ERRORED",
        };
        write!(f, "{}", s)
    }
}

/// Last error recorded against a workflow.
///
/// The remote error code, when the switch supplied one, is resolved once at
/// construction time - never probed out of a nested cause chain later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_code: Option<u32>,
}

/// Full serialized record of a transfer workflow instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferState {
    pub transfer_id: WorkflowId,
    pub stage: TransferStage,
    /// The request that seeded this workflow, immutable once accepted
    pub request: TransferRequest,
    /// Accumulated stage results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payee: Option<Party>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<Quote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization: Option<Authorization>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilment: Option<Fulfilment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<LastError>,
    /// Created timestamp (millis)
    pub created_at: i64,
    /// Last updated timestamp (millis)
    pub updated_at: i64,
}

impl TransferState {
    /// Create a new state record in CREATED stage
    pub fn new(transfer_id: WorkflowId, request: TransferRequest) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            transfer_id,
            stage: TransferStage::Created,
            request,
            payee: None,
            quote: None,
            authorization: None,
            fulfilment: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance to the next stage. Transitions are monotonic within one run;
    /// a regression is refused and the current stage kept.
    pub fn advance(&mut self, next: TransferStage) {
        if next.rank() < self.stage.rank() {
            tracing::warn!(
                transfer_id = %self.transfer_id,
                "refusing stage regression: {} -> {}",
                self.stage,
                next
            );
            return;
        }
        self.stage = next;
        self.touch();
    }

    /// Record a failure and move to the terminal ERRORED stage
    pub fn record_error(&mut self, message: String, remote_code: Option<u32>) {
        self.last_error = Some(LastError {
            message,
            remote_code,
        });
        self.stage = TransferStage::Errored;
        self.touch();
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Transfer[{}] {} -> {}/{} {} {} stage={}",
            self.transfer_id,
            self.request.from.id_value,
            self.request.to.id_type,
            self.request.to.id_value,
            self.request.amount,
            self.request.currency,
            self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::types::PartyIdInfo;

    fn request() -> TransferRequest {
        TransferRequest {
            home_transaction_id: None,
            from: Party {
                id_type: "MSISDN".into(),
                id_value: "447700900001".into(),
                display_name: None,
                fsp_id: Some("senderfsp".into()),
            },
            to: PartyIdInfo {
                id_type: "MSISDN".into(),
                id_value: "447700900002".into(),
            },
            amount_type: Some("SEND".into()),
            currency: "USD".into(),
            amount: "100.00".into(),
            transaction_type: Some("TRANSFER".into()),
            note: None,
        }
    }

    #[test]
    fn test_stage_terminal() {
        assert!(TransferStage::Completed.is_terminal());
        assert!(TransferStage::Errored.is_terminal());
        assert!(!TransferStage::AwaitingAcceptance.is_terminal());
        assert!(!TransferStage::Quoting.is_terminal());
    }

    #[test]
    fn test_stage_pause() {
        assert!(TransferStage::AwaitingAcceptance.is_pause());
        assert!(!TransferStage::Authorizing.is_pause());
    }

    #[test]
    fn test_stage_serializes_screaming_snake() {
        let s = serde_json::to_string(&TransferStage::AwaitingAcceptance).unwrap();
        assert_eq!(s, "\"AWAITING_ACCEPTANCE\"");
        let s = serde_json::to_string(&TransferStage::DiscoveringParty).unwrap();
        assert_eq!(s, "\"DISCOVERING_PARTY\"");
    }

    #[test]
    fn test_new_state() {
        let id = WorkflowId::new();
        let state = TransferState::new(id, request());
        assert_eq!(state.transfer_id, id);
        assert_eq!(state.stage, TransferStage::Created);
        assert!(state.payee.is_none());
        assert!(state.last_error.is_none());
        assert_eq!(state.created_at, state.updated_at);
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut state = TransferState::new(WorkflowId::new(), request());
        state.advance(TransferStage::DiscoveringParty);
        state.advance(TransferStage::Quoting);
        state.advance(TransferStage::AwaitingAcceptance);
        state.advance(TransferStage::Authorizing);
        assert_eq!(state.stage, TransferStage::Authorizing);
    }

    #[test]
    fn test_advance_refuses_regression() {
        let mut state = TransferState::new(WorkflowId::new(), request());
        state.advance(TransferStage::Executing);
        state.advance(TransferStage::Quoting);
        assert_eq!(state.stage, TransferStage::Executing);

        state.advance(TransferStage::Completed);
        assert_eq!(state.stage, TransferStage::Completed);
    }

    #[test]
    fn test_record_error_is_terminal() {
        let mut state = TransferState::new(WorkflowId::new(), request());
        state.advance(TransferStage::Quoting);
        state.record_error("quote rejected".into(), Some(5100));
        assert_eq!(state.stage, TransferStage::Errored);
        let err = state.last_error.as_ref().unwrap();
        assert_eq!(err.message, "quote rejected");
        assert_eq!(err.remote_code, Some(5100));
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut state = TransferState::new(WorkflowId::new(), request());
        state.advance(TransferStage::AwaitingAcceptance);
        state.quote = Some(Quote {
            quote_id: WorkflowId::new().to_string(),
            transfer_amount: "100.00".into(),
            currency: "USD".into(),
            fee: Some("1.00".into()),
            expiration: None,
            condition: Some("abcdef".into()),
        });

        let value = serde_json::to_value(&state).unwrap();
        let back: TransferState = serde_json::from_value(value).unwrap();
        assert_eq!(back, state);
    }
}
