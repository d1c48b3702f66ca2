//! Workflow Core Types
//!
//! Identifiers and wire-level records shared by the transfer and accounts
//! workflows.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Workflow identifier - ULID-based unique identifier
///
/// Using ULID provides:
/// - Monotonic, sortable IDs
/// - No coordination needed (no machine_id)
/// - 128-bit with good entropy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(ulid::Ulid);

impl WorkflowId {
    /// Generate a new unique WorkflowId
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    /// Get the inner ULID value
    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for WorkflowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for WorkflowId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

/// Party lookup key: how a counterparty is addressed at the switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyIdInfo {
    /// Identifier scheme, e.g. "MSISDN" or "ACCOUNT_ID"
    pub id_type: String,
    /// Identifier value within the scheme
    pub id_value: String,
}

/// A resolved party as reported by the switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    pub id_type: String,
    pub id_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Settlement participant the party is homed at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fsp_id: Option<String>,
}

/// Caller-supplied payload that seeds a new transfer workflow.
///
/// Immutable once accepted; copied into the workflow state at creation.
/// Amounts travel as strings to avoid float precision issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    /// Caller's own correlation id, echoed back untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_transaction_id: Option<String>,
    /// Sending party
    pub from: Party,
    /// Receiving party lookup key (resolved during party discovery)
    pub to: PartyIdInfo,
    /// "SEND" (amount is what the sender pays) or "RECEIVE"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_type: Option<String>,
    pub currency: String,
    /// Amount as string
    pub amount: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Quote returned by the switch during the quoting stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub quote_id: String,
    /// Amount the payee will receive
    pub transfer_amount: String,
    pub currency: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<String>,
    /// ILP-style condition to present at execution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
}

/// Authorization decision returned by the switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Authorization {
    pub approved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Transfer execution outcome returned by the switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fulfilment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fulfilment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_timestamp: Option<String>,
}
