//! Workflow engine: the stateful, identifiable, resumable units of work
//! behind the HTTP boundary.
//!
//! - [`transfer`] - transfer workflow controller (initialize / load / run)
//! - [`accounts`] - participant provisioning controller (initialize / run)
//! - [`state`] - stage enums and persisted state records
//! - [`error`] - the failure taxonomy every operation propagates
//! - [`types`] - identifiers and wire-level records

pub mod accounts;
pub mod error;
pub mod state;
pub mod transfer;
pub mod types;

pub use accounts::{AccountResult, AccountSpec, AccountsState, AccountsWorkflow};
pub use error::{ErrorKind, StateSnapshot, WorkflowError};
pub use state::{AccountsStage, LastError, TransferStage, TransferState};
pub use transfer::TransferWorkflow;
pub use types::{
    Authorization, Fulfilment, Party, PartyIdInfo, Quote, TransferRequest, WorkflowId,
};
