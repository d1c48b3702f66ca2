//! Settlement switch client.
//!
//! The switch is the external network the workflows exchange messages with
//! during party discovery, quoting, authorization and transfer execution.
//! Controllers only see the [`SwitchClient`] trait; the HTTP implementation
//! and the scripted mock live in submodules.

pub mod http;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

use crate::workflow::accounts::AccountSpec;
use crate::workflow::state::TransferState;
use crate::workflow::types::{Authorization, Fulfilment, Party, PartyIdInfo, Quote};

pub use http::HttpSwitchClient;
pub use mock::MockSwitch;

/// Failure talking to the switch
#[derive(Debug, Clone, Error)]
pub enum SwitchError {
    /// The switch answered with a structured scheme error. `code` is the
    /// remote-assigned numeric error code, parsed once when the error is
    /// built from the wire body.
    #[error("switch returned error: {message}")]
    Protocol {
        message: String,
        code: Option<u32>,
    },

    /// Transport-level failure (connect, TLS, malformed body)
    #[error("switch transport failure: {0}")]
    Transport(String),
}

impl SwitchError {
    /// Remote numeric error code, when the switch supplied one
    pub fn code(&self) -> Option<u32> {
        match self {
            SwitchError::Protocol { code, .. } => *code,
            SwitchError::Transport(_) => None,
        }
    }
}

/// Asynchronous client for the multi-stage exchange with the switch.
///
/// Implementations must be safe for concurrent use; many workflow runs call
/// into one shared client.
#[async_trait]
pub trait SwitchClient: Send + Sync {
    /// Party discovery: resolve the counterparty behind a lookup key
    async fn lookup_party(&self, to: &PartyIdInfo) -> Result<Party, SwitchError>;

    /// Request a quote for the transfer described by `state`
    async fn request_quote(&self, state: &TransferState) -> Result<Quote, SwitchError>;

    /// Request authorization for the quoted transfer
    async fn request_authorization(
        &self,
        state: &TransferState,
    ) -> Result<Authorization, SwitchError>;

    /// Execute the transfer against the accepted quote
    async fn execute_transfer(&self, state: &TransferState) -> Result<Fulfilment, SwitchError>;

    /// Provision one participant account at the switch
    async fn create_participant(&self, spec: &AccountSpec) -> Result<(), SwitchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_code() {
        let err = SwitchError::Protocol {
            message: "payer rejected".into(),
            code: Some(5101),
        };
        assert_eq!(err.code(), Some(5101));

        let err = SwitchError::Protocol {
            message: "no code supplied".into(),
            code: None,
        };
        assert_eq!(err.code(), None);

        let err = SwitchError::Transport("connection refused".into());
        assert_eq!(err.code(), None);
    }
}
