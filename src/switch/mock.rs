//! Scripted switch mock for tests.
//!
//! Answers every stage successfully by default; individual stages can be
//! scripted to fail, individual account ids can be rejected, and an
//! artificial response delay can be injected for timeout/concurrency tests.
//! Call counts are tracked per stage.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::workflow::accounts::AccountSpec;
use crate::workflow::state::TransferState;
use crate::workflow::types::{Authorization, Fulfilment, Party, PartyIdInfo, Quote};

use super::{SwitchClient, SwitchError};

#[derive(Default)]
pub struct MockSwitch {
    fail_lookup: Mutex<Option<SwitchError>>,
    fail_quote: Mutex<Option<SwitchError>>,
    fail_authorization: Mutex<Option<SwitchError>>,
    fail_transfer: Mutex<Option<SwitchError>>,
    rejected_accounts: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,

    lookup_count: AtomicUsize,
    quote_count: AtomicUsize,
    authorization_count: AtomicUsize,
    transfer_count: AtomicUsize,
    participant_count: AtomicUsize,
}

impl MockSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_lookup_with(&self, err: SwitchError) {
        *self.fail_lookup.lock().unwrap() = Some(err);
    }

    pub fn fail_quote_with(&self, err: SwitchError) {
        *self.fail_quote.lock().unwrap() = Some(err);
    }

    pub fn fail_authorization_with(&self, err: SwitchError) {
        *self.fail_authorization.lock().unwrap() = Some(err);
    }

    pub fn fail_transfer_with(&self, err: SwitchError) {
        *self.fail_transfer.lock().unwrap() = Some(err);
    }

    /// Reject participant creation for this id value
    pub fn reject_account(&self, id_value: &str) {
        self.rejected_accounts
            .lock()
            .unwrap()
            .insert(id_value.to_string());
    }

    /// Delay every response by `delay`
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn lookup_count(&self) -> usize {
        self.lookup_count.load(Ordering::Relaxed)
    }

    pub fn quote_count(&self) -> usize {
        self.quote_count.load(Ordering::Relaxed)
    }

    pub fn authorization_count(&self) -> usize {
        self.authorization_count.load(Ordering::Relaxed)
    }

    pub fn transfer_count(&self) -> usize {
        self.transfer_count.load(Ordering::Relaxed)
    }

    pub fn participant_count(&self) -> usize {
        self.participant_count.load(Ordering::Relaxed)
    }

    async fn maybe_delay(&self) {
        let delay = *self.delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
    }

    fn scripted(&self, slot: &Mutex<Option<SwitchError>>) -> Option<SwitchError> {
        slot.lock().unwrap().clone()
    }
}

#[async_trait]
impl SwitchClient for MockSwitch {
    async fn lookup_party(&self, to: &PartyIdInfo) -> Result<Party, SwitchError> {
        self.lookup_count.fetch_add(1, Ordering::Relaxed);
        self.maybe_delay().await;
        if let Some(err) = self.scripted(&self.fail_lookup) {
            return Err(err);
        }
        Ok(Party {
            id_type: to.id_type.clone(),
            id_value: to.id_value.clone(),
            display_name: Some(format!("Mock Party {}", to.id_value)),
            fsp_id: Some("mockfsp".to_string()),
        })
    }

    async fn request_quote(&self, state: &TransferState) -> Result<Quote, SwitchError> {
        self.quote_count.fetch_add(1, Ordering::Relaxed);
        self.maybe_delay().await;
        if let Some(err) = self.scripted(&self.fail_quote) {
            return Err(err);
        }
        Ok(Quote {
            quote_id: crate::workflow::types::WorkflowId::new().to_string(),
            transfer_amount: state.request.amount.clone(),
            currency: state.request.currency.clone(),
            fee: Some("0.00".to_string()),
            expiration: None,
            condition: Some("mock-condition".to_string()),
        })
    }

    async fn request_authorization(
        &self,
        _state: &TransferState,
    ) -> Result<Authorization, SwitchError> {
        self.authorization_count.fetch_add(1, Ordering::Relaxed);
        self.maybe_delay().await;
        if let Some(err) = self.scripted(&self.fail_authorization) {
            return Err(err);
        }
        Ok(Authorization {
            approved: true,
            reference: Some("mock-auth".to_string()),
        })
    }

    async fn execute_transfer(&self, _state: &TransferState) -> Result<Fulfilment, SwitchError> {
        self.transfer_count.fetch_add(1, Ordering::Relaxed);
        self.maybe_delay().await;
        if let Some(err) = self.scripted(&self.fail_transfer) {
            return Err(err);
        }
        Ok(Fulfilment {
            fulfilment: Some("mock-fulfilment".to_string()),
            completed_timestamp: Some(chrono::Utc::now().to_rfc3339()),
        })
    }

    async fn create_participant(&self, spec: &AccountSpec) -> Result<(), SwitchError> {
        self.participant_count.fetch_add(1, Ordering::Relaxed);
        self.maybe_delay().await;
        let rejected = self
            .rejected_accounts
            .lock()
            .unwrap()
            .contains(&spec.id_value);
        if rejected {
            return Err(SwitchError::Protocol {
                message: format!("participant {} rejected", spec.id_value),
                code: Some(3204),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_lookup_and_counts() {
        let mock = MockSwitch::new();
        let party = mock
            .lookup_party(&PartyIdInfo {
                id_type: "MSISDN".into(),
                id_value: "447700900002".into(),
            })
            .await
            .unwrap();
        assert_eq!(party.id_value, "447700900002");
        assert_eq!(party.fsp_id.as_deref(), Some("mockfsp"));
        assert_eq!(mock.lookup_count(), 1);
        assert_eq!(mock.quote_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_scripted_failure() {
        let mock = MockSwitch::new();
        mock.fail_lookup_with(SwitchError::Protocol {
            message: "party not found".into(),
            code: Some(3204),
        });
        let err = mock
            .lookup_party(&PartyIdInfo {
                id_type: "MSISDN".into(),
                id_value: "0".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(3204));
    }

    #[tokio::test]
    async fn test_mock_rejects_scripted_account() {
        let mock = MockSwitch::new();
        mock.reject_account("bad-account");

        let ok_spec = AccountSpec {
            id_type: "MSISDN".into(),
            id_value: "good-account".into(),
            currency: "USD".into(),
        };
        let bad_spec = AccountSpec {
            id_type: "MSISDN".into(),
            id_value: "bad-account".into(),
            currency: "USD".into(),
        };

        assert!(mock.create_participant(&ok_spec).await.is_ok());
        assert!(mock.create_participant(&bad_spec).await.is_err());
        assert_eq!(mock.participant_count(), 2);
    }
}
