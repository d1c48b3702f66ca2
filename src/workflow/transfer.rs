//! Transfer workflow controller.
//!
//! Owns the lifecycle of a single transfer workflow instance: creation from a
//! request body, reload from the store by identifier, and driven execution to
//! completion or to the quote-acceptance pause point. State is persisted
//! after every observable transition so another request (or process) can
//! resume it.

use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::WorkflowConfig;
use crate::store::WorkflowStore;
use crate::switch::{SwitchClient, SwitchError};

use super::error::{ErrorKind, WorkflowError};
use super::state::{TransferStage, TransferState};
use super::types::{TransferRequest, WorkflowId};

/// Store key namespace for transfer workflow state
pub(crate) fn store_key(id: WorkflowId) -> String {
    format!("transfer_{id}")
}

pub struct TransferWorkflow {
    store: Arc<dyn WorkflowStore>,
    switch: Arc<dyn SwitchClient>,
    config: WorkflowConfig,
    state: Option<TransferState>,
}

impl TransferWorkflow {
    /// All collaborators are injected; the controller reads nothing ambient.
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

    /// Identifier of the attached workflow, once initialized or loaded
    pub fn id(&self) -> Option<WorkflowId> {
        self.state.as_ref().map(|s| s.transfer_id)
    }

    pub fn state(&self) -> Option<&TransferState> {
        self.state.as_ref()
    }

    /// Construct a new workflow state from the request, assign an identifier
    /// and persist the initial record.
    pub async fn initialize(&mut self, request: TransferRequest) -> Result<(), WorkflowError> {
        validate_request(&request)?;

        let state = TransferState::new(WorkflowId::new(), request);
        self.persist(&state).await?;
        info!(transfer_id = %state.transfer_id, "transfer workflow created: {state}");
        self.state = Some(state);
        Ok(())
    }

    /// Reload a previously persisted workflow state by identifier.
    ///
    /// The state is deserialized fresh from the store (copy-on-load); no
    /// in-memory context from the creating request survives.
    pub async fn load(&mut self, id: WorkflowId) -> Result<(), WorkflowError> {
        let value = self
            .store
            .get(&store_key(id))
            .await?
            .ok_or_else(|| WorkflowError::not_found(id))?;
        let state: TransferState = serde_json::from_value(value)
            .map_err(|e| WorkflowError::unspecified(format!("corrupt state for {id}: {e}")))?;
        debug!(transfer_id = %id, stage = %state.stage, "transfer workflow loaded");
        self.state = Some(state);
        Ok(())
    }

    /// Drive the attached workflow forward through as many stages as can
    /// complete without external pause.
    ///
    /// Returns the final or paused state. Only `AWAITING_ACCEPTANCE` escapes
    /// non-terminally; a workflow loaded at that stage treats `run()` as the
    /// acceptance signal and continues to execution.
    pub async fn run(&mut self) -> Result<TransferState, WorkflowError> {
        let mut state = self
            .state
            .take()
            .ok_or_else(|| WorkflowError::unspecified("run() called before initialize() or load()"))?;

        let outcome = self.drive(&mut state).await;
        self.state = Some(state.clone());

        match outcome {
            Ok(()) => Ok(state),
            Err(err) if err.state().is_some() => Err(err),
            Err(err) => Err(err.with_state(state)),
        }
    }

    async fn drive(&self, state: &mut TransferState) -> Result<(), WorkflowError> {
        loop {
            match state.stage {
                TransferStage::Created | TransferStage::DiscoveringParty => {
                    self.step_discover(state).await?;
                }
                TransferStage::Quoting => {
                    let paused = self.step_quote(state).await?;
                    if paused {
                        return Ok(());
                    }
                }
                TransferStage::AwaitingAcceptance => {
                    // Reached only on a resumed run: the caller's PUT is the
                    // acceptance signal.
                    info!(transfer_id = %state.transfer_id, "quote accepted, resuming");
                    state.advance(TransferStage::Authorizing);
                    self.persist(state).await?;
                }
                TransferStage::Authorizing => {
                    self.step_authorize(state).await?;
                }
                TransferStage::Executing => {
                    self.step_execute(state).await?;
                }
                TransferStage::Completed | TransferStage::Errored => return Ok(()),
            }
        }
    }

    /// CREATED -> DISCOVERING_PARTY -> QUOTING
    async fn step_discover(&self, state: &mut TransferState) -> Result<(), WorkflowError> {
        // Persist the stage before the remote call, so a reload observes
        // where the workflow stopped.
        state.advance(TransferStage::DiscoveringParty);
        self.persist(state).await?;

        let party = match self
            .call(
                TransferStage::DiscoveringParty,
                self.switch.lookup_party(&state.request.to),
            )
            .await
        {
            Ok(party) => party,
            Err(err) => return Err(self.fail(state, err).await),
        };

        debug!(
            transfer_id = %state.transfer_id,
            fsp = party.fsp_id.as_deref().unwrap_or("?"),
            "payee resolved"
        );
        state.payee = Some(party);
        state.advance(TransferStage::Quoting);
        self.persist(state).await?;
        Ok(())
    }

    /// QUOTING -> AWAITING_ACCEPTANCE (pause) or AUTHORIZING.
    /// Returns true when the workflow paused.
    async fn step_quote(&self, state: &mut TransferState) -> Result<bool, WorkflowError> {
        let quote = match self
            .call(TransferStage::Quoting, self.switch.request_quote(state))
            .await
        {
            Ok(quote) => quote,
            Err(err) => return Err(self.fail(state, err).await),
        };

        debug!(transfer_id = %state.transfer_id, quote_id = %quote.quote_id, "quote received");
        state.quote = Some(quote);

        if self.config.auto_accept_quotes {
            state.advance(TransferStage::Authorizing);
            self.persist(state).await?;
            Ok(false)
        } else {
            // Deliberate pause: await the caller's accept via PUT.
            state.advance(TransferStage::AwaitingAcceptance);
            self.persist(state).await?;
            info!(transfer_id = %state.transfer_id, "awaiting quote acceptance");
            Ok(true)
        }
    }

    /// AUTHORIZING -> EXECUTING
    async fn step_authorize(&self, state: &mut TransferState) -> Result<(), WorkflowError> {
        let authorization = match self
            .call(
                TransferStage::Authorizing,
                self.switch.request_authorization(state),
            )
            .await
        {
            Ok(authorization) => authorization,
            Err(err) => return Err(self.fail(state, err).await),
        };

        if !authorization.approved {
            let declined = WorkflowError::remote(&SwitchError::Protocol {
                message: "authorization declined".into(),
                code: None,
            });
            return Err(self.fail(state, declined).await);
        }

        state.authorization = Some(authorization);
        state.advance(TransferStage::Executing);
        self.persist(state).await?;
        Ok(())
    }

    /// EXECUTING -> COMPLETED. The final transition persists atomically with
    /// completion.
    async fn step_execute(&self, state: &mut TransferState) -> Result<(), WorkflowError> {
        let fulfilment = match self
            .call(TransferStage::Executing, self.switch.execute_transfer(state))
            .await
        {
            Ok(fulfilment) => fulfilment,
            Err(err) => return Err(self.fail(state, err).await),
        };

        state.fulfilment = Some(fulfilment);
        state.advance(TransferStage::Completed);
        self.persist(state).await?;
        info!(transfer_id = %state.transfer_id, "transfer completed");
        Ok(())
    }

    /// Wrap a switch interaction in the configured per-stage timeout
    async fn call<T>(
        &self,
        stage: TransferStage,
        fut: impl Future<Output = Result<T, SwitchError>> + Send,
    ) -> Result<T, WorkflowError> {
        let timeout = Duration::from_millis(self.config.stage_timeout_ms);
        match tokio::time::timeout(timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(WorkflowError::remote(&err)),
            Err(_) => Err(WorkflowError::timeout(stage, self.config.stage_timeout_ms)),
        }
    }

    /// Record a stage failure. Timeouts leave the workflow in its last
    /// persisted stage so a later load can observe or retry from there;
    /// everything else marks the workflow ERRORED before propagating.
    async fn fail(&self, state: &mut TransferState, err: WorkflowError) -> WorkflowError {
        if matches!(err.kind(), ErrorKind::Timeout { .. }) {
            warn!(transfer_id = %state.transfer_id, stage = %state.stage, "stage timed out");
        } else {
            state.record_error(err.to_string(), err.remote_code());
            if let Err(persist_err) = self.persist(state).await {
                warn!(
                    transfer_id = %state.transfer_id,
                    "could not persist errored state: {persist_err}"
                );
            }
        }
        err.with_state(state.clone())
    }

    async fn persist(&self, state: &TransferState) -> Result<(), WorkflowError> {
        let value = serde_json::to_value(state)
            .map_err(|e| WorkflowError::unspecified(format!("state serialization failed: {e}")))?;
        self.store.put(&store_key(state.transfer_id), value).await?;
        Ok(())
    }
}

fn validate_request(request: &TransferRequest) -> Result<(), WorkflowError> {
    match Decimal::from_str(request.amount.trim()) {
        Ok(amount) if amount > Decimal::ZERO => {}
        _ => {
            return Err(WorkflowError::validation(format!(
                "amount must be a positive decimal, got '{}'",
                request.amount
            )));
        }
    }

    if request.currency.len() != 3
        || !request.currency.chars().all(|c| c.is_ascii_uppercase())
    {
        return Err(WorkflowError::validation(format!(
            "currency must be a 3-letter code, got '{}'",
            request.currency
        )));
    }

    if request.to.id_type.trim().is_empty() || request.to.id_value.trim().is_empty() {
        return Err(WorkflowError::validation("payee idType/idValue must be present"));
    }

    if request.from.id_type.trim().is_empty() || request.from.id_value.trim().is_empty() {
        return Err(WorkflowError::validation("payer idType/idValue must be present"));
    }

    Ok(())
}
