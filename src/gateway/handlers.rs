//! HTTP handlers.
//!
//! Each handler builds a controller from the injected state, drives it, and
//! returns the workflow result as-is; every failure propagates as a
//! `WorkflowError` and is normalized by the shared response path. No
//! stage-specific branching happens here.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::workflow::{
    AccountSpec, AccountsState, AccountsWorkflow, TransferRequest, TransferState,
    TransferWorkflow, WorkflowError, WorkflowId,
};

use super::state::AppState;

/// GET / - liveness probe; always 200 with an empty body
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}

/// POST /transfers - create a transfer workflow and run it
pub async fn post_transfers(
    State(state): State<Arc<AppState>>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<TransferState>, WorkflowError> {
    let mut workflow = TransferWorkflow::new(
        state.store.clone(),
        state.switch.clone(),
        state.workflow.clone(),
    );
    workflow.initialize(request).await?;

    // The id exists after initialize; claim it before driving.
    let id = workflow
        .id()
        .ok_or_else(|| WorkflowError::unspecified("workflow has no identifier after initialize"))?;
    let _guard = state
        .runs
        .acquire(&id.to_string())
        .ok_or_else(|| WorkflowError::conflict(id))?;

    let result = workflow.run().await?;
    Ok(Json(result))
}

/// PUT /transfers/{transfer_id} - resume a paused transfer workflow
pub async fn put_transfers(
    State(state): State<Arc<AppState>>,
    Path(transfer_id): Path<String>,
) -> Result<Json<TransferState>, WorkflowError> {
    let id: WorkflowId = transfer_id
        .parse()
        .map_err(|_| WorkflowError::validation(format!("invalid transfer id '{transfer_id}'")))?;

    let _guard = state
        .runs
        .acquire(&id.to_string())
        .ok_or_else(|| WorkflowError::conflict(id))?;

    let mut workflow = TransferWorkflow::new(
        state.store.clone(),
        state.switch.clone(),
        state.workflow.clone(),
    );
    workflow.load(id).await?;
    let result = workflow.run().await?;
    Ok(Json(result))
}

/// POST /accounts - provision participant accounts in a single pass
pub async fn post_accounts(
    State(state): State<Arc<AppState>>,
    Json(accounts): Json<Vec<AccountSpec>>,
) -> Result<Json<AccountsState>, WorkflowError> {
    let mut workflow = AccountsWorkflow::new(
        state.store.clone(),
        state.switch.clone(),
        state.workflow.clone(),
    );
    workflow.initialize(accounts).await?;
    let result = workflow.run().await?;
    Ok(Json(result))
}
