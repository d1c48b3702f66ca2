//! Error normalization.
//!
//! Converts any workflow failure into the uniform, client-safe response
//! shape, regardless of which controller or stage produced it. This path
//! never fails: it always yields a well-formed `{message, transferState,
//! statusCode}` triple, and records the error before returning.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::workflow::WorkflowError;

/// Fallback when an error carries no usable message
pub const FALLBACK_MESSAGE: &str = "Unspecified error";

/// Uniform error body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedError {
    pub message: String,
    /// Workflow state at the point of failure, `{}` when none was attached
    pub transfer_state: serde_json::Value,
    /// Remote-assigned numeric code when present, else the HTTP status
    pub status_code: u32,
}

/// Produce the HTTP status and response body for a workflow failure
pub fn normalize(err: &WorkflowError) -> (StatusCode, NormalizedError) {
    let http_status = err.http_status();

    // A structured remote error code supersedes the generic status in the
    // body; the HTTP status line keeps the taxonomy class.
    let status_code = err
        .remote_code()
        .unwrap_or_else(|| u32::from(http_status.as_u16()));

    let transfer_state = err
        .snapshot()
        .and_then(|s| s.to_value())
        .unwrap_or_else(|| serde_json::json!({}));

    let mut message = err.to_string();
    if message.trim().is_empty() {
        message = FALLBACK_MESSAGE.to_string();
    }

    tracing::error!(
        http_status = %http_status,
        status_code,
        "workflow request failed: {message}"
    );

    (
        http_status,
        NormalizedError {
            message,
            transfer_state,
            status_code,
        },
    )
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let (status, body) = normalize(&self);
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::SwitchError;
    use crate::workflow::state::TransferState;
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
    fn test_always_well_formed_triple() {
        for err in [
            WorkflowError::validation("bad"),
            WorkflowError::not_found("x"),
            WorkflowError::conflict("x"),
            WorkflowError::unspecified("boom"),
            WorkflowError::timeout(crate::workflow::TransferStage::Quoting, 100),
        ] {
            let (status, body) = normalize(&err);
            assert!(status.as_u16() >= 400);
            assert!(!body.message.is_empty());
            assert!(body.transfer_state.is_object());
            assert!(body.status_code >= 400);
        }
    }

    #[test]
    fn test_empty_message_gets_fallback() {
        let (_, body) = normalize(&WorkflowError::unspecified(""));
        assert_eq!(body.message, FALLBACK_MESSAGE);
    }

    #[test]
    fn test_remote_code_supersedes_status() {
        let err = WorkflowError::remote(&SwitchError::Protocol {
            message: "quote rejected".into(),
            code: Some(5100),
        });
        let (status, body) = normalize(&err);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.status_code, 5100);
    }

    #[test]
    fn test_state_snapshot_serialized() {
        let state = dummy_state();
        let id = state.transfer_id.to_string();
        let err = WorkflowError::unspecified("boom").with_state(state);
        let (_, body) = normalize(&err);
        assert_eq!(body.transfer_state["transferId"], serde_json::json!(id));
    }

    #[test]
    fn test_accounts_snapshot_serialized() {
        let now = chrono::Utc::now().timestamp_millis();
        let state = crate::workflow::AccountsState {
            workflow_id: WorkflowId::new(),
            stage: crate::workflow::AccountsStage::Provisioning,
            accounts: vec![],
            results: vec![crate::workflow::AccountResult {
                id_type: "MSISDN".into(),
                id_value: "1".into(),
                success: true,
                error: None,
            }],
            last_error: None,
            created_at: now,
            updated_at: now,
        };
        let err = WorkflowError::unspecified("persist failed").with_accounts_state(state);
        let (_, body) = normalize(&err);
        assert_eq!(body.transfer_state["stage"], serde_json::json!("PROVISIONING"));
        assert_eq!(body.transfer_state["results"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_missing_state_is_empty_object() {
        let (_, body) = normalize(&WorkflowError::validation("bad"));
        assert_eq!(body.transfer_state, serde_json::json!({}));
    }

    #[test]
    fn test_body_field_names() {
        let (_, body) = normalize(&WorkflowError::not_found("abc"));
        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("message").is_some());
        assert!(value.get("transferState").is_some());
        assert!(value.get("statusCode").is_some());
    }
}
