//! HTTP switch client.
//!
//! Thin reqwest-based implementation of [`SwitchClient`] against the peer
//! endpoint configured in `SwitchConfig`. Scheme errors arrive as
//! `{"errorInformation": {"errorCode": "5100", "errorDescription": "..."}}`;
//! the numeric code is parsed here, once, so downstream layers never probe
//! the body again.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::SwitchConfig;
use crate::workflow::accounts::AccountSpec;
use crate::workflow::state::TransferState;
use crate::workflow::types::{Authorization, Fulfilment, Party, PartyIdInfo, Quote};

use super::{SwitchClient, SwitchError};

/// Wire shape of a scheme error body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorInformationBody {
    error_information: ErrorInformation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorInformation {
    error_code: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRequestBody<'a> {
    transfer_id: String,
    from: &'a Party,
    to: &'a Party,
    amount: &'a str,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    amount_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<&'a str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizationRequestBody<'a> {
    transfer_id: String,
    quote_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TransferExecuteBody<'a> {
    transfer_id: String,
    quote_id: &'a str,
    amount: &'a str,
    currency: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    condition: Option<&'a str>,
}

pub struct HttpSwitchClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSwitchClient {
    pub fn new(config: &SwitchConfig) -> Result<Self, SwitchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| SwitchError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Decode a successful body, or map a scheme error body to Protocol
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SwitchError> {
        if response.status().is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| SwitchError::Transport(format!("malformed switch response: {e}")));
        }

        Err(Self::decode_error(response).await)
    }

    /// Map a non-success response to a Protocol error when the body carries
    /// `errorInformation`, falling back to Transport otherwise
    async fn decode_error(response: reqwest::Response) -> SwitchError {
        let status = response.status();
        match response.json::<ErrorInformationBody>().await {
            Ok(body) => {
                let info = body.error_information;
                SwitchError::Protocol {
                    message: info
                        .error_description
                        .unwrap_or_else(|| format!("switch error {}", info.error_code)),
                    code: info.error_code.parse::<u32>().ok(),
                }
            }
            Err(_) => SwitchError::Transport(format!(
                "switch returned HTTP {status} with unrecognized body"
            )),
        }
    }

    async fn post_json<B: serde::Serialize, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, SwitchError> {
        let response = self
            .client
            .post(format!("{}{}", self.endpoint, path))
            .json(body)
            .send()
            .await
            .map_err(|e| SwitchError::Transport(e.to_string()))?;
        Self::decode(response).await
    }
}

#[async_trait]
impl SwitchClient for HttpSwitchClient {
    async fn lookup_party(&self, to: &PartyIdInfo) -> Result<Party, SwitchError> {
        let response = self
            .client
            .get(format!(
                "{}/parties/{}/{}",
                self.endpoint, to.id_type, to.id_value
            ))
            .send()
            .await
            .map_err(|e| SwitchError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn request_quote(&self, state: &TransferState) -> Result<Quote, SwitchError> {
        // lookup_party has run by the time quoting starts
        let payee = state.payee.as_ref().ok_or_else(|| {
            SwitchError::Transport("quote requested before party discovery".into())
        })?;
        let body = QuoteRequestBody {
            transfer_id: state.transfer_id.to_string(),
            from: &state.request.from,
            to: payee,
            amount: &state.request.amount,
            currency: &state.request.currency,
            amount_type: state.request.amount_type.as_deref(),
            note: state.request.note.as_deref(),
        };
        self.post_json("/quotes", &body).await
    }

    async fn request_authorization(
        &self,
        state: &TransferState,
    ) -> Result<Authorization, SwitchError> {
        let quote = state.quote.as_ref().ok_or_else(|| {
            SwitchError::Transport("authorization requested before quoting".into())
        })?;
        let body = AuthorizationRequestBody {
            transfer_id: state.transfer_id.to_string(),
            quote_id: &quote.quote_id,
        };
        self.post_json("/authorizations", &body).await
    }

    async fn execute_transfer(&self, state: &TransferState) -> Result<Fulfilment, SwitchError> {
        let quote = state.quote.as_ref().ok_or_else(|| {
            SwitchError::Transport("transfer executed before quoting".into())
        })?;
        let body = TransferExecuteBody {
            transfer_id: state.transfer_id.to_string(),
            quote_id: &quote.quote_id,
            amount: &quote.transfer_amount,
            currency: &quote.currency,
            condition: quote.condition.as_deref(),
        };
        self.post_json("/transfers", &body).await
    }

    async fn create_participant(&self, spec: &AccountSpec) -> Result<(), SwitchError> {
        // Participant creation only signals success/failure; the ack body is
        // not interesting to this layer.
        let response = self
            .client
            .post(format!("{}/participants", self.endpoint))
            .json(spec)
            .send()
            .await
            .map_err(|e| SwitchError::Transport(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::decode_error(response).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_information_parsing() {
        let body: ErrorInformationBody = serde_json::from_value(serde_json::json!({
            "errorInformation": {
                "errorCode": "5100",
                "errorDescription": "Payee FSP rejected quote"
            }
        }))
        .unwrap();
        assert_eq!(body.error_information.error_code, "5100");
        assert_eq!(body.error_information.error_code.parse::<u32>().ok(), Some(5100));
    }

    #[test]
    fn test_non_numeric_error_code_yields_none() {
        let body: ErrorInformationBody = serde_json::from_value(serde_json::json!({
            "errorInformation": { "errorCode": "GENERIC" }
        }))
        .unwrap();
        assert_eq!(body.error_information.error_code.parse::<u32>().ok(), None);
        assert!(body.error_information.error_description.is_none());
    }

    #[test]
    fn test_endpoint_trailing_slash_trimmed() {
        let client = HttpSwitchClient::new(&SwitchConfig {
            endpoint: "http://switch:4000/".into(),
            request_timeout_ms: 1000,
        })
        .unwrap();
        assert_eq!(client.endpoint, "http://switch:4000");
    }
}
