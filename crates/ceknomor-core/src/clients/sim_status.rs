//! SIM card status lookup via the operator's JSON endpoint.

use super::{kind_mismatch, Verifier};
use crate::config::VerifierSettings;
use crate::error::VerifyError;
use crate::model::{
    normalize_msisdn, Resolution, SimRecord, VerificationKind, VerificationRequest,
    VerificationResult, UNKNOWN,
};
use crate::utils::last_chars;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{info, warn};

/// Fixed action code the endpoint expects for a status query.
pub const STATUS_ACTION: &str = "MSISDN_STATUS_WEB";

#[derive(Debug, Serialize)]
struct StatusRequest<'a> {
    action: &'a str,
    input1: &'a str,
    input2: &'a str,
    language: &'a str,
    msisdn: &'a str,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<StatusData>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatusData {
    #[serde(default)]
    iccid: Option<String>,
    #[serde(default)]
    card_status: Option<String>,
    #[serde(default)]
    activation_status: Option<String>,
}

impl StatusResponse {
    fn into_record(self) -> Result<SimRecord, VerifyError> {
        if !self.status {
            let message = self
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN.to_string());
            return Err(VerifyError::Service(message));
        }

        let data = self.data.unwrap_or_default();
        let iccid_last4 = data
            .iccid
            .as_deref()
            .and_then(|iccid| last_chars(iccid.trim(), 4))
            .unwrap_or_else(|| UNKNOWN.to_string());

        Ok(SimRecord {
            card_status: data.card_status.unwrap_or_else(|| UNKNOWN.to_string()),
            activation_status: data
                .activation_status
                .unwrap_or_else(|| UNKNOWN.to_string()),
            iccid_last4,
        })
    }
}

/// Client for the SIM status endpoint.
#[derive(Debug, Clone)]
pub struct SimStatusClient {
    http: reqwest::Client,
    url: String,
}

impl SimStatusClient {
    /// Client for `url` with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Network`] if the HTTP client cannot be built.
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, VerifyError> {
        Self::build(url.into(), timeout, crate::config::DEFAULT_USER_AGENT)
    }

    /// Client configured from settings.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Network`] if the HTTP client cannot be built.
    pub fn from_settings(settings: &VerifierSettings) -> Result<Self, VerifyError> {
        Self::build(
            settings.sim_status_url.clone(),
            settings.sim_status_timeout(),
            &settings.user_agent,
        )
    }

    fn build(url: String, timeout: Duration, user_agent: &str) -> Result<Self, VerifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/plain, */*"),
        );
        if let Ok(agent) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, agent);
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| VerifyError::Network(e.to_string()))?;
        Ok(Self { http, url })
    }

    /// Query the status of `msisdn`. Local `08…` numbers are normalized first.
    pub async fn status(&self, msisdn: &str) -> VerificationResult {
        let msisdn = normalize_msisdn(msisdn);
        let result = self.fetch_record(&msisdn).await;
        let request = VerificationRequest::SimStatus {
            msisdn: msisdn.clone(),
        };

        match result {
            Ok(record) => {
                info!(
                    msisdn = %msisdn,
                    card_status = %record.card_status,
                    "SIM status resolved"
                );
                VerificationResult::success(request, Resolution::SimStatus(record))
            }
            Err(e) => {
                warn!(msisdn = %msisdn, error = %e, "SIM status lookup failed");
                VerificationResult::failure(request, e)
            }
        }
    }

    async fn fetch_record(&self, msisdn: &str) -> Result<SimRecord, VerifyError> {
        let body = StatusRequest {
            action: STATUS_ACTION,
            input1: "",
            input2: "",
            language: "ID",
            msisdn,
        };

        let response = self.http.post(&self.url).json(&body).send().await?;
        if response.status() != StatusCode::OK {
            return Err(VerifyError::HttpStatus(response.status().as_u16()));
        }

        let text = response.text().await?;
        let parsed: StatusResponse = serde_json::from_str(&text)
            .map_err(|e| VerifyError::InvalidResponse(e.to_string()))?;
        parsed.into_record()
    }
}

#[async_trait]
impl Verifier for SimStatusClient {
    fn kind(&self) -> VerificationKind {
        VerificationKind::SimStatus
    }

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        match request {
            VerificationRequest::SimStatus { msisdn } => self.status(msisdn).await,
            VerificationRequest::Identity { .. } => kind_mismatch(self.kind(), request),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<SimRecord, VerifyError> {
        serde_json::from_str::<StatusResponse>(json)
            .expect("fixture is valid JSON")
            .into_record()
    }

    #[test]
    fn test_success_payload() {
        let record = parse(
            r#"{"status":true,"data":{"iccid":"12345678","cardStatus":"ACTIVE","activationStatus":"DONE"}}"#,
        )
        .expect("status=true resolves");
        assert_eq!(record.iccid_last4, "5678");
        assert_eq!(record.card_status, "ACTIVE");
        assert_eq!(record.activation_status, "DONE");
    }

    #[test]
    fn test_missing_fields_use_sentinel() {
        let record = parse(r#"{"status":true,"data":{"iccid":"12"}}"#).expect("resolves");
        assert_eq!(record.iccid_last4, UNKNOWN);
        assert_eq!(record.card_status, UNKNOWN);
        assert_eq!(record.activation_status, UNKNOWN);

        let record = parse(r#"{"status":true}"#).expect("resolves without data");
        assert_eq!(record.iccid_last4, UNKNOWN);
    }

    #[test]
    fn test_negative_answer() {
        assert_eq!(
            parse(r#"{"status":false,"message":"Nomor tidak terdaftar"}"#),
            Err(VerifyError::Service("Nomor tidak terdaftar".into()))
        );
        assert_eq!(
            parse(r#"{"status":false}"#),
            Err(VerifyError::Service(UNKNOWN.into()))
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = StatusRequest {
            action: STATUS_ACTION,
            input1: "",
            input2: "",
            language: "ID",
            msisdn: "6281234",
        };
        let json = serde_json::to_value(&body).expect("serializes");
        assert_eq!(
            json,
            serde_json::json!({
                "action": "MSISDN_STATUS_WEB",
                "input1": "",
                "input2": "",
                "language": "ID",
                "msisdn": "6281234"
            })
        );
    }
}
