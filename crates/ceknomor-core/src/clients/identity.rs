//! NIK/KK lookup against the operator's "cek nomor" page.
//!
//! The service is a two-step form flow: the POST answers with a 302 and a
//! session cookie, and the result page is only meaningful when fetched with
//! that same cookie. Each lookup therefore builds its own cookie-enabled
//! client with redirects disabled.

use super::{kind_mismatch, Verifier};
use crate::config::VerifierSettings;
use crate::error::VerifyError;
use crate::model::{
    IdentityRecord, Resolution, VerificationKind, VerificationRequest, VerificationResult,
};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::redirect::Policy;
use reqwest::StatusCode;
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::{debug, info, warn};

const LABEL_SELECTOR: &str = "h6";
const NUMBER_LIST_SELECTOR: &str = "ul.list-unstyled.margin-5-top";
const NUMBER_ITEM_SELECTOR: &str = "li";
const SUBMIT_VALUE: &str = "PERIKSA";
const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Client for the identity (NIK + KK) lookup.
#[derive(Debug, Clone)]
pub struct IdentityLookupClient {
    check_url: String,
    result_url: String,
    user_agent: String,
    timeout: Option<Duration>,
}

impl IdentityLookupClient {
    /// Client pointed at explicit endpoints, with no timeout.
    pub fn new(check_url: impl Into<String>, result_url: impl Into<String>) -> Self {
        Self {
            check_url: check_url.into(),
            result_url: result_url.into(),
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    /// Client configured from settings.
    #[must_use]
    pub fn from_settings(settings: &VerifierSettings) -> Self {
        Self {
            check_url: settings.identity_check_url.clone(),
            result_url: settings.identity_result_url.clone(),
            user_agent: settings.user_agent.clone(),
            timeout: settings.identity_timeout(),
        }
    }

    /// Look up the numbers registered under `nik` + `kk`.
    pub async fn lookup(&self, nik: &str, kk: &str) -> VerificationResult {
        let request = VerificationRequest::identity(nik, kk);
        match self.fetch_record(nik, kk).await {
            Ok(record) => {
                info!(
                    nik = %nik,
                    numbers = record.numbers.len(),
                    remaining = record.remaining,
                    "Identity lookup resolved"
                );
                VerificationResult::success(request, Resolution::Identity(record))
            }
            Err(e) => {
                warn!(nik = %nik, error = %e, "Identity lookup failed");
                VerificationResult::failure(request, e)
            }
        }
    }

    fn session_client(&self) -> Result<reqwest::Client, VerifyError> {
        let mut headers = HeaderMap::new();
        if let Ok(agent) = HeaderValue::from_str(&self.user_agent) {
            headers.insert(USER_AGENT, agent);
        }
        headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));

        let mut builder = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .default_headers(headers);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        builder
            .build()
            .map_err(|e| VerifyError::Network(e.to_string()))
    }

    async fn fetch_record(&self, nik: &str, kk: &str) -> Result<IdentityRecord, VerifyError> {
        let client = self.session_client()?;

        let form = [
            ("nik", nik),
            ("kk", kk),
            ("g-recaptcha-response", ""),
            ("send", SUBMIT_VALUE),
        ];
        let post = client.post(&self.check_url).form(&form).send().await?;
        if post.status() != StatusCode::FOUND {
            return Err(VerifyError::PostRejected(post.status().as_u16()));
        }
        debug!(nik = %nik, "Check form accepted, fetching result page");

        let page = client.get(&self.result_url).send().await?;
        if page.status() != StatusCode::OK {
            return Err(VerifyError::GetFailed(page.status().as_u16()));
        }
        let body = page.text().await?;

        parse_result_page(&body)
    }
}

#[async_trait]
impl Verifier for IdentityLookupClient {
    fn kind(&self) -> VerificationKind {
        VerificationKind::Identity
    }

    async fn verify(&self, request: &VerificationRequest) -> VerificationResult {
        match request {
            VerificationRequest::Identity { nik, kk } => self.lookup(nik, kk).await,
            VerificationRequest::SimStatus { .. } => kind_mismatch(self.kind(), request),
        }
    }
}

fn selector(css: &str) -> Result<Selector, VerifyError> {
    Selector::parse(css).map_err(|e| VerifyError::InvalidResponse(e.to_string()))
}

fn element_text(element: scraper::ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extract the identity label and registered numbers from the result page.
///
/// # Errors
///
/// Returns [`VerifyError::ParseMismatch`] when either the label heading or
/// the number list is missing.
pub fn parse_result_page(html: &str) -> Result<IdentityRecord, VerifyError> {
    let document = Html::parse_document(html);
    let label_selector = selector(LABEL_SELECTOR)?;
    let list_selector = selector(NUMBER_LIST_SELECTOR)?;
    let item_selector = selector(NUMBER_ITEM_SELECTOR)?;

    let label = document.select(&label_selector).next();
    let list = document.select(&list_selector).next();

    let (Some(label), Some(list)) = (label, list) else {
        return Err(VerifyError::ParseMismatch);
    };

    let numbers = list.select(&item_selector).map(element_text).collect();
    Ok(IdentityRecord::new(element_text(label), numbers))
}
