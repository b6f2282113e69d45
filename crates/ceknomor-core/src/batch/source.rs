//! Batch input sources: inline text blocks and remote delimited tables.

#![allow(clippy::non_std_lazy_statics)]

use crate::error::VerifyError;
use crate::model::{VerificationKind, VerificationRequest};
use async_trait::async_trait;
use csv::{ReaderBuilder, Trim};
use lazy_regex::lazy_regex;
use reqwest::{StatusCode, Url};
use tracing::{debug, info};

/// Separators accepted between NIK and KK on one text line.
static RE_KEY_SEPARATOR: lazy_regex::Lazy<regex::Regex> = lazy_regex!(r"[\s,;]+");

/// Example shown to users who paste something that is not an https URL.
pub const TABLE_URL_EXAMPLE: &str =
    "https://docs.google.com/spreadsheets/d/ID_SPREADSHEET/export?format=csv&gid=ID_SHEET";

/// Raw batch input as received from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchSource {
    /// Newline-delimited keys typed into the chat
    Text(String),
    /// Remote CSV table; first row is a header
    Url(Url),
}

impl BatchSource {
    /// Inline text batch.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::UserInput`] if the text holds no keys.
    pub fn text(raw: &str) -> Result<Self, VerifyError> {
        if raw.trim().is_empty() {
            return Err(VerifyError::user_input("Data kosong. Kirim minimal satu baris."));
        }
        Ok(Self::Text(raw.trim().to_string()))
    }

    /// Remote table batch. Only `https://` URLs are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::UserInput`] for anything that is not an https URL.
    pub fn url(raw: &str) -> Result<Self, VerifyError> {
        let invalid = || {
            VerifyError::user_input(format!(
                "URL tidak valid. Harap gunakan format URL spreadsheet yang valid seperti:\n\n{TABLE_URL_EXAMPLE}"
            ))
        };
        let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
        if url.scheme() != "https" {
            return Err(invalid());
        }
        Ok(Self::Url(url))
    }
}

/// One parsed input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchRow {
    /// A well-formed key ready to be verified
    Ready(VerificationRequest),
    /// A row that could not be turned into a key; recorded as a failure
    Malformed {
        /// Whatever could be salvaged from the row
        request: VerificationRequest,
        /// Why the row was rejected
        error: VerifyError,
    },
}

impl BatchRow {
    /// Input recorded for this row.
    #[must_use]
    pub const fn request(&self) -> &VerificationRequest {
        match self {
            Self::Ready(request) | Self::Malformed { request, .. } => request,
        }
    }
}

fn build_row(kind: VerificationKind, keys: &[&str], location: &str) -> BatchRow {
    let key = |i: usize| keys.get(i).map_or("", |k| k.trim());
    match kind {
        VerificationKind::Identity => {
            let request = VerificationRequest::identity(key(0), key(1));
            if key(0).is_empty() || key(1).is_empty() {
                BatchRow::Malformed {
                    request,
                    error: VerifyError::user_input(format!("{location}: diperlukan NIK dan KK")),
                }
            } else {
                BatchRow::Ready(request)
            }
        }
        VerificationKind::SimStatus => {
            let request = VerificationRequest::sim_status(key(0));
            if key(0).is_empty() {
                BatchRow::Malformed {
                    request,
                    error: VerifyError::user_input(format!("{location}: diperlukan MSISDN")),
                }
            } else {
                BatchRow::Ready(request)
            }
        }
    }
}

/// Parse a newline-delimited text batch. Blank lines are skipped.
///
/// Identity lines hold `NIK KK` separated by whitespace, comma or semicolon;
/// SIM lines hold one number each.
#[must_use]
pub fn parse_text(kind: VerificationKind, text: &str) -> Vec<BatchRow> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let location = format!("baris {}", index + 1);
            match kind {
                VerificationKind::Identity => {
                    let keys: Vec<&str> = RE_KEY_SEPARATOR
                        .split(line.trim())
                        .filter(|k| !k.is_empty())
                        .collect();
                    if keys.len() > 2 {
                        BatchRow::Malformed {
                            request: VerificationRequest::identity(keys[0], keys[1]),
                            error: VerifyError::user_input(format!(
                                "{location}: diperlukan tepat satu NIK dan satu KK"
                            )),
                        }
                    } else {
                        build_row(kind, &keys, &location)
                    }
                }
                VerificationKind::SimStatus => build_row(kind, &[line.trim()], &location),
            }
        })
        .collect()
}

/// Parse a CSV table body. The first row is a header and is discarded.
///
/// Only the leading key column(s) are read; extra columns are ignored.
/// Every data row yields one [`BatchRow`]: rows with blank or missing keys
/// and undecodable records become [`BatchRow::Malformed`].
#[must_use]
pub fn parse_table(kind: VerificationKind, body: &str) -> Vec<BatchRow> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(body.as_bytes());

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        // Header is row 1
        let location = format!("baris {}", index + 2);
        match record {
            Ok(record) => {
                let keys: Vec<&str> = record.iter().take(kind.key_columns()).collect();
                rows.push(build_row(kind, &keys, &location));
            }
            Err(e) => rows.push(BatchRow::Malformed {
                request: empty_request(kind),
                error: VerifyError::user_input(format!("{location}: {e}")),
            }),
        }
    }
    rows
}

fn empty_request(kind: VerificationKind) -> VerificationRequest {
    match kind {
        VerificationKind::Identity => VerificationRequest::identity("", ""),
        VerificationKind::SimStatus => VerificationRequest::sim_status(""),
    }
}

/// Fetches the body of a remote table.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TableSource: Send + Sync {
    /// Download the table at `url` as text.
    async fn fetch(&self, url: &Url) -> Result<String, VerifyError>;
}

/// [`TableSource`] backed by a plain HTTP GET. No timeout, no retries.
#[derive(Debug, Clone, Default)]
pub struct HttpTableSource {
    http: reqwest::Client,
}

impl HttpTableSource {
    /// Create a fetcher with a default HTTP client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TableSource for HttpTableSource {
    async fn fetch(&self, url: &Url) -> Result<String, VerifyError> {
        debug!(url = %url, "Fetching remote table");
        let response = self.http.get(url.clone()).send().await?;
        if response.status() != StatusCode::OK {
            return Err(VerifyError::HttpStatus(response.status().as_u16()));
        }
        let body = response.text().await?;
        info!(url = %url, bytes = body.len(), "Remote table fetched");
        Ok(body)
    }
}

/// Resolve a batch source into rows, fetching the table if needed.
///
/// # Errors
///
/// Returns an error if the remote table cannot be fetched. Individual bad rows
/// never error; they come back as [`BatchRow::Malformed`].
pub async fn load_rows(
    kind: VerificationKind,
    source: &BatchSource,
    tables: &dyn TableSource,
) -> Result<Vec<BatchRow>, VerifyError> {
    match source {
        BatchSource::Text(text) => Ok(parse_text(kind, text)),
        BatchSource::Url(url) => {
            let body = tables.fetch(url).await?;
            Ok(parse_table(kind, &body))
        }
    }
}
