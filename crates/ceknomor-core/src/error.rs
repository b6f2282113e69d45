//! Error types shared by the verification pipeline.
//!
//! Per-row failures are carried inside [`crate::model::VerificationResult`] as
//! a [`VerifyError`]; the same type is reused at the session boundary for
//! user-input and state errors so every failure has one vocabulary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse error family, used for logging and for choosing user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Connection refused, DNS failure, timeout.
    Network,
    /// The remote answered, but not with the status the protocol expects.
    Protocol,
    /// The expected HTML or JSON structure was absent.
    Parse,
    /// The remote service explicitly reported a negative answer.
    Service,
    /// Malformed batch source, missing arguments, invalid URL.
    UserInput,
    /// Event arrived in a phase that cannot handle it.
    State,
}

/// Errors produced while verifying a row or driving a session.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum VerifyError {
    /// Connection or timeout failure
    #[error("Request Error: {0}")]
    Network(String),
    /// Identity check form was not answered with a redirect
    #[error("POST request failed with status code {0}")]
    PostRejected(u16),
    /// Identity result page could not be fetched
    #[error("GET request failed with status code {0}")]
    GetFailed(u16),
    /// Non-200 answer from a JSON endpoint or table host
    #[error("HTTP Error {0}")]
    HttpStatus(u16),
    /// Identity result page lacks the label heading or the number list
    #[error("Data tidak ditemukan atau format respons berubah.")]
    ParseMismatch,
    /// Body could not be decoded at all
    #[error("Respons tidak valid: {0}")]
    InvalidResponse(String),
    /// The service answered `status=false`
    #[error("{0}")]
    Service(String),
    /// Bad user-supplied input
    #[error("{0}")]
    UserInput(String),
    /// A format was chosen but nothing is pending
    #[error("Tidak ada data untuk diproses. Kirim data terlebih dahulu.")]
    NoPendingBatch,
}

impl VerifyError {
    /// Family this error belongs to.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Network(_) => ErrorCategory::Network,
            Self::PostRejected(_) | Self::GetFailed(_) | Self::HttpStatus(_) => {
                ErrorCategory::Protocol
            }
            Self::ParseMismatch | Self::InvalidResponse(_) => ErrorCategory::Parse,
            Self::Service(_) => ErrorCategory::Service,
            Self::UserInput(_) => ErrorCategory::UserInput,
            Self::NoPendingBatch => ErrorCategory::State,
        }
    }

    /// Shorthand for a [`VerifyError::UserInput`].
    pub fn user_input(message: impl Into<String>) -> Self {
        Self::UserInput(message.into())
    }
}

impl From<reqwest::Error> for VerifyError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err.to_string())
    }
}

/// Errors raised while rendering or staging an export artifact.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV writer failure
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// Spreadsheet writer failure
    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    /// Temporary storage failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
