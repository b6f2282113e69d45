//! Verification data model: requests, per-row results and ordered result sets.

use crate::error::VerifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of phone numbers a single identity may register.
pub const MAX_REGISTRATIONS: u8 = 3;

/// Placeholder used when the SIM service omits a field.
pub const UNKNOWN: &str = "Tidak diketahui";

/// Which verification service a batch targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerificationKind {
    /// NIK + KK lookup of registered phone numbers
    Identity,
    /// MSISDN lookup of SIM card status
    SimStatus,
}

impl VerificationKind {
    /// Number of leading table columns that form the lookup key.
    #[must_use]
    pub const fn key_columns(self) -> usize {
        match self {
            Self::Identity => 2,
            Self::SimStatus => 1,
        }
    }

    /// Prefix used for exported file names.
    #[must_use]
    pub const fn file_prefix(self) -> &'static str {
        match self {
            Self::Identity => "ceknik",
            Self::SimStatus => "cekstatus",
        }
    }
}

impl fmt::Display for VerificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::SimStatus => f.write_str("sim-status"),
        }
    }
}

/// Rewrites a local `08…` number into the international `628…` form.
///
/// Any other input is returned unchanged, so the function is idempotent.
/// Callers trim before normalizing.
///
/// # Examples
///
/// ```
/// use ceknomor_core::model::normalize_msisdn;
/// assert_eq!(normalize_msisdn("081234"), "6281234");
/// assert_eq!(normalize_msisdn("6281234"), "6281234");
/// ```
#[must_use]
pub fn normalize_msisdn(raw: &str) -> String {
    raw.strip_prefix("08")
        .map_or_else(|| raw.to_string(), |rest| format!("628{rest}"))
}

/// A single lookup key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationRequest {
    /// National identity number paired with the family card number
    Identity {
        /// NIK
        nik: String,
        /// KK
        kk: String,
    },
    /// Subscriber phone number, already normalized
    SimStatus {
        /// MSISDN in `628…` form
        msisdn: String,
    },
}

impl VerificationRequest {
    /// Build an identity request from raw values.
    pub fn identity(nik: impl Into<String>, kk: impl Into<String>) -> Self {
        Self::Identity {
            nik: nik.into().trim().to_string(),
            kk: kk.into().trim().to_string(),
        }
    }

    /// Build a SIM status request, normalizing the number.
    #[must_use]
    pub fn sim_status(msisdn: &str) -> Self {
        Self::SimStatus {
            msisdn: normalize_msisdn(msisdn),
        }
    }

    /// Kind of service this request is meant for.
    #[must_use]
    pub const fn kind(&self) -> VerificationKind {
        match self {
            Self::Identity { .. } => VerificationKind::Identity,
            Self::SimStatus { .. } => VerificationKind::SimStatus,
        }
    }
}

impl fmt::Display for VerificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity { nik, kk } => write!(f, "{nik}/{kk}"),
            Self::SimStatus { msisdn } => f.write_str(msisdn),
        }
    }
}

/// Numbers registered under an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Identity label as rendered by the result page
    pub label: String,
    /// Registered phone numbers (0 to 3)
    pub numbers: Vec<String>,
    /// Unused registration slots
    pub remaining: u8,
}

impl IdentityRecord {
    /// Build a record, deriving `remaining` from the number count.
    #[must_use]
    pub fn new(label: String, numbers: Vec<String>) -> Self {
        let used = u8::try_from(numbers.len()).unwrap_or(u8::MAX);
        Self {
            label,
            numbers,
            remaining: MAX_REGISTRATIONS.saturating_sub(used),
        }
    }
}

/// SIM card status as reported by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRecord {
    /// Card status, e.g. `ACTIVE`
    pub card_status: String,
    /// Activation status
    pub activation_status: String,
    /// Last four characters of the ICCID, or [`UNKNOWN`]
    pub iccid_last4: String,
}

/// Successful lookup payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    /// Identity lookup succeeded
    Identity(IdentityRecord),
    /// SIM status lookup succeeded
    SimStatus(SimRecord),
}

/// Outcome of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The service resolved the key
    Success(Resolution),
    /// Anything else; never aborts the batch
    Failure(VerifyError),
}

/// Result of a single verification, tagged with the input that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Input as received
    pub request: VerificationRequest,
    /// What happened
    pub outcome: Outcome,
}

impl VerificationResult {
    /// Successful result.
    #[must_use]
    pub const fn success(request: VerificationRequest, resolution: Resolution) -> Self {
        Self {
            request,
            outcome: Outcome::Success(resolution),
        }
    }

    /// Failed result.
    #[must_use]
    pub const fn failure(request: VerificationRequest, error: VerifyError) -> Self {
        Self {
            request,
            outcome: Outcome::Failure(error),
        }
    }

    /// Whether the row resolved.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    /// Error carried by a failed row.
    #[must_use]
    pub const fn error(&self) -> Option<&VerifyError> {
        match &self.outcome {
            Outcome::Failure(err) => Some(err),
            Outcome::Success(_) => None,
        }
    }

    /// Free registration slots. Failed identity rows report the full quota.
    #[must_use]
    pub const fn remaining(&self) -> u8 {
        match &self.outcome {
            Outcome::Success(Resolution::Identity(record)) => record.remaining,
            _ => MAX_REGISTRATIONS,
        }
    }
}

/// Ordered results of one batch run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    kind: VerificationKind,
    results: Vec<VerificationResult>,
}

impl ResultSet {
    /// Wrap results produced for `kind`, keeping their order.
    #[must_use]
    pub const fn new(kind: VerificationKind, results: Vec<VerificationResult>) -> Self {
        Self { kind, results }
    }

    /// Kind of every row in the set.
    #[must_use]
    pub const fn kind(&self) -> VerificationKind {
        self.kind
    }

    /// Rows in input order.
    #[must_use]
    pub fn results(&self) -> &[VerificationResult] {
        &self.results
    }

    /// Iterate rows in input order.
    pub fn iter(&self) -> std::slice::Iter<'_, VerificationResult> {
        self.results.iter()
    }

    /// Row count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of successful rows.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a VerificationResult;
    type IntoIter = std::slice::Iter<'a, VerificationResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
