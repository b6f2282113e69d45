//! Column schema per verification kind.

use crate::model::{Outcome, Resolution, ResultSet, VerificationKind, VerificationRequest, VerificationResult};
use std::fmt;

/// Identity report columns
pub const IDENTITY_COLUMNS: [&str; 6] = ["NIK", "KK", "Status", "Nomor", "Message", "Sisa"];
/// SIM status report columns
pub const SIM_STATUS_COLUMNS: [&str; 5] = [
    "MSISDN",
    "Card Status",
    "Activation Status",
    "Last 4 ICCID",
    "Message",
];

const STATUS_SUCCESS: &str = "Berhasil";
const STATUS_FAILURE: &str = "Gagal";

/// A single report cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cell {
    /// Free text
    Text(String),
    /// Small count, kept numeric for spreadsheets
    Count(u8),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Count(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Header for `kind`.
#[must_use]
pub fn columns(kind: VerificationKind) -> &'static [&'static str] {
    match kind {
        VerificationKind::Identity => &IDENTITY_COLUMNS,
        VerificationKind::SimStatus => &SIM_STATUS_COLUMNS,
    }
}

fn identity_row(result: &VerificationResult) -> Vec<Cell> {
    let (nik, kk) = match &result.request {
        VerificationRequest::Identity { nik, kk } => (nik.as_str(), kk.as_str()),
        VerificationRequest::SimStatus { msisdn } => (msisdn.as_str(), ""),
    };
    let (status, numbers, message) = match &result.outcome {
        Outcome::Success(Resolution::Identity(record)) => {
            (STATUS_SUCCESS, record.numbers.join(", "), String::new())
        }
        Outcome::Success(Resolution::SimStatus(_)) => {
            (STATUS_FAILURE, String::new(), "unexpected SIM status row".to_string())
        }
        Outcome::Failure(err) => (STATUS_FAILURE, String::new(), err.to_string()),
    };
    vec![
        nik.into(),
        kk.into(),
        status.into(),
        numbers.into(),
        message.into(),
        Cell::Count(result.remaining()),
    ]
}

fn sim_status_row(result: &VerificationResult) -> Vec<Cell> {
    let msisdn = match &result.request {
        VerificationRequest::SimStatus { msisdn } => msisdn.clone(),
        VerificationRequest::Identity { nik, .. } => nik.clone(),
    };
    match &result.outcome {
        Outcome::Success(Resolution::SimStatus(record)) => vec![
            msisdn.into(),
            record.card_status.clone().into(),
            record.activation_status.clone().into(),
            record.iccid_last4.clone().into(),
            "".into(),
        ],
        Outcome::Success(Resolution::Identity(_)) => vec![
            msisdn.into(),
            "".into(),
            "".into(),
            "".into(),
            "unexpected identity row".into(),
        ],
        Outcome::Failure(err) => vec![
            msisdn.into(),
            "".into(),
            "".into(),
            "".into(),
            err.to_string().into(),
        ],
    }
}

/// Body rows of `set`, in order, matching [`columns`].
#[must_use]
pub fn rows(set: &ResultSet) -> Vec<Vec<Cell>> {
    let render = match set.kind() {
        VerificationKind::Identity => identity_row,
        VerificationKind::SimStatus => sim_status_row,
    };
    set.iter().map(render).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VerifyError;
    use crate::model::{IdentityRecord, SimRecord};

    #[test]
    fn test_identity_rows() {
        let set = ResultSet::new(
            VerificationKind::Identity,
            vec![
                VerificationResult::success(
                    VerificationRequest::identity("3201", "3202"),
                    Resolution::Identity(IdentityRecord::new(
                        "3201".into(),
                        vec!["0811".into(), "0822".into()],
                    )),
                ),
                VerificationResult::failure(
                    VerificationRequest::identity("3301", "3302"),
                    VerifyError::PostRejected(200),
                ),
            ],
        );

        let rows = rows(&set);
        let rendered: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(ToString::to_string).collect())
            .collect();
        assert_eq!(
            rendered[0],
            vec!["3201", "3202", "Berhasil", "0811, 0822", "", "1"]
        );
        assert_eq!(
            rendered[1],
            vec![
                "3301",
                "3302",
                "Gagal",
                "",
                "POST request failed with status code 200",
                "3"
            ]
        );
        assert_eq!(rows[0].len(), columns(VerificationKind::Identity).len());
    }

    #[test]
    fn test_sim_rows() {
        let set = ResultSet::new(
            VerificationKind::SimStatus,
            vec![VerificationResult::success(
                VerificationRequest::sim_status("0812"),
                Resolution::SimStatus(SimRecord {
                    card_status: "ACTIVE".into(),
                    activation_status: "DONE".into(),
                    iccid_last4: "5678".into(),
                }),
            )],
        );
        let rows = rows(&set);
        assert_eq!(
            rows[0],
            vec![
                Cell::from("62812"),
                Cell::from("ACTIVE"),
                Cell::from("DONE"),
                Cell::from("5678"),
                Cell::from(""),
            ]
        );
    }
}
