//! Batch processing: apply one verifier across an ordered list of rows.

pub mod source;

pub use source::{load_rows, BatchRow, BatchSource, HttpTableSource, TableSource};

use crate::clients::Verifier;
use crate::model::{ResultSet, VerificationResult};
use tracing::{info, instrument, warn};

/// Runs a [`Verifier`] over every row of a batch, sequentially.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchProcessor;

impl BatchProcessor {
    /// Verify every row in order. The output has exactly one result per row,
    /// at the same index. Malformed rows are recorded without calling the
    /// verifier, and a failed row never stops the rest of the batch.
    #[instrument(skip_all, fields(kind = %verifier.kind(), rows = rows.len()))]
    pub async fn run(rows: &[BatchRow], verifier: &dyn Verifier) -> ResultSet {
        let total = rows.len();
        let mut results = Vec::with_capacity(total);

        for (index, row) in rows.iter().enumerate() {
            let result = match row {
                BatchRow::Ready(request) if request.kind() == verifier.kind() => {
                    verifier.verify(request).await
                }
                BatchRow::Ready(request) => VerificationResult::failure(
                    request.clone(),
                    crate::error::VerifyError::user_input(format!(
                        "row kind {} does not match batch kind {}",
                        request.kind(),
                        verifier.kind()
                    )),
                ),
                BatchRow::Malformed { request, error } => {
                    warn!(row = index + 1, error = %error, "Skipping malformed row");
                    VerificationResult::failure(request.clone(), error.clone())
                }
            };
            info!(
                row = index + 1,
                total,
                input = %result.request,
                success = result.is_success(),
                "Row processed"
            );
            results.push(result);
        }

        let set = ResultSet::new(verifier.kind(), results);
        info!(
            succeeded = set.success_count(),
            total = set.len(),
            "Batch finished"
        );
        set
    }
}
