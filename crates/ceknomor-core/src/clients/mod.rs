//! Verification service clients
//!
//! Both clients turn every transport, protocol and parse problem into a
//! [`VerificationResult`] failure instead of returning an error, so callers
//! never need to unwind a batch.

pub mod identity;
pub mod sim_status;

pub use identity::IdentityLookupClient;
pub use sim_status::SimStatusClient;

use crate::model::{VerificationKind, VerificationRequest, VerificationResult};
use crate::error::VerifyError;
use async_trait::async_trait;

/// A service that resolves one [`VerificationRequest`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Verifier: Send + Sync {
    /// Kind of request this verifier understands.
    fn kind(&self) -> VerificationKind;

    /// Resolve a single request. Never fails; problems become a `Failure` row.
    async fn verify(&self, request: &VerificationRequest) -> VerificationResult;
}

/// Failure row for a request handed to the wrong verifier.
pub(crate) fn kind_mismatch(
    expected: VerificationKind,
    request: &VerificationRequest,
) -> VerificationResult {
    VerificationResult::failure(
        request.clone(),
        VerifyError::user_input(format!(
            "expected a {expected} request, got a {} request",
            request.kind()
        )),
    )
}
