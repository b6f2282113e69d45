//! Small helpers shared by the core and the transport adapters.

use anyhow::Result;
use std::time::Duration;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::Retry;
use tracing::warn;

/// Safely truncates a string to a maximum character length (not bytes).
///
/// # Examples
///
/// ```
/// use ceknomor_core::utils::truncate_str;
/// assert_eq!(truncate_str("Tidak diketahui", 5), "Tidak");
/// ```
pub fn truncate_str(s: impl AsRef<str>, max_chars: usize) -> String {
    let s = s.as_ref();
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    s.char_indices()
        .nth(max_chars)
        .map_or_else(|| s.to_string(), |(pos, _)| s[..pos].to_string())
}

/// Last `n` characters of `s`, or `None` if it is shorter than `n`.
///
/// # Examples
///
/// ```
/// use ceknomor_core::utils::last_chars;
/// assert_eq!(last_chars("12345678", 4).as_deref(), Some("5678"));
/// assert_eq!(last_chars("123", 4), None);
/// ```
#[must_use]
pub fn last_chars(s: &str, n: usize) -> Option<String> {
    let count = s.chars().count();
    if count < n {
        return None;
    }
    Some(s.chars().skip(count - n).collect())
}

/// Retry a transport send with exponential backoff and jitter.
///
/// Meant for message delivery (prompts, documents). Verification calls are
/// never routed through here: a failed lookup is recorded once.
///
/// # Errors
///
/// Returns the last error if every attempt fails.
pub async fn retry_transport_operation<F, Fut, T>(operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    use crate::config::{
        TRANSPORT_INITIAL_BACKOFF_MS, TRANSPORT_MAX_BACKOFF_MS, TRANSPORT_MAX_RETRIES,
    };

    let retry_strategy = ExponentialBackoff::from_millis(TRANSPORT_INITIAL_BACKOFF_MS)
        .max_delay(Duration::from_millis(TRANSPORT_MAX_BACKOFF_MS))
        .map(jitter)
        .take(TRANSPORT_MAX_RETRIES);

    Retry::spawn(retry_strategy, operation).await.map_err(|e| {
        warn!(
            "Transport operation failed after {} retries: {}",
            TRANSPORT_MAX_RETRIES, e
        );
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_truncate_str_unicode() {
        let s = "Привет, мир!";
        assert_eq!(truncate_str(s, 6), "Привет");
        assert_eq!(truncate_str(s, 50), "Привет, мир!");
    }

    #[test]
    fn test_last_chars() {
        assert_eq!(last_chars("89620012345678", 4).as_deref(), Some("5678"));
        assert_eq!(last_chars("1234", 4).as_deref(), Some("1234"));
        assert_eq!(last_chars("", 4), None);
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_error() {
        let attempts = AtomicUsize::new(0);
        let value = retry_transport_operation(|| async {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow::anyhow!("connection reset"))
            } else {
                Ok(42)
            }
        })
        .await
        .expect("second attempt succeeds");

        assert_eq!(value, 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
