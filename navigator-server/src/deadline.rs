//! Run a blocking, cancellable solve under a deadline.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

use crate::algorithm::{CancelToken, Cancelled};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeadlineError {
    #[error("solution timed out")]
    TimedOut,

    #[error("solver worker failed: {0}")]
    WorkerFailed(String),
}

impl From<Cancelled> for DeadlineError {
    fn from(_: Cancelled) -> Self {
        DeadlineError::TimedOut
    }
}

/// Run `solve` on the blocking pool and wait at most `timeout` for it.
///
/// On expiry the token handed to `solve` is cancelled, so the worker stops
/// at its next loop check instead of running on in the background.
pub async fn run_with_deadline<T, F>(timeout: Duration, solve: F) -> Result<T, DeadlineError>
where
    T: Send + 'static,
    F: FnOnce(CancelToken) -> Result<T, Cancelled> + Send + 'static,
{
    let token = CancelToken::new();
    let worker = token.clone();
    let handle = tokio::task::spawn_blocking(move || solve(worker));

    match tokio::time::timeout(timeout, handle).await {
        Ok(Ok(result)) => Ok(result?),
        Ok(Err(join_error)) => Err(DeadlineError::WorkerFailed(join_error.to_string())),
        Err(_) => {
            warn!(timeout_ms = timeout.as_millis() as u64, "solve exceeded its deadline");
            token.cancel();
            Err(DeadlineError::TimedOut)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[tokio::test]
    async fn fast_solve_returns_its_value() {
        let result = run_with_deadline(Duration::from_secs(5), |_| Ok(42)).await;
        assert_eq!(result, Ok(42));
    }

    #[tokio::test]
    async fn slow_solve_times_out_and_is_cancelled() {
        let observed = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&observed);

        let result: Result<(), _> = run_with_deadline(Duration::from_millis(20), move |token| {
            while !token.is_cancelled() {
                std::thread::sleep(Duration::from_millis(5));
            }
            flag.store(true, Ordering::SeqCst);
            token.check()
        })
        .await;
        assert_eq!(result, Err(DeadlineError::TimedOut));

        // The worker notices the cancellation shortly after the deadline.
        for _ in 0..200 {
            if observed.load(Ordering::SeqCst) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(observed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn cancelled_solve_is_a_timeout() {
        let result: Result<(), _> =
            run_with_deadline(Duration::from_secs(5), |_| Err(Cancelled)).await;
        assert_eq!(result, Err(DeadlineError::TimedOut));
    }

    #[tokio::test]
    async fn panicking_solve_is_reported() {
        let result: Result<(), _> =
            run_with_deadline(Duration::from_secs(5), |_| panic!("boom")).await;
        assert!(matches!(result, Err(DeadlineError::WorkerFailed(_))));
    }

    #[test]
    fn error_display() {
        assert_eq!(DeadlineError::TimedOut.to_string(), "solution timed out");
        assert_eq!(
            DeadlineError::WorkerFailed("panicked".into()).to_string(),
            "solver worker failed: panicked"
        );
    }
}
