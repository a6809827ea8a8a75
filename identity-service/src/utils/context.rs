use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

/// Cancellation and deadline of the inbound request an operation runs for.
///
/// Every outbound call made on behalf of the request goes through
/// [`RequestContext::run`].
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new(cancel: CancellationToken, deadline: Option<Instant>) -> Self {
        Self { cancel, deadline }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new(CancellationToken::new(), Some(Instant::now() + timeout))
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Drive `fut` until it finishes, the request is cancelled, or the
    /// deadline passes, whichever comes first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, Interrupted> {
        if self.cancel.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }

        let bounded = async {
            match self.deadline {
                Some(deadline) => tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| Interrupted::DeadlineExceeded),
                None => Ok(fut.await),
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupted::Cancelled),
            out = bounded => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_run_completes() {
        let ctx = RequestContext::default();
        assert_eq!(ctx.run(async { 7 }).await, Ok(7));
    }

    #[tokio::test]
    async fn test_run_observes_cancellation() {
        let ctx = RequestContext::default();
        let token = ctx.cancellation_token().clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(30)))
            .await;
        assert_eq!(result, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_already_cancelled_short_circuits() {
        let ctx = RequestContext::default();
        ctx.cancellation_token().cancel();
        assert_eq!(ctx.run(async { 1 }).await, Err(Interrupted::Cancelled));
    }

    #[tokio::test]
    async fn test_run_observes_deadline() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));
        let result = ctx
            .run(tokio::time::sleep(Duration::from_secs(30)))
            .await;
        assert_eq!(result, Err(Interrupted::DeadlineExceeded));
    }
}
