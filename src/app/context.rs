//! Per-request execution context handed to every repository call.

use crate::error::{StoreError, StoreResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Carries the deadline a storage call must finish by.
///
/// Cancellation is dropping the future; the deadline bounds how long a call
/// may run when nobody drops it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
}

impl RequestContext {
    /// No deadline.
    pub fn background() -> Self {
        Self { deadline: None }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Runs `fut` under this context. An already expired context fails
    /// without polling `fut`.
    pub async fn run<T, F>(&self, fut: F) -> StoreResult<T>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match self.deadline {
            None => fut.await,
            Some(deadline) => {
                if Instant::now() >= deadline {
                    return Err(StoreError::DeadlineExceeded);
                }
                tokio::time::timeout_at(deadline, fut)
                    .await
                    .map_err(|_| StoreError::DeadlineExceeded)?
            }
        }
    }
}
