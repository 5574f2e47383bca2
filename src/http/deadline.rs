//! Optional deadline for one logical call.

use std::future::Future;
use std::time::{Duration, Instant};

use futures_util::future::{select, Either};

use crate::error::HttpError;

/// Absolute deadline checked at every suspension point of a call.
///
/// `Deadline::none()` never fires. Dropping the call's future cancels it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Deadline {
    at: Option<Instant>,
}

impl Deadline {
    pub fn none() -> Self {
        Self { at: None }
    }

    /// Starts counting now. `None` means no deadline.
    pub fn after(timeout: Option<Duration>) -> Self {
        Self {
            at: timeout.map(|t| Instant::now() + t),
        }
    }

    /// Time left, or `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.at.map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Drive `fut` to completion unless the deadline passes first.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output, HttpError> {
        let Some(remaining) = self.remaining() else {
            return Ok(fut.await);
        };
        if remaining.is_zero() {
            return Err(HttpError::Timeout);
        }

        futures_util::pin_mut!(fut);
        match select(fut, futures_timer::Delay::new(remaining)).await {
            Either::Left((output, _)) => Ok(output),
            Either::Right(_) => Err(HttpError::Timeout),
        }
    }
}
