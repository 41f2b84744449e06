//! Injectable waiting.
//!
//! Rate-limit backoff and scan throttling sleep through a [`Delay`] so tests
//! can observe the requested pauses without waiting, and so a caller can
//! abort a scan by dropping its future while it is parked.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

#[async_trait]
pub trait Delay: Send + Sync + fmt::Debug {
    async fn sleep(&self, duration: Duration);
}

/// Real wall-clock sleeping on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
