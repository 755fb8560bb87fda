use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error};

use nearnest_api::ApiError;

use crate::validate::{BodyError, validate_body};

/// Minimum gap between two accepted sends.
pub const THROTTLE_WINDOW: Duration = Duration::from_millis(1500);

/// Local send-rate limit: a timestamp of the last accepted send, not a queue.
#[derive(Debug, Clone)]
pub struct SendThrottle {
    window: Duration,
    last_sent: Option<Instant>,
}

impl Default for SendThrottle {
    fn default() -> Self {
        Self::new(THROTTLE_WINDOW)
    }
}

impl SendThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_sent: None,
        }
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    /// Time left before another send is allowed.
    pub fn remaining(&self, now: Instant) -> Duration {
        match self.last_sent {
            Some(last) => self.window.saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn record(&mut self, at: Instant) {
        self.last_sent = Some(at);
    }
}

/// Result of a send attempt. Only `Sent` starts a new throttle window.
#[derive(Debug)]
pub enum SendOutcome {
    Sent,
    /// Rejected locally; the backend was not contacted
    Throttled { retry_in: Duration },
    /// Rejected locally; the backend was not contacted
    Invalid(BodyError),
    Failed(ApiError),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Validate, throttle, then hand the trimmed body to `send`.
pub(crate) async fn gated_send<F, Fut>(throttle: &mut SendThrottle, body: &str, send: F) -> SendOutcome
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<(), ApiError>>,
{
    let text = match validate_body(body) {
        Ok(text) => text.to_string(),
        Err(e) => return SendOutcome::Invalid(e),
    };

    let now = Instant::now();
    if !throttle.is_ready(now) {
        let retry_in = throttle.remaining(now);
        debug!("Send throttled, {:?} left", retry_in);
        return SendOutcome::Throttled { retry_in };
    }

    match send(text).await {
        Ok(()) => {
            throttle.record(now);
            SendOutcome::Sent
        }
        Err(e) => {
            error!("send failed: {}", e);
            SendOutcome::Failed(e)
        }
    }
}
