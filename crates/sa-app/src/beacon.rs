//! Visitor tracking beacon.
//!
//! Fire-and-forget: each page view is sent from a background task, every
//! attempt is bounded by a timeout, failures are retried with exponential
//! backoff up to a fixed attempt count and then dropped without surfacing
//! anything to the user.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, Instrument};

use sa_core::config::BeaconConfig;
use sa_core::ports::{BeaconEvent, BeaconPort, ClockPort, GatewayError};

use crate::timeout::with_timeout;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeaconPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
    /// Repeated views of the same path inside this window are coalesced.
    pub debounce: Duration,
}

impl BeaconPolicy {
    pub fn from_config(config: &BeaconConfig) -> Self {
        Self {
            timeout: Duration::from_millis(config.timeout_ms),
            max_attempts: config.max_attempts,
            backoff: Duration::from_millis(config.backoff_ms),
            debounce: Duration::from_millis(config.debounce_ms),
        }
    }

    /// Delay before attempt `attempt + 1` (1-based `attempt`).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
        self.backoff.saturating_mul(factor)
    }

    /// Aborted requests were cancelled on purpose and are never retried;
    /// client errors and undecodable answers will not improve either.
    pub fn should_retry(error: &GatewayError) -> bool {
        match error {
            GatewayError::Aborted | GatewayError::Decode(_) => false,
            GatewayError::Server {
                status: Some(status),
                ..
            } => !(400..500).contains(status),
            GatewayError::Network(_) | GatewayError::Timeout { .. } | GatewayError::Server { .. } => {
                true
            }
        }
    }
}

pub struct TrackingBeacon {
    port: Arc<dyn BeaconPort>,
    clock: Arc<dyn ClockPort>,
    policy: BeaconPolicy,
    last_sent: Mutex<HashMap<String, Instant>>,
}

impl TrackingBeacon {
    pub fn new(port: Arc<dyn BeaconPort>, clock: Arc<dyn ClockPort>, policy: BeaconPolicy) -> Self {
        Self {
            port,
            clock,
            policy,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    /// Reports a page view. Returns `None` when the view was coalesced with
    /// a recent one, otherwise the handle of the delivery task, which yields
    /// whether the beacon was delivered.
    pub fn track(&self, path: &str, referrer: Option<&str>) -> Option<JoinHandle<bool>> {
        if self.debounced(path) {
            debug!(path, "beacon debounced");
            return None;
        }

        let event = BeaconEvent {
            path: path.to_string(),
            referrer: referrer.map(str::to_string),
            occurred_at: self.clock.now(),
        };
        let port = Arc::clone(&self.port);
        let policy = self.policy;
        let span = tracing::debug_span!("beacon.deliver", path);

        Some(tokio::spawn(deliver(port, policy, event).instrument(span)))
    }

    fn debounced(&self, path: &str) -> bool {
        let now = Instant::now();
        let mut last_sent = self.last_sent.lock().unwrap_or_else(PoisonError::into_inner);
        match last_sent.get(path) {
            Some(at) if now.duration_since(*at) < self.policy.debounce => true,
            _ => {
                last_sent.insert(path.to_string(), now);
                false
            }
        }
    }
}

async fn deliver(port: Arc<dyn BeaconPort>, policy: BeaconPolicy, event: BeaconEvent) -> bool {
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match with_timeout(policy.timeout, port.send(&event)).await {
            Ok(()) => return true,
            Err(err) if !BeaconPolicy::should_retry(&err) => {
                debug!(attempt, error = %err, "beacon not retryable, dropping");
                return false;
            }
            Err(err) => {
                debug!(attempt, error = %err, "beacon attempt failed");
                if attempt < max_attempts {
                    tokio::time::sleep(policy.backoff_after(attempt)).await;
                }
            }
        }
    }
    debug!(max_attempts, "beacon gave up");
    false
}
