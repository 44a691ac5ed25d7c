//! Sidebar badge counters.
//!
//! A poller fetches navigation section counts on a fixed interval and
//! publishes them on a `watch` channel. Each section is registered in the
//! [`InvalidationRegistry`] so a mutation elsewhere can trigger an
//! immediate refresh instead of waiting for the next tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use sa_core::config::defaults;
use sa_core::ports::{AuthContextPort, BadgeCountPort, SectionCounts};

use crate::invalidation::{InvalidationRegistry, Registration};
use crate::timeout::with_timeout;

pub struct BadgePollerDeps {
    pub counts: Arc<dyn BadgeCountPort>,
    pub auth: Arc<dyn AuthContextPort>,
    pub registry: Arc<InvalidationRegistry>,
}

pub struct BadgePoller {
    receiver: watch::Receiver<SectionCounts>,
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
    _registrations: Vec<Registration>,
}

impl BadgePoller {
    /// Starts polling `sections` every `interval`. The first poll happens
    /// right away. A zero interval falls back to the default.
    pub fn spawn(
        deps: BadgePollerDeps,
        sections: Vec<String>,
        interval: Duration,
        request_timeout: Duration,
    ) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_secs(defaults::BADGE_POLL_INTERVAL_SECS)
        } else {
            interval
        };

        let (sender, receiver) = watch::channel(SectionCounts::new());
        let refresh = Arc::new(Notify::new());
        let cancel = CancellationToken::new();

        let registrations = sections
            .iter()
            .map(|section| {
                let refresh = Arc::clone(&refresh);
                let cancel = cancel.clone();
                deps.registry.register(section.clone(), move || {
                    // Ignore invocations that race with teardown.
                    if !cancel.is_cancelled() {
                        refresh.notify_one();
                    }
                })
            })
            .collect();

        let task = PollTask {
            counts: deps.counts,
            auth: deps.auth,
            sections,
            interval,
            request_timeout,
            refresh,
            cancel: cancel.clone(),
            sender,
        };
        let handle = tokio::spawn(task.run().instrument(info_span!("badge_poller")));

        Self {
            receiver,
            cancel,
            handle: Some(handle),
            _registrations: registrations,
        }
    }

    /// Latest published counts.
    pub fn counts(&self) -> SectionCounts {
        self.receiver.borrow().clone()
    }

    pub fn count(&self, section: &str) -> u64 {
        self.receiver.borrow().get(section).copied().unwrap_or(0)
    }

    pub fn subscribe(&self) -> watch::Receiver<SectionCounts> {
        self.receiver.clone()
    }

    /// Stops polling and waits for the task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "badge poller task ended abnormally");
            }
        }
    }
}

impl Drop for BadgePoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct PollTask {
    counts: Arc<dyn BadgeCountPort>,
    auth: Arc<dyn AuthContextPort>,
    sections: Vec<String>,
    interval: Duration,
    request_timeout: Duration,
    refresh: Arc<Notify>,
    cancel: CancellationToken,
    sender: watch::Sender<SectionCounts>,
}

impl PollTask {
    async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
                _ = self.refresh.notified() => {
                    debug!("refresh requested");
                    ticker.reset();
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }
        }
        debug!("badge poller stopped");
    }

    async fn poll_once(&self) {
        let status = self.auth.status();
        let Some(user_id) = status.user_id() else {
            debug!("no authenticated user, skipping badge poll");
            return;
        };

        match with_timeout(
            self.request_timeout,
            self.counts.section_counts(&self.sections, user_id),
        )
        .await
        {
            Ok(counts) => {
                self.sender.send_replace(counts);
            }
            Err(err) => warn!(error = %err, "badge count poll failed, keeping previous counts"),
        }
    }
}
