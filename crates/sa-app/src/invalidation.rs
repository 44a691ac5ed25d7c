//! Cross-component invalidation signal.
//!
//! Components that cache server-derived data (badge counters, permission
//! caches) register a refresh callback under a section name. Anything that
//! knows the data just changed calls [`InvalidationRegistry::invalidate`].
//! Delivery is fire-and-forget: an unregistered section is a silent no-op,
//! nothing is queued and nothing is retried.
//!
//! The registry is an explicit service handed out as `Arc`, not a global.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::debug;

type RefreshFn = Arc<dyn Fn() + Send + Sync>;

struct Entry {
    token: u64,
    refresh: RefreshFn,
}

#[derive(Default)]
pub struct InvalidationRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    next_token: AtomicU64,
}

impl InvalidationRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `refresh` under `section`. Last writer wins when a section is
    /// registered twice.
    ///
    /// The returned guard unregisters on drop, but only if the section still
    /// holds this registration.
    pub fn register<F>(self: &Arc<Self>, section: impl Into<String>, refresh: F) -> Registration
    where
        F: Fn() + Send + Sync + 'static,
    {
        let section = section.into();
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let replaced = self
            .lock()
            .insert(
                section.clone(),
                Entry {
                    token,
                    refresh: Arc::new(refresh),
                },
            )
            .is_some();
        if replaced {
            debug!(section = %section, "replaced existing invalidation callback");
        }

        Registration {
            registry: Arc::downgrade(self),
            section,
            token,
        }
    }

    /// Removes whatever is registered under `section`.
    pub fn unregister(&self, section: &str) -> bool {
        self.lock().remove(section).is_some()
    }

    fn unregister_token(&self, section: &str, token: u64) {
        let mut entries = self.lock();
        if entries.get(section).is_some_and(|e| e.token == token) {
            entries.remove(section);
        }
    }

    pub fn is_registered(&self, section: &str) -> bool {
        self.lock().contains_key(section)
    }

    pub fn sections(&self) -> Vec<String> {
        let mut sections: Vec<String> = self.lock().keys().cloned().collect();
        sections.sort();
        sections
    }

    /// Invokes the callback registered under `section`, if any. Returns
    /// whether a callback ran.
    pub fn invalidate(&self, section: &str) -> bool {
        // Callbacks run outside the lock so they may register or invalidate.
        let refresh = self.lock().get(section).map(|e| Arc::clone(&e.refresh));
        match refresh {
            Some(refresh) => {
                debug!(section, "invalidating section");
                refresh();
                true
            }
            None => {
                debug!(section, "no component registered, invalidation dropped");
                false
            }
        }
    }

    /// Invokes every registered callback and returns how many ran.
    pub fn invalidate_all(&self) -> usize {
        let callbacks: Vec<RefreshFn> = self
            .lock()
            .values()
            .map(|e| Arc::clone(&e.refresh))
            .collect();
        for refresh in &callbacks {
            refresh();
        }
        callbacks.len()
    }
}

/// Keeps a section registered for as long as it lives.
#[must_use = "dropping a Registration unregisters the callback"]
pub struct Registration {
    registry: Weak<InvalidationRegistry>,
    section: String,
    token: u64,
}

impl Registration {
    pub fn section(&self) -> &str {
        &self.section
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.unregister_token(&self.section, self.token);
        }
    }
}
