//! Auth context holders.
//!
//! The UI's auth provider owns the session; these adapters only expose its
//! current status to the application layer.

use std::sync::Arc;

use tokio::sync::watch;

use sa_core::ports::{AuthContextPort, AuthStatus};

/// Fixed status, for tools and tests that do not sign in.
#[derive(Debug, Clone)]
pub struct StaticAuthContext(AuthStatus);

impl StaticAuthContext {
    pub fn new(status: AuthStatus) -> Self {
        Self(status)
    }

    pub fn anonymous() -> Self {
        Self(AuthStatus::Unauthenticated)
    }
}

impl AuthContextPort for StaticAuthContext {
    fn status(&self) -> AuthStatus {
        self.0.clone()
    }
}

/// Status that changes over time. Starts out `Loading` until the session
/// is resolved through [`WatchAuthContext::set`].
#[derive(Debug, Clone)]
pub struct WatchAuthContext {
    sender: Arc<watch::Sender<AuthStatus>>,
}

impl WatchAuthContext {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(AuthStatus::Loading);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn set(&self, status: AuthStatus) {
        self.sender.send_replace(status);
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthStatus> {
        self.sender.subscribe()
    }
}

impl Default for WatchAuthContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthContextPort for WatchAuthContext {
    fn status(&self) -> AuthStatus {
        self.sender.borrow().clone()
    }
}
