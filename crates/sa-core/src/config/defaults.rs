//! Default values used when a configuration key is absent.

pub const API_BASE_URL: &str = "http://localhost:3000/api";
pub const REQUEST_TIMEOUT_MS: u64 = 10_000;

pub const BADGE_POLL_INTERVAL_SECS: u64 = 30;
pub const BADGE_SECTIONS: &[&str] = &["orders", "store", "notifications"];

pub const BEACON_TIMEOUT_MS: u64 = 5_000;
pub const BEACON_MAX_ATTEMPTS: u32 = 3;
pub const BEACON_BACKOFF_MS: u64 = 500;
pub const BEACON_DEBOUNCE_MS: u64 = 1_000;

pub const PROTECTED_ROLES: &[&str] = &["Admin", "User"];
