//! # Configuration DTO
//!
//! Maps a TOML document onto [`AppConfig`]. Absent keys take the values in
//! [`defaults`]; present keys are accepted as they are (no range checks).

pub mod defaults;

use std::path::PathBuf;
use std::time::Duration;

use toml::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeConfig {
    pub poll_interval_secs: u64,
    pub sections: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeaconConfig {
    pub timeout_ms: u64,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    pub protected_roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Directory for rolling log files. Empty means stdout only.
    pub dir: PathBuf,
}

/// Application configuration DTO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub badges: BadgeConfig,
    pub beacon: BeaconConfig,
    pub policy: PolicyConfig,
    pub logging: LoggingConfig,
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl BadgeConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_toml(&Value::Table(Default::default()))
    }
}

fn lookup<'a>(value: &'a Value, section: &str, key: &str) -> Option<&'a Value> {
    value.get(section).and_then(|s| s.get(key))
}

fn string_or(value: &Value, section: &str, key: &str, default: &str) -> String {
    lookup(value, section, key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn u64_or(value: &Value, section: &str, key: &str, default: u64) -> u64 {
    lookup(value, section, key)
        .and_then(Value::as_integer)
        .map(|n| n.max(0) as u64)
        .unwrap_or(default)
}

fn strings_or(value: &Value, section: &str, key: &str, default: &[&str]) -> Vec<String> {
    match lookup(value, section, key).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => default.iter().map(|s| s.to_string()).collect(),
    }
}

impl AppConfig {
    /// Create AppConfig from a parsed TOML value.
    pub fn from_toml(value: &Value) -> Self {
        Self {
            api: ApiConfig {
                base_url: string_or(value, "api", "base_url", defaults::API_BASE_URL),
                request_timeout_ms: u64_or(
                    value,
                    "api",
                    "request_timeout_ms",
                    defaults::REQUEST_TIMEOUT_MS,
                ),
            },
            badges: BadgeConfig {
                poll_interval_secs: u64_or(
                    value,
                    "badges",
                    "poll_interval_secs",
                    defaults::BADGE_POLL_INTERVAL_SECS,
                ),
                sections: strings_or(value, "badges", "sections", defaults::BADGE_SECTIONS),
            },
            beacon: BeaconConfig {
                timeout_ms: u64_or(value, "beacon", "timeout_ms", defaults::BEACON_TIMEOUT_MS),
                max_attempts: u64_or(
                    value,
                    "beacon",
                    "max_attempts",
                    u64::from(defaults::BEACON_MAX_ATTEMPTS),
                )
                .min(u64::from(u32::MAX)) as u32,
                backoff_ms: u64_or(value, "beacon", "backoff_ms", defaults::BEACON_BACKOFF_MS),
                debounce_ms: u64_or(value, "beacon", "debounce_ms", defaults::BEACON_DEBOUNCE_MS),
            },
            policy: PolicyConfig {
                protected_roles: strings_or(
                    value,
                    "policy",
                    "protected_roles",
                    defaults::PROTECTED_ROLES,
                ),
            },
            logging: LoggingConfig {
                dir: PathBuf::from(string_or(value, "logging", "dir", "")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, defaults::API_BASE_URL);
        assert_eq!(config.badges.poll_interval(), Duration::from_secs(30));
        assert_eq!(config.policy.protected_roles, vec!["Admin", "User"]);
        assert!(config.logging.dir.as_os_str().is_empty());
    }

    #[test]
    fn present_keys_override_defaults() {
        let value: Value = toml::from_str(
            r#"
            [api]
            base_url = "https://shop.example/api"
            request_timeout_ms = 2500

            [badges]
            sections = ["orders"]

            [policy]
            protected_roles = []
            "#,
        )
        .unwrap();

        let config = AppConfig::from_toml(&value);
        assert_eq!(config.api.base_url, "https://shop.example/api");
        assert_eq!(config.api.request_timeout(), Duration::from_millis(2500));
        assert_eq!(config.badges.sections, vec!["orders"]);
        assert!(config.policy.protected_roles.is_empty());
        assert_eq!(config.beacon.max_attempts, defaults::BEACON_MAX_ATTEMPTS);
    }

    #[test]
    fn negative_numbers_clamp_to_zero() {
        let value: Value = toml::from_str("[beacon]\nbackoff_ms = -5").unwrap();
        assert_eq!(AppConfig::from_toml(&value).beacon.backoff_ms, 0);
    }
}
