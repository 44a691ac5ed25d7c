use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::GatewayError;

/// A visitor page view reported by the tracking beacon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconEvent {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[async_trait]
pub trait BeaconPort: Send + Sync {
    async fn send(&self, event: &BeaconEvent) -> Result<(), GatewayError>;
}
