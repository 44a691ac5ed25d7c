use async_trait::async_trait;
use reqwest::Method;

use sa_core::ports::{BeaconEvent, BeaconPort, GatewayError};

use super::HttpClient;

/// `POST {base}/track`. The answer body is ignored beyond the envelope.
pub struct HttpBeacon {
    http: HttpClient,
}

impl HttpBeacon {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BeaconPort for HttpBeacon {
    async fn send(&self, event: &BeaconEvent) -> Result<(), GatewayError> {
        let request = self.http.request(Method::POST, "track").json(event);
        self.http.send::<serde_json::Value>(request).await.map(|_| ())
    }
}
