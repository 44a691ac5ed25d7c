use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use sa_core::ports::{BadgeCountPort, GatewayError, SectionCounts};
use sa_core::UserId;

use super::HttpClient;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CountsRequest<'a> {
    sections: &'a [String],
    user_id: &'a UserId,
}

/// `POST {base}/navigation/counts`.
pub struct HttpBadgeCounts {
    http: HttpClient,
}

impl HttpBadgeCounts {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl BadgeCountPort for HttpBadgeCounts {
    #[instrument(name = "http.section_counts", skip(self, sections))]
    async fn section_counts(
        &self,
        sections: &[String],
        user_id: &UserId,
    ) -> Result<SectionCounts, GatewayError> {
        let request = self
            .http
            .request(Method::POST, "navigation/counts")
            .json(&CountsRequest { sections, user_id });
        self.http.send_data(request).await
    }
}
