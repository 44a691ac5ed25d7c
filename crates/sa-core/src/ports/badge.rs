use std::collections::HashMap;

use async_trait::async_trait;

use super::errors::GatewayError;
use crate::ids::UserId;

/// Unread/pending counts keyed by navigation section.
pub type SectionCounts = HashMap<String, u64>;

#[async_trait]
pub trait BadgeCountPort: Send + Sync {
    async fn section_counts(
        &self,
        sections: &[String],
        user_id: &UserId,
    ) -> Result<SectionCounts, GatewayError>;
}

#[cfg(test)]
mockall::mock! {
    pub BadgeCounts {}

    #[async_trait]
    impl BadgeCountPort for BadgeCounts {
        async fn section_counts(
            &self,
            sections: &[String],
            user_id: &UserId,
        ) -> Result<SectionCounts, GatewayError>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_badge_counts_answers_per_section() {
        let mut mock = MockBadgeCounts::new();
        mock.expect_section_counts()
            .withf(|sections, user| sections.len() == 1 && sections[0] == "orders" && user.as_str() == "u1")
            .times(1)
            .returning(|_, _| Ok(HashMap::from([("orders".to_string(), 3)])));

        let counts = mock
            .section_counts(&["orders".to_string()], &UserId::from("u1"))
            .await
            .unwrap();
        assert_eq!(counts.get("orders"), Some(&3));
    }
}
