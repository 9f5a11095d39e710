use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ Event envelope wrapping all domain events.
///
/// Routing key format: `freeshare.{domain}.{entity}.{action}`
/// Example: `freeshare.moderation.review.completed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Moderation events
    pub const MODERATION_REPORT_CREATED: &str = "freeshare.moderation.report.created";
    pub const MODERATION_REVIEW_OPENED: &str = "freeshare.moderation.review.opened";
    pub const MODERATION_REVIEW_COMPLETED: &str = "freeshare.moderation.review.completed";
    pub const MODERATION_APPEAL_FILED: &str = "freeshare.moderation.appeal.filed";
    pub const MODERATION_APPEAL_COMPLETED: &str = "freeshare.moderation.appeal.completed";
    pub const MODERATION_SANCTION_ISSUED: &str = "freeshare.moderation.sanction.issued";
    pub const MODERATION_SANCTION_LIFTED: &str = "freeshare.moderation.sanction.lifted";

    // Published by the content scanner when an item or profile trips a rule
    pub const MODERATION_SUBJECT_AUTO_FLAGGED: &str = "freeshare.moderation.subject.auto_flagged";

    // Item events
    pub const ITEM_STATUS_CHANGED: &str = "freeshare.item.item.status_changed";

    // Support / outreach events
    pub const SUPPORT_REQUEST_CREATED: &str = "freeshare.support.request.created";
    pub const BROADCAST_SENT: &str = "freeshare.outreach.broadcast.sent";
}

/// Common event data payloads
pub mod payloads {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportCreated {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub subject_type: String,
        pub subject_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SubjectAutoFlagged {
        pub subject_type: String,
        pub subject_id: Uuid,
        pub rule: String,
        pub score: Option<f64>,
        #[serde(default)]
        pub details: Option<serde_json::Value>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReviewOpened {
        pub review_id: Uuid,
        pub subject_type: String,
        pub subject_id: Uuid,
        pub trigger_type: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReviewCompleted {
        pub review_id: Uuid,
        pub subject_type: String,
        pub subject_id: Uuid,
        pub reviewer_id: Uuid,
        pub outcome: String,
        pub outcome_action: String,
        pub appealable: bool,
        pub appeal_deadline: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppealFiled {
        pub review_id: Uuid,
        pub subject_type: String,
        pub subject_id: Uuid,
        pub appealed_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppealCompleted {
        pub review_id: Uuid,
        pub subject_type: String,
        pub subject_id: Uuid,
        pub appeal_reviewer_id: Uuid,
        pub outcome: String,
        pub outcome_action: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SanctionIssued {
        pub sanction_id: Uuid,
        pub user_id: Uuid,
        pub sanction_type: String,
        pub reason: String,
        pub expires_at: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SanctionLifted {
        pub user_id: Uuid,
        pub sanction_type: String,
        pub lifted_count: usize,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ItemStatusChanged {
        pub item_id: Uuid,
        pub owner_id: Uuid,
        pub status: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct SupportRequestCreated {
        pub request_id: Uuid,
        pub user_id: Uuid,
        pub category: String,
        pub priority: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BroadcastSent {
        pub broadcast_id: Uuid,
        pub recipients: usize,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_carries_user_and_correlation() {
        let review_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let event = Event::new(
            "freeshare-admin",
            routing_keys::MODERATION_APPEAL_FILED,
            payloads::AppealFiled {
                review_id,
                subject_type: "item".into(),
                subject_id: Uuid::new_v4(),
                appealed_by: user_id,
            },
        )
        .with_user(user_id)
        .with_correlation(review_id);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event_type"], "freeshare.moderation.appeal.filed");
        assert_eq!(json["user_id"], user_id.to_string());
        assert_eq!(json["correlation_id"], review_id.to_string());
        assert_eq!(json["data"]["subject_type"], "item");
    }
}
