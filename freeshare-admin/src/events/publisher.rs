use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::clients::rabbitmq::RabbitMQClient;
use freeshare_shared::types::event::{payloads, routing_keys, Event};

use crate::models::{Review, SubjectType};

const SOURCE: &str = "freeshare-admin";

async fn publish<T: Serialize>(rabbitmq: &RabbitMQClient, routing_key: &str, actor: Option<Uuid>, data: T) {
    let mut event = Event::new(SOURCE, routing_key, data);
    if let Some(actor) = actor {
        event = event.with_user(actor);
    }

    if let Err(e) = rabbitmq.publish(routing_key, &event).await {
        tracing::error!(error = %e, routing_key, "failed to publish event");
    }
}

pub async fn publish_report_created(
    rabbitmq: &RabbitMQClient,
    report_id: Uuid,
    reporter_id: Uuid,
    subject: SubjectType,
    subject_id: Uuid,
) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_REPORT_CREATED,
        Some(reporter_id),
        payloads::ReportCreated {
            report_id,
            reporter_id,
            subject_type: subject.as_str().to_string(),
            subject_id,
        },
    )
    .await;
}

pub async fn publish_review_opened(rabbitmq: &RabbitMQClient, subject: SubjectType, review: &Review) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_REVIEW_OPENED,
        None,
        payloads::ReviewOpened {
            review_id: review.id,
            subject_type: subject.as_str().to_string(),
            subject_id: review.subject_id,
            trigger_type: review.trigger_type.clone(),
        },
    )
    .await;
}

pub async fn publish_review_completed(rabbitmq: &RabbitMQClient, subject: SubjectType, review: &Review, reviewer_id: Uuid) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_REVIEW_COMPLETED,
        Some(reviewer_id),
        payloads::ReviewCompleted {
            review_id: review.id,
            subject_type: subject.as_str().to_string(),
            subject_id: review.subject_id,
            reviewer_id,
            outcome: review.review_outcome.clone().unwrap_or_default(),
            outcome_action: review.review_outcome_action.clone().unwrap_or_default(),
            appealable: review.appealable,
            appeal_deadline: review.appeal_deadline,
        },
    )
    .await;
}

pub async fn publish_appeal_filed(rabbitmq: &RabbitMQClient, subject: SubjectType, review: &Review, appealed_by: Uuid) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_APPEAL_FILED,
        Some(appealed_by),
        payloads::AppealFiled {
            review_id: review.id,
            subject_type: subject.as_str().to_string(),
            subject_id: review.subject_id,
            appealed_by,
        },
    )
    .await;
}

pub async fn publish_appeal_completed(rabbitmq: &RabbitMQClient, subject: SubjectType, review: &Review, reviewer_id: Uuid) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_APPEAL_COMPLETED,
        Some(reviewer_id),
        payloads::AppealCompleted {
            review_id: review.id,
            subject_type: subject.as_str().to_string(),
            subject_id: review.subject_id,
            appeal_reviewer_id: reviewer_id,
            outcome: review.appeal_review_outcome.clone().unwrap_or_default(),
            outcome_action: review.appeal_review_outcome_action.clone().unwrap_or_default(),
        },
    )
    .await;
}

pub async fn publish_sanction_issued(
    rabbitmq: &RabbitMQClient,
    sanction_id: Uuid,
    user_id: Uuid,
    sanction_type: &str,
    reason: &str,
    expires_at: Option<DateTime<Utc>>,
) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_SANCTION_ISSUED,
        Some(user_id),
        payloads::SanctionIssued {
            sanction_id,
            user_id,
            sanction_type: sanction_type.to_string(),
            reason: reason.to_string(),
            expires_at,
        },
    )
    .await;
}

pub async fn publish_sanction_lifted(rabbitmq: &RabbitMQClient, user_id: Uuid, sanction_type: &str, lifted_count: usize) {
    publish(
        rabbitmq,
        routing_keys::MODERATION_SANCTION_LIFTED,
        Some(user_id),
        payloads::SanctionLifted {
            user_id,
            sanction_type: sanction_type.to_string(),
            lifted_count,
        },
    )
    .await;
}

pub async fn publish_item_status_changed(rabbitmq: &RabbitMQClient, item_id: Uuid, owner_id: Uuid, status: &str) {
    publish(
        rabbitmq,
        routing_keys::ITEM_STATUS_CHANGED,
        Some(owner_id),
        payloads::ItemStatusChanged {
            item_id,
            owner_id,
            status: status.to_string(),
        },
    )
    .await;
}

pub async fn publish_support_request_created(
    rabbitmq: &RabbitMQClient,
    request_id: Uuid,
    user_id: Uuid,
    category: &str,
    priority: &str,
) {
    publish(
        rabbitmq,
        routing_keys::SUPPORT_REQUEST_CREATED,
        Some(user_id),
        payloads::SupportRequestCreated {
            request_id,
            user_id,
            category: category.to_string(),
            priority: priority.to_string(),
        },
    )
    .await;
}

pub async fn publish_broadcast_sent(rabbitmq: &RabbitMQClient, broadcast_id: Uuid, sent_by: Uuid, recipients: usize) {
    publish(
        rabbitmq,
        routing_keys::BROADCAST_SENT,
        Some(sent_by),
        payloads::BroadcastSent { broadcast_id, recipients },
    )
    .await;
}
