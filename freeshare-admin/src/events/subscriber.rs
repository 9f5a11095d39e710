use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use freeshare_shared::types::event::{payloads, routing_keys, Event};

use crate::services::review_service;
use crate::AppState;

pub const AUTO_FLAG_QUEUE: &str = "freeshare-admin.auto_flag";

/// Listen for content-scanner flags and open a review for each flagged subject.
pub async fn listen_auto_flag_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state
        .rabbitmq
        .subscribe(AUTO_FLAG_QUEUE, &[routing_keys::MODERATION_SUBJECT_AUTO_FLAGGED])
        .await?;

    tracing::info!("listening for auto-flag events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::SubjectAutoFlagged>>(&delivery.data) {
                    Ok(event) => {
                        let flag = &event.data;
                        tracing::info!(
                            subject_type = %flag.subject_type,
                            subject_id = %flag.subject_id,
                            rule = %flag.rule,
                            "received subject.auto_flagged event"
                        );

                        match review_service::open_auto_flag_review(&state, flag).await {
                            Ok(Some(review)) => tracing::info!(review_id = %review.id, "auto-flag review opened"),
                            Ok(None) => {}
                            Err(e) => tracing::error!(error = %e, subject_id = %flag.subject_id, "failed to open auto-flag review"),
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize subject.auto_flagged event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "auto-flag consumer error");
            }
        }
    }

    Ok(())
}
