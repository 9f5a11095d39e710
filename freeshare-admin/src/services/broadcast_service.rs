use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};
use freeshare_shared::records::{ChangeKind, Changes, StatusGuard};
use freeshare_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::models::{broadcast_status, profile_status, Broadcast, NewBroadcast, BROADCASTS};
use crate::schema::{broadcasts, profiles};
use crate::services::{audit_service, notification_service};
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BroadcastAudience {
    /// Every profile, including suspended ones.
    All,
    /// Profiles that are neither suspended nor banned.
    Active,
}

impl BroadcastAudience {
    pub fn as_str(&self) -> &'static str {
        match self {
            BroadcastAudience::All => "all",
            BroadcastAudience::Active => "active",
        }
    }
}

impl std::str::FromStr for BroadcastAudience {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(BroadcastAudience::All),
            "active" => Ok(BroadcastAudience::Active),
            _ => Err(AppError::Validation(format!("unknown broadcast audience '{s}'"))),
        }
    }
}

pub fn create(
    state: &AppState,
    admin: &AuthUser,
    title: String,
    body: String,
    audience: BroadcastAudience,
) -> AppResult<Broadcast> {
    let mut conn = state.db.get()?;
    let broadcast = diesel::insert_into(broadcasts::table)
        .values(&NewBroadcast {
            title,
            body,
            audience: audience.as_str().to_string(),
            created_by: admin.id,
        })
        .get_result::<Broadcast>(&mut conn)?;

    tracing::info!(broadcast_id = %broadcast.id, audience = audience.as_str(), "broadcast drafted");
    state.records::<Broadcast>(&BROADCASTS).notify(ChangeKind::Insert, &broadcast);
    Ok(broadcast)
}

/// Deliver a draft broadcast as one notification per targeted profile.
pub async fn send(state: &AppState, id: Uuid, admin: &AuthUser) -> AppResult<Broadcast> {
    let svc = state.records::<Broadcast>(&BROADCASTS);
    let mut conn = state.db.get()?;

    let (broadcast, recipients) = conn.transaction::<_, AppError, _>(|conn| {
        let broadcast = broadcasts::table
            .find(id)
            .first::<Broadcast>(conn)
            .optional()?
            .ok_or_else(|| AppError::new(ErrorCode::BroadcastNotFound, "broadcast not found"))?;
        if broadcast.status == broadcast_status::SENT {
            return Err(AppError::with_details(
                ErrorCode::BroadcastAlreadySent,
                "broadcast was already sent",
                serde_json::json!({ "sent_at": broadcast.sent_at }),
            ));
        }

        let audience: BroadcastAudience = broadcast.audience.parse()?;
        let mut targets = profiles::table.select(profiles::id).into_boxed();
        if audience == BroadcastAudience::Active {
            targets = targets.filter(profiles::status.eq(profile_status::ACTIVE));
        }
        let user_ids = targets.load::<Uuid>(conn)?;

        let recipients = notification_service::create_many(
            conn,
            &user_ids,
            "broadcast",
            &broadcast.title,
            &broadcast.body,
            Some(serde_json::json!({ "broadcast_id": broadcast.id })),
        )?;

        let changes = Changes::new()
            .set("status", broadcast_status::SENT)
            .set("recipient_count", recipients.to_string())
            .set_time("sent_at", Utc::now());
        let sent = svc.write(conn, id, &changes, Some(&StatusGuard::new("status", broadcast_status::DRAFT)))?;

        audit_service::log_action(
            conn,
            admin.id,
            "send_broadcast",
            None,
            serde_json::json!({ "broadcast_id": id, "audience": audience, "recipients": recipients }),
        )?;
        Ok((sent, recipients))
    })?;

    tracing::info!(broadcast_id = %id, recipients, "broadcast sent");
    svc.notify(ChangeKind::Update, &broadcast);
    publisher::publish_broadcast_sent(&state.rabbitmq, id, admin.id, recipients).await;
    Ok(broadcast)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audience_parses_known_values_only() {
        assert_eq!("all".parse::<BroadcastAudience>().unwrap(), BroadcastAudience::All);
        assert_eq!("active".parse::<BroadcastAudience>().unwrap(), BroadcastAudience::Active);
        assert!("everyone".parse::<BroadcastAudience>().is_err());
        assert_eq!(serde_json::to_value(BroadcastAudience::Active).unwrap(), "active");
    }
}
