use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};
use freeshare_shared::records::{ChangeKind, Changes, RecordService, StatusGuard};
use freeshare_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::models::{
    NewSupportRequest, SupportPriority, SupportRequest, SupportSlaConfig, SupportStatus, SUPPORT_REQUESTS,
};
use crate::schema::{support_requests, support_sla_configs};
use crate::services::audit_service;
use crate::sla::{self, SlaStatus, SlaThresholds};
use crate::AppState;

fn requests(state: &AppState) -> RecordService<SupportRequest> {
    state.records(&SUPPORT_REQUESTS)
}

fn load(svc: &RecordService<SupportRequest>, conn: &mut PgConnection, id: Uuid) -> AppResult<SupportRequest> {
    svc.get_by_id(conn, id).map_err(|e| match e.code() {
        Some(ErrorCode::RecordNotFound) => AppError::new(ErrorCode::SupportRequestNotFound, "support request not found"),
        _ => e,
    })
}

pub async fn create_request(
    state: &AppState,
    user: &AuthUser,
    category: String,
    priority: SupportPriority,
    subject: String,
    body: String,
) -> AppResult<SupportRequest> {
    let mut conn = state.db.get()?;
    let request = diesel::insert_into(support_requests::table)
        .values(&NewSupportRequest {
            user_id: user.id,
            category,
            priority: priority.as_str().to_string(),
            subject,
            body,
        })
        .get_result::<SupportRequest>(&mut conn)?;

    tracing::info!(request_id = %request.id, user_id = %user.id, category = %request.category, "support request created");
    requests(state).notify(ChangeKind::Insert, &request);
    publisher::publish_support_request_created(
        &state.rabbitmq,
        request.id,
        user.id,
        &request.category,
        &request.priority,
    )
    .await;
    Ok(request)
}

/// Timestamp changes implied by moving `request` to `next`.
///
/// The first move away from `open` records the first response. Finishing
/// records the resolution time; reopening a finished request clears it.
pub fn status_changes(request: &SupportRequest, next: SupportStatus, now: DateTime<Utc>) -> Changes {
    let mut changes = Changes::new().set("status", next.as_str());
    if next != SupportStatus::Open && request.first_response_at.is_none() {
        changes = changes.set_time("first_response_at", now);
    }
    match (next.is_finished(), request.resolved_at) {
        (true, None) => changes = changes.set_time("resolved_at", now),
        (false, Some(_)) => changes = changes.set_null("resolved_at"),
        _ => {}
    }
    changes
}

pub fn update_status(state: &AppState, id: Uuid, next: SupportStatus, actor: &AuthUser) -> AppResult<SupportRequest> {
    let svc = requests(state);
    let mut conn = state.db.get()?;

    let updated = conn.transaction::<_, AppError, _>(|conn| {
        let request = load(&svc, conn, id)?;
        let changes = status_changes(&request, next, Utc::now());
        let updated = svc.write(conn, id, &changes, Some(&StatusGuard::new("status", request.status.clone())))?;
        audit_service::log_action(
            conn,
            actor.id,
            "update_support_status",
            Some(request.user_id),
            serde_json::json!({ "request_id": id, "from": request.status, "to": next.as_str() }),
        )?;
        Ok(updated)
    })?;

    tracing::info!(request_id = %id, status = next.as_str(), actor = %actor.id, "support request status changed");
    svc.notify(ChangeKind::Update, &updated);
    Ok(updated)
}

/// Assign a request to a staff member, or unassign it with `None`.
pub fn assign(state: &AppState, id: Uuid, assignee: Option<Uuid>, actor: &AuthUser) -> AppResult<SupportRequest> {
    let svc = requests(state);
    let mut conn = state.db.get()?;

    let updated = conn.transaction::<_, AppError, _>(|conn| {
        let request = load(&svc, conn, id)?;
        let changes = Changes::new().set_opt("assigned_to", assignee.map(|a| a.to_string()));
        let updated = svc.write(conn, id, &changes, None)?;
        audit_service::log_action(
            conn,
            actor.id,
            "assign_support_request",
            Some(request.user_id),
            serde_json::json!({ "request_id": id, "assigned_to": assignee }),
        )?;
        Ok(updated)
    })?;

    svc.notify(ChangeKind::Update, &updated);
    Ok(updated)
}

/// The active SLA for a category and priority.
pub fn active_sla_config(conn: &mut PgConnection, category: &str, priority: &str) -> AppResult<SupportSlaConfig> {
    support_sla_configs::table
        .filter(support_sla_configs::category.eq(category))
        .filter(support_sla_configs::priority.eq(priority))
        .filter(support_sla_configs::is_active.eq(true))
        .order(support_sla_configs::updated_at.desc())
        .first::<SupportSlaConfig>(conn)
        .optional()?
        .ok_or_else(|| {
            AppError::with_details(
                ErrorCode::SlaConfigNotFound,
                "no active SLA for this category and priority",
                serde_json::json!({ "category": category, "priority": priority }),
            )
        })
}

#[derive(Debug, serde::Serialize)]
pub struct RequestSla {
    pub request_id: Uuid,
    pub status: String,
    #[serde(flatten)]
    pub sla: SlaStatus,
}

pub fn sla_status(state: &AppState, id: Uuid) -> AppResult<RequestSla> {
    let mut conn = state.db.get()?;
    let request = load(&requests(state), &mut conn, id)?;
    let config = active_sla_config(&mut conn, &request.category, &request.priority)?;
    Ok(RequestSla {
        request_id: request.id,
        sla: sla::evaluate_request(&request, Utc::now(), SlaThresholds::from(&config)),
        status: request.status,
    })
}

/// Open requests currently breaching their response or resolution SLA.
/// Requests without an active SLA are not counted.
pub fn breached_open_count(conn: &mut PgConnection, now: DateTime<Utc>) -> AppResult<i64> {
    let open = support_requests::table
        .filter(support_requests::status.eq_any(SupportStatus::OPEN))
        .load::<SupportRequest>(conn)?;
    let configs = support_sla_configs::table
        .filter(support_sla_configs::is_active.eq(true))
        .load::<SupportSlaConfig>(conn)?;
    Ok(count_breached(&open, &configs, now))
}

pub fn count_breached(open: &[SupportRequest], configs: &[SupportSlaConfig], now: DateTime<Utc>) -> i64 {
    open.iter()
        .filter(|request| {
            configs
                .iter()
                .find(|c| c.category == request.category && c.priority == request.priority)
                .map(|c| {
                    let status = sla::evaluate_request(request, now, SlaThresholds::from(c));
                    status.response_breached || status.resolution_breached
                })
                .unwrap_or(false)
        })
        .count() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn request(status: &str, created_at: DateTime<Utc>) -> SupportRequest {
        SupportRequest {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            category: "pickup".into(),
            priority: "high".into(),
            subject: "no-show".into(),
            body: "the giver never showed up".into(),
            status: status.into(),
            assigned_to: None,
            first_response_at: None,
            resolved_at: None,
            created_at,
            updated_at: created_at,
        }
    }

    fn config(response: i32, resolution: i32) -> SupportSlaConfig {
        let now = Utc::now();
        SupportSlaConfig {
            id: Uuid::new_v4(),
            category: "pickup".into(),
            priority: "high".into(),
            response_time_hours: response,
            resolution_time_hours: resolution,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn first_move_stamps_first_response() {
        let now = Utc::now();
        let req = request("open", now);
        let changes = status_changes(&req, SupportStatus::InProgress, now);
        assert_eq!(changes.get("status"), Some(Some("in_progress")));
        assert!(changes.get("first_response_at").is_some());
        assert!(changes.get("resolved_at").is_none());
    }

    #[test]
    fn finishing_stamps_resolution_once() {
        let now = Utc::now();
        let mut req = request("in_progress", now);
        req.first_response_at = Some(now);

        let changes = status_changes(&req, SupportStatus::Resolved, now);
        assert!(changes.get("first_response_at").is_none());
        assert!(matches!(changes.get("resolved_at"), Some(Some(_))));

        req.resolved_at = Some(now);
        let changes = status_changes(&req, SupportStatus::Closed, now);
        assert!(changes.get("resolved_at").is_none());
    }

    #[test]
    fn reopening_clears_resolution() {
        let now = Utc::now();
        let mut req = request("resolved", now);
        req.first_response_at = Some(now);
        req.resolved_at = Some(now);
        let changes = status_changes(&req, SupportStatus::Open, now);
        assert_eq!(changes.get("resolved_at"), Some(None));
    }

    #[test]
    fn breached_count_needs_matching_config() {
        let now = Utc::now();
        let old = request("open", now - Duration::hours(5));
        let fresh = request("open", now - Duration::minutes(5));
        let mut other = request("open", now - Duration::hours(50));
        other.category = "account".into();

        let configs = [config(4, 48)];
        assert_eq!(count_breached(&[old.clone(), fresh.clone(), other], &configs, now), 1);
        assert_eq!(count_breached(&[old, fresh], &[], now), 0);
    }
}
