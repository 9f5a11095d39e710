//! Review and appeal workflows for item and user reviews.
//!
//! Every write to a review row is guarded by the status it was read in, so
//! two moderators acting on the same review get a conflict instead of one
//! silently overwriting the other. Decisions apply their side effects in the
//! same transaction as the status change. Change-feed updates, domain events
//! and user notifications go out only after the transaction commits.

use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};
use freeshare_shared::records::{ChangeKind, Changes, RecordService, StatusGuard};
use freeshare_shared::types::auth::AuthUser;
use freeshare_shared::types::event::payloads::SubjectAutoFlagged;

use crate::decision::{self, DecisionInput, Effect, OutcomeAction, Phase};
use crate::events::publisher;
use crate::lifecycle::{self, Command, ReviewAction, ReviewStatus, TriggerType};
use crate::models::{
    report_status, Item, ItemStatus, Notification, Profile, Report, Review, SubjectType, UserBan, UserSuspension, UserWarning,
    ITEMS, NOTIFICATIONS, PROFILES,
};
use crate::schema::{item_reviews, reports, user_reviews};
use crate::services::{audit_service, item_service, notification_service, sanction_service};
use crate::AppState;

/// A side effect as it landed in the database.
#[derive(Debug, Clone)]
pub enum Applied {
    Item(Item),
    Warning(UserWarning),
    Suspension(UserSuspension, Profile),
    Ban(UserBan, Profile),
    Lifted {
        sanction_type: &'static str,
        count: usize,
        profile: Profile,
    },
}

#[derive(Debug, Serialize)]
pub struct ReviewDetail {
    pub subject_type: SubjectType,
    pub review: Review,
    pub available_actions: Vec<ReviewAction>,
    /// Outcome actions a decision may carry in the current status.
    pub outcome_actions: Vec<OutcomeAction>,
    pub appeal_open: bool,
    pub reports: Vec<Report>,
}

fn load(reviews: &RecordService<Review>, conn: &mut PgConnection, id: Uuid) -> AppResult<Review> {
    reviews.get_by_id(conn, id).map_err(|e| match e.code() {
        Some(ErrorCode::RecordNotFound) => AppError::new(ErrorCode::ReviewNotFound, "review not found"),
        _ => e,
    })
}

fn ensure_assigned(actor: &AuthUser, assigned: Option<Uuid>) -> AppResult<()> {
    if actor.is_admin() || assigned == Some(actor.id) {
        return Ok(());
    }
    Err(AppError::new(
        ErrorCode::NotAssignedReviewer,
        "only the assigned reviewer or an admin may do this",
    ))
}

fn guard(status: ReviewStatus) -> StatusGuard {
    StatusGuard::new("status", status.as_str())
}

/// The user a review is about: the item owner or the reviewed user.
fn affected_user(conn: &mut PgConnection, subject: SubjectType, subject_id: Uuid) -> AppResult<Uuid> {
    match subject {
        SubjectType::Item => Ok(item_service::get_item(conn, subject_id)?.owner_id),
        SubjectType::User => Ok(subject_id),
    }
}

fn audit_target(subject: SubjectType, review: &Review) -> Option<Uuid> {
    match subject {
        SubjectType::User => Some(review.subject_id),
        SubjectType::Item => None,
    }
}

/// The open review of a subject, if there is one.
pub fn open_review_for(conn: &mut PgConnection, subject: SubjectType, subject_id: Uuid) -> AppResult<Option<Review>> {
    let open = ReviewStatus::OPEN.map(|s| s.as_str());
    let review = match subject {
        SubjectType::Item => item_reviews::table
            .filter(item_reviews::subject_id.eq(subject_id))
            .filter(item_reviews::status.eq_any(open))
            .order(item_reviews::created_at.desc())
            .first::<Review>(conn)
            .optional()?,
        SubjectType::User => user_reviews::table
            .filter(user_reviews::subject_id.eq(subject_id))
            .filter(user_reviews::status.eq_any(open))
            .order(user_reviews::created_at.desc())
            .first::<Review>(conn)
            .optional()?,
    };
    Ok(review)
}

/// Insert a pending review. A subject has at most one open review.
pub fn insert_review(
    conn: &mut PgConnection,
    reviews: &RecordService<Review>,
    subject: SubjectType,
    subject_id: Uuid,
    trigger: TriggerType,
    trigger_data: Option<serde_json::Value>,
) -> AppResult<Review> {
    if let Some(existing) = open_review_for(conn, subject, subject_id)? {
        return Err(AppError::with_details(
            ErrorCode::ReviewAlreadyOpen,
            format!("this {subject} already has an open review"),
            serde_json::json!({ "review_id": existing.id }),
        ));
    }

    let mut values = Changes::new()
        .set_uuid("subject_id", subject_id)
        .set("status", ReviewStatus::Pending.as_str())
        .set("trigger_type", trigger.as_str());
    if let Some(data) = &trigger_data {
        values = values.set_json("trigger_data", data);
    }

    let review = reviews.insert(conn, &values)?;
    tracing::info!(
        review_id = %review.id,
        subject_type = subject.as_str(),
        subject_id = %subject_id,
        trigger = trigger.as_str(),
        "review opened"
    );
    Ok(review)
}

pub fn detail(state: &AppState, subject: SubjectType, id: Uuid) -> AppResult<ReviewDetail> {
    let reviews = state.reviews(subject);
    let mut conn = state.db.get()?;
    let review = load(&reviews, &mut conn, id)?;
    let snapshot = review.snapshot()?;
    let now = Utc::now();

    let outcome_actions = match snapshot.status {
        ReviewStatus::InReview => OutcomeAction::allowed(subject, Phase::Review).to_vec(),
        ReviewStatus::AppealInReview => OutcomeAction::appeal_options(subject, review.original_action()?),
        _ => Vec::new(),
    };

    let linked = reports::table
        .filter(reports::review_id.eq(review.id))
        .order(reports::created_at.asc())
        .load::<Report>(&mut conn)?;

    Ok(ReviewDetail {
        subject_type: subject,
        available_actions: lifecycle::available_actions(&snapshot, now),
        outcome_actions,
        appeal_open: snapshot.appeal_open(now),
        review,
        reports: linked,
    })
}

pub async fn create_manual(
    state: &AppState,
    subject: SubjectType,
    subject_id: Uuid,
    actor: &AuthUser,
    note: Option<String>,
) -> AppResult<Review> {
    let reviews = state.reviews(subject);
    let mut conn = state.db.get()?;

    let review = conn.transaction::<_, AppError, _>(|conn| {
        affected_user(conn, subject, subject_id)?;
        if subject == SubjectType::User {
            sanction_service::get_profile(conn, subject_id)?;
        }
        let data = serde_json::json!({ "opened_by": actor.id, "note": note });
        let review = insert_review(conn, &reviews, subject, subject_id, TriggerType::Manual, Some(data))?;
        audit_service::log_action(
            conn,
            actor.id,
            format!("open_{subject}_review"),
            audit_target(subject, &review),
            serde_json::json!({ "review_id": review.id, "subject_id": subject_id }),
        )?;
        Ok(review)
    })?;

    reviews.notify(ChangeKind::Insert, &review);
    publisher::publish_review_opened(&state.rabbitmq, subject, &review).await;
    Ok(review)
}

/// Open a review for a subject the content scanner flagged. Items are hidden
/// until the review is decided. Returns `None` when a review is already open.
pub async fn open_auto_flag_review(state: &AppState, flag: &SubjectAutoFlagged) -> AppResult<Option<Review>> {
    let subject: SubjectType = flag.subject_type.parse()?;
    let reviews = state.reviews(subject);
    let mut conn = state.db.get()?;

    let opened = conn.transaction::<_, AppError, _>(|conn| {
        if open_review_for(conn, subject, flag.subject_id)?.is_some() {
            return Ok(None);
        }

        let mut applied = Vec::new();
        match subject {
            SubjectType::Item => {
                let item = item_service::get_item(conn, flag.subject_id)?;
                if item.status == ItemStatus::Available.as_str() {
                    applied.push(Applied::Item(item_service::set_status(conn, item.id, ItemStatus::Hidden)?));
                }
            }
            SubjectType::User => {
                sanction_service::get_profile(conn, flag.subject_id)?;
            }
        }

        let data = serde_json::json!({ "rule": flag.rule, "score": flag.score, "details": flag.details });
        let review = insert_review(conn, &reviews, subject, flag.subject_id, TriggerType::AutoFlag, Some(data))?;
        Ok(Some((review, applied)))
    })?;

    let Some((review, applied)) = opened else {
        tracing::debug!(subject_id = %flag.subject_id, "subject already under review, flag ignored");
        return Ok(None);
    };

    reviews.notify(ChangeKind::Insert, &review);
    announce(state, &applied).await;
    publisher::publish_review_opened(&state.rabbitmq, subject, &review).await;
    Ok(Some(review))
}

pub async fn claim(state: &AppState, subject: SubjectType, id: Uuid, actor: &AuthUser) -> AppResult<Review> {
    assign(state, subject, id, actor, Command::Claim).await
}

pub async fn release(state: &AppState, subject: SubjectType, id: Uuid, actor: &AuthUser) -> AppResult<Review> {
    assign(state, subject, id, actor, Command::Release).await
}

pub async fn claim_appeal(state: &AppState, subject: SubjectType, id: Uuid, actor: &AuthUser) -> AppResult<Review> {
    assign(state, subject, id, actor, Command::ClaimAppeal).await
}

pub async fn release_appeal(state: &AppState, subject: SubjectType, id: Uuid, actor: &AuthUser) -> AppResult<Review> {
    assign(state, subject, id, actor, Command::ReleaseAppeal).await
}

/// Claim or release a review or an appeal.
async fn assign(
    state: &AppState,
    subject: SubjectType,
    id: Uuid,
    actor: &AuthUser,
    command: Command,
) -> AppResult<Review> {
    let reviews = state.reviews(subject);
    let mut conn = state.db.get()?;

    let review = load(&reviews, &mut conn, id)?;
    let snapshot = review.snapshot()?;
    let next = lifecycle::transition(&snapshot, &command)?;

    let changes = Changes::new().set("status", next.as_str());
    let changes = match command {
        Command::Claim => changes.set_uuid("reviewer_id", actor.id),
        Command::Release => {
            ensure_assigned(actor, snapshot.reviewer_id)?;
            changes.set_null("reviewer_id")
        }
        Command::ClaimAppeal => changes.set_uuid("appeal_reviewer_id", actor.id),
        Command::ReleaseAppeal => {
            ensure_assigned(actor, snapshot.appeal_reviewer_id)?;
            changes.set_null("appeal_reviewer_id")
        }
        _ => return Err(AppError::internal("not an assignment command")),
    };

    let updated = conn.transaction::<_, AppError, _>(|conn| {
        let updated = reviews.write(conn, id, &changes, Some(&guard(snapshot.status)))?;
        audit_service::log_action(
            conn,
            actor.id,
            format!("{}_{subject}_review", command.action()),
            audit_target(subject, &updated),
            serde_json::json!({ "review_id": id, "status": next.as_str() }),
        )?;
        Ok(updated)
    })?;

    tracing::info!(review_id = %id, actor = %actor.id, action = %command.action(), status = next.as_str(), "review reassigned");
    reviews.notify(ChangeKind::Update, &updated);
    Ok(updated)
}

/// Complete a review in `in_review`.
pub async fn decide(
    state: &AppState,
    subject: SubjectType,
    id: Uuid,
    actor: &AuthUser,
    input: DecisionInput,
) -> AppResult<Review> {
    let reviews = state.reviews(subject);
    let policy = state.decision_policy();
    let now = Utc::now();
    let mut conn = state.db.get()?;

    let (review, applied, affected) = conn.transaction::<_, AppError, _>(|conn| {
        let review = load(&reviews, conn, id)?;
        let snapshot = review.snapshot()?;
        ensure_assigned(actor, snapshot.reviewer_id)?;

        let mut plan =
            decision::plan_review_decision(&snapshot, subject, review.id, review.subject_id, &input, now, &policy)?;
        if subject == SubjectType::Item {
            let item = item_service::get_item(conn, review.subject_id)?;
            decision::restore_if_hidden(&mut plan, item.id, item.status.parse()?);
        }
        let affected = affected_user(conn, subject, review.subject_id)?;
        let applied = apply_effects(conn, &plan.effects, review.id, actor.id)?;

        let changes = Changes::new()
            .set("status", plan.next_status.as_str())
            .set("review_outcome", plan.outcome.as_str())
            .set("review_outcome_action", plan.action.as_str())
            .set_opt("review_reason", input.reason.clone())
            .set_opt("review_comments", input.comments.clone())
            .set_time("reviewed_at", now)
            .set_bool("appealable", plan.appealable)
            .set_opt("appeal_deadline", plan.appeal_deadline.map(|d| d.to_rfc3339()));
        let updated = reviews.write(conn, id, &changes, Some(&guard(ReviewStatus::InReview)))?;

        let closed = diesel::update(reports::table.filter(reports::review_id.eq(id)))
            .set(reports::status.eq(report_status::CLOSED))
            .execute(conn)?;

        audit_service::log_action(
            conn,
            actor.id,
            format!("decide_{subject}_review"),
            audit_target(subject, &updated),
            serde_json::json!({
                "review_id": id,
                "outcome": plan.outcome,
                "action": plan.action,
                "appealable": plan.appealable,
                "appeal_deadline": plan.appeal_deadline,
                "reports_closed": closed,
            }),
        )?;

        Ok((updated, applied, affected))
    })?;

    tracing::info!(
        review_id = %id,
        reviewer = %actor.id,
        outcome = review.review_outcome.as_deref().unwrap_or_default(),
        action = review.review_outcome_action.as_deref().unwrap_or_default(),
        "review decided"
    );

    reviews.notify(ChangeKind::Update, &review);
    announce(state, &applied).await;
    publisher::publish_review_completed(&state.rabbitmq, subject, &review, actor.id).await;
    notify_user(
        state,
        affected,
        "moderation_decision",
        "A moderation review was completed",
        &decision_message(subject, &review),
        serde_json::json!({
            "review_id": review.id,
            "subject_type": subject,
            "appealable": review.appealable,
            "appeal_deadline": review.appeal_deadline,
        }),
    );
    Ok(review)
}

/// File an appeal as the affected user.
pub async fn file_appeal(
    state: &AppState,
    subject: SubjectType,
    id: Uuid,
    appellant: &AuthUser,
    reason: String,
) -> AppResult<Review> {
    let reviews = state.reviews(subject);
    let now = Utc::now();
    let mut conn = state.db.get()?;

    let review = conn.transaction::<_, AppError, _>(|conn| {
        let review = load(&reviews, conn, id)?;
        if affected_user(conn, subject, review.subject_id)? != appellant.id {
            return Err(AppError::new(
                ErrorCode::AppealNotAllowed,
                "only the affected user may appeal this review",
            ));
        }

        let snapshot = review.snapshot()?;
        let next = lifecycle::transition(&snapshot, &Command::FileAppeal { at: now })?;
        let changes = Changes::new()
            .set("status", next.as_str())
            .set_uuid("appealed_by", appellant.id)
            .set("appeal_reason", reason)
            .set_time("appealed_at", now);
        Ok(reviews.write(conn, id, &changes, Some(&guard(snapshot.status)))?)
    })?;

    tracing::info!(review_id = %id, appellant = %appellant.id, "appeal filed");
    reviews.notify(ChangeKind::Update, &review);
    publisher::publish_appeal_filed(&state.rabbitmq, subject, &review, appellant.id).await;
    Ok(review)
}

/// Complete an appeal in `appeal_in_review`.
pub async fn decide_appeal(
    state: &AppState,
    subject: SubjectType,
    id: Uuid,
    actor: &AuthUser,
    input: DecisionInput,
) -> AppResult<Review> {
    let reviews = state.reviews(subject);
    let policy = state.decision_policy();
    let now = Utc::now();
    let mut conn = state.db.get()?;

    let (review, applied, affected) = conn.transaction::<_, AppError, _>(|conn| {
        let review = load(&reviews, conn, id)?;
        let snapshot = review.snapshot()?;
        ensure_assigned(actor, snapshot.appeal_reviewer_id)?;

        let plan = decision::plan_appeal_decision(
            &snapshot,
            subject,
            review.id,
            review.subject_id,
            review.original_action()?,
            &input,
            now,
            &policy,
        )?;
        let affected = affected_user(conn, subject, review.subject_id)?;
        let applied = apply_effects(conn, &plan.effects, review.id, actor.id)?;

        let changes = Changes::new()
            .set("status", plan.next_status.as_str())
            .set("appeal_review_outcome", plan.outcome.as_str())
            .set("appeal_review_outcome_action", plan.action.as_str())
            .set_opt("appeal_review_comments", input.comments.clone())
            .set_time("appeal_reviewed_at", now);
        let updated = reviews.write(conn, id, &changes, Some(&guard(ReviewStatus::AppealInReview)))?;

        audit_service::log_action(
            conn,
            actor.id,
            format!("decide_{subject}_appeal"),
            audit_target(subject, &updated),
            serde_json::json!({ "review_id": id, "outcome": plan.outcome, "action": plan.action }),
        )?;

        Ok((updated, applied, affected))
    })?;

    tracing::info!(review_id = %id, reviewer = %actor.id, "appeal decided");
    reviews.notify(ChangeKind::Update, &review);
    announce(state, &applied).await;
    publisher::publish_appeal_completed(&state.rabbitmq, subject, &review, actor.id).await;
    notify_user(
        state,
        affected,
        "appeal_decision",
        "Your appeal was reviewed",
        &appeal_message(&review),
        serde_json::json!({ "review_id": review.id, "subject_type": subject }),
    );
    Ok(review)
}

fn apply_effects(conn: &mut PgConnection, effects: &[Effect], review_id: Uuid, actor: Uuid) -> AppResult<Vec<Applied>> {
    let mut applied = Vec::with_capacity(effects.len());
    for effect in effects {
        let done = match effect {
            Effect::SetItemStatus { item_id, status } => Applied::Item(item_service::set_status(conn, *item_id, *status)?),
            Effect::Warn { user_id, reason } => {
                Applied::Warning(sanction_service::warn(conn, *user_id, Some(review_id), reason, actor)?)
            }
            Effect::Suspend { user_id, reason, until } => {
                let (suspension, profile) =
                    sanction_service::suspend(conn, *user_id, Some(review_id), reason, actor, *until)?;
                Applied::Suspension(suspension, profile)
            }
            Effect::Ban { user_id, reason } => {
                let (ban, profile) = sanction_service::ban(conn, *user_id, Some(review_id), reason, actor)?;
                Applied::Ban(ban, profile)
            }
            Effect::LiftSuspensions { user_id, review_id } => {
                let (count, profile) = sanction_service::lift_suspensions(conn, *user_id, *review_id, actor)?;
                Applied::Lifted { sanction_type: "suspension", count, profile }
            }
            Effect::LiftBans { user_id, review_id } => {
                let (count, profile) = sanction_service::lift_bans(conn, *user_id, *review_id, actor)?;
                Applied::Lifted { sanction_type: "ban", count, profile }
            }
        };
        applied.push(done);
    }
    Ok(applied)
}

/// Publish committed side effects to the change feed and the event bus.
pub(crate) async fn announce(state: &AppState, applied: &[Applied]) {
    let items = state.records::<Item>(&ITEMS);
    let profiles = state.records::<Profile>(&PROFILES);

    for done in applied {
        match done {
            Applied::Item(item) => {
                items.notify(ChangeKind::Update, item);
                publisher::publish_item_status_changed(&state.rabbitmq, item.id, item.owner_id, &item.status).await;
            }
            Applied::Warning(w) => {
                publisher::publish_sanction_issued(&state.rabbitmq, w.id, w.user_id, "warning", &w.reason, None).await;
            }
            Applied::Suspension(s, profile) => {
                profiles.notify(ChangeKind::Update, profile);
                publisher::publish_sanction_issued(
                    &state.rabbitmq,
                    s.id,
                    s.user_id,
                    "suspension",
                    &s.reason,
                    Some(s.expires_at),
                )
                .await;
            }
            Applied::Ban(b, profile) => {
                profiles.notify(ChangeKind::Update, profile);
                publisher::publish_sanction_issued(&state.rabbitmq, b.id, b.user_id, "ban", &b.reason, None).await;
            }
            Applied::Lifted { sanction_type, count, profile } => {
                profiles.notify(ChangeKind::Update, profile);
                publisher::publish_sanction_lifted(&state.rabbitmq, profile.id, sanction_type, *count).await;
            }
        }
    }
}

/// Best-effort notification; failures are logged, never returned.
fn notify_user(
    state: &AppState,
    user_id: Uuid,
    kind: &str,
    title: &str,
    body: &str,
    data: serde_json::Value,
) {
    let result = state.db.get().map_err(AppError::from).and_then(|mut conn| {
        notification_service::create_notification(&mut conn, user_id, kind, title, body, Some(data))
    });
    match result {
        Ok(notification) => state.records::<Notification>(&NOTIFICATIONS).notify(ChangeKind::Insert, &notification),
        Err(e) => tracing::error!(error = %e, user_id = %user_id, kind, "failed to create notification"),
    }
}

fn decision_message(subject: SubjectType, review: &Review) -> String {
    let what = match subject {
        SubjectType::Item => "your listing",
        SubjectType::User => "your account",
    };
    let action = review.review_outcome_action.as_deref().unwrap_or("none");
    let mut message = match action {
        "none" | "restore_item" => format!("A moderator reviewed {what} and took no action against it."),
        _ => format!("A moderator reviewed {what}. Action taken: {}.", action.replace('_', " ")),
    };
    if let Some(deadline) = review.appeal_deadline.filter(|_| review.appealable) {
        message.push_str(&format!(" You can appeal until {}.", deadline.format("%Y-%m-%d %H:%M UTC")));
    }
    message
}

fn appeal_message(review: &Review) -> String {
    match review.appeal_review_outcome_action.as_deref() {
        Some(action) if action != "none" => {
            format!("Your appeal was accepted. Action taken: {}.", action.replace('_', " "))
        }
        _ => "Your appeal was reviewed and the original decision stands.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use freeshare_shared::types::auth::UserRole;

    fn user(role: UserRole) -> AuthUser {
        AuthUser { id: Uuid::new_v4(), role, token_id: Uuid::new_v4() }
    }

    fn review(action: &str, appealable: bool) -> Review {
        let now = Utc::now();
        Review {
            id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            status: "review_completed".into(),
            trigger_type: "reports".into(),
            trigger_data: None,
            reviewer_id: Some(Uuid::new_v4()),
            review_outcome: Some("resolved".into()),
            review_outcome_action: Some(action.into()),
            review_reason: None,
            review_comments: None,
            reviewed_at: Some(now),
            appealable,
            appeal_deadline: appealable.then(|| now + Duration::days(14)),
            appealed_by: None,
            appeal_reason: None,
            appealed_at: None,
            appeal_reviewer_id: None,
            appeal_review_outcome: None,
            appeal_review_outcome_action: None,
            appeal_review_comments: None,
            appeal_reviewed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn assigned_reviewer_or_admin_only() {
        let moderator = user(UserRole::Moderator);
        assert!(ensure_assigned(&moderator, Some(moderator.id)).is_ok());
        assert_eq!(
            ensure_assigned(&moderator, Some(Uuid::new_v4())).unwrap_err().code(),
            Some(ErrorCode::NotAssignedReviewer)
        );
        assert!(ensure_assigned(&moderator, None).is_err());
        assert!(ensure_assigned(&user(UserRole::Admin), Some(Uuid::new_v4())).is_ok());
    }

    #[test]
    fn decision_message_mentions_action_and_appeal() {
        let msg = decision_message(SubjectType::User, &review("suspend_user", true));
        assert!(msg.contains("your account"));
        assert!(msg.contains("suspend user"));
        assert!(msg.contains("You can appeal until"));

        let msg = decision_message(SubjectType::Item, &review("none", false));
        assert!(msg.contains("took no action"));
        assert!(!msg.contains("appeal"));
    }

    #[test]
    fn appeal_message_reflects_reversal() {
        let mut r = review("ban_user", true);
        r.appeal_review_outcome_action = Some("lift_ban".into());
        assert!(appeal_message(&r).contains("accepted"));
        r.appeal_review_outcome_action = Some("none".into());
        assert!(appeal_message(&r).contains("stands"));
    }
}
