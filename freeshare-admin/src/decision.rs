//! Validation of review and appeal decisions and the side effects they imply.
//!
//! Planning is pure: it checks the submitted decision against the review's
//! current state and returns the status to write together with a list of
//! [`Effect`]s. The review service applies the effects inside the same
//! database transaction that completes the review.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};

use crate::lifecycle::{self, Command, ReviewOutcome, ReviewSnapshot, ReviewStatus};
use crate::models::{ItemStatus, SubjectType};

const MAX_SUSPENSION_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeAction {
    None,
    RemoveItem,
    RestoreItem,
    WarnUser,
    SuspendUser,
    BanUser,
    LiftSuspension,
    LiftBan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Review,
    Appeal,
}

impl OutcomeAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutcomeAction::None => "none",
            OutcomeAction::RemoveItem => "remove_item",
            OutcomeAction::RestoreItem => "restore_item",
            OutcomeAction::WarnUser => "warn_user",
            OutcomeAction::SuspendUser => "suspend_user",
            OutcomeAction::BanUser => "ban_user",
            OutcomeAction::LiftSuspension => "lift_suspension",
            OutcomeAction::LiftBan => "lift_ban",
        }
    }

    pub fn is_punitive(&self) -> bool {
        matches!(
            self,
            OutcomeAction::RemoveItem | OutcomeAction::WarnUser | OutcomeAction::SuspendUser | OutcomeAction::BanUser
        )
    }

    /// The appeal action that undoes this review action, if any.
    pub fn reversal(&self) -> Option<OutcomeAction> {
        match self {
            OutcomeAction::RemoveItem => Some(OutcomeAction::RestoreItem),
            OutcomeAction::SuspendUser => Some(OutcomeAction::LiftSuspension),
            OutcomeAction::BanUser => Some(OutcomeAction::LiftBan),
            _ => None,
        }
    }

    /// Appeal actions open for a review that ended with `original`.
    pub fn appeal_options(subject: SubjectType, original: OutcomeAction) -> Vec<OutcomeAction> {
        OutcomeAction::allowed(subject, Phase::Appeal)
            .iter()
            .copied()
            .filter(|a| *a == OutcomeAction::None || original.reversal() == Some(*a))
            .collect()
    }

    /// Actions a moderator may pick for this subject in this phase.
    pub fn allowed(subject: SubjectType, phase: Phase) -> &'static [OutcomeAction] {
        use OutcomeAction::*;
        match (subject, phase) {
            (SubjectType::Item, Phase::Review) => &[None, RemoveItem, RestoreItem],
            (SubjectType::Item, Phase::Appeal) => &[None, RestoreItem],
            (SubjectType::User, Phase::Review) => &[None, WarnUser, SuspendUser, BanUser],
            (SubjectType::User, Phase::Appeal) => &[None, LiftSuspension, LiftBan],
        }
    }
}

impl std::str::FromStr for OutcomeAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(OutcomeAction::None),
            "remove_item" => Ok(OutcomeAction::RemoveItem),
            "restore_item" => Ok(OutcomeAction::RestoreItem),
            "warn_user" => Ok(OutcomeAction::WarnUser),
            "suspend_user" => Ok(OutcomeAction::SuspendUser),
            "ban_user" => Ok(OutcomeAction::BanUser),
            "lift_suspension" => Ok(OutcomeAction::LiftSuspension),
            "lift_ban" => Ok(OutcomeAction::LiftBan),
            _ => Err(AppError::internal(format!("unknown outcome action '{s}'"))),
        }
    }
}

/// Work a decision requires beyond updating the review row.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    SetItemStatus { item_id: Uuid, status: ItemStatus },
    Warn { user_id: Uuid, reason: String },
    Suspend { user_id: Uuid, reason: String, until: DateTime<Utc> },
    Ban { user_id: Uuid, reason: String },
    /// Lift what the review being appealed imposed.
    LiftSuspensions { user_id: Uuid, review_id: Uuid },
    LiftBans { user_id: Uuid, review_id: Uuid },
}

/// A decision as submitted by a moderator.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionInput {
    pub outcome: Option<ReviewOutcome>,
    pub action: Option<OutcomeAction>,
    pub reason: Option<String>,
    pub comments: Option<String>,
    #[serde(default)]
    pub appealable: bool,
    pub appeal_deadline: Option<DateTime<Utc>>,
    pub suspension_days: Option<i64>,
}

#[derive(Debug, Clone, Copy)]
pub struct DecisionPolicy {
    pub appeal_window: Duration,
    pub default_suspension_days: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DecisionPlan {
    pub next_status: ReviewStatus,
    pub outcome: ReviewOutcome,
    pub action: OutcomeAction,
    pub appealable: bool,
    pub appeal_deadline: Option<DateTime<Utc>>,
    pub effects: Vec<Effect>,
}

fn invalid_action(action: OutcomeAction, why: impl Into<String>) -> AppError {
    AppError::with_details(
        ErrorCode::InvalidOutcomeAction,
        why,
        serde_json::json!({ "action": action.as_str() }),
    )
}

fn check_action(subject: SubjectType, phase: Phase, outcome: ReviewOutcome, action: OutcomeAction) -> AppResult<()> {
    if !OutcomeAction::allowed(subject, phase).contains(&action) {
        return Err(invalid_action(
            action,
            format!("'{}' is not a valid {} action here", action.as_str(), subject.as_str()),
        ));
    }
    match (phase, outcome) {
        (Phase::Review, ReviewOutcome::Dismissed) if action.is_punitive() => Err(invalid_action(
            action,
            "a dismissed review cannot carry a punitive action",
        )),
        // a dismissed appeal keeps the original action in place
        (Phase::Appeal, ReviewOutcome::Dismissed) if action != OutcomeAction::None => Err(invalid_action(
            action,
            "a dismissed appeal cannot reverse the original action",
        )),
        _ => Ok(()),
    }
}

fn effects_for(
    review_id: Uuid,
    subject_id: Uuid,
    action: OutcomeAction,
    input: &DecisionInput,
    now: DateTime<Utc>,
    policy: &DecisionPolicy,
) -> AppResult<Vec<Effect>> {
    let reason = || {
        input
            .reason
            .clone()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "community guidelines violation".to_string())
    };

    let effect = match action {
        OutcomeAction::None => return Ok(Vec::new()),
        OutcomeAction::RemoveItem => Effect::SetItemStatus { item_id: subject_id, status: ItemStatus::Removed },
        OutcomeAction::RestoreItem => Effect::SetItemStatus { item_id: subject_id, status: ItemStatus::Available },
        OutcomeAction::WarnUser => Effect::Warn { user_id: subject_id, reason: reason() },
        OutcomeAction::SuspendUser => {
            let days = input.suspension_days.unwrap_or(policy.default_suspension_days);
            if !(1..=MAX_SUSPENSION_DAYS).contains(&days) {
                return Err(AppError::Validation(format!(
                    "suspension_days must be between 1 and {MAX_SUSPENSION_DAYS}"
                )));
            }
            Effect::Suspend { user_id: subject_id, reason: reason(), until: now + Duration::days(days) }
        }
        OutcomeAction::BanUser => Effect::Ban { user_id: subject_id, reason: reason() },
        OutcomeAction::LiftSuspension => Effect::LiftSuspensions { user_id: subject_id, review_id },
        OutcomeAction::LiftBan => Effect::LiftBans { user_id: subject_id, review_id },
    };
    Ok(vec![effect])
}

/// Check a review decision and work out what it changes.
pub fn plan_review_decision(
    state: &ReviewSnapshot,
    subject: SubjectType,
    review_id: Uuid,
    subject_id: Uuid,
    input: &DecisionInput,
    now: DateTime<Utc>,
    policy: &DecisionPolicy,
) -> AppResult<DecisionPlan> {
    let next_status = lifecycle::transition(state, &Command::Decide { outcome: input.outcome })?;
    let outcome = input.outcome.ok_or(lifecycle::TransitionError::MissingOutcome)?;
    let action = input.action.unwrap_or(OutcomeAction::None);
    check_action(subject, Phase::Review, outcome, action)?;

    let appeal_deadline = if input.appealable {
        match input.appeal_deadline {
            Some(deadline) if deadline <= now => {
                return Err(AppError::Validation("appeal_deadline must be in the future".into()));
            }
            Some(deadline) => Some(deadline),
            None => Some(now + policy.appeal_window),
        }
    } else {
        None
    };

    Ok(DecisionPlan {
        next_status,
        outcome,
        action,
        appealable: input.appealable,
        appeal_deadline,
        effects: effects_for(review_id, subject_id, action, input, now, policy)?,
    })
}

/// A dismissed item review puts an item hidden for the review back on offer.
pub fn restore_if_hidden(plan: &mut DecisionPlan, item_id: Uuid, current: ItemStatus) {
    if plan.outcome == ReviewOutcome::Dismissed && plan.action == OutcomeAction::None && current == ItemStatus::Hidden {
        plan.action = OutcomeAction::RestoreItem;
        plan.effects.push(Effect::SetItemStatus { item_id, status: ItemStatus::Available });
    }
}

/// Check an appeal decision against the action it appeals. Only that
/// action's reversal, or `none`, is accepted. Appeals never reopen the
/// appeal window.
#[allow(clippy::too_many_arguments)]
pub fn plan_appeal_decision(
    state: &ReviewSnapshot,
    subject: SubjectType,
    review_id: Uuid,
    subject_id: Uuid,
    original: OutcomeAction,
    input: &DecisionInput,
    now: DateTime<Utc>,
    policy: &DecisionPolicy,
) -> AppResult<DecisionPlan> {
    let next_status = lifecycle::transition(state, &Command::DecideAppeal { outcome: input.outcome })?;
    let outcome = input.outcome.ok_or(lifecycle::TransitionError::MissingOutcome)?;
    let action = input.action.unwrap_or(OutcomeAction::None);
    check_action(subject, Phase::Appeal, outcome, action)?;
    if !OutcomeAction::appeal_options(subject, original).contains(&action) {
        return Err(invalid_action(
            action,
            format!("'{}' does not reverse the original '{}' decision", action.as_str(), original.as_str()),
        ));
    }

    Ok(DecisionPlan {
        next_status,
        outcome,
        action,
        appealable: state.appealable,
        appeal_deadline: state.appeal_deadline,
        effects: effects_for(review_id, subject_id, action, input, now, policy)?,
    })
}
