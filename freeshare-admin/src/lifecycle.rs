//! Review and appeal status machine.
//!
//! ```text
//! pending ──claim──▶ in_review ──decide──▶ review_completed
//!    ▲                   │                        │ file appeal
//!    └─────release───────┘                        ▼
//!                  appeal_in_review ◀──claim── appeal_pending
//!                        │   └──────release──────▶ ▲
//!                        └──decide──▶ appeal_completed
//! ```
//!
//! Everything here is pure; callers persist the resulting status.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use freeshare_shared::errors::{AppError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Pending,
    InReview,
    ReviewCompleted,
    AppealPending,
    AppealInReview,
    AppealCompleted,
}

impl ReviewStatus {
    /// Statuses in which a review still needs a moderator.
    pub const OPEN: [ReviewStatus; 4] = [
        ReviewStatus::Pending,
        ReviewStatus::InReview,
        ReviewStatus::AppealPending,
        ReviewStatus::AppealInReview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::InReview => "in_review",
            ReviewStatus::ReviewCompleted => "review_completed",
            ReviewStatus::AppealPending => "appeal_pending",
            ReviewStatus::AppealInReview => "appeal_in_review",
            ReviewStatus::AppealCompleted => "appeal_completed",
        }
    }

    pub fn is_appeal(&self) -> bool {
        matches!(
            self,
            ReviewStatus::AppealPending | ReviewStatus::AppealInReview | ReviewStatus::AppealCompleted
        )
    }

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReviewStatus::Pending),
            "in_review" => Ok(ReviewStatus::InReview),
            "review_completed" => Ok(ReviewStatus::ReviewCompleted),
            "appeal_pending" => Ok(ReviewStatus::AppealPending),
            "appeal_in_review" => Ok(ReviewStatus::AppealInReview),
            "appeal_completed" => Ok(ReviewStatus::AppealCompleted),
            _ => Err(AppError::internal(format!("unknown review status '{s}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Reports,
    AutoFlag,
    Manual,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Reports => "reports",
            TriggerType::AutoFlag => "auto_flag",
            TriggerType::Manual => "manual",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewOutcome {
    Resolved,
    Dismissed,
}

impl ReviewOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewOutcome::Resolved => "resolved",
            ReviewOutcome::Dismissed => "dismissed",
        }
    }
}

/// The parts of a review row the status machine looks at.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSnapshot {
    pub status: ReviewStatus,
    pub reviewer_id: Option<Uuid>,
    pub appeal_reviewer_id: Option<Uuid>,
    pub appealable: bool,
    pub appeal_deadline: Option<DateTime<Utc>>,
}

impl ReviewSnapshot {
    pub fn pending() -> Self {
        Self {
            status: ReviewStatus::Pending,
            reviewer_id: None,
            appeal_reviewer_id: None,
            appealable: false,
            appeal_deadline: None,
        }
    }

    /// Whether the subject could still file an appeal at `now`.
    pub fn appeal_open(&self, now: DateTime<Utc>) -> bool {
        self.status == ReviewStatus::ReviewCompleted
            && self.appealable
            && self.appeal_deadline.map_or(false, |deadline| now <= deadline)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewAction {
    Claim,
    Release,
    Decide,
    FileAppeal,
    ClaimAppeal,
    ReleaseAppeal,
    DecideAppeal,
}

impl ReviewAction {
    pub const ALL: [ReviewAction; 7] = [
        ReviewAction::Claim,
        ReviewAction::Release,
        ReviewAction::Decide,
        ReviewAction::FileAppeal,
        ReviewAction::ClaimAppeal,
        ReviewAction::ReleaseAppeal,
        ReviewAction::DecideAppeal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewAction::Claim => "claim",
            ReviewAction::Release => "release",
            ReviewAction::Decide => "decide",
            ReviewAction::FileAppeal => "file_appeal",
            ReviewAction::ClaimAppeal => "claim_appeal",
            ReviewAction::ReleaseAppeal => "release_appeal",
            ReviewAction::DecideAppeal => "decide_appeal",
        }
    }
}

impl std::fmt::Display for ReviewAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Claim,
    Release,
    Decide { outcome: Option<ReviewOutcome> },
    FileAppeal { at: DateTime<Utc> },
    ClaimAppeal,
    ReleaseAppeal,
    DecideAppeal { outcome: Option<ReviewOutcome> },
}

impl Command {
    pub fn action(&self) -> ReviewAction {
        match self {
            Command::Claim => ReviewAction::Claim,
            Command::Release => ReviewAction::Release,
            Command::Decide { .. } => ReviewAction::Decide,
            Command::FileAppeal { .. } => ReviewAction::FileAppeal,
            Command::ClaimAppeal => ReviewAction::ClaimAppeal,
            Command::ReleaseAppeal => ReviewAction::ReleaseAppeal,
            Command::DecideAppeal { .. } => ReviewAction::DecideAppeal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransitionError {
    #[error("cannot {action} a review in status {from}")]
    NotAllowed { from: ReviewStatus, action: ReviewAction },

    #[error("a review outcome is required")]
    MissingOutcome,

    #[error("this review is not appealable")]
    NotAppealable,

    #[error("the appeal window closed at {0}")]
    AppealWindowClosed(DateTime<Utc>),
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        let code = match &err {
            TransitionError::NotAllowed { .. } => ErrorCode::InvalidReviewTransition,
            TransitionError::MissingOutcome => ErrorCode::ReviewOutcomeRequired,
            TransitionError::NotAppealable => ErrorCode::AppealNotAllowed,
            TransitionError::AppealWindowClosed(_) => ErrorCode::AppealWindowClosed,
        };
        AppError::new(code, err.to_string())
    }
}

/// Status a review moves to when `command` is applied to `state`.
pub fn transition(state: &ReviewSnapshot, command: &Command) -> Result<ReviewStatus, TransitionError> {
    use ReviewStatus::*;

    let not_allowed = || TransitionError::NotAllowed {
        from: state.status,
        action: command.action(),
    };

    match (state.status, command) {
        (Pending, Command::Claim) => Ok(InReview),
        (InReview, Command::Release) => Ok(Pending),
        (InReview, Command::Decide { outcome }) => {
            outcome.ok_or(TransitionError::MissingOutcome)?;
            Ok(ReviewCompleted)
        }
        (ReviewCompleted, Command::FileAppeal { at }) => {
            if !state.appealable {
                return Err(TransitionError::NotAppealable);
            }
            match state.appeal_deadline {
                Some(deadline) if *at <= deadline => Ok(AppealPending),
                Some(deadline) => Err(TransitionError::AppealWindowClosed(deadline)),
                None => Err(TransitionError::NotAppealable),
            }
        }
        (AppealPending, Command::ClaimAppeal) => Ok(AppealInReview),
        (AppealInReview, Command::ReleaseAppeal) => Ok(AppealPending),
        (AppealInReview, Command::DecideAppeal { outcome }) => {
            outcome.ok_or(TransitionError::MissingOutcome)?;
            Ok(AppealCompleted)
        }
        _ => Err(not_allowed()),
    }
}

/// Actions the status machine would accept right now, in display order.
pub fn available_actions(state: &ReviewSnapshot, now: DateTime<Utc>) -> Vec<ReviewAction> {
    let sample_outcome = Some(ReviewOutcome::Resolved);
    ReviewAction::ALL
        .into_iter()
        .filter(|action| {
            let command = match action {
                ReviewAction::Claim => Command::Claim,
                ReviewAction::Release => Command::Release,
                ReviewAction::Decide => Command::Decide { outcome: sample_outcome },
                ReviewAction::FileAppeal => Command::FileAppeal { at: now },
                ReviewAction::ClaimAppeal => Command::ClaimAppeal,
                ReviewAction::ReleaseAppeal => Command::ReleaseAppeal,
                ReviewAction::DecideAppeal => Command::DecideAppeal { outcome: sample_outcome },
            };
            transition(state, &command).is_ok()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ALL_STATUSES: [ReviewStatus; 6] = [
        ReviewStatus::Pending,
        ReviewStatus::InReview,
        ReviewStatus::ReviewCompleted,
        ReviewStatus::AppealPending,
        ReviewStatus::AppealInReview,
        ReviewStatus::AppealCompleted,
    ];

    fn at(status: ReviewStatus) -> ReviewSnapshot {
        ReviewSnapshot { status, ..ReviewSnapshot::pending() }
    }

    fn completed(appealable: bool, deadline: Option<DateTime<Utc>>) -> ReviewSnapshot {
        ReviewSnapshot {
            status: ReviewStatus::ReviewCompleted,
            reviewer_id: Some(Uuid::new_v4()),
            appeal_reviewer_id: None,
            appealable,
            appeal_deadline: deadline,
        }
    }

    #[test]
    fn happy_path_through_appeal() {
        let now = Utc::now();
        let mut state = ReviewSnapshot::pending();

        state.status = transition(&state, &Command::Claim).unwrap();
        assert_eq!(state.status, ReviewStatus::InReview);

        state.status = transition(&state, &Command::Decide { outcome: Some(ReviewOutcome::Resolved) }).unwrap();
        assert_eq!(state.status, ReviewStatus::ReviewCompleted);

        state.appealable = true;
        state.appeal_deadline = Some(now + Duration::days(14));
        state.status = transition(&state, &Command::FileAppeal { at: now }).unwrap();
        assert_eq!(state.status, ReviewStatus::AppealPending);

        state.status = transition(&state, &Command::ClaimAppeal).unwrap();
        state.status = transition(&state, &Command::DecideAppeal { outcome: Some(ReviewOutcome::Dismissed) }).unwrap();
        assert_eq!(state.status, ReviewStatus::AppealCompleted);
    }

    #[test]
    fn review_cannot_complete_without_outcome() {
        for status in ALL_STATUSES {
            let result = transition(&at(status), &Command::Decide { outcome: None });
            assert_ne!(result, Ok(ReviewStatus::ReviewCompleted), "from {status}");
        }
        assert_eq!(
            transition(&at(ReviewStatus::InReview), &Command::Decide { outcome: None }),
            Err(TransitionError::MissingOutcome)
        );
    }

    #[test]
    fn only_decide_reaches_review_completed() {
        let now = Utc::now();
        let commands = [
            Command::Claim,
            Command::Release,
            Command::FileAppeal { at: now },
            Command::ClaimAppeal,
            Command::ReleaseAppeal,
            Command::DecideAppeal { outcome: Some(ReviewOutcome::Resolved) },
        ];
        for status in ALL_STATUSES {
            for command in &commands {
                assert_ne!(transition(&at(status), command), Ok(ReviewStatus::ReviewCompleted));
            }
        }
    }

    #[test]
    fn appeal_decisions_only_in_appeal_states() {
        let now = Utc::now();
        for status in ALL_STATUSES {
            let actions = available_actions(&at(status), now);
            let appeal_decision = actions
                .iter()
                .any(|a| matches!(a, ReviewAction::ClaimAppeal | ReviewAction::DecideAppeal));
            if appeal_decision {
                assert!(status.is_appeal(), "{status} offered an appeal decision");
            }
        }
        assert_eq!(
            available_actions(&at(ReviewStatus::AppealInReview), now),
            vec![ReviewAction::ReleaseAppeal, ReviewAction::DecideAppeal]
        );
    }

    #[test]
    fn decide_appeal_rejected_outside_appeal_review() {
        let err = transition(
            &at(ReviewStatus::InReview),
            &Command::DecideAppeal { outcome: Some(ReviewOutcome::Resolved) },
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::NotAllowed { from: ReviewStatus::InReview, .. }));
        assert_eq!(AppError::from(err).code(), Some(ErrorCode::InvalidReviewTransition));
    }

    #[test]
    fn appeal_needs_flag_and_open_window() {
        let now = Utc::now();

        let err = transition(&completed(false, None), &Command::FileAppeal { at: now }).unwrap_err();
        assert_eq!(err, TransitionError::NotAppealable);

        let closed = now - Duration::hours(1);
        let err = transition(&completed(true, Some(closed)), &Command::FileAppeal { at: now }).unwrap_err();
        assert_eq!(err, TransitionError::AppealWindowClosed(closed));
        assert_eq!(AppError::from(err).code(), Some(ErrorCode::AppealWindowClosed));

        let open = completed(true, Some(now + Duration::days(1)));
        assert!(open.appeal_open(now));
        assert_eq!(available_actions(&open, now), vec![ReviewAction::FileAppeal]);
        assert!(available_actions(&completed(false, None), now).is_empty());
    }

    #[test]
    fn terminal_state_offers_nothing() {
        assert!(available_actions(&at(ReviewStatus::AppealCompleted), Utc::now()).is_empty());
    }

    #[test]
    fn status_round_trips_through_str() {
        for status in ALL_STATUSES {
            assert_eq!(status.as_str().parse::<ReviewStatus>().unwrap(), status);
        }
        assert!(ReviewStatus::Pending.is_open());
        assert!(!ReviewStatus::ReviewCompleted.is_open());
    }
}
