use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use freeshare_shared::errors::AppResult;
use freeshare_shared::middleware::ModeratorUser;
use freeshare_shared::types::api::ApiResponse;

use crate::decision::{DecisionInput, OutcomeAction};
use crate::lifecycle::ReviewOutcome;
use crate::models::{Review, SubjectType};
use crate::services::review_service::{self, ReviewDetail};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReviewRequest {
    pub subject_id: Uuid,
    #[validate(length(max = 2000, message = "note is too long"))]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DecisionRequest {
    pub outcome: Option<ReviewOutcome>,
    pub action: Option<OutcomeAction>,
    #[validate(length(max = 500, message = "reason is too long"))]
    pub reason: Option<String>,
    #[validate(length(max = 5000, message = "comments are too long"))]
    pub comments: Option<String>,
    #[serde(default)]
    pub appealable: bool,
    pub appeal_deadline: Option<DateTime<Utc>>,
    pub suspension_days: Option<i64>,
}

impl From<DecisionRequest> for DecisionInput {
    fn from(req: DecisionRequest) -> Self {
        DecisionInput {
            outcome: req.outcome,
            action: req.action,
            reason: req.reason,
            comments: req.comments,
            appealable: req.appealable,
            appeal_deadline: req.appeal_deadline,
            suspension_days: req.suspension_days,
        }
    }
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path(subject): Path<SubjectType>,
    Json(req): Json<CreateReviewRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    req.validate()?;
    let review = review_service::create_manual(&state, subject, req.subject_id, &user, req.note).await?;
    Ok(Json(ApiResponse::ok_with_message(review, "review opened")))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
) -> AppResult<Json<ApiResponse<ReviewDetail>>> {
    Ok(Json(ApiResponse::ok(review_service::detail(&state, subject, id)?)))
}

pub async fn claim(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
) -> AppResult<Json<ApiResponse<Review>>> {
    Ok(Json(ApiResponse::ok(review_service::claim(&state, subject, id, &user).await?)))
}

pub async fn release(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
) -> AppResult<Json<ApiResponse<Review>>> {
    Ok(Json(ApiResponse::ok(review_service::release(&state, subject, id, &user).await?)))
}

pub async fn decide(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
    Json(req): Json<DecisionRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    req.validate()?;
    let review = review_service::decide(&state, subject, id, &user, req.into()).await?;
    Ok(Json(ApiResponse::ok_with_message(review, "review completed")))
}

pub async fn claim_appeal(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
) -> AppResult<Json<ApiResponse<Review>>> {
    Ok(Json(ApiResponse::ok(review_service::claim_appeal(&state, subject, id, &user).await?)))
}

pub async fn release_appeal(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
) -> AppResult<Json<ApiResponse<Review>>> {
    Ok(Json(ApiResponse::ok(review_service::release_appeal(&state, subject, id, &user).await?)))
}

pub async fn decide_appeal(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
    Json(req): Json<DecisionRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    req.validate()?;
    let review = review_service::decide_appeal(&state, subject, id, &user, req.into()).await?;
    Ok(Json(ApiResponse::ok_with_message(review, "appeal completed")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_request_maps_onto_input() {
        let req: DecisionRequest = serde_json::from_value(serde_json::json!({
            "outcome": "resolved",
            "action": "suspend_user",
            "reason": "spam listings",
            "suspension_days": 3
        }))
        .unwrap();
        assert!(req.validate().is_ok());

        let input: DecisionInput = req.into();
        assert_eq!(input.outcome, Some(ReviewOutcome::Resolved));
        assert_eq!(input.action, Some(OutcomeAction::SuspendUser));
        assert!(!input.appealable);
        assert_eq!(input.suspension_days, Some(3));
    }

    #[test]
    fn overlong_comments_fail_validation() {
        let req = DecisionRequest {
            outcome: Some(ReviewOutcome::Dismissed),
            action: Some(OutcomeAction::None),
            reason: None,
            comments: Some("x".repeat(5001)),
            appealable: false,
            appeal_deadline: None,
            suspension_days: None,
        };
        assert!(req.validate().is_err());
    }
}
