//! Endpoints any signed-in user may call.

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use freeshare_shared::errors::AppResult;
use freeshare_shared::types::api::ApiResponse;
use freeshare_shared::types::auth::AuthUser;

use crate::models::{Review, SubjectType, SupportPriority, SupportRequest};
use crate::services::report_service::{self, ReportReceipt};
use crate::services::{review_service, support_service};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub subject_type: SubjectType,
    pub subject_id: Uuid,
    #[validate(
        length(min = 1, max = 100, message = "reason must be 1-100 characters"),
        custom = "not_blank"
    )]
    pub reason: String,
    #[validate(length(max = 2000, message = "details are too long"))]
    pub details: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AppealRequest {
    #[validate(
        length(min = 1, max = 2000, message = "reason must be 1-2000 characters"),
        custom = "not_blank"
    )]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSupportRequest {
    #[validate(length(min = 1, max = 50, message = "category must be 1-50 characters"), custom = "not_blank")]
    pub category: String,
    #[serde(default = "default_priority")]
    pub priority: SupportPriority,
    #[validate(length(min = 1, max = 200, message = "subject must be 1-200 characters"), custom = "not_blank")]
    pub subject: String,
    #[validate(length(min = 1, max = 10000, message = "body must be 1-10000 characters"), custom = "not_blank")]
    pub body: String,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

fn default_priority() -> SupportPriority {
    SupportPriority::Normal
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateReportRequest>,
) -> AppResult<Json<ApiResponse<ReportReceipt>>> {
    req.validate()?;
    let receipt = report_service::create_report(
        &state,
        &user,
        req.subject_type,
        req.subject_id,
        req.reason.trim().to_string(),
        req.details,
    )
    .await?;
    Ok(Json(ApiResponse::ok_with_message(receipt, "report submitted")))
}

pub async fn file_appeal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path((subject, id)): Path<(SubjectType, Uuid)>,
    Json(req): Json<AppealRequest>,
) -> AppResult<Json<ApiResponse<Review>>> {
    req.validate()?;
    let review = review_service::file_appeal(&state, subject, id, &user, req.reason.trim().to_string()).await?;
    Ok(Json(ApiResponse::ok_with_message(review, "appeal filed")))
}

pub async fn create_support_request(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateSupportRequest>,
) -> AppResult<Json<ApiResponse<SupportRequest>>> {
    req.validate()?;
    let request = support_service::create_request(
        &state,
        &user,
        req.category.trim().to_lowercase(),
        req.priority,
        req.subject.trim().to_string(),
        req.body,
    )
    .await?;
    Ok(Json(ApiResponse::ok_with_message(request, "support request created")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_request_requires_a_reason() {
        let req: CreateReportRequest = serde_json::from_value(serde_json::json!({
            "subject_type": "item",
            "subject_id": Uuid::new_v4(),
            "reason": ""
        }))
        .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn whitespace_only_text_is_rejected() {
        let report: CreateReportRequest = serde_json::from_value(serde_json::json!({
            "subject_type": "user",
            "subject_id": Uuid::new_v4(),
            "reason": "   "
        }))
        .unwrap();
        assert!(report.validate().is_err());

        let appeal = AppealRequest { reason: "\n\t ".into() };
        assert!(appeal.validate().is_err());
        assert!(AppealRequest { reason: " listing was mislabeled ".into() }.validate().is_ok());

        let support: CreateSupportRequest = serde_json::from_value(serde_json::json!({
            "category": "pickup",
            "subject": "  ",
            "body": "waited an hour"
        }))
        .unwrap();
        assert!(support.validate().is_err());
    }

    #[test]
    fn support_priority_defaults_to_normal() {
        let req: CreateSupportRequest = serde_json::from_value(serde_json::json!({
            "category": "pickup",
            "subject": "giver did not show",
            "body": "waited an hour"
        }))
        .unwrap();
        assert_eq!(req.priority, SupportPriority::Normal);
        assert!(req.validate().is_ok());
    }
}
