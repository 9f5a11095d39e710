use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: Auth errors
/// - E6xxx: Moderation errors (reviews, appeals, reports, sanctions)
/// - E7xxx: Support and broadcast errors
/// - E8xxx: Generic record errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Unauthorized,
    Forbidden,
    ServiceUnavailable,
    BadRequest,
    Conflict,

    // Auth (E1xxx)
    TokenExpired,
    TokenInvalid,

    // Moderation (E6xxx)
    ReviewNotFound,
    InvalidReviewTransition,
    ReviewOutcomeRequired,
    InvalidOutcomeAction,
    NotAssignedReviewer,
    AppealNotAllowed,
    AppealWindowClosed,
    ReviewAlreadyOpen,
    ReportNotFound,
    CannotReportSelf,
    DuplicateReport,
    ItemNotFound,
    ProfileNotFound,
    SanctionNotFound,

    // Support (E7xxx)
    SupportRequestNotFound,
    SlaConfigNotFound,
    BroadcastNotFound,
    BroadcastAlreadySent,

    // Records (E8xxx)
    UnknownTable,
    UnknownField,
    FieldNotSearchable,
    FieldNotSortable,
    FieldNotFilterable,
    FieldNotEditable,
    RecordNotFound,
    StaleRecord,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Unauthorized => "E0004",
            Self::Forbidden => "E0005",
            Self::ServiceUnavailable => "E0007",
            Self::BadRequest => "E0008",
            Self::Conflict => "E0010",

            // Auth
            Self::TokenExpired => "E1004",
            Self::TokenInvalid => "E1005",

            // Moderation
            Self::ReviewNotFound => "E6001",
            Self::InvalidReviewTransition => "E6002",
            Self::ReviewOutcomeRequired => "E6003",
            Self::InvalidOutcomeAction => "E6004",
            Self::NotAssignedReviewer => "E6005",
            Self::AppealNotAllowed => "E6006",
            Self::AppealWindowClosed => "E6007",
            Self::ReviewAlreadyOpen => "E6008",
            Self::ReportNotFound => "E6009",
            Self::CannotReportSelf => "E6010",
            Self::DuplicateReport => "E6011",
            Self::ItemNotFound => "E6012",
            Self::ProfileNotFound => "E6013",
            Self::SanctionNotFound => "E6014",

            // Support
            Self::SupportRequestNotFound => "E7001",
            Self::SlaConfigNotFound => "E7002",
            Self::BroadcastNotFound => "E7003",
            Self::BroadcastAlreadySent => "E7004",

            // Records
            Self::UnknownTable => "E8001",
            Self::UnknownField => "E8002",
            Self::FieldNotSearchable => "E8003",
            Self::FieldNotSortable => "E8004",
            Self::FieldNotFilterable => "E8005",
            Self::FieldNotEditable => "E8006",
            Self::RecordNotFound => "E8007",
            Self::StaleRecord => "E8008",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::ValidationError | Self::BadRequest | Self::ReviewOutcomeRequired
            | Self::InvalidOutcomeAction | Self::UnknownField | Self::FieldNotSearchable
            | Self::FieldNotSortable | Self::FieldNotFilterable | Self::FieldNotEditable => StatusCode::BAD_REQUEST,
            Self::NotFound | Self::ReviewNotFound | Self::ReportNotFound | Self::ItemNotFound
            | Self::ProfileNotFound | Self::SanctionNotFound | Self::SupportRequestNotFound
            | Self::SlaConfigNotFound | Self::BroadcastNotFound | Self::UnknownTable
            | Self::RecordNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized | Self::TokenExpired | Self::TokenInvalid => StatusCode::UNAUTHORIZED,
            Self::Forbidden | Self::NotAssignedReviewer | Self::CannotReportSelf
            | Self::AppealNotAllowed => StatusCode::FORBIDDEN,
            Self::Conflict | Self::InvalidReviewTransition | Self::ReviewAlreadyOpen
            | Self::DuplicateReport | Self::BroadcastAlreadySent | Self::StaleRecord => StatusCode::CONFLICT,
            Self::AppealWindowClosed => StatusCode::GONE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Error code carried by this error, if it is a known one.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Known { code, .. } => Some(*code),
            Self::Validation(_) => Some(ErrorCode::ValidationError),
            _ => None,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::new(ErrorCode::ValidationError, errors.to_string())
    }
}

impl From<diesel::r2d2::PoolError> for AppError {
    fn from(err: diesel::r2d2::PoolError) -> Self {
        tracing::error!(error = %err, "failed to get db connection");
        Self::new(ErrorCode::ServiceUnavailable, "database connection error")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn known_error_uses_code_and_status() {
        let (status, body) = body_json(AppError::new(
            ErrorCode::InvalidReviewTransition,
            "cannot decide a pending review",
        ))
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "E6002");
        assert_eq!(body["error"]["message"], "cannot decide a pending review");
    }

    #[tokio::test]
    async fn details_are_forwarded() {
        let err = AppError::with_details(
            ErrorCode::FieldNotSortable,
            "field 'body' is not sortable",
            serde_json::json!({ "field": "body" }),
        );
        let (status, body) = body_json(err).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["details"]["field"], "body");
    }

    #[tokio::test]
    async fn diesel_not_found_maps_to_404() {
        let (status, body) = body_json(AppError::Database(diesel::result::Error::NotFound)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "E0003");
    }

    #[tokio::test]
    async fn internal_error_hides_message() {
        let (status, body) = body_json(AppError::Internal(anyhow::anyhow!("secret detail"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "internal server error");
    }

    #[tokio::test]
    async fn unavailable_service_is_503() {
        let (status, body) = body_json(AppError::new(ErrorCode::ServiceUnavailable, "database connection error")).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], "E0007");
    }

    #[test]
    fn appeal_window_closed_is_gone() {
        assert_eq!(ErrorCode::AppealWindowClosed.status_code(), StatusCode::GONE);
        assert_eq!(ErrorCode::AppealWindowClosed.code(), "E6007");
    }

    #[test]
    fn code_accessor() {
        assert_eq!(
            AppError::new(ErrorCode::StaleRecord, "changed").code(),
            Some(ErrorCode::StaleRecord)
        );
        assert_eq!(AppError::Validation("bad".into()).code(), Some(ErrorCode::ValidationError));
        assert_eq!(AppError::Database(diesel::result::Error::NotFound).code(), None);
    }
}
