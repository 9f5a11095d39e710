use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use freeshare_shared::errors::AppResult;
use freeshare_shared::middleware::ModeratorUser;
use freeshare_shared::types::api::ApiResponse;

use crate::models::{SupportRequest, SupportStatus};
use crate::services::support_service::{self, RequestSla};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: SupportStatus,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// `null` unassigns.
    pub assigned_to: Option<Uuid>,
}

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<ApiResponse<SupportRequest>>> {
    Ok(Json(ApiResponse::ok(support_service::update_status(&state, id, req.status, &user)?)))
}

pub async fn assign(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path(id): Path<Uuid>,
    Json(req): Json<AssignRequest>,
) -> AppResult<Json<ApiResponse<SupportRequest>>> {
    Ok(Json(ApiResponse::ok(support_service::assign(&state, id, req.assigned_to, &user)?)))
}

pub async fn sla(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<RequestSla>>> {
    Ok(Json(ApiResponse::ok(support_service::sla_status(&state, id)?)))
}
