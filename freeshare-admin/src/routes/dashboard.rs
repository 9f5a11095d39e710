use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use freeshare_shared::errors::AppResult;
use freeshare_shared::middleware::{AdminUser, ModeratorUser};
use freeshare_shared::types::api::ApiResponse;
use freeshare_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::AdminAction;
use crate::services::item_service::{self, ItemDetail};
use crate::services::stats_service::{self, DashboardStats};
use crate::services::audit_service;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AuditLogParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub admin_id: Option<Uuid>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

pub async fn stats(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let mut conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(stats_service::dashboard(&mut conn)?)))
}

pub async fn audit_log(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Query(params): Query<AuditLogParams>,
) -> AppResult<Json<ApiResponse<Paginated<AdminAction>>>> {
    let pagination = PaginationParams::new(params.page, params.per_page);
    let mut conn = state.db.get()?;
    let page = audit_service::list_actions(&mut conn, &pagination, params.admin_id)?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn item_detail(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ItemDetail>>> {
    Ok(Json(ApiResponse::ok(item_service::detail(&state, id)?)))
}
