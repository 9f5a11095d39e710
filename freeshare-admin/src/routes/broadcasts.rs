use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use freeshare_shared::errors::AppResult;
use freeshare_shared::middleware::AdminUser;
use freeshare_shared::types::api::ApiResponse;

use crate::models::Broadcast;
use crate::services::broadcast_service::{self, BroadcastAudience};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBroadcastRequest {
    #[validate(length(min = 1, max = 200, message = "title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 2000, message = "body must be 1-2000 characters"))]
    pub body: String,
    pub audience: BroadcastAudience,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Json(req): Json<CreateBroadcastRequest>,
) -> AppResult<Json<ApiResponse<Broadcast>>> {
    req.validate()?;
    let broadcast = broadcast_service::create(&state, &admin, req.title, req.body, req.audience)?;
    Ok(Json(ApiResponse::ok(broadcast)))
}

pub async fn send(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Broadcast>>> {
    let broadcast = broadcast_service::send(&state, id, &admin).await?;
    Ok(Json(ApiResponse::ok_with_message(broadcast, "broadcast sent")))
}
