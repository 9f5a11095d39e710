//! Generic table endpoints backing the back-office list, detail and edit views.
//!
//! `GET /admin/tables/:table/:id/subscribe` streams the row over SSE: one
//! `snapshot` event with the current row, then a `change` event per
//! committed write. Clients that fall too far behind get a `lagged` event
//! and should refetch.

use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use futures::stream::Stream;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use freeshare_shared::errors::AppResult;
use freeshare_shared::middleware::ModeratorUser;
use freeshare_shared::records::{ListQuery, RowEvent, TableMeta};
use freeshare_shared::types::api::ApiResponse;
use freeshare_shared::types::pagination::Paginated;

use crate::tables::{table_view, EXPOSED};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub table: &'static str,
    pub count: u64,
}

pub async fn list_tables(_staff: ModeratorUser) -> Json<ApiResponse<Vec<&'static str>>> {
    Json(ApiResponse::ok(EXPOSED.iter().map(|m| m.name).collect()))
}

pub async fn meta(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path(table): Path<String>,
) -> AppResult<Json<ApiResponse<&'static TableMeta>>> {
    let view = table_view(&table, &state.feed)?;
    Ok(Json(ApiResponse::ok(view.meta())))
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<Paginated<Value>>>> {
    let view = table_view(&table, &state.feed)?;
    let query = ListQuery::from_params(params)?;
    let mut conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(view.list(&mut conn, &query)?)))
}

pub async fn count(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<ApiResponse<CountResponse>>> {
    let view = table_view(&table, &state.feed)?;
    let query = ListQuery::from_params(params)?;
    let mut conn = state.db.get()?;
    let count = view.count(&mut conn, &query)?;
    Ok(Json(ApiResponse::ok(CountResponse { table: view.meta().name, count })))
}

pub async fn get(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path((table, id)): Path<(String, Uuid)>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let view = table_view(&table, &state.feed)?;
    let mut conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(view.get(&mut conn, id)?)))
}

/// Single-row lookup by any filterable field; `data` is `null` when nothing matches.
pub async fn find_one(
    State(state): State<Arc<AppState>>,
    _staff: ModeratorUser,
    Path((table, field, value)): Path<(String, String, String)>,
) -> AppResult<Json<ApiResponse<Option<Value>>>> {
    let view = table_view(&table, &state.feed)?;
    let mut conn = state.db.get()?;
    Ok(Json(ApiResponse::ok(view.find_one(&mut conn, &field, &value)?)))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((table, id)): Path<(String, Uuid)>,
    Json(patch): Json<serde_json::Map<String, Value>>,
) -> AppResult<Json<ApiResponse<Value>>> {
    let view = table_view(&table, &state.feed)?;
    let mut conn = state.db.get()?;
    let row = view.update(&mut conn, id, &patch)?;

    tracing::info!(
        table = view.meta().name,
        id = %id,
        user_id = %user.id,
        fields = ?patch.keys().collect::<Vec<_>>(),
        "record updated"
    );
    Ok(Json(ApiResponse::ok(row)))
}

pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    ModeratorUser(user): ModeratorUser,
    Path((table, id)): Path<(String, Uuid)>,
) -> AppResult<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>> {
    let view = table_view(&table, &state.feed)?;

    // subscribe before reading so no write can fall between snapshot and stream
    let mut subscription = view.subscribe(id);
    let snapshot = {
        let mut conn = state.db.get()?;
        view.get(&mut conn, id)?
    };

    let table = view.meta().name;
    tracing::info!(table, id = %id, user_id = %user.id, "row subscriber connected");

    let stream = async_stream::stream! {
        yield Ok(SseEvent::default().event("snapshot").data(snapshot.to_string()));

        while let Some(event) = subscription.next().await {
            match event {
                RowEvent::Changed(change) => {
                    let json = match serde_json::to_string(&*change) {
                        Ok(j) => j,
                        Err(e) => {
                            tracing::warn!(error = %e, "failed to serialize row change");
                            continue;
                        }
                    };
                    yield Ok(SseEvent::default().event("change").data(json));
                }
                RowEvent::Lagged(missed) => {
                    tracing::warn!(table, id = %id, missed, "row subscriber lagged");
                    yield Ok(SseEvent::default()
                        .event("lagged")
                        .data(serde_json::json!({ "missed": missed }).to_string()));
                }
            }
        }

        tracing::info!(table, id = %id, "change feed closed, ending row stream");
    };

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("heartbeat")))
}
