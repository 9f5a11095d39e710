use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use freeshare_shared::errors::AppResult;
use freeshare_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::{AdminAction, NewAdminAction};
use crate::schema::admin_actions;

/// Record a moderation or admin action in the audit log.
pub fn log_action(
    conn: &mut PgConnection,
    admin_id: Uuid,
    action: impl Into<String>,
    target_user_id: Option<Uuid>,
    details: serde_json::Value,
) -> AppResult<()> {
    let entry = NewAdminAction {
        admin_id,
        action: action.into(),
        target_user_id,
        details: Some(details),
    };

    diesel::insert_into(admin_actions::table)
        .values(&entry)
        .execute(conn)?;

    tracing::debug!(admin_id = %admin_id, action = %entry.action, "admin action logged");
    Ok(())
}

pub fn list_actions(
    conn: &mut PgConnection,
    params: &PaginationParams,
    admin_id: Option<Uuid>,
) -> AppResult<Paginated<AdminAction>> {
    let mut items_query = admin_actions::table.into_boxed();
    let mut count_query = admin_actions::table.into_boxed();
    if let Some(admin_id) = admin_id {
        items_query = items_query.filter(admin_actions::admin_id.eq(admin_id));
        count_query = count_query.filter(admin_actions::admin_id.eq(admin_id));
    }

    let items = items_query
        .order(admin_actions::created_at.desc())
        .offset(params.offset() as i64)
        .limit(params.limit() as i64)
        .load::<AdminAction>(conn)?;

    let total: i64 = count_query.count().get_result(conn)?;

    Ok(Paginated::new(items, total as u64, params))
}
