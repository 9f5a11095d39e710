//! Name-based access to the tables exposed through the generic table views.

use diesel::pg::PgConnection;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult, ErrorCode};
use freeshare_shared::records::{ChangeFeed, ListQuery, Record, RecordService, RowSubscription, TableMeta};
use freeshare_shared::types::pagination::Paginated;

use crate::models::*;

/// A [`RecordService`] with its row type erased to JSON.
pub trait TableView: Send + Sync {
    fn meta(&self) -> &'static TableMeta;
    fn get(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Value>;
    fn find_one(&self, conn: &mut PgConnection, field: &str, value: &str) -> AppResult<Option<Value>>;
    fn list(&self, conn: &mut PgConnection, query: &ListQuery) -> AppResult<Paginated<Value>>;
    fn count(&self, conn: &mut PgConnection, query: &ListQuery) -> AppResult<u64>;
    fn update(&self, conn: &mut PgConnection, id: Uuid, patch: &serde_json::Map<String, Value>) -> AppResult<Value>;
    fn subscribe(&self, id: Uuid) -> RowSubscription;
}

fn to_json<T: Serialize>(row: &T) -> AppResult<Value> {
    serde_json::to_value(row).map_err(|e| AppError::Internal(e.into()))
}

impl<T: Record> TableView for RecordService<T> {
    fn meta(&self) -> &'static TableMeta {
        RecordService::<T>::meta(self)
    }

    fn get(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Value> {
        to_json(&self.get_by_id(conn, id)?)
    }

    fn find_one(&self, conn: &mut PgConnection, field: &str, value: &str) -> AppResult<Option<Value>> {
        self.get_one_or_null(conn, field, value)?.as_ref().map(to_json).transpose()
    }

    fn list(&self, conn: &mut PgConnection, query: &ListQuery) -> AppResult<Paginated<Value>> {
        let page = self.get_all_paged(conn, query)?;
        let items = page.items.iter().map(to_json).collect::<AppResult<Vec<_>>>()?;
        Ok(Paginated {
            items,
            total: page.total,
            page: page.page,
            per_page: page.per_page,
            total_pages: page.total_pages,
        })
    }

    fn count(&self, conn: &mut PgConnection, query: &ListQuery) -> AppResult<u64> {
        RecordService::<T>::count(self, conn, query)
    }

    fn update(&self, conn: &mut PgConnection, id: Uuid, patch: &serde_json::Map<String, Value>) -> AppResult<Value> {
        to_json(&RecordService::<T>::update(self, conn, id, patch)?)
    }

    fn subscribe(&self, id: Uuid) -> RowSubscription {
        self.subscribe_to_row_by_id(id)
    }
}

/// Every table the back-office can browse, in menu order.
pub static EXPOSED: &[&TableMeta] = &[
    &PROFILES,
    &ITEMS,
    &COMMUNITY_EVENTS,
    &DEVICES,
    &NOTIFICATIONS,
    &BROADCASTS,
    &SUPPORT_REQUESTS,
    &SUPPORT_SLA_CONFIGS,
    &REPORTS,
    &ITEM_REVIEWS,
    &USER_REVIEWS,
    &USER_WARNINGS,
    &USER_SUSPENSIONS,
    &USER_BANS,
];

pub fn table_view(name: &str, feed: &ChangeFeed) -> AppResult<Box<dyn TableView>> {
    fn boxed<T: Record>(meta: &'static TableMeta, feed: &ChangeFeed) -> Box<dyn TableView> {
        Box::new(RecordService::<T>::new(meta, feed.clone()))
    }

    let view = match name {
        "profiles" => boxed::<Profile>(&PROFILES, feed),
        "items" => boxed::<Item>(&ITEMS, feed),
        "community_events" => boxed::<CommunityEvent>(&COMMUNITY_EVENTS, feed),
        "devices" => boxed::<Device>(&DEVICES, feed),
        "notifications" => boxed::<Notification>(&NOTIFICATIONS, feed),
        "broadcasts" => boxed::<Broadcast>(&BROADCASTS, feed),
        "support_requests" => boxed::<SupportRequest>(&SUPPORT_REQUESTS, feed),
        "support_sla_configs" => boxed::<SupportSlaConfig>(&SUPPORT_SLA_CONFIGS, feed),
        "reports" => boxed::<Report>(&REPORTS, feed),
        "item_reviews" => boxed::<Review>(&ITEM_REVIEWS, feed),
        "user_reviews" => boxed::<Review>(&USER_REVIEWS, feed),
        "user_warnings" => boxed::<UserWarning>(&USER_WARNINGS, feed),
        "user_suspensions" => boxed::<UserSuspension>(&USER_SUSPENSIONS, feed),
        "user_bans" => boxed::<UserBan>(&USER_BANS, feed),
        _ => {
            return Err(AppError::with_details(
                ErrorCode::UnknownTable,
                format!("unknown table '{name}'"),
                serde_json::json!({ "table": name }),
            ))
        }
    };
    Ok(view)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_exposed_table_has_a_view() {
        let feed = ChangeFeed::new();
        for meta in EXPOSED {
            let view = table_view(meta.name, &feed).unwrap();
            assert_eq!(view.meta().name, meta.name);
        }
    }

    #[test]
    fn unknown_tables_are_rejected() {
        let feed = ChangeFeed::new();
        for name in ["admin_actions", "pg_user", "items; drop table items"] {
            let err = table_view(name, &feed).err().unwrap();
            assert_eq!(err.code(), Some(ErrorCode::UnknownTable));
        }
    }

    #[test]
    fn metadata_is_consistent() {
        for meta in EXPOSED {
            assert!(meta.primary_key_field().is_ok(), "{} has no primary key field", meta.name);
            assert!(meta.field(meta.default_sort).is_ok(), "{} default sort is unknown", meta.name);
            assert!(
                meta.editable(meta.primary_key).is_err(),
                "{} primary key must not be editable",
                meta.name
            );
            let mut names: Vec<_> = meta.fields.iter().map(|f| f.name).collect();
            names.sort_unstable();
            names.dedup();
            assert_eq!(names.len(), meta.fields.len(), "{} has duplicate fields", meta.name);
        }
    }
}
