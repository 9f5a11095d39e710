use std::marker::PhantomData;

use chrono::Utc;
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::query_builder::BoxedSqlQuery;
use diesel::query_builder::SqlQuery;
use diesel::sql_types::{BigInt, Nullable, Text};
use serde::Serialize;
use uuid::Uuid;

use super::feed::{ChangeFeed, ChangeKind, RowChange, RowSubscription};
use super::meta::TableMeta;
use super::query::{self, Changes, ListQuery, SqlStatement, StatusGuard};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::types::pagination::Paginated;

/// A row type that can be loaded by column name from one of the admin tables.
pub trait Record: QueryableByName<Pg> + Serialize + Send + Sync + 'static {
    fn record_id(&self) -> Uuid;
}

#[derive(QueryableByName)]
struct CountRow {
    #[diesel(sql_type = BigInt)]
    total: i64,
}

fn prepare(stmt: SqlStatement) -> BoxedSqlQuery<'static, Pg, SqlQuery> {
    let mut q = diesel::sql_query(stmt.sql).into_boxed::<Pg>();
    for value in stmt.binds {
        q = q.bind::<Nullable<Text>, _>(value);
    }
    q
}

fn not_found(meta: &TableMeta, id: Uuid) -> AppError {
    AppError::with_details(
        ErrorCode::RecordNotFound,
        format!("{} record not found", meta.name),
        serde_json::json!({ "table": meta.name, "id": id }),
    )
}

/// Error for an update that matched no row. A guarded update against a row
/// that still exists means the guard no longer held.
fn missed_update(meta: &TableMeta, id: Uuid, guarded: bool, row_exists: bool) -> AppError {
    if guarded && row_exists {
        AppError::with_details(
            ErrorCode::StaleRecord,
            format!("{} record was changed by someone else", meta.name),
            serde_json::json!({ "table": meta.name, "id": id }),
        )
    } else {
        not_found(meta, id)
    }
}

/// Typed access to one table described by a [`TableMeta`].
///
/// Reads and writes take a borrowed connection so callers can group several
/// writes in one transaction. `update` publishes to the change feed itself;
/// `write` and `insert` leave publishing to the caller via [`Self::notify`],
/// to be done once the surrounding transaction has committed.
pub struct RecordService<T> {
    meta: &'static TableMeta,
    feed: ChangeFeed,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordService<T> {
    fn clone(&self) -> Self {
        Self {
            meta: self.meta,
            feed: self.feed.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Record> RecordService<T> {
    pub fn new(meta: &'static TableMeta, feed: ChangeFeed) -> Self {
        Self {
            meta,
            feed,
            _record: PhantomData,
        }
    }

    pub fn meta(&self) -> &'static TableMeta {
        self.meta
    }

    pub fn get_by_id(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<T> {
        self.find(conn, id)?.ok_or_else(|| not_found(self.meta, id))
    }

    fn find(&self, conn: &mut PgConnection, id: Uuid) -> AppResult<Option<T>> {
        let stmt = query::build_find_by(self.meta, self.meta.primary_key, &id.to_string())?;
        Ok(prepare(stmt).get_result::<T>(conn).optional()?)
    }

    /// First row whose `field` equals `value`, used for single related-row lookups.
    pub fn get_one_or_null(&self, conn: &mut PgConnection, field: &str, value: &str) -> AppResult<Option<T>> {
        let stmt = query::build_find_by(self.meta, field, value)?;
        Ok(prepare(stmt).get_result::<T>(conn).optional()?)
    }

    pub fn get_all_paged(&self, conn: &mut PgConnection, list: &ListQuery) -> AppResult<Paginated<T>> {
        let items = prepare(query::build_select(self.meta, list)?).load::<T>(conn)?;
        let total = self.count(conn, list)?;
        Ok(Paginated::new(items, total, &list.pagination))
    }

    pub fn count(&self, conn: &mut PgConnection, list: &ListQuery) -> AppResult<u64> {
        let row = prepare(query::build_count(self.meta, list)?).get_result::<CountRow>(conn)?;
        Ok(row.total.max(0) as u64)
    }

    /// Apply a JSON patch from an edit form. Only editable fields are accepted.
    pub fn update(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        patch: &serde_json::Map<String, serde_json::Value>,
    ) -> AppResult<T> {
        let mut changes = Changes::new();
        for (name, value) in patch {
            let field = self.meta.editable(name)?;
            changes = changes.set_opt(field.name, query::bind_value(field, value)?);
        }

        let row = self.write(conn, id, &changes, None)?;
        self.notify(ChangeKind::Update, &row);
        Ok(row)
    }

    /// Update arbitrary fields, optionally only while a status column still
    /// holds the expected value. Does not publish.
    pub fn write(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
        changes: &Changes,
        guard: Option<&StatusGuard>,
    ) -> AppResult<T> {
        let stmt = query::build_update(self.meta, id, changes, guard)?;
        match prepare(stmt).get_result::<T>(conn).optional()? {
            Some(row) => Ok(row),
            None => {
                let guarded = guard.is_some();
                let row_exists = guarded && self.find(conn, id)?.is_some();
                Err(missed_update(self.meta, id, guarded, row_exists))
            }
        }
    }

    /// Insert a row. Does not publish.
    pub fn insert(&self, conn: &mut PgConnection, values: &Changes) -> AppResult<T> {
        let stmt = query::build_insert(self.meta, values)?;
        Ok(prepare(stmt).get_result::<T>(conn)?)
    }

    pub fn notify(&self, kind: ChangeKind, row: &T) {
        let record = match serde_json::to_value(row) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(table = self.meta.name, error = %e, "failed to serialize row change");
                return;
            }
        };
        self.feed.publish(RowChange {
            table: self.meta.name,
            id: row.record_id(),
            kind,
            record,
            at: Utc::now(),
        });
    }

    pub fn subscribe_to_row_by_id(&self, id: Uuid) -> RowSubscription {
        self.feed.subscribe_row(self.meta.name, id)
    }
}

#[cfg(test)]
mod tests {
    use super::super::meta::fixtures::WIDGETS;
    use super::*;

    #[test]
    fn guarded_update_on_existing_row_is_stale() {
        let id = Uuid::new_v4();
        let err = missed_update(&WIDGETS, id, true, true);
        assert_eq!(err.code(), Some(ErrorCode::StaleRecord));
    }

    #[test]
    fn update_on_missing_row_is_not_found() {
        let id = Uuid::new_v4();
        assert_eq!(missed_update(&WIDGETS, id, true, false).code(), Some(ErrorCode::RecordNotFound));
        assert_eq!(missed_update(&WIDGETS, id, false, false).code(), Some(ErrorCode::RecordNotFound));
    }
}
