use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::meta::{FieldMeta, FieldType, TableMeta};
use crate::errors::{AppError, AppResult, ErrorCode};
use crate::types::pagination::PaginationParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(AppError::Validation(format!("order must be 'asc' or 'desc', got '{s}'"))),
        }
    }
}

/// Listing request for a table view: paging, free-text search, one sort
/// column and equality filters.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub pagination: PaginationParams,
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: SortOrder,
    pub filters: BTreeMap<String, String>,
}

impl ListQuery {
    /// Build from raw query-string pairs. `page`, `per_page`, `search`,
    /// `sort` and `order` are reserved; any other key filters on the field of
    /// that name. A filter value of `null` matches rows where the column is
    /// NULL.
    pub fn from_params(params: HashMap<String, String>) -> AppResult<Self> {
        let mut query = ListQuery::default();
        let mut page = 1;
        let mut per_page = query.pagination.per_page;

        for (key, value) in params {
            match key.as_str() {
                "page" => page = parse_number(&key, &value)?,
                "per_page" => per_page = parse_number(&key, &value)?,
                "search" => {
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        query.search = Some(trimmed.to_string());
                    }
                }
                "sort" => query.sort = Some(value),
                "order" => query.order = value.parse()?,
                _ => {
                    query.filters.insert(key, value);
                }
            }
        }

        query.pagination = PaginationParams::new(page, per_page);
        Ok(query)
    }

    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }
}

fn parse_number(key: &str, value: &str) -> AppResult<u64> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("{key} must be a positive integer")))
}

/// SQL text plus its positional bind values (`$1`, `$2`, ...), all sent as
/// nullable text and cast in SQL.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlStatement {
    pub sql: String,
    pub binds: Vec<Option<String>>,
}

#[derive(Default)]
struct Binder {
    binds: Vec<Option<String>>,
}

impl Binder {
    fn push(&mut self, value: Option<String>) -> String {
        self.binds.push(value);
        format!("${}", self.binds.len())
    }

    fn finish(self, sql: String) -> SqlStatement {
        SqlStatement { sql, binds: self.binds }
    }
}

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len() + 2);
    out.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('%');
    out
}

fn build_where(meta: &TableMeta, query: &ListQuery, binder: &mut Binder) -> AppResult<String> {
    let mut clauses = Vec::new();

    for (name, value) in &query.filters {
        let field = meta.filterable(name)?;
        if value == "null" {
            clauses.push(format!("{} IS NULL", quote(field.name)));
        } else {
            let placeholder = binder.push(Some(value.clone()));
            clauses.push(format!("{}::text = {placeholder}", quote(field.name)));
        }
    }

    if let Some(term) = &query.search {
        let fields: Vec<&FieldMeta> = meta.searchable_fields().collect();
        if fields.is_empty() {
            return Err(AppError::new(
                ErrorCode::FieldNotSearchable,
                format!("table '{}' has no searchable fields", meta.name),
            ));
        }
        let placeholder = binder.push(Some(escape_like(term)));
        let ors: Vec<String> = fields
            .iter()
            .map(|f| format!("{}::text ILIKE {placeholder}", quote(f.name)))
            .collect();
        clauses.push(format!("({})", ors.join(" OR ")));
    }

    if clauses.is_empty() {
        Ok(String::new())
    } else {
        Ok(format!(" WHERE {}", clauses.join(" AND ")))
    }
}

/// One page of rows, sorted by the requested column (or the table default)
/// with the primary key as tie-breaker.
pub fn build_select(meta: &TableMeta, query: &ListQuery) -> AppResult<SqlStatement> {
    let mut binder = Binder::default();
    let where_sql = build_where(meta, query, &mut binder)?;

    let (sort_field, order) = match &query.sort {
        Some(name) => (meta.sortable(name)?.name, query.order),
        None => (meta.field(meta.default_sort)?.name, query.order),
    };

    let sql = format!(
        "SELECT * FROM {table}{where_sql} ORDER BY {sort} {dir}, {pk} ASC LIMIT {limit} OFFSET {offset}",
        table = quote(meta.name),
        sort = quote(sort_field),
        dir = order.as_sql(),
        pk = quote(meta.primary_key),
        limit = query.pagination.limit(),
        offset = query.pagination.offset(),
    );
    Ok(binder.finish(sql))
}

pub fn build_count(meta: &TableMeta, query: &ListQuery) -> AppResult<SqlStatement> {
    let mut binder = Binder::default();
    let where_sql = build_where(meta, query, &mut binder)?;
    let sql = format!("SELECT COUNT(*) AS total FROM {}{where_sql}", quote(meta.name));
    Ok(binder.finish(sql))
}

/// First row whose `field` equals `value`. The value must parse as the
/// field's type.
pub fn build_find_by(meta: &TableMeta, field: &str, value: &str) -> AppResult<SqlStatement> {
    let field = meta.filterable(field)?;
    let mut binder = Binder::default();
    let placeholder = binder.push(Some(parse_lookup(field, value)?));
    let sql = format!(
        "SELECT * FROM {} WHERE {} = {placeholder}::{} LIMIT 1",
        quote(meta.name),
        quote(field.name),
        field.field_type.pg_cast(),
    );
    Ok(binder.finish(sql))
}

/// Column assignments for an insert or update, values already rendered as text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changes {
    values: Vec<(String, Option<String>)>,
}

impl Changes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.push((field.into(), Some(value.into())));
        self
    }

    pub fn set_opt(mut self, field: impl Into<String>, value: Option<impl Into<String>>) -> Self {
        self.values.push((field.into(), value.map(Into::into)));
        self
    }

    pub fn set_null(mut self, field: impl Into<String>) -> Self {
        self.values.push((field.into(), None));
        self
    }

    pub fn set_uuid(self, field: impl Into<String>, value: Uuid) -> Self {
        self.set(field, value.to_string())
    }

    pub fn set_time(self, field: impl Into<String>, value: DateTime<Utc>) -> Self {
        self.set(field, value.to_rfc3339())
    }

    pub fn set_bool(self, field: impl Into<String>, value: bool) -> Self {
        self.set(field, value.to_string())
    }

    pub fn set_json(self, field: impl Into<String>, value: &Value) -> Self {
        self.set(field, value.to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(f, _)| f.as_str())
    }

    pub fn get(&self, field: &str) -> Option<Option<&str>> {
        self.values
            .iter()
            .rev()
            .find(|(f, _)| f == field)
            .map(|(_, v)| v.as_deref())
    }
}

/// Only apply an update while `field` still holds `expected`.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusGuard {
    pub field: &'static str,
    pub expected: String,
}

impl StatusGuard {
    pub fn new(field: &'static str, expected: impl Into<String>) -> Self {
        Self { field, expected: expected.into() }
    }
}

pub fn build_update(
    meta: &TableMeta,
    id: Uuid,
    changes: &Changes,
    guard: Option<&StatusGuard>,
) -> AppResult<SqlStatement> {
    if changes.is_empty() {
        return Err(AppError::Validation("no fields to update".into()));
    }

    let mut binder = Binder::default();
    let mut assignments = Vec::new();
    for (name, value) in &changes.values {
        let field = meta.field(name)?;
        let placeholder = binder.push(value.clone());
        assignments.push(format!("{} = {placeholder}::{}", quote(field.name), field.field_type.pg_cast()));
    }
    if meta.has_field("updated_at") && changes.get("updated_at").is_none() {
        assignments.push(format!("{} = now()", quote("updated_at")));
    }

    let pk = meta.primary_key_field()?;
    let id_placeholder = binder.push(Some(id.to_string()));
    let mut sql = format!(
        "UPDATE {} SET {} WHERE {} = {id_placeholder}::{}",
        quote(meta.name),
        assignments.join(", "),
        quote(pk.name),
        pk.field_type.pg_cast(),
    );

    if let Some(guard) = guard {
        let field = meta.field(guard.field)?;
        let placeholder = binder.push(Some(guard.expected.clone()));
        sql.push_str(&format!(" AND {}::text = {placeholder}", quote(field.name)));
    }

    sql.push_str(" RETURNING *");
    Ok(binder.finish(sql))
}

pub fn build_insert(meta: &TableMeta, changes: &Changes) -> AppResult<SqlStatement> {
    if changes.is_empty() {
        return Err(AppError::Validation("no fields to insert".into()));
    }

    let mut binder = Binder::default();
    let mut columns = Vec::new();
    let mut values = Vec::new();
    for (name, value) in &changes.values {
        let field = meta.field(name)?;
        columns.push(quote(field.name));
        let placeholder = binder.push(value.clone());
        values.push(format!("{placeholder}::{}", field.field_type.pg_cast()));
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING *",
        quote(meta.name),
        columns.join(", "),
        values.join(", "),
    );
    Ok(binder.finish(sql))
}

/// Check a path or query value against the column type before it is cast
/// in SQL.
pub fn parse_lookup(field: &FieldMeta, raw: &str) -> AppResult<String> {
    let value = match field.field_type {
        FieldType::Integer => raw.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::String(raw.into())),
        FieldType::Boolean => raw.parse::<bool>().map(Value::Bool).unwrap_or_else(|_| Value::String(raw.into())),
        FieldType::Json => {
            return Err(AppError::Validation(format!("field '{}' cannot be used for lookups", field.name)));
        }
        _ => Value::String(raw.to_string()),
    };
    bind_value(field, &value)?
        .ok_or_else(|| AppError::Validation(format!("a value is required for field '{}'", field.name)))
}

/// Render a JSON patch value as a bind parameter for `field`, rejecting
/// values that do not fit the column type.
pub fn bind_value(field: &FieldMeta, value: &Value) -> AppResult<Option<String>> {
    let mismatch = || {
        AppError::with_details(
            ErrorCode::ValidationError,
            format!("invalid value for field '{}'", field.name),
            serde_json::json!({ "field": field.name, "expected": field.field_type }),
        )
    };

    let rendered = match (field.field_type, value) {
        (_, Value::Null) => None,
        (FieldType::Json, v) => Some(v.to_string()),
        (FieldType::Text, Value::String(s)) => Some(s.clone()),
        (FieldType::Uuid, Value::String(s)) => {
            let id: Uuid = s.parse().map_err(|_| mismatch())?;
            Some(id.to_string())
        }
        (FieldType::Timestamp, Value::String(s)) => {
            let at: DateTime<Utc> = s.parse().map_err(|_| mismatch())?;
            Some(at.to_rfc3339())
        }
        (FieldType::Boolean, Value::Bool(b)) => Some(b.to_string()),
        (FieldType::Integer, Value::Number(n)) if n.is_i64() => Some(n.to_string()),
        _ => return Err(mismatch()),
    };
    Ok(rendered)
}

#[cfg(test)]
mod tests {
    use super::super::meta::fixtures::{TAGS, WIDGETS};
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn parses_reserved_and_filter_params() {
        let q = ListQuery::from_params(params(&[
            ("page", "2"),
            ("per_page", "10"),
            ("search", "  lamp "),
            ("sort", "title"),
            ("order", "asc"),
            ("status", "available"),
        ]))
        .unwrap();

        assert_eq!(q.pagination.page, 2);
        assert_eq!(q.pagination.limit(), 10);
        assert_eq!(q.search.as_deref(), Some("lamp"));
        assert_eq!(q.sort.as_deref(), Some("title"));
        assert_eq!(q.order, SortOrder::Asc);
        assert_eq!(q.filters.get("status").map(String::as_str), Some("available"));
    }

    #[test]
    fn rejects_bad_paging_and_order() {
        assert!(ListQuery::from_params(params(&[("page", "two")])).is_err());
        assert!(ListQuery::from_params(params(&[("order", "sideways")])).is_err());
    }

    #[test]
    fn blank_search_is_ignored() {
        let q = ListQuery::from_params(params(&[("search", "   ")])).unwrap();
        assert!(q.search.is_none());
    }

    #[test]
    fn default_select_sorts_by_table_default() {
        let stmt = build_select(&WIDGETS, &ListQuery::default()).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"widgets\" ORDER BY \"created_at\" DESC, \"id\" ASC LIMIT 20 OFFSET 0"
        );
        assert!(stmt.binds.is_empty());
    }

    #[test]
    fn select_with_filters_and_search() {
        let mut q = ListQuery::default()
            .with_filter("status", "available")
            .with_filter("owner_id", "null");
        q.search = Some("50%_off".into());
        q.sort = Some("title".into());
        q.order = SortOrder::Asc;
        q.pagination = PaginationParams::new(3, 10);

        let stmt = build_select(&WIDGETS, &q).unwrap();
        assert_eq!(
            stmt.sql,
            "SELECT * FROM \"widgets\" WHERE \"owner_id\" IS NULL AND \"status\"::text = $1 \
             AND (\"title\"::text ILIKE $2 OR \"notes\"::text ILIKE $2) \
             ORDER BY \"title\" ASC, \"id\" ASC LIMIT 10 OFFSET 20"
        );
        assert_eq!(
            stmt.binds,
            vec![Some("available".to_string()), Some("%50\\%\\_off%".to_string())]
        );
    }

    #[test]
    fn count_shares_where_clause() {
        let q = ListQuery::default().with_filter("hidden", "false");
        let stmt = build_count(&WIDGETS, &q).unwrap();
        assert_eq!(stmt.sql, "SELECT COUNT(*) AS total FROM \"widgets\" WHERE \"hidden\"::text = $1");
        assert_eq!(stmt.binds, vec![Some("false".to_string())]);
    }

    #[test]
    fn ineligible_fields_are_rejected() {
        let q = ListQuery { sort: Some("notes".into()), ..Default::default() };
        assert_eq!(build_select(&WIDGETS, &q).unwrap_err().code(), Some(ErrorCode::FieldNotSortable));

        let q = ListQuery::default().with_filter("title", "x");
        assert_eq!(build_count(&WIDGETS, &q).unwrap_err().code(), Some(ErrorCode::FieldNotFilterable));

        let q = ListQuery::default().with_filter("'; drop table widgets; --", "x");
        assert_eq!(build_count(&WIDGETS, &q).unwrap_err().code(), Some(ErrorCode::UnknownField));
    }

    #[test]
    fn search_without_searchable_fields_fails() {
        let q = ListQuery { search: Some("x".into()), ..Default::default() };
        assert_eq!(build_select(&TAGS, &q).unwrap_err().code(), Some(ErrorCode::FieldNotSearchable));
    }

    #[test]
    fn find_by_casts_to_field_type() {
        let stmt = build_find_by(&WIDGETS, "owner_id", "6a2f41a3-c54c-fce8-32d2-0324e1c32e22").unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM \"widgets\" WHERE \"owner_id\" = $1::uuid LIMIT 1");
    }

    #[test]
    fn find_by_rejects_values_of_the_wrong_type() {
        let err = build_find_by(&WIDGETS, "owner_id", "not-a-uuid").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::ValidationError));

        let id = Uuid::new_v4();
        let stmt = build_find_by(&WIDGETS, "owner_id", &id.to_string().to_uppercase()).unwrap();
        assert_eq!(stmt.binds, vec![Some(id.to_string())]);
    }

    #[test]
    fn lookup_values_parse_by_field_type() {
        let quantity = WIDGETS.field("quantity").unwrap();
        assert_eq!(parse_lookup(quantity, "12").unwrap(), "12");
        assert_eq!(parse_lookup(quantity, "twelve").unwrap_err().code(), Some(ErrorCode::ValidationError));

        let hidden = WIDGETS.field("hidden").unwrap();
        assert_eq!(parse_lookup(hidden, "true").unwrap(), "true");
        assert!(parse_lookup(hidden, "yes").is_err());

        let created = WIDGETS.field("created_at").unwrap();
        assert!(parse_lookup(created, "2026-03-14T10:00:00Z").is_ok());
        assert!(parse_lookup(created, "last tuesday").is_err());

        let title = WIDGETS.field("title").unwrap();
        assert_eq!(parse_lookup(title, "Desk").unwrap(), "Desk");
    }

    #[test]
    fn huge_page_number_builds_a_bounded_offset() {
        let q = ListQuery::from_params(params(&[("page", "18446744073709551615"), ("per_page", "100")])).unwrap();
        let stmt = build_select(&WIDGETS, &q).unwrap();
        assert!(stmt.sql.ends_with(&format!("LIMIT 100 OFFSET {}", i64::MAX)));
    }

    #[test]
    fn update_touches_updated_at_and_guards_status() {
        let id = Uuid::nil();
        let changes = Changes::new().set("status", "removed").set_null("notes");
        let guard = StatusGuard::new("status", "available");
        let stmt = build_update(&WIDGETS, id, &changes, Some(&guard)).unwrap();

        assert_eq!(
            stmt.sql,
            "UPDATE \"widgets\" SET \"status\" = $1::text, \"notes\" = $2::text, \"updated_at\" = now() \
             WHERE \"id\" = $3::uuid AND \"status\"::text = $4 RETURNING *"
        );
        assert_eq!(
            stmt.binds,
            vec![
                Some("removed".to_string()),
                None,
                Some(id.to_string()),
                Some("available".to_string()),
            ]
        );
    }

    #[test]
    fn empty_update_is_rejected() {
        assert!(build_update(&WIDGETS, Uuid::nil(), &Changes::new(), None).is_err());
    }

    #[test]
    fn insert_lists_columns_in_order() {
        let changes = Changes::new()
            .set("title", "Desk")
            .set_bool("hidden", false)
            .set_json("attributes", &serde_json::json!({ "color": "oak" }));
        let stmt = build_insert(&WIDGETS, &changes).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO \"widgets\" (\"title\", \"hidden\", \"attributes\") \
             VALUES ($1::text, $2::boolean, $3::jsonb) RETURNING *"
        );
        assert_eq!(stmt.binds[2].as_deref(), Some("{\"color\":\"oak\"}"));
    }

    #[test]
    fn bind_value_checks_types() {
        let quantity = WIDGETS.field("quantity").unwrap();
        assert_eq!(bind_value(quantity, &serde_json::json!(4)).unwrap().as_deref(), Some("4"));
        assert!(bind_value(quantity, &serde_json::json!("four")).is_err());
        assert!(bind_value(quantity, &serde_json::json!(1.5)).is_err());

        let hidden = WIDGETS.field("hidden").unwrap();
        assert_eq!(bind_value(hidden, &serde_json::json!(true)).unwrap().as_deref(), Some("true"));
        assert_eq!(bind_value(hidden, &Value::Null).unwrap(), None);

        let owner = WIDGETS.field("owner_id").unwrap();
        assert!(bind_value(owner, &serde_json::json!("not-a-uuid")).is_err());
    }

    #[test]
    fn changes_last_write_wins_on_get() {
        let changes = Changes::new().set("status", "a").set("status", "b");
        assert_eq!(changes.get("status"), Some(Some("b")));
        assert_eq!(changes.get("title"), None);
    }
}
