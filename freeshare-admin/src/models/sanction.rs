use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::schema::{user_bans, user_suspensions, user_warnings};

// --- Warning ---

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = user_warnings)]
pub struct UserWarning {
    pub id: Uuid,
    pub user_id: Uuid,
    pub review_id: Option<Uuid>,
    pub reason: String,
    pub issued_by: Uuid,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_warnings)]
pub struct NewUserWarning {
    pub user_id: Uuid,
    pub review_id: Option<Uuid>,
    pub reason: String,
    pub issued_by: Uuid,
}

impl Record for UserWarning {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

// --- Suspension ---

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = user_suspensions)]
pub struct UserSuspension {
    pub id: Uuid,
    pub user_id: Uuid,
    pub review_id: Option<Uuid>,
    pub reason: String,
    pub issued_by: Uuid,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
    pub lifted_at: Option<DateTime<Utc>>,
    pub lifted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_suspensions)]
pub struct NewUserSuspension {
    pub user_id: Uuid,
    pub review_id: Option<Uuid>,
    pub reason: String,
    pub issued_by: Uuid,
    pub expires_at: DateTime<Utc>,
}

impl Record for UserSuspension {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

// --- Ban ---

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = user_bans)]
pub struct UserBan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub review_id: Option<Uuid>,
    pub reason: String,
    pub issued_by: Uuid,
    pub is_active: bool,
    pub lifted_at: Option<DateTime<Utc>>,
    pub lifted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_bans)]
pub struct NewUserBan {
    pub user_id: Uuid,
    pub review_id: Option<Uuid>,
    pub reason: String,
    pub issued_by: Uuid,
}

impl Record for UserBan {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

const SANCTION_FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldType::Uuid),
    FieldMeta::new("user_id", FieldType::Uuid).filterable(),
    FieldMeta::new("review_id", FieldType::Uuid).filterable(),
    FieldMeta::new("reason", FieldType::Text).searchable(),
    FieldMeta::new("issued_by", FieldType::Uuid).filterable(),
    FieldMeta::new("is_active", FieldType::Boolean).filterable(),
    FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
];

pub static USER_WARNINGS: TableMeta = TableMeta {
    name: "user_warnings",
    primary_key: "id",
    default_sort: "created_at",
    fields: SANCTION_FIELDS,
};

pub static USER_SUSPENSIONS: TableMeta = TableMeta {
    name: "user_suspensions",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("user_id", FieldType::Uuid).filterable(),
        FieldMeta::new("review_id", FieldType::Uuid).filterable(),
        FieldMeta::new("reason", FieldType::Text).searchable(),
        FieldMeta::new("issued_by", FieldType::Uuid).filterable(),
        FieldMeta::new("expires_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("is_active", FieldType::Boolean).filterable(),
        FieldMeta::new("lifted_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("lifted_by", FieldType::Uuid).filterable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
    ],
};

pub static USER_BANS: TableMeta = TableMeta {
    name: "user_bans",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("user_id", FieldType::Uuid).filterable(),
        FieldMeta::new("review_id", FieldType::Uuid).filterable(),
        FieldMeta::new("reason", FieldType::Text).searchable(),
        FieldMeta::new("issued_by", FieldType::Uuid).filterable(),
        FieldMeta::new("is_active", FieldType::Boolean).filterable(),
        FieldMeta::new("lifted_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("lifted_by", FieldType::Uuid).filterable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
    ],
};
