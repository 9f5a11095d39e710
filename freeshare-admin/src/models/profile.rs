use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::schema::profiles;

pub mod profile_status {
    pub const ACTIVE: &str = "active";
    pub const SUSPENDED: &str = "suspended";
    pub const BANNED: &str = "banned";
}

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = profiles)]
pub struct Profile {
    pub id: Uuid,
    pub display_name: String,
    pub email: Option<String>,
    pub avatar_path: Option<String>,
    pub neighborhood: Option<String>,
    pub role: String,
    pub status: String,
    pub suspended_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Profile {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static PROFILES: TableMeta = TableMeta {
    name: "profiles",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("display_name", FieldType::Text).searchable().sortable().editable(),
        FieldMeta::new("email", FieldType::Text).searchable(),
        FieldMeta::new("avatar_path", FieldType::Text).editable(),
        FieldMeta::new("neighborhood", FieldType::Text).searchable().filterable().sortable().editable(),
        FieldMeta::new("role", FieldType::Text).filterable(),
        FieldMeta::new("status", FieldType::Text).filterable().sortable(),
        FieldMeta::new("suspended_until", FieldType::Timestamp).sortable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("updated_at", FieldType::Timestamp).sortable(),
    ],
};
