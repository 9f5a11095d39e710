use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::schema::{admin_actions, reports};

// --- Report ---

pub mod report_status {
    pub const PENDING: &str = "pending";
    /// Counted towards a review that is now open.
    pub const LINKED: &str = "linked";
    pub const CLOSED: &str = "closed";
}

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub subject_type: String,
    pub subject_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
    pub status: String,
    pub review_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub subject_type: String,
    pub subject_id: Uuid,
    pub reason: String,
    pub details: Option<String>,
}

impl Record for Report {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static REPORTS: TableMeta = TableMeta {
    name: "reports",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("reporter_id", FieldType::Uuid).filterable(),
        FieldMeta::new("subject_type", FieldType::Text).filterable(),
        FieldMeta::new("subject_id", FieldType::Uuid).filterable(),
        FieldMeta::new("reason", FieldType::Text).filterable().sortable(),
        FieldMeta::new("details", FieldType::Text).searchable(),
        FieldMeta::new("status", FieldType::Text).filterable().sortable(),
        FieldMeta::new("review_id", FieldType::Uuid).filterable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
    ],
};

// --- AdminAction ---

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = admin_actions)]
pub struct AdminAction {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = admin_actions)]
pub struct NewAdminAction {
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}
