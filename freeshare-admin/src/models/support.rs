use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::schema::{support_requests, support_sla_configs};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportStatus {
    Open,
    InProgress,
    WaitingOnUser,
    Resolved,
    Closed,
}

impl SupportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportStatus::Open => "open",
            SupportStatus::InProgress => "in_progress",
            SupportStatus::WaitingOnUser => "waiting_on_user",
            SupportStatus::Resolved => "resolved",
            SupportStatus::Closed => "closed",
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, SupportStatus::Resolved | SupportStatus::Closed)
    }

    /// Statuses counted as still needing work.
    pub const OPEN: [&'static str; 3] = ["open", "in_progress", "waiting_on_user"];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportPriority {
    Low,
    Normal,
    High,
    Urgent,
}

impl SupportPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupportPriority::Low => "low",
            SupportPriority::Normal => "normal",
            SupportPriority::High => "high",
            SupportPriority::Urgent => "urgent",
        }
    }
}

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = support_requests)]
pub struct SupportRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub category: String,
    pub priority: String,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub first_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = support_requests)]
pub struct NewSupportRequest {
    pub user_id: Uuid,
    pub category: String,
    pub priority: String,
    pub subject: String,
    pub body: String,
}

impl Record for SupportRequest {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static SUPPORT_REQUESTS: TableMeta = TableMeta {
    name: "support_requests",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("user_id", FieldType::Uuid).filterable(),
        FieldMeta::new("category", FieldType::Text).filterable().sortable().editable(),
        FieldMeta::new("priority", FieldType::Text).filterable().sortable().editable(),
        FieldMeta::new("subject", FieldType::Text).searchable().sortable(),
        FieldMeta::new("body", FieldType::Text).searchable(),
        FieldMeta::new("status", FieldType::Text).filterable().sortable(),
        FieldMeta::new("assigned_to", FieldType::Uuid).filterable(),
        FieldMeta::new("first_response_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("resolved_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("updated_at", FieldType::Timestamp).sortable(),
    ],
};

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = support_sla_configs)]
pub struct SupportSlaConfig {
    pub id: Uuid,
    pub category: String,
    pub priority: String,
    pub response_time_hours: i32,
    pub resolution_time_hours: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for SupportSlaConfig {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static SUPPORT_SLA_CONFIGS: TableMeta = TableMeta {
    name: "support_sla_configs",
    primary_key: "id",
    default_sort: "category",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("category", FieldType::Text).filterable().sortable(),
        FieldMeta::new("priority", FieldType::Text).filterable().sortable(),
        FieldMeta::new("response_time_hours", FieldType::Integer).sortable().editable(),
        FieldMeta::new("resolution_time_hours", FieldType::Integer).sortable().editable(),
        FieldMeta::new("is_active", FieldType::Boolean).filterable().editable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("updated_at", FieldType::Timestamp),
    ],
};
