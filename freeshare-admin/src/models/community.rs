use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::schema::{broadcasts, community_events, devices, notifications};

// --- Community event ---

#[derive(Debug, Queryable, QueryableByName, Serialize, Clone)]
#[diesel(table_name = community_events)]
pub struct CommunityEvent {
    pub id: Uuid,
    pub organizer_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for CommunityEvent {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static COMMUNITY_EVENTS: TableMeta = TableMeta {
    name: "community_events",
    primary_key: "id",
    default_sort: "starts_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("organizer_id", FieldType::Uuid).filterable(),
        FieldMeta::new("title", FieldType::Text).searchable().sortable().editable(),
        FieldMeta::new("description", FieldType::Text).searchable().editable(),
        FieldMeta::new("location", FieldType::Text).searchable().editable(),
        FieldMeta::new("starts_at", FieldType::Timestamp).sortable().editable(),
        FieldMeta::new("ends_at", FieldType::Timestamp).sortable().editable(),
        FieldMeta::new("status", FieldType::Text).filterable().sortable().editable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("updated_at", FieldType::Timestamp),
    ],
};

// --- Device ---

#[derive(Debug, Queryable, QueryableByName, Serialize, Clone)]
#[diesel(table_name = devices)]
pub struct Device {
    pub id: Uuid,
    pub user_id: Uuid,
    pub platform: String,
    #[serde(skip_serializing)]
    pub push_token: String,
    pub app_version: Option<String>,
    pub last_seen_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Record for Device {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static DEVICES: TableMeta = TableMeta {
    name: "devices",
    primary_key: "id",
    default_sort: "last_seen_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("user_id", FieldType::Uuid).filterable(),
        FieldMeta::new("platform", FieldType::Text).filterable().sortable(),
        FieldMeta::new("push_token", FieldType::Text),
        FieldMeta::new("app_version", FieldType::Text).filterable().sortable(),
        FieldMeta::new("last_seen_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
    ],
};

// --- Notification ---

#[derive(Debug, Queryable, QueryableByName, Serialize, Clone)]
#[diesel(table_name = notifications)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = notifications)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub notification_type: String,
    pub title: String,
    pub body: String,
    pub data: Option<serde_json::Value>,
}

impl Record for Notification {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static NOTIFICATIONS: TableMeta = TableMeta {
    name: "notifications",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("user_id", FieldType::Uuid).filterable(),
        FieldMeta::new("notification_type", FieldType::Text).filterable().sortable(),
        FieldMeta::new("title", FieldType::Text).searchable(),
        FieldMeta::new("body", FieldType::Text).searchable(),
        FieldMeta::new("data", FieldType::Json),
        FieldMeta::new("is_read", FieldType::Boolean).filterable().editable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
    ],
};

// --- Broadcast ---

pub mod broadcast_status {
    pub const DRAFT: &str = "draft";
    pub const SENT: &str = "sent";
}

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = broadcasts)]
pub struct Broadcast {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub audience: String,
    pub status: String,
    pub created_by: Uuid,
    pub recipient_count: i32,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = broadcasts)]
pub struct NewBroadcast {
    pub title: String,
    pub body: String,
    pub audience: String,
    pub created_by: Uuid,
}

impl Record for Broadcast {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static BROADCASTS: TableMeta = TableMeta {
    name: "broadcasts",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("title", FieldType::Text).searchable().sortable(),
        FieldMeta::new("body", FieldType::Text).searchable(),
        FieldMeta::new("audience", FieldType::Text).filterable(),
        FieldMeta::new("status", FieldType::Text).filterable().sortable(),
        FieldMeta::new("created_by", FieldType::Uuid).filterable(),
        FieldMeta::new("recipient_count", FieldType::Integer).sortable(),
        FieldMeta::new("sent_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("updated_at", FieldType::Timestamp),
    ],
};
