use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use freeshare_shared::errors::AppError;
use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::schema::items;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Available,
    Reserved,
    GivenAway,
    /// Taken out of listings pending a review.
    Hidden,
    Removed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Available => "available",
            ItemStatus::Reserved => "reserved",
            ItemStatus::GivenAway => "given_away",
            ItemStatus::Hidden => "hidden",
            ItemStatus::Removed => "removed",
        }
    }
}

impl std::str::FromStr for ItemStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(ItemStatus::Available),
            "reserved" => Ok(ItemStatus::Reserved),
            "given_away" => Ok(ItemStatus::GivenAway),
            "hidden" => Ok(ItemStatus::Hidden),
            "removed" => Ok(ItemStatus::Removed),
            _ => Err(AppError::internal(format!("unknown item status '{s}'"))),
        }
    }
}

#[derive(Debug, Queryable, QueryableByName, Identifiable, Serialize, Clone)]
#[diesel(table_name = items)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub condition: Option<String>,
    pub status: String,
    pub image_path: Option<String>,
    pub pickup_area: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Item {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

pub static ITEMS: TableMeta = TableMeta {
    name: "items",
    primary_key: "id",
    default_sort: "created_at",
    fields: &[
        FieldMeta::new("id", FieldType::Uuid),
        FieldMeta::new("owner_id", FieldType::Uuid).filterable(),
        FieldMeta::new("title", FieldType::Text).searchable().sortable().editable(),
        FieldMeta::new("description", FieldType::Text).searchable().editable(),
        FieldMeta::new("category", FieldType::Text).filterable().sortable().editable(),
        FieldMeta::new("condition", FieldType::Text).filterable().editable(),
        FieldMeta::new("status", FieldType::Text).filterable().sortable(),
        FieldMeta::new("image_path", FieldType::Text),
        FieldMeta::new("pickup_area", FieldType::Text).searchable().filterable().editable(),
        FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
        FieldMeta::new("updated_at", FieldType::Timestamp).sortable(),
    ],
};
