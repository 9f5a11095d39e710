use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use freeshare_shared::errors::{AppError, AppResult};
use freeshare_shared::records::{FieldMeta, FieldType, Record, TableMeta};

use crate::decision::OutcomeAction;
use crate::lifecycle::{ReviewSnapshot, ReviewStatus};
use crate::schema::item_reviews;

/// What a review, report or flag is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectType {
    Item,
    User,
}

impl SubjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectType::Item => "item",
            SubjectType::User => "user",
        }
    }

    pub fn review_table(&self) -> &'static TableMeta {
        match self {
            SubjectType::Item => &ITEM_REVIEWS,
            SubjectType::User => &USER_REVIEWS,
        }
    }
}

impl std::fmt::Display for SubjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SubjectType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "item" => Ok(SubjectType::Item),
            "user" => Ok(SubjectType::User),
            _ => Err(AppError::Validation(format!("unknown subject type '{s}'"))),
        }
    }
}

/// A row of `item_reviews` or `user_reviews`; both tables share this layout
/// and `subject_id` points at the item or the profile respectively.
#[derive(Debug, Queryable, QueryableByName, Serialize, Clone)]
#[diesel(table_name = item_reviews)]
pub struct Review {
    pub id: Uuid,
    pub subject_id: Uuid,
    pub status: String,
    pub trigger_type: String,
    pub trigger_data: Option<serde_json::Value>,
    pub reviewer_id: Option<Uuid>,
    pub review_outcome: Option<String>,
    pub review_outcome_action: Option<String>,
    pub review_reason: Option<String>,
    pub review_comments: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub appealable: bool,
    pub appeal_deadline: Option<DateTime<Utc>>,
    pub appealed_by: Option<Uuid>,
    pub appeal_reason: Option<String>,
    pub appealed_at: Option<DateTime<Utc>>,
    pub appeal_reviewer_id: Option<Uuid>,
    pub appeal_review_outcome: Option<String>,
    pub appeal_review_outcome_action: Option<String>,
    pub appeal_review_comments: Option<String>,
    pub appeal_reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Review {
    fn record_id(&self) -> Uuid {
        self.id
    }
}

impl Review {
    pub fn status(&self) -> AppResult<ReviewStatus> {
        self.status.parse()
    }

    pub fn snapshot(&self) -> AppResult<ReviewSnapshot> {
        Ok(ReviewSnapshot {
            status: self.status()?,
            reviewer_id: self.reviewer_id,
            appeal_reviewer_id: self.appeal_reviewer_id,
            appealable: self.appealable,
            appeal_deadline: self.appeal_deadline,
        })
    }

    /// Action taken when the review itself was decided.
    pub fn original_action(&self) -> AppResult<OutcomeAction> {
        self.review_outcome_action.as_deref().unwrap_or("none").parse()
    }
}

const REVIEW_FIELDS: &[FieldMeta] = &[
    FieldMeta::new("id", FieldType::Uuid),
    FieldMeta::new("subject_id", FieldType::Uuid).filterable(),
    FieldMeta::new("status", FieldType::Text).filterable().sortable(),
    FieldMeta::new("trigger_type", FieldType::Text).filterable(),
    FieldMeta::new("trigger_data", FieldType::Json),
    FieldMeta::new("reviewer_id", FieldType::Uuid).filterable(),
    FieldMeta::new("review_outcome", FieldType::Text).filterable(),
    FieldMeta::new("review_outcome_action", FieldType::Text).filterable(),
    FieldMeta::new("review_reason", FieldType::Text).searchable(),
    FieldMeta::new("review_comments", FieldType::Text).searchable().editable(),
    FieldMeta::new("reviewed_at", FieldType::Timestamp).sortable(),
    FieldMeta::new("appealable", FieldType::Boolean).filterable(),
    FieldMeta::new("appeal_deadline", FieldType::Timestamp).sortable(),
    FieldMeta::new("appealed_by", FieldType::Uuid).filterable(),
    FieldMeta::new("appeal_reason", FieldType::Text).searchable(),
    FieldMeta::new("appealed_at", FieldType::Timestamp).sortable(),
    FieldMeta::new("appeal_reviewer_id", FieldType::Uuid).filterable(),
    FieldMeta::new("appeal_review_outcome", FieldType::Text).filterable(),
    FieldMeta::new("appeal_review_outcome_action", FieldType::Text).filterable(),
    FieldMeta::new("appeal_review_comments", FieldType::Text).searchable().editable(),
    FieldMeta::new("appeal_reviewed_at", FieldType::Timestamp).sortable(),
    FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
    FieldMeta::new("updated_at", FieldType::Timestamp).sortable(),
];

pub static ITEM_REVIEWS: TableMeta = TableMeta {
    name: "item_reviews",
    primary_key: "id",
    default_sort: "created_at",
    fields: REVIEW_FIELDS,
};

pub static USER_REVIEWS: TableMeta = TableMeta {
    name: "user_reviews",
    primary_key: "id",
    default_sort: "created_at",
    fields: REVIEW_FIELDS,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subject_type_picks_review_table() {
        assert_eq!(SubjectType::Item.review_table().name, "item_reviews");
        assert_eq!(SubjectType::User.review_table().name, "user_reviews");
        assert_eq!("user".parse::<SubjectType>().unwrap(), SubjectType::User);
        assert!("group".parse::<SubjectType>().is_err());
    }

    #[test]
    fn workflow_columns_are_not_editable() {
        for name in ["status", "reviewer_id", "review_outcome", "appealable", "appeal_deadline"] {
            assert!(ITEM_REVIEWS.editable(name).is_err(), "{name} should not be editable");
        }
        assert!(USER_REVIEWS.editable("review_comments").is_ok());
    }
}
