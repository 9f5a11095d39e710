use serde::Serialize;

use crate::errors::{AppError, AppResult, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Uuid,
    Text,
    Integer,
    Boolean,
    Timestamp,
    Json,
}

impl FieldType {
    /// Postgres type a text bind parameter is cast to before it reaches the column.
    pub fn pg_cast(&self) -> &'static str {
        match self {
            FieldType::Uuid => "uuid",
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Timestamp => "timestamptz",
            FieldType::Json => "jsonb",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldMeta {
    pub name: &'static str,
    pub field_type: FieldType,
    pub searchable: bool,
    pub sortable: bool,
    pub filterable: bool,
    pub editable: bool,
}

impl FieldMeta {
    pub const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            searchable: false,
            sortable: false,
            filterable: false,
            editable: false,
        }
    }

    pub const fn searchable(mut self) -> Self {
        self.searchable = true;
        self
    }

    pub const fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub const fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    pub const fn editable(mut self) -> Self {
        self.editable = true;
        self
    }
}

/// Static description of one table exposed through [`super::RecordService`].
#[derive(Debug, Serialize)]
pub struct TableMeta {
    pub name: &'static str,
    pub primary_key: &'static str,
    pub default_sort: &'static str,
    pub fields: &'static [FieldMeta],
}

impl TableMeta {
    pub fn field(&self, name: &str) -> AppResult<&FieldMeta> {
        self.fields.iter().find(|f| f.name == name).ok_or_else(|| {
            AppError::with_details(
                ErrorCode::UnknownField,
                format!("table '{}' has no field '{name}'", self.name),
                serde_json::json!({ "table": self.name, "field": name }),
            )
        })
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    pub fn primary_key_field(&self) -> AppResult<&FieldMeta> {
        self.field(self.primary_key)
    }

    pub fn searchable_fields(&self) -> impl Iterator<Item = &FieldMeta> {
        self.fields.iter().filter(|f| f.searchable)
    }

    pub fn sortable(&self, name: &str) -> AppResult<&FieldMeta> {
        let field = self.field(name)?;
        if !field.sortable {
            return Err(self.ineligible(ErrorCode::FieldNotSortable, name, "sortable"));
        }
        Ok(field)
    }

    pub fn filterable(&self, name: &str) -> AppResult<&FieldMeta> {
        let field = self.field(name)?;
        if !field.filterable && name != self.primary_key {
            return Err(self.ineligible(ErrorCode::FieldNotFilterable, name, "filterable"));
        }
        Ok(field)
    }

    pub fn editable(&self, name: &str) -> AppResult<&FieldMeta> {
        let field = self.field(name)?;
        if !field.editable {
            return Err(self.ineligible(ErrorCode::FieldNotEditable, name, "editable"));
        }
        Ok(field)
    }

    fn ineligible(&self, code: ErrorCode, field: &str, what: &str) -> AppError {
        AppError::with_details(
            code,
            format!("field '{field}' of '{}' is not {what}", self.name),
            serde_json::json!({ "table": self.name, "field": field }),
        )
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub static WIDGETS: TableMeta = TableMeta {
        name: "widgets",
        primary_key: "id",
        default_sort: "created_at",
        fields: &[
            FieldMeta::new("id", FieldType::Uuid),
            FieldMeta::new("owner_id", FieldType::Uuid).filterable(),
            FieldMeta::new("title", FieldType::Text).searchable().sortable().editable(),
            FieldMeta::new("notes", FieldType::Text).searchable().editable(),
            FieldMeta::new("status", FieldType::Text).filterable().sortable().editable(),
            FieldMeta::new("quantity", FieldType::Integer).sortable().editable(),
            FieldMeta::new("hidden", FieldType::Boolean).filterable().editable(),
            FieldMeta::new("attributes", FieldType::Json).editable(),
            FieldMeta::new("created_at", FieldType::Timestamp).sortable(),
            FieldMeta::new("updated_at", FieldType::Timestamp),
        ],
    };

    pub static TAGS: TableMeta = TableMeta {
        name: "tags",
        primary_key: "id",
        default_sort: "label",
        fields: &[
            FieldMeta::new("id", FieldType::Uuid),
            FieldMeta::new("label", FieldType::Text).sortable(),
        ],
    };
}

#[cfg(test)]
mod tests {
    use super::fixtures::WIDGETS;
    use super::*;

    #[test]
    fn builder_flags() {
        let f = FieldMeta::new("title", FieldType::Text).searchable().editable();
        assert!(f.searchable && f.editable);
        assert!(!f.sortable && !f.filterable);
    }

    #[test]
    fn unknown_field_is_reported() {
        let err = WIDGETS.field("nope").unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::UnknownField));
    }

    #[test]
    fn eligibility_checks() {
        assert!(WIDGETS.sortable("title").is_ok());
        assert_eq!(WIDGETS.sortable("notes").unwrap_err().code(), Some(ErrorCode::FieldNotSortable));
        assert_eq!(WIDGETS.filterable("title").unwrap_err().code(), Some(ErrorCode::FieldNotFilterable));
        assert_eq!(WIDGETS.editable("created_at").unwrap_err().code(), Some(ErrorCode::FieldNotEditable));
    }

    #[test]
    fn primary_key_is_always_filterable() {
        assert!(WIDGETS.filterable("id").is_ok());
    }

    #[test]
    fn metadata_serializes_for_table_views() {
        let json = serde_json::to_value(&WIDGETS).unwrap();
        assert_eq!(json["name"], "widgets");
        assert_eq!(json["fields"][2]["name"], "title");
        assert_eq!(json["fields"][2]["field_type"], "text");
        assert_eq!(json["fields"][2]["searchable"], true);
    }
}
