//! Generic typed record access.
//!
//! Every admin table is described by a static [`TableMeta`]: the table name
//! and per-field flags saying which columns may be searched, sorted,
//! filtered or edited. [`RecordService`] turns that description into
//! parameterized SQL, runs it through diesel and publishes every write to a
//! [`ChangeFeed`] so detail views can follow a single row in real time.
//!
//! Only field names taken from the metadata are ever interpolated into SQL;
//! all values travel as bind parameters.

mod feed;
mod meta;
mod query;
mod service;

pub use feed::{ChangeFeed, ChangeKind, RowChange, RowEvent, RowSubscription};
pub use meta::{FieldMeta, FieldType, TableMeta};
pub use query::{bind_value, Changes, ListQuery, SortOrder, SqlStatement, StatusGuard};
pub use service::{Record, RecordService};
