//! User record model and schema descriptor.
//!
//! # Responsibility
//! - Define the managed entity and its partial-update representation.
//! - Declare the ordered, typed attribute list the store builds SQL from.
//!
//! # Invariants
//! - `id` is `None` until the store persists the record; callers never pick
//!   ids.
//! - `deleted_at` is set at most once; there is no restore path.

use crate::db::schema::{ColumnDef, ColumnType, TableSchema};
use serde::{Deserialize, Serialize};

/// Store-assigned primary key. Strictly increasing, never reused.
pub type RecordId = i64;

/// Schema descriptor for the `users` table.
///
/// Ordered domain attributes only; the store and bootstrap layer add the
/// system columns (`id`, `created_at`, `updated_at`, `deleted_at`).
pub const USER_SCHEMA: TableSchema = TableSchema {
    table: "users",
    columns: &[
        ColumnDef {
            name: "name",
            ty: ColumnType::Text,
            unique: true,
        },
        ColumnDef {
            name: "age",
            ty: ColumnType::Integer,
            unique: false,
        },
        ColumnDef {
            name: "is_active",
            ty: ColumnType::Boolean,
            unique: false,
        },
    ],
};

/// The managed record.
///
/// Timestamps are epoch milliseconds. A freshly constructed record carries
/// `id = None` and zeroed timestamps; the persisted values come back on the
/// stored copy returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identity; `None` until persisted.
    pub id: Option<RecordId>,
    /// Unique display name.
    pub name: String,
    pub age: i64,
    pub is_active: bool,
    /// Set once at insert time.
    pub created_at: i64,
    /// Refreshed on every successful mutation.
    pub updated_at: i64,
    /// Soft-delete tombstone; `Some` means logically removed.
    pub deleted_at: Option<i64>,
}

impl User {
    /// Creates an unpersisted record with the given domain attributes.
    pub fn new(name: impl Into<String>, age: i64, is_active: bool) -> Self {
        Self {
            id: None,
            name: name.into(),
            age,
            is_active,
            created_at: 0,
            updated_at: 0,
            deleted_at: None,
        }
    }

    /// Returns whether this record is soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Partial-record representation for multi-column updates.
///
/// Fields default to their zero values (`""`, `0`, `false`). A zero value is
/// indistinguishable from "not set", so zero-valued fields are skipped by
/// default; callers must name them in `explicit_columns` to write them (see
/// `UserStore::update_columns`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    pub name: String,
    pub age: i64,
    pub is_active: bool,
}
