//! Typed record-access layer for the roster database.
//! This crate is the single source of truth for record lifecycle invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod store;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::user::{RecordId, User, UserPatch, USER_SCHEMA};
pub use store::filter::{FieldValue, Filter};
pub use store::user_store::{SqliteUserStore, UserStore};
pub use store::{StoreError, StoreResult};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
