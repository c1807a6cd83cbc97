//! Record store abstractions and SQLite persistence implementation.
//!
//! # Responsibility
//! - Define the typed CRUD/soft-delete contract over the managed record.
//! - Isolate SQL details from callers; expose semantic errors.
//!
//! # Invariants
//! - Zero-row matches on update/delete paths return an affected count of 0,
//!   never an error; only single-record fetches report `NotFound`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod filter;
pub mod user_store;

pub type StoreResult<T> = Result<T, StoreError>;

/// Semantic error for record persistence and query operations.
#[derive(Debug)]
pub enum StoreError {
    /// Single-record fetch matched nothing.
    NotFound,
    /// A declared uniqueness/type constraint rejected a write.
    ConstraintViolation(String),
    /// Backend transport or transaction failure; propagated without retry.
    Unavailable(DbError),
    /// Malformed predicate: unknown or non-writable column.
    InvalidFilter(String),
    /// Persisted state failed validation on read.
    InvalidData(String),
    /// Connection readiness guard: required table is absent.
    MissingTable(&'static str),
    /// Connection readiness guard: required column is absent.
    MissingColumn {
        table: &'static str,
        column: String,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "record not found"),
            Self::ConstraintViolation(message) => {
                write!(f, "constraint violation: {message}")
            }
            Self::Unavailable(err) => write!(f, "store unavailable: {err}"),
            Self::InvalidFilter(message) => write!(f, "invalid filter: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted record data: {message}"),
            Self::MissingTable(table) => write!(f, "required table `{table}` is missing"),
            Self::MissingColumn { table, column } => {
                write!(f, "required column `{table}.{column}` is missing")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(failure, ref message) = value {
            if failure.code == rusqlite::ErrorCode::ConstraintViolation {
                return Self::ConstraintViolation(
                    message
                        .clone()
                        .unwrap_or_else(|| "constraint failed".to_string()),
                );
            }
        }
        Self::Unavailable(DbError::Sqlite(value))
    }
}
