//! Domain model for the managed record type.
//!
//! # Responsibility
//! - Define the canonical record shape and its schema descriptor.
//! - Keep identity and lifecycle field semantics in one place.
//!
//! # Invariants
//! - Record ids are assigned by the store and never reused.
//! - Deletion is represented by a nullable tombstone timestamp, not a flag.

pub mod user;
