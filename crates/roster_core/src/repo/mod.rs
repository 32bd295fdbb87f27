//! Repository layer: CRUD engine and relationship resolver.
//!
//! # Responsibility
//! - Translate entity state into parameterized SQL and back.
//! - Compose repository calls into association reads and writes.
//!
//! # Invariants
//! - Repositories borrow the caller's connection; they never open one.
//! - Engine errors propagate unchanged; nothing is retried.

pub mod entity_repo;
pub mod relation;
