//! Core persistence logic for the roster school mapper.
//! Entities, their ordered schemas, the generic SQLite repository and the
//! relationship resolver live here.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig};
pub use model::course::{Course, COURSE_DEPARTMENT, COURSE_REGISTRATIONS, COURSE_STUDENTS};
pub use model::department::{Department, DEPARTMENT_COURSES};
pub use model::entity::{Entity, EntityId, InvalidState, Lifecycle, Reference};
pub use model::registration::{Registration, REGISTRATION_COURSE, REGISTRATION_STUDENT};
pub use model::schema::{Column, ColumnType, RowCursor, TableSchema};
pub use model::student::{Student, STUDENT_COURSES, STUDENT_REGISTRATIONS};
pub use repo::entity_repo::{EntityRepository, RepoError, RepoResult, SqliteEntityRepository};
pub use repo::relation::{BelongsTo, HasMany, HasManyThrough};
pub use service::school_service::SchoolService;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
