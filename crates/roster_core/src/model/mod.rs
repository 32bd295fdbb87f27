//! School domain model and the persistence capability it implements.
//!
//! # Responsibility
//! - Declare each table's ordered columns once (`schema`).
//! - Define the entity/row-codec contract and belongs-to slots (`entity`).
//! - Provide the Student/Course/Department/Registration types and their
//!   relationship descriptors.
//!
//! # Invariants
//! - Entities start transient (`id = None`) and only repositories assign ids.
//! - Foreign keys live in `Reference` slots, never as loose integers.

pub mod course;
pub mod department;
pub mod entity;
pub mod registration;
pub mod schema;
pub mod student;
