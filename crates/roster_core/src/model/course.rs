//! Course entity.
//!
//! # Invariants
//! - `department` is the only place the `department_id` foreign key lives;
//!   the column value and the memoized department change together.
//! - `department_id` is nullable: a course may exist without a department.

use crate::model::department::Department;
use crate::model::entity::{Entity, EntityId, Reference};
use crate::model::registration::{Registration, REGISTRATION_COURSE, REGISTRATION_STUDENT};
use crate::model::schema::{Column, RowCursor, TableSchema};
use crate::model::student::Student;
use crate::repo::relation::{BelongsTo, HasMany, HasManyThrough};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// `courses.department_id -> departments.id`.
pub const COURSE_DEPARTMENT: BelongsTo<Course, Department> =
    BelongsTo::new("department_id", department_slot, department_slot_mut);

/// Registrations naming a course.
pub const COURSE_REGISTRATIONS: HasMany<Course, Registration> = HasMany::new(REGISTRATION_COURSE);

/// Students registered for a course, through `registrations`.
pub const COURSE_STUDENTS: HasManyThrough<Course, Registration, Student> =
    HasManyThrough::new(COURSE_REGISTRATIONS, REGISTRATION_STUDENT);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Option<EntityId>,
    pub name: String,
    /// Serialized as the bare `department_id` key.
    #[serde(rename = "department_id")]
    pub department: Reference<Department>,
}

impl Course {
    /// Creates a transient course without a department.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            department: Reference::empty(),
        }
    }

    pub fn department_id(&self) -> Option<EntityId> {
        self.department.key()
    }
}

impl Entity for Course {
    const SCHEMA: TableSchema = TableSchema {
        table: "courses",
        attributes: &[Column::text("name"), Column::integer("department_id")],
    };

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn from_row(cursor: &mut RowCursor<'_, '_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: cursor.read()?,
            name: cursor.read()?,
            department: Reference::from_key(cursor.read()?),
        })
    }

    fn attribute_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.name.clone()),
            Value::from(self.department.key()),
        ]
    }
}

fn department_slot(course: &Course) -> &Reference<Department> {
    &course.department
}

fn department_slot_mut(course: &mut Course) -> &mut Reference<Department> {
    &mut course.department
}
