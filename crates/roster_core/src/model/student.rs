//! Student entity.

use crate::model::course::Course;
use crate::model::entity::{Entity, EntityId};
use crate::model::registration::{Registration, REGISTRATION_COURSE, REGISTRATION_STUDENT};
use crate::model::schema::{Column, RowCursor, TableSchema};
use crate::repo::relation::{HasMany, HasManyThrough};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Registrations naming a student.
pub const STUDENT_REGISTRATIONS: HasMany<Student, Registration> =
    HasMany::new(REGISTRATION_STUDENT);

/// Courses a student is registered for, through `registrations`.
pub const STUDENT_COURSES: HasManyThrough<Student, Registration, Course> =
    HasManyThrough::new(STUDENT_REGISTRATIONS, REGISTRATION_COURSE);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Student {
    /// Creates a transient student.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Entity for Student {
    const SCHEMA: TableSchema = TableSchema {
        table: "students",
        attributes: &[Column::text("name")],
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
        })
    }

    fn attribute_values(&self) -> Vec<Value> {
        vec![Value::from(self.name.clone())]
    }
}
