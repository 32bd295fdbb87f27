//! Registration join entity linking one course to one student.
//!
//! Rows carry no attributes beyond the two foreign keys; the table exists to
//! back the course <-> student has-many-through relation.

use crate::model::course::Course;
use crate::model::entity::{Entity, EntityId, InvalidState, Reference};
use crate::model::schema::{Column, RowCursor, TableSchema};
use crate::model::student::Student;
use crate::repo::relation::BelongsTo;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// `registrations.course_id -> courses.id`.
pub const REGISTRATION_COURSE: BelongsTo<Registration, Course> =
    BelongsTo::new("course_id", course_slot, course_slot_mut);

/// `registrations.student_id -> students.id`.
pub const REGISTRATION_STUDENT: BelongsTo<Registration, Student> =
    BelongsTo::new("student_id", student_slot, student_slot_mut);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: Option<EntityId>,
    #[serde(rename = "course_id")]
    pub course: Reference<Course>,
    #[serde(rename = "student_id")]
    pub student: Reference<Student>,
}

impl Registration {
    /// Builds a transient registration for two persisted participants.
    ///
    /// # Errors
    /// - `InvalidState` when either participant has no id.
    pub fn link(course: &Course, student: &Student) -> Result<Self, InvalidState> {
        let mut registration = Self::default();
        registration.course.set(course)?;
        registration.student.set(student)?;
        Ok(registration)
    }
}

impl Entity for Registration {
    const SCHEMA: TableSchema = TableSchema {
        table: "registrations",
        attributes: &[Column::integer("course_id"), Column::integer("student_id")],
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
            course: Reference::from_key(cursor.read()?),
            student: Reference::from_key(cursor.read()?),
        })
    }

    fn attribute_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.course.key()),
            Value::from(self.student.key()),
        ]
    }
}

fn course_slot(registration: &Registration) -> &Reference<Course> {
    &registration.course
}

fn course_slot_mut(registration: &mut Registration) -> &mut Reference<Course> {
    &mut registration.course
}

fn student_slot(registration: &Registration) -> &Reference<Student> {
    &registration.student
}

fn student_slot_mut(registration: &mut Registration) -> &mut Reference<Student> {
    &mut registration.student
}
