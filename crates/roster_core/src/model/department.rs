//! Department entity: owner side of the course belongs-to link.

use crate::model::course::{Course, COURSE_DEPARTMENT};
use crate::model::entity::{Entity, EntityId};
use crate::model::schema::{Column, RowCursor, TableSchema};
use crate::repo::relation::HasMany;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

/// Courses whose `department_id` points at a department.
pub const DEPARTMENT_COURSES: HasMany<Department, Course> = HasMany::new(COURSE_DEPARTMENT);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    pub id: Option<EntityId>,
    pub name: String,
}

impl Department {
    /// Creates a transient department.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl Entity for Department {
    const SCHEMA: TableSchema = TableSchema {
        table: "departments",
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
