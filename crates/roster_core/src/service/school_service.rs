//! School use-case service.
//!
//! # Responsibility
//! - Provide named entry points for the school domain (finders, schema
//!   setup, course/department/student links).
//! - Delegate every read and write to entity repositories and relation
//!   descriptors.
//!
//! # Invariants
//! - Service APIs never bypass repository lifecycle checks.
//! - Tables are created parents first and dropped join table first.

use crate::model::course::{Course, COURSE_DEPARTMENT, COURSE_STUDENTS};
use crate::model::department::{Department, DEPARTMENT_COURSES};
use crate::model::entity::{Entity, EntityId};
use crate::model::registration::Registration;
use crate::model::student::{Student, STUDENT_COURSES};
use crate::repo::entity_repo::{EntityRepository, RepoResult, SqliteEntityRepository};
use log::info;
use rusqlite::Connection;

/// Use-case service over one borrowed connection.
pub struct SchoolService<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SchoolService<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Repository for any school entity on this service's connection.
    pub fn repo<E: Entity>(&self) -> SqliteEntityRepository<'conn, E> {
        SqliteEntityRepository::new(self.conn)
    }

    /// Creates all four tables; safe to call repeatedly.
    pub fn create_schema(&self) -> RepoResult<()> {
        self.repo::<Department>().create_table()?;
        self.repo::<Course>().create_table()?;
        self.repo::<Student>().create_table()?;
        self.repo::<Registration>().create_table()?;
        info!("event=schema_create module=service status=ok tables=4");
        Ok(())
    }

    /// Drops all four tables; safe to call when they are absent.
    pub fn drop_schema(&self) -> RepoResult<()> {
        self.repo::<Registration>().drop_table()?;
        self.repo::<Student>().drop_table()?;
        self.repo::<Course>().drop_table()?;
        self.repo::<Department>().drop_table()?;
        info!("event=schema_drop module=service status=ok tables=4");
        Ok(())
    }

    /// Inserts or updates any school entity.
    pub fn save<E: Entity>(&self, entity: &mut E) -> RepoResult<EntityId> {
        self.repo::<E>().save(entity)
    }

    pub fn find_department_by_name(&self, name: &str) -> RepoResult<Option<Department>> {
        self.repo::<Department>().find_by("name", &name)
    }

    pub fn find_course_by_name(&self, name: &str) -> RepoResult<Option<Course>> {
        self.repo::<Course>().find_by("name", &name)
    }

    pub fn find_student_by_name(&self, name: &str) -> RepoResult<Option<Student>> {
        self.repo::<Student>().find_by("name", &name)
    }

    /// The course's department, memoized on the course after first lookup.
    pub fn course_department<'c>(&self, course: &'c Course) -> RepoResult<Option<&'c Department>> {
        COURSE_DEPARTMENT.get(self.conn, course)
    }

    /// Points `course` at `department` in memory; call `save` to persist.
    pub fn set_course_department(
        &self,
        course: &mut Course,
        department: &Department,
    ) -> RepoResult<()> {
        COURSE_DEPARTMENT.set(course, department)
    }

    pub fn department_courses(&self, department: &Department) -> RepoResult<Vec<Course>> {
        DEPARTMENT_COURSES.get(self.conn, department)
    }

    /// Moves `course` into `department` and persists both.
    pub fn add_course_to_department(
        &self,
        department: &mut Department,
        course: &mut Course,
    ) -> RepoResult<()> {
        DEPARTMENT_COURSES.add(self.conn, department, course)
    }

    pub fn course_students(&self, course: &Course) -> RepoResult<Vec<Student>> {
        COURSE_STUDENTS.get(self.conn, course)
    }

    /// Registers `student` for `course`; both must already be saved.
    pub fn add_student_to_course(
        &self,
        course: &Course,
        student: &Student,
    ) -> RepoResult<Registration> {
        COURSE_STUDENTS.add(self.conn, course, student)
    }

    pub fn student_courses(&self, student: &Student) -> RepoResult<Vec<Course>> {
        STUDENT_COURSES.get(self.conn, student)
    }

    /// Registers `student` for `course` from the student side.
    pub fn add_course_to_student(
        &self,
        student: &Student,
        course: &Course,
    ) -> RepoResult<Registration> {
        STUDENT_COURSES.add(self.conn, student, course)
    }

    /// Removes every registration of `student` for `course`.
    pub fn drop_student_from_course(&self, course: &Course, student: &Student) -> RepoResult<usize> {
        COURSE_STUDENTS.remove(self.conn, course, student)
    }
}
