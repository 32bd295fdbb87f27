use roster_core::db::open_db_in_memory;
use roster_core::{
    Course, Department, Entity, EntityRepository, Lifecycle, RepoError, SchoolService,
    SqliteEntityRepository, Student, COURSE_DEPARTMENT, COURSE_REGISTRATIONS, DEPARTMENT_COURSES,
};
use rusqlite::Connection;

fn setup() -> Connection {
    let conn = open_db_in_memory().unwrap();
    SchoolService::new(&conn).create_schema().unwrap();
    conn
}

fn saved<E: Entity>(conn: &Connection, mut entity: E) -> E {
    SqliteEntityRepository::<E>::new(conn).save(&mut entity).unwrap();
    entity
}

fn sorted_names(students: &[Student]) -> Vec<String> {
    let mut names: Vec<String> = students.iter().map(|s| s.name.clone()).collect();
    names.sort();
    names
}

#[test]
fn belongs_to_setter_updates_key_and_cache_without_lookup() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let math = saved(&conn, Department::new("Math"));

    let mut course = Course::new("Algebra");
    service.set_course_department(&mut course, &math).unwrap();
    assert_eq!(course.department_id(), math.id);

    // The department table is gone, so only the memo can answer.
    SqliteEntityRepository::<Department>::new(&conn)
        .drop_table()
        .unwrap();
    let department = service.course_department(&course).unwrap().unwrap();
    assert_eq!(department, &math);
}

#[test]
fn belongs_to_getter_memoizes_first_lookup() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let math = saved(&conn, Department::new("Math"));
    let mut course = Course::new("Algebra");
    service.set_course_department(&mut course, &math).unwrap();
    service.save(&mut course).unwrap();

    let fresh = service.find_course_by_name("Algebra").unwrap().unwrap();
    assert!(fresh.department.cached().is_none());
    let first = service.course_department(&fresh).unwrap().unwrap().clone();
    assert_eq!(first, math);

    conn.execute("UPDATE departments SET name = 'Renamed';", [])
        .unwrap();
    let second = service.course_department(&fresh).unwrap().unwrap();
    assert_eq!(second.name, "Math");

    let refetched = service.find_course_by_name("Algebra").unwrap().unwrap();
    let reloaded = service.course_department(&refetched).unwrap().unwrap();
    assert_eq!(reloaded.name, "Renamed");
    assert_eq!(reloaded.id, math.id);
}

#[test]
fn belongs_to_getter_returns_none_for_missing_or_dangling_key() {
    let conn = setup();
    let service = SchoolService::new(&conn);

    let orphan = Course::new("Orphan");
    assert!(service.course_department(&orphan).unwrap().is_none());

    let mut dangling = Course::new("Dangling");
    dangling.department.set_key(Some(999));
    assert!(service.course_department(&dangling).unwrap().is_none());
}

#[test]
fn belongs_to_setter_rejects_transient_target() {
    let mut course = Course::new("Algebra");

    let err = COURSE_DEPARTMENT
        .set(&mut course, &Department::new("Unsaved"))
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidState(_)));
    assert_eq!(course.department_id(), None);
}

#[test]
fn belongs_to_clear_unlinks_on_next_save() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let math = saved(&conn, Department::new("Math"));
    let mut course = Course::new("Algebra");
    service.set_course_department(&mut course, &math).unwrap();
    service.save(&mut course).unwrap();

    COURSE_DEPARTMENT.clear(&mut course);
    service.save(&mut course).unwrap();

    let reloaded = service.find_course_by_name("Algebra").unwrap().unwrap();
    assert_eq!(COURSE_DEPARTMENT.key(&reloaded), None);
    assert!(service.department_courses(&math).unwrap().is_empty());
}

#[test]
fn has_many_returns_only_matching_children() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let math = saved(&conn, Department::new("Math"));
    let art = saved(&conn, Department::new("Art"));

    for (name, department) in [("Algebra", &math), ("Geometry", &math), ("Painting", &art)] {
        let mut course = Course::new(name);
        service.set_course_department(&mut course, department).unwrap();
        service.save(&mut course).unwrap();
    }

    let mut names: Vec<String> = service
        .department_courses(&math)
        .unwrap()
        .into_iter()
        .map(|course| course.name)
        .collect();
    names.sort();
    assert_eq!(names, ["Algebra", "Geometry"]);
    assert_eq!(DEPARTMENT_COURSES.foreign_key(), "department_id");
}

#[test]
fn has_many_of_transient_owner_is_empty() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    saved(&conn, Course::new("Unlinked"));

    assert!(service
        .department_courses(&Department::new("Draft"))
        .unwrap()
        .is_empty());
}

#[test]
fn add_child_persists_transient_owner_and_child() {
    let conn = setup();
    let service = SchoolService::new(&conn);

    let mut physics = Department::new("Physics");
    let mut mechanics = Course::new("Mechanics");
    service
        .add_course_to_department(&mut physics, &mut mechanics)
        .unwrap();

    assert!(physics.is_persisted());
    assert!(mechanics.is_persisted());
    assert_eq!(mechanics.department_id(), physics.id);

    let courses = service.department_courses(&physics).unwrap();
    assert_eq!(courses, vec![mechanics.clone()]);
    assert_eq!(
        service.course_department(&mechanics).unwrap().unwrap().name,
        "Physics"
    );
}

#[test]
fn add_child_moves_persisted_child_and_saves_owner_changes() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let math = saved(&conn, Department::new("Math"));
    let mut art = saved(&conn, Department::new("Art"));

    let mut course = Course::new("Geometry");
    service.set_course_department(&mut course, &math).unwrap();
    let course_id = service.save(&mut course).unwrap();

    art.name = "Fine Art".to_string();
    service.add_course_to_department(&mut art, &mut course).unwrap();

    assert_eq!(course.id, Some(course_id));
    assert!(service.department_courses(&math).unwrap().is_empty());
    assert_eq!(service.department_courses(&art).unwrap().len(), 1);
    assert!(service.find_department_by_name("Fine Art").unwrap().is_some());
}

#[test]
fn has_many_through_returns_exactly_linked_targets() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let algebra = saved(&conn, Course::new("Algebra"));
    let poetry = saved(&conn, Course::new("Poetry"));
    let ada = saved(&conn, Student::new("Ada"));
    let bob = saved(&conn, Student::new("Bob"));
    let dora = saved(&conn, Student::new("Dora"));

    service.add_student_to_course(&algebra, &ada).unwrap();
    service.add_student_to_course(&algebra, &bob).unwrap();
    service.add_student_to_course(&poetry, &dora).unwrap();

    let students = service.course_students(&algebra).unwrap();
    assert_eq!(sorted_names(&students), ["Ada", "Bob"]);
    assert_eq!(sorted_names(&service.course_students(&poetry).unwrap()), ["Dora"]);
}

#[test]
fn has_many_through_keeps_duplicate_registrations() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let algebra = saved(&conn, Course::new("Algebra"));
    let ada = saved(&conn, Student::new("Ada"));

    service.add_student_to_course(&algebra, &ada).unwrap();
    service.add_course_to_student(&ada, &algebra).unwrap();

    assert_eq!(service.course_students(&algebra).unwrap().len(), 2);
    assert_eq!(COURSE_REGISTRATIONS.get(&conn, &algebra).unwrap().len(), 2);
    assert_eq!(service.drop_student_from_course(&algebra, &ada).unwrap(), 2);
    assert!(service.course_students(&algebra).unwrap().is_empty());
}

#[test]
fn has_many_through_works_from_student_side() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let algebra = saved(&conn, Course::new("Algebra"));
    let poetry = saved(&conn, Course::new("Poetry"));
    saved(&conn, Course::new("Chemistry"));
    let ada = saved(&conn, Student::new("Ada"));

    let registration = service.add_course_to_student(&ada, &algebra).unwrap();
    service.add_course_to_student(&ada, &poetry).unwrap();

    assert!(registration.is_persisted());
    assert_eq!(registration.course.key(), algebra.id);
    assert_eq!(registration.student.key(), ada.id);

    let mut names: Vec<String> = service
        .student_courses(&ada)
        .unwrap()
        .into_iter()
        .map(|course| course.name)
        .collect();
    names.sort();
    assert_eq!(names, ["Algebra", "Poetry"]);
}

#[test]
fn add_association_rejects_transient_participants() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    let algebra = saved(&conn, Course::new("Algebra"));
    let ghost = Student::new("Ghost");

    let err = service.add_student_to_course(&algebra, &ghost).unwrap_err();
    match err {
        RepoError::InvalidState(state) => {
            assert_eq!(state.table, "students");
            assert_eq!(state.found, Lifecycle::Transient);
        }
        other => panic!("unexpected error: {other}"),
    }

    let draft = Course::new("Draft");
    let ada = saved(&conn, Student::new("Ada"));
    assert!(service.add_student_to_course(&draft, &ada).is_err());
    assert_eq!(
        service.repo::<roster_core::Registration>().count().unwrap(),
        0
    );
}

#[test]
fn has_many_through_of_transient_owner_is_empty() {
    let conn = setup();
    let service = SchoolService::new(&conn);
    assert!(service
        .course_students(&Course::new("Draft"))
        .unwrap()
        .is_empty());
}
