use roster_core::db::open_db_in_memory;
use roster_core::{Course, Department, SchoolService, Student};

#[test]
fn department_course_student_scenario() {
    let conn = open_db_in_memory().unwrap();
    let service = SchoolService::new(&conn);
    service.create_schema().unwrap();

    let mut math = Department::new("Math");
    service.save(&mut math).unwrap();

    let mut algebra = Course::new("Algebra");
    service.set_course_department(&mut algebra, &math).unwrap();
    service.save(&mut algebra).unwrap();

    let found = service.find_course_by_name("Algebra").unwrap().unwrap();
    let department = service.course_department(&found).unwrap().unwrap();
    assert_eq!(department.name, "Math");

    let mut ada = Student::new("Ada");
    service.save(&mut ada).unwrap();
    service.add_student_to_course(&found, &ada).unwrap();

    let mut poetry = Course::new("Poetry");
    service.save(&mut poetry).unwrap();

    let students = service.course_students(&found).unwrap();
    assert_eq!(students.len(), 1);
    assert_eq!(students[0].name, "Ada");
    assert_eq!(students[0], ada);
    assert!(service.course_students(&poetry).unwrap().is_empty());
}

#[test]
fn entities_serialize_with_column_names() {
    let mut ada = Student::new("Ada");
    ada.id = Some(7);

    let json = serde_json::to_value(&ada).unwrap();
    assert_eq!(json, serde_json::json!({ "id": 7, "name": "Ada" }));
}
