//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open a database (file path argument or in-memory), create the school
//!   schema and run a small department/course/student walkthrough.
//! - Keep output deterministic for quick local sanity checks.

use log::error;
use roster_core::db::{open_db, open_db_in_memory};
use roster_core::{
    core_version, init_logging, Course, Department, LoggingConfig, RepoResult, SchoolService,
    Student,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("roster_core version={}", core_version());

    match LoggingConfig::from_env() {
        Ok(Some(config)) => {
            if let Err(err) = init_logging(&config) {
                eprintln!("logging disabled: {err}");
            }
        }
        Ok(None) => {}
        Err(err) => eprintln!("logging disabled: {err}"),
    }

    let conn = match std::env::args().nth(1) {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    };
    let conn = match conn {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open database: {err}");
            return ExitCode::FAILURE;
        }
    };

    match walkthrough(&SchoolService::new(&conn)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_walkthrough module=cli status=error error={err}");
            eprintln!("walkthrough failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn walkthrough(service: &SchoolService<'_>) -> RepoResult<()> {
    service.create_schema()?;

    let mut math = Department::new("Math");
    service.save(&mut math)?;

    let mut algebra = Course::new("Algebra");
    service.set_course_department(&mut algebra, &math)?;
    service.save(&mut algebra)?;

    let mut ada = Student::new("Ada");
    service.save(&mut ada)?;
    service.add_student_to_course(&algebra, &ada)?;

    if let Some(course) = service.find_course_by_name("Algebra")? {
        let department = service
            .course_department(&course)?
            .map_or("<none>", |department| department.name.as_str());
        println!("course={} department={department}", course.name);
        for student in service.course_students(&course)? {
            println!("course={} student={}", course.name, student.name);
        }
    }

    Ok(())
}
