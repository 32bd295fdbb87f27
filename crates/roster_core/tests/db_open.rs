use roster_core::db::{open_db, open_db_in_memory};
use roster_core::{Department, EntityRepository, SchoolService, SqliteEntityRepository};

#[test]
fn open_db_in_memory_enables_foreign_keys() {
    let conn = open_db_in_memory().unwrap();
    let enabled: i64 = conn
        .query_row("PRAGMA foreign_keys;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(enabled, 1);
}

#[test]
fn file_database_keeps_rows_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roster.db");

    let conn = open_db(&path).unwrap();
    SchoolService::new(&conn).create_schema().unwrap();
    let mut math = Department::new("Math");
    SqliteEntityRepository::<Department>::new(&conn).insert(&mut math).unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let service = SchoolService::new(&conn);
    service.create_schema().unwrap();
    let loaded = service.find_department_by_name("Math").unwrap().unwrap();
    assert_eq!(loaded, math);
}
