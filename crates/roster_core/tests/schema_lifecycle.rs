use roster_core::db::open_db_in_memory;
use roster_core::{
    Course, Department, EntityRepository, RepoError, Registration, SchoolService,
    SqliteEntityRepository, Student,
};
use rusqlite::Connection;

fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table});"))
        .unwrap();
    let mut rows = stmt.query([]).unwrap();
    let mut columns = Vec::new();
    while let Some(row) = rows.next().unwrap() {
        columns.push(row.get::<_, String>(1).unwrap());
    }
    columns
}

fn table_exists(conn: &Connection, table: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [table],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

#[test]
fn create_table_uses_declared_column_order() {
    let conn = open_db_in_memory().unwrap();
    SchoolService::new(&conn).create_schema().unwrap();

    assert_eq!(table_columns(&conn, "departments"), ["id", "name"]);
    assert_eq!(table_columns(&conn, "students"), ["id", "name"]);
    assert_eq!(
        table_columns(&conn, "courses"),
        ["id", "name", "department_id"]
    );
    assert_eq!(
        table_columns(&conn, "registrations"),
        ["id", "course_id", "student_id"]
    );
}

#[test]
fn create_table_twice_keeps_rows_and_schema() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntityRepository::<Course>::new(&conn);
    repo.create_table().unwrap();
    let mut course = Course::new("Algebra");
    repo.insert(&mut course).unwrap();

    repo.create_table().unwrap();

    assert_eq!(table_columns(&conn, "courses").len(), 3);
    assert_eq!(repo.count().unwrap(), 1);
}

#[test]
fn drop_table_twice_never_errors() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteEntityRepository::<Student>::new(&conn);
    repo.create_table().unwrap();

    repo.drop_table().unwrap();
    repo.drop_table().unwrap();
    assert!(!table_exists(&conn, "students"));
}

#[test]
fn drop_schema_on_empty_database_is_noop() {
    let conn = open_db_in_memory().unwrap();
    let service = SchoolService::new(&conn);
    service.drop_schema().unwrap();

    service.create_schema().unwrap();
    service.drop_schema().unwrap();
    for table in ["departments", "courses", "students", "registrations"] {
        assert!(!table_exists(&conn, table), "table {table} still exists");
    }
}

#[test]
fn engine_rejection_surfaces_as_schema_error() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("CREATE VIEW departments AS SELECT 1 AS id;")
        .unwrap();

    let err = SqliteEntityRepository::<Department>::new(&conn)
        .drop_table()
        .unwrap_err();
    assert!(matches!(err, RepoError::Schema { table: "departments", .. }));
}

#[test]
fn operations_on_missing_table_propagate_engine_error() {
    let conn = open_db_in_memory().unwrap();
    let mut registration = Registration::default();

    let err = SqliteEntityRepository::<Registration>::new(&conn)
        .insert(&mut registration)
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    assert_eq!(registration.id, None);
}
