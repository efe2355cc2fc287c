use parcel_core::db::{open_db, open_db_in_memory, DbError, SchemaProblem, PARCEL_COLUMNS};
use parcel_core::{Parcel, ParcelRepository, RepoError, SqliteParcelRepository};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_creates_parcel_table() {
    let conn = open_db_in_memory().unwrap();

    assert_table_exists(&conn, "parcel");
    let columns = table_columns(&conn);
    for column in PARCEL_COLUMNS {
        assert!(columns.iter().any(|name| name == column), "missing {column}");
    }
}

#[test]
fn opening_same_database_twice_keeps_rows() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");

    let number = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteParcelRepository::try_new(&conn).unwrap();
        repo.add(&Parcel::new(5, "Tver", "2024-05-01T08:00:00Z"))
            .unwrap()
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let loaded = repo.get(number).unwrap();
    assert_eq!(loaded.address, "Tver");
}

#[test]
fn existing_table_created_elsewhere_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY AUTOINCREMENT,
            client INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT '',
            address TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT ''
        );
        INSERT INTO parcel (client, status, address, created_at)
        VALUES (9, 'sent', 'Omsk', '2023-01-01T00:00:00Z');",
    )
    .unwrap();
    drop(conn);

    let conn = open_db(&path).unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let listed = repo.get_by_client(9).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].address, "Omsk");
}

#[test]
fn opening_database_with_incompatible_table_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER PRIMARY KEY,
            client INTEGER,
            status TEXT,
            address TEXT
        );",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::IncompatibleSchema { column, problem } => {
            assert_eq!(column, "created_at");
            assert_eq!(problem, SchemaProblem::MissingColumn);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn opening_database_with_plain_integer_number_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.db");
    create_legacy_table(&path, "number INTEGER");

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::IncompatibleSchema {
                column: "number",
                problem: SchemaProblem::NotRowidPrimaryKey,
            }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn opening_database_with_composite_key_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("composite.db");
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE parcel (
            number INTEGER,
            client INTEGER,
            status TEXT,
            address TEXT,
            created_at TEXT,
            PRIMARY KEY (number, client)
        );",
    )
    .unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    assert!(matches!(
        err,
        DbError::IncompatibleSchema {
            problem: SchemaProblem::NotRowidPrimaryKey,
            ..
        }
    ));
}

#[test]
fn opening_database_without_autoincrement_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reusing.db");
    create_legacy_table(&path, "number INTEGER PRIMARY KEY");

    let err = open_db(&path).unwrap_err();
    assert!(
        matches!(
            err,
            DbError::IncompatibleSchema {
                column: "number",
                problem: SchemaProblem::MissingAutoincrement,
            }
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn file_database_never_reuses_number_of_deleted_newest_parcel() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");

    let (first, second) = {
        let conn = open_db(&path).unwrap();
        let repo = SqliteParcelRepository::try_new(&conn).unwrap();
        let first = repo.add(&Parcel::new(2, "Perm", "2024-05-01T08:00:00Z")).unwrap();
        let second = repo.add(&Parcel::new(2, "Perm", "2024-05-01T08:00:00Z")).unwrap();
        assert!(repo.delete(second).unwrap().is_applied());
        (first, second)
    };

    let conn = open_db(&path).unwrap();
    let repo = SqliteParcelRepository::try_new(&conn).unwrap();
    let third = repo.add(&Parcel::new(2, "Perm", "2024-05-01T08:00:00Z")).unwrap();
    assert!(second > first);
    assert!(third > second, "number {second} was handed out again");
    assert_eq!(repo.get(third).unwrap().number, third);
}

#[test]
fn repository_rejects_connection_without_parcel_table() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteParcelRepository::try_new(&conn).err().unwrap();
    assert!(matches!(
        err,
        RepoError::Db(DbError::IncompatibleSchema {
            column: "number",
            problem: SchemaProblem::MissingColumn,
        })
    ));
}

fn create_legacy_table(path: &std::path::Path, number_column: &str) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE parcel (
            {number_column},
            client INTEGER NOT NULL,
            status TEXT NOT NULL,
            address TEXT NOT NULL,
            created_at TEXT NOT NULL
        );"
    ))
    .unwrap();
}

fn table_columns(conn: &Connection) -> Vec<String> {
    let mut stmt = conn.prepare("PRAGMA table_info(parcel);").unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>("name"))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}

fn assert_table_exists(conn: &Connection, table_name: &str) {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1
            );",
            [table_name],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(exists, 1, "table {table_name} does not exist");
}
