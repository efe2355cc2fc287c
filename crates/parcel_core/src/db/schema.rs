//! Parcel table creation and shape verification.
//!
//! The table is created only when absent. A table created elsewhere (for
//! example a hand-made `tracker.db`) is accepted as long as every column the
//! store selects is present and `number` is an autoincrementing rowid alias.

use super::{DbError, DbResult, SchemaProblem};
use rusqlite::Connection;

const SCHEMA_SQL: &str = include_str!("schema.sql");

/// Columns read and written by the parcel store, in select order.
pub const PARCEL_COLUMNS: [&str; 5] = ["number", "client", "status", "address", "created_at"];

const NUMBER_COLUMN: &str = "number";

struct ColumnInfo {
    name: String,
    declared_type: String,
    pk: i64,
}

/// Creates the `parcel` table when missing and verifies its shape.
///
/// # Errors
/// - `DbError::Sqlite` when the schema script or a catalog query fails.
/// - `DbError::IncompatibleSchema` when an existing table does not fit.
pub fn ensure_schema(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    verify_schema(conn)
}

/// Checks, without writing, that the `parcel` table fits the store.
///
/// # Invariants
/// - Every column of `PARCEL_COLUMNS` exists. A missing table reports
///   `number` as missing.
/// - `number` is the only primary key column and is declared `INTEGER`, so
///   it aliases the rowid returned by `last_insert_rowid()`.
/// - The table is declared `AUTOINCREMENT`, so deleted numbers are not reused.
pub fn verify_schema(conn: &Connection) -> DbResult<()> {
    let columns = table_columns(conn)?;

    for column in PARCEL_COLUMNS {
        if !columns.iter().any(|info| info.name.eq_ignore_ascii_case(column)) {
            return Err(incompatible(column, SchemaProblem::MissingColumn));
        }
    }

    let rowid_alias = columns.iter().all(|info| {
        if info.name.eq_ignore_ascii_case(NUMBER_COLUMN) {
            info.pk == 1 && info.declared_type.eq_ignore_ascii_case("INTEGER")
        } else {
            info.pk == 0
        }
    });
    if !rowid_alias {
        return Err(incompatible(NUMBER_COLUMN, SchemaProblem::NotRowidPrimaryKey));
    }

    if !declared_with_autoincrement(conn)? {
        return Err(incompatible(
            NUMBER_COLUMN,
            SchemaProblem::MissingAutoincrement,
        ));
    }

    Ok(())
}

fn incompatible(column: &'static str, problem: SchemaProblem) -> DbError {
    DbError::IncompatibleSchema { column, problem }
}

fn table_columns(conn: &Connection) -> DbResult<Vec<ColumnInfo>> {
    let mut stmt = conn.prepare("PRAGMA table_info(parcel);")?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnInfo {
                name: row.get("name")?,
                declared_type: row.get("type")?,
                pk: row.get("pk")?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

fn declared_with_autoincrement(conn: &Connection) -> DbResult<bool> {
    let sql: Option<String> = conn.query_row(
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'parcel';",
        [],
        |row| row.get(0),
    )?;
    Ok(sql.is_some_and(|sql| sql.to_ascii_uppercase().contains("AUTOINCREMENT")))
}
