//! SQLite storage bootstrap for the parcel table.
//!
//! # Responsibility
//! - Open and configure SQLite connections for parcel tracking.
//! - Ensure the `parcel` table exists and has the columns the store reads.
//!
//! # Invariants
//! - Core code must not read/write parcel rows before bootstrap succeeds.
//! - An existing table is never altered; an incompatible one is reported.
//! - `parcel.number` is an `INTEGER PRIMARY KEY AUTOINCREMENT` column, so the
//!   number returned on insert is the stored one and is never handed out twice.

use std::error::Error;
use std::fmt::{Display, Formatter};

mod open;
mod schema;

pub use open::{open_db, open_db_in_memory};
pub use schema::{ensure_schema, verify_schema, PARCEL_COLUMNS};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The `parcel` table is absent or does not have the shape the store needs.
    IncompatibleSchema {
        column: &'static str,
        problem: SchemaProblem,
    },
}

/// Why an existing `parcel` table was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaProblem {
    MissingColumn,
    /// `number` is not the `INTEGER PRIMARY KEY` rowid alias.
    NotRowidPrimaryKey,
    /// `number` is a rowid alias but numbers of deleted rows may be reused.
    MissingAutoincrement,
}

impl Display for SchemaProblem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingColumn => f.write_str("is missing"),
            Self::NotRowidPrimaryKey => f.write_str("must be declared INTEGER PRIMARY KEY"),
            Self::MissingAutoincrement => f.write_str("must be declared AUTOINCREMENT"),
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "{err}"),
            Self::IncompatibleSchema { column, problem } => {
                write!(f, "parcel table column `{column}` {problem}")
            }
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::IncompatibleSchema { .. } => None,
        }
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
