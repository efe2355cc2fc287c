//! Parcel repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Own every read and write of the `parcel` table.
//! - Enforce the status guard on address change and deletion.
//!
//! # Invariants
//! - `add` always persists `ParcelStatus::Registered`.
//! - `set_address` and `delete` mutate only rows still in `registered`.
//! - A guard rejection is a successful `GuardOutcome::Rejected`, not an error.
//! - `set_status` trusts the caller to have validated the transition.
//!
//! Guarded writes read the row first, then issue an update/delete keyed on
//! both `number` and `status = 'registered'`, so a status change landing
//! between the read and the write is reported as a rejection instead of
//! being overwritten.

use crate::db::{verify_schema, DbError};
use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use log::{debug, info};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PARCEL_SELECT_SQL: &str = "SELECT
    number,
    client,
    status,
    address,
    created_at
FROM parcel";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for parcel persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    /// Engine-level failure, propagated unchanged.
    Db(DbError),
    /// No row with this number. Expected after deletion.
    NotFound(ParcelNumber),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(number) => write!(f, "parcel not found: {number}"),
            Self::InvalidData(message) => write!(f, "invalid persisted parcel data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Result of a status-guarded mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// The parcel was `registered` and the mutation was written.
    Applied,
    /// The parcel had already left `registered`; nothing was written.
    Rejected { status: ParcelStatus },
}

impl GuardOutcome {
    pub fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Repository interface for parcel records.
pub trait ParcelRepository {
    /// Inserts `parcel` as `registered` and returns the assigned number.
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber>;
    /// Loads one parcel. Zero rows yields `RepoError::NotFound`.
    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel>;
    /// Loads every parcel of `client`. No ordering is promised.
    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>>;
    /// Overwrites the status without checking the transition.
    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()>;
    /// Replaces the address while the parcel is still `registered`.
    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<GuardOutcome>;
    /// Deletes the parcel while it is still `registered`.
    fn delete(&self, number: ParcelNumber) -> RepoResult<GuardOutcome>;
}

/// SQLite-backed parcel repository.
pub struct SqliteParcelRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteParcelRepository<'conn> {
    /// Constructs a repository from a bootstrapped connection.
    ///
    /// Fails with `RepoError::Db(DbError::IncompatibleSchema)` when the
    /// `parcel` table is absent or does not fit the store.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        verify_schema(conn)?;
        Ok(Self { conn })
    }

    fn current_status(&self, number: ParcelNumber) -> RepoResult<ParcelStatus> {
        let mut stmt = self
            .conn
            .prepare("SELECT status FROM parcel WHERE number = ?1;")?;
        let mut rows = stmt.query([number])?;
        if let Some(row) = rows.next()? {
            let status_text: String = row.get("status")?;
            return parse_status(&status_text);
        }

        Err(RepoError::NotFound(number))
    }

    /// Re-reads the status after a guarded write matched no row.
    fn rejected_after_race(
        &self,
        number: ParcelNumber,
        operation: &'static str,
    ) -> RepoResult<GuardOutcome> {
        let status = self.current_status(number)?;
        Ok(rejected(number, operation, status))
    }
}

impl ParcelRepository for SqliteParcelRepository<'_> {
    fn add(&self, parcel: &Parcel) -> RepoResult<ParcelNumber> {
        self.conn.execute(
            "INSERT INTO parcel (client, status, address, created_at)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                parcel.client,
                ParcelStatus::Registered.as_str(),
                parcel.address.as_str(),
                parcel.created_at.as_str(),
            ],
        )?;

        let number = self.conn.last_insert_rowid();
        debug!(
            "event=parcel_add module=repo status=ok number={} client={}",
            number, parcel.client
        );
        Ok(number)
    }

    fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PARCEL_SELECT_SQL} WHERE number = ?1;"))?;

        let mut rows = stmt.query([number])?;
        if let Some(row) = rows.next()? {
            return parse_parcel_row(row);
        }

        Err(RepoError::NotFound(number))
    }

    fn get_by_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PARCEL_SELECT_SQL} WHERE client = ?1 ORDER BY number ASC;"
        ))?;

        let mut rows = stmt.query([client])?;
        let mut parcels = Vec::new();
        while let Some(row) = rows.next()? {
            parcels.push(parse_parcel_row(row)?);
        }

        Ok(parcels)
    }

    fn set_status(&self, number: ParcelNumber, status: ParcelStatus) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE parcel SET status = ?2 WHERE number = ?1;",
            params![number, status.as_str()],
        )?;

        if changed == 0 {
            debug!(
                "event=parcel_set_status module=repo status=noop number={} reason=no_row",
                number
            );
        }

        Ok(())
    }

    fn set_address(&self, number: ParcelNumber, address: &str) -> RepoResult<GuardOutcome> {
        let current = self.get(number)?;
        if !current.status.is_mutable() {
            return Ok(rejected(number, "set_address", current.status));
        }

        let changed = self.conn.execute(
            "UPDATE parcel SET address = ?2 WHERE number = ?1 AND status = ?3;",
            params![number, address, ParcelStatus::Registered.as_str()],
        )?;
        if changed == 0 {
            return self.rejected_after_race(number, "set_address");
        }

        Ok(GuardOutcome::Applied)
    }

    fn delete(&self, number: ParcelNumber) -> RepoResult<GuardOutcome> {
        let status = self.current_status(number)?;
        if !status.is_mutable() {
            return Ok(rejected(number, "delete", status));
        }

        let changed = self.conn.execute(
            "DELETE FROM parcel WHERE number = ?1 AND status = ?2;",
            params![number, ParcelStatus::Registered.as_str()],
        )?;
        if changed == 0 {
            return self.rejected_after_race(number, "delete");
        }

        Ok(GuardOutcome::Applied)
    }
}

fn rejected(number: ParcelNumber, operation: &'static str, status: ParcelStatus) -> GuardOutcome {
    info!(
        "event=parcel_guard_rejected module=repo operation={} number={} parcel_status={}",
        operation, number, status
    );
    GuardOutcome::Rejected { status }
}

fn parse_parcel_row(row: &Row<'_>) -> RepoResult<Parcel> {
    let status_text: String = row.get("status")?;
    Ok(Parcel {
        number: row.get("number")?,
        client: row.get("client")?,
        status: parse_status(&status_text)?,
        address: row.get("address")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_status(value: &str) -> RepoResult<ParcelStatus> {
    ParcelStatus::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid parcel status `{value}` in parcel.status"))
    })
}
