//! Parcel tracking use-case service.
//!
//! # Responsibility
//! - Register parcels with a creation timestamp.
//! - Own the forward-only status transition table.
//! - Delegate guarded mutations and listings to the repository.
//!
//! # Invariants
//! - `advance` moves a parcel exactly one step and never regresses it.
//! - Repository errors surface unchanged; no local recovery.

use crate::model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
use crate::repo::parcel_repo::{GuardOutcome, ParcelRepository, RepoResult};
use chrono::{SecondsFormat, Utc};
use log::info;

/// Outcome of one `advance` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// Status was moved one step forward.
    Advanced {
        from: ParcelStatus,
        to: ParcelStatus,
    },
    /// Parcel is already `delivered`; nothing was written.
    Terminal,
}

/// Returns the single valid successor of `status`, or `None` when terminal.
pub fn next_status(status: ParcelStatus) -> Option<ParcelStatus> {
    match status {
        ParcelStatus::Registered => Some(ParcelStatus::Sent),
        ParcelStatus::Sent => Some(ParcelStatus::Delivered),
        ParcelStatus::Delivered => None,
    }
}

/// Current UTC time as RFC 3339 with second precision, e.g. `2024-03-01T10:00:00Z`.
pub fn creation_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Tracking service facade over repository implementations.
pub struct TrackingService<R: ParcelRepository> {
    repo: R,
}

impl<R: ParcelRepository> TrackingService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers a new parcel and returns it with its assigned number.
    pub fn register(&self, client: ClientId, address: impl Into<String>) -> RepoResult<Parcel> {
        let mut parcel = Parcel::new(client, address, creation_timestamp());
        parcel.number = self.repo.add(&parcel)?;

        info!(
            "event=parcel_register module=service status=ok number={} client={} created_at={}",
            parcel.number, parcel.client, parcel.created_at
        );
        Ok(parcel)
    }

    /// Moves the parcel to its next status.
    ///
    /// `delivered` parcels are left untouched and reported as `Terminal`.
    pub fn advance(&self, number: ParcelNumber) -> RepoResult<StatusChange> {
        let current = self.repo.get(number)?;
        let Some(next) = next_status(current.status) else {
            return Ok(StatusChange::Terminal);
        };

        self.repo.set_status(number, next)?;
        info!(
            "event=parcel_advance module=service status=ok number={} from={} to={}",
            number, current.status, next
        );
        Ok(StatusChange::Advanced {
            from: current.status,
            to: next,
        })
    }

    /// Changes the delivery address while the parcel is still `registered`.
    pub fn change_address(
        &self,
        number: ParcelNumber,
        address: impl AsRef<str>,
    ) -> RepoResult<GuardOutcome> {
        self.repo.set_address(number, address.as_ref())
    }

    /// Deletes the parcel while it is still `registered`.
    pub fn remove(&self, number: ParcelNumber) -> RepoResult<GuardOutcome> {
        self.repo.delete(number)
    }

    /// Lists every parcel of `client` for presentation.
    pub fn list_for_client(&self, client: ClientId) -> RepoResult<Vec<Parcel>> {
        self.repo.get_by_client(client)
    }

    /// Gets one parcel by number.
    pub fn get(&self, number: ParcelNumber) -> RepoResult<Parcel> {
        self.repo.get(number)
    }
}
