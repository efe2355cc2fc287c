//! Core domain logic for parcel tracking.
//! This crate is the single source of truth for the parcel status guards.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::parcel::{ClientId, Parcel, ParcelNumber, ParcelStatus};
pub use repo::parcel_repo::{
    GuardOutcome, ParcelRepository, RepoError, RepoResult, SqliteParcelRepository,
};
pub use service::tracking_service::{next_status, StatusChange, TrackingService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
