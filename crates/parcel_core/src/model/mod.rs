//! Parcel domain model.
//!
//! # Responsibility
//! - Define the single persisted entity and its lifecycle states.
//!
//! # Invariants
//! - Every parcel is identified by a store-assigned `ParcelNumber`.
//! - Status only moves forward along `registered -> sent -> delivered`.

pub mod parcel;
