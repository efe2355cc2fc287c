//! Parcel record and status.
//!
//! # Responsibility
//! - Define the canonical parcel record shared by store, service and callers.
//! - Provide the text encoding used for the `parcel.status` column.
//!
//! # Invariants
//! - `number` is assigned by the store and never reused for another parcel.
//! - `address` is mutable only while `status == Registered`.
//! - `created_at` is fixed at registration.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-assigned parcel identifier.
pub type ParcelNumber = i64;

/// Owning client identifier. Opaque to this crate.
pub type ClientId = i64;

/// Delivery lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParcelStatus {
    /// Accepted for shipping; address change and deletion still allowed.
    Registered,
    /// Handed to the carrier.
    Sent,
    /// Terminal state.
    Delivered,
}

impl ParcelStatus {
    /// Returns the text stored in `parcel.status`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Registered => "registered",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
        }
    }

    /// Parses the stored text form. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "registered" => Some(Self::Registered),
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            _ => None,
        }
    }

    /// Whether guarded mutations (address change, deletion) may apply.
    pub fn is_mutable(self) -> bool {
        self == Self::Registered
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical parcel record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Ignored on insert; filled from the store afterwards.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    /// Free-form delivery address.
    pub address: String,
    /// RFC 3339 UTC timestamp text.
    pub created_at: String,
}

impl Parcel {
    /// Builds an unsaved parcel in the `Registered` state.
    ///
    /// `number` stays `0` until the store assigns one.
    pub fn new(
        client: ClientId,
        address: impl Into<String>,
        created_at: impl Into<String>,
    ) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: created_at.into(),
        }
    }
}
