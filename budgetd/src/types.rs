//! Common type definitions.
//!
//! # ID Types
//!
//! - [`UserId`]: User account identifier (UUID)
//! - [`RecordId`]: Ledger record identifier. Chosen by the client, so it is an opaque string that is
//!   only unique within one user's records.
//! - [`RecordKey`]: The full key of a ledger row, pairing the owner with the record id.
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use std::fmt;
use uuid::Uuid;

pub type UserId = Uuid;
pub type RecordId = String;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Key of an income or expense row: records are only addressable through their owner.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub owner: UserId,
    pub id: RecordId,
}

impl RecordKey {
    pub fn new(owner: UserId, id: impl Into<RecordId>) -> Self {
        Self { owner, id: id.into() }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", abbrev_uuid(&self.owner), self.id)
    }
}

/// Generate a fresh record id for rows submitted without one.
pub fn generate_record_id() -> RecordId {
    Uuid::new_v4().to_string()
}
