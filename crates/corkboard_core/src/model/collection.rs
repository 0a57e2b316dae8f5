//! Collection domain model.
//!
//! # Responsibility
//! - Define the container entity that cards live in and that publications
//!   attach to.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another collection.
//! - Published state is derived from publication-row existence at read time;
//!   no field here may cache it.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a collection.
pub type CollectionId = Uuid;

/// Stable identifier for the access-grouping bubble a collection belongs to.
///
/// Bubbles themselves (membership, visibility rules) are owned by the outer
/// application; the core only stores the reference so listing queries can
/// compose access scoping with the published filter.
pub type BubbleId = Uuid;

/// A user-owned container of cards that can be shared publicly.
///
/// Creation and destruction of collections is driven by the outer workflow;
/// the core persists them so publications and tests have something real to
/// attach to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Collection {
    /// Stable global ID used for publication linkage and auditing.
    pub uuid: CollectionId,
    /// Bubble the collection is visible within.
    pub bubble_uuid: BubbleId,
    /// Display name.
    pub name: String,
}

impl Collection {
    /// Creates a new collection with a generated stable ID.
    pub fn new(bubble_uuid: BubbleId, name: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), bubble_uuid, name)
    }

    /// Creates a collection with a caller-provided stable ID.
    ///
    /// Used by import paths and tests where identity already exists.
    pub fn with_id(uuid: CollectionId, bubble_uuid: BubbleId, name: impl Into<String>) -> Self {
        Self {
            uuid,
            bubble_uuid,
            name: name.into(),
        }
    }
}
