//! Domain model for the collaboration/publishing core.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep pure invariants (key shape, parameter canonicalization, role
//!   predicates) next to the data they protect.
//!
//! # Invariants
//! - Every domain object is identified by a stable UUID.
//! - A collection is published iff its publication record exists; the model
//!   deliberately carries no cached published flag.

pub mod collection;
pub mod filter;
pub mod publication;
pub mod user;
