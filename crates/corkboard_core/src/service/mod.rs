//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep outer layers (CLI, routing) decoupled from storage details.

pub mod filters;
pub mod publishing;
