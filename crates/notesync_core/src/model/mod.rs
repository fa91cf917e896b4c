//! Todo domain model.
//!
//! # Responsibility
//! - Define the canonical todo record and its lifecycle status.
//! - Keep lifecycle rules next to the data they constrain.
//!
//! # Invariants
//! - Every todo is identified by a stable, non-nil `TodoId`.
//! - Status only moves forward: active -> completed -> archived.
//! - Todos are never hard-deleted; archival is a status, not a removal.

pub mod todo;
