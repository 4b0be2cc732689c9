//! Goal domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep enumerated fields as closed types checked at the storage boundary.
//!
//! # Invariants
//! - Every goal is identified by a stable `GoalId`.
//! - Deletion is a hard removal from the persisted collection.

pub mod goal;
