//! Period query engine.
//!
//! # Responsibility
//! - Decide which goals belong to a day/month/year view.
//! - Build trailing-window history sections.
//!
//! # Invariants
//! - Everything here is pure and synchronous; no storage access.
//! - The reference time zone is the zone of the `DateTime` passed in.

pub mod bucket;
pub mod history;
