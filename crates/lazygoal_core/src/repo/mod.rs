//! Persistence layer for goals.
//!
//! # Responsibility
//! - Define the key-value medium contract and its implementations.
//! - Keep the whole-collection goal store on top of that medium.
//!
//! # Invariants
//! - Goal store writes go through `Goal::validate()` before persistence.
//! - Store APIs return semantic errors (`NotFound`, corrupt payload) in
//!   addition to medium transport errors.

pub mod goal_store;
pub mod kv_store;
