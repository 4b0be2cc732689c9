//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls and period queries into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod goal_service;
