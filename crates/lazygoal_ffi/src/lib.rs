//! Flutter bridge for LazyGoal core.

pub mod api;
