//! Core domain logic for LazyGoal.
//! This crate is the single source of truth for goal invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod period;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::goal::{Goal, GoalId, GoalStatus, GoalValidationError, NewGoal, PeriodKind};
pub use period::bucket::{
    advance_period, filter_by_period, is_current_period, is_past_period, period_start,
    period_start_utc, period_title, same_period, StepDirection,
};
pub use period::history::{group_for_history, HistoryGroup, HistoryWindow};
pub use repo::goal_store::{GoalStore, GOALS_STORAGE_KEY};
pub use repo::kv_store::{
    KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore, StoreError, StoreResult,
};
pub use service::goal_service::{GoalService, PeriodGoal, PeriodView};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
