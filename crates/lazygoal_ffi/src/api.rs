//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose stable, use-case-level goal functions to Dart via FRB.
//! - Translate core results into flat envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across FFI boundary.
//! - Instants cross the boundary as epoch milliseconds in the device zone.
//! - Store failures degrade to `ok=false` envelopes with empty payloads.

use chrono::{DateTime, Local, TimeZone};
use lazygoal_core::db::{open_db, resolve_db_path};
use lazygoal_core::{
    advance_period, core_version as core_version_inner, init_logging as init_logging_inner,
    ping as ping_inner, Goal, GoalId, GoalService, HistoryGroup, HistoryWindow, PeriodKind,
    PeriodView, SqliteKeyValueStore, StepDirection,
};
use log::warn;
use std::path::PathBuf;
use std::sync::OnceLock;

static GOAL_DB_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir` (idempotent).
/// - Never panics; returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Goal row as rendered by period and history lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalItem {
    pub goal_id: String,
    pub title: String,
    pub description: Option<String>,
    /// `todo|in-progress|done`.
    pub status: String,
    /// `day|month|year`.
    pub kind: String,
    pub date_epoch_ms: i64,
    pub created_at_epoch_ms: i64,
    /// Whether to show the rollover action (period views only).
    pub can_rollover: bool,
}

/// Response envelope for one day/month/year view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodViewResponse {
    pub ok: bool,
    pub title: String,
    /// False when the viewed period is not the current one.
    pub is_current: bool,
    pub items: Vec<GoalItem>,
    pub message: String,
}

/// One labeled history section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySection {
    pub label: String,
    pub items: Vec<GoalItem>,
}

/// Response envelope for the history view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryResponse {
    pub ok: bool,
    pub sections: Vec<HistorySection>,
    pub message: String,
}

/// Generic action response envelope for goal mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoalActionResponse {
    pub ok: bool,
    /// Affected goal when the action succeeded.
    pub goal: Option<GoalItem>,
    pub message: String,
}

impl GoalActionResponse {
    fn success(message: impl Into<String>, goal: Option<GoalItem>) -> Self {
        Self {
            ok: true,
            goal,
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            goal: None,
            message: message.into(),
        }
    }
}

/// Lists goals for the `kind` period containing `reference_epoch_ms`.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - Never panics; invalid input yields `ok=false` with empty items.
#[flutter_rust_bridge::frb(sync)]
pub fn goals_for_period(kind: String, reference_epoch_ms: i64) -> PeriodViewResponse {
    let result = parse_kind(&kind).and_then(|kind| {
        let reference = local_from_epoch_ms(reference_epoch_ms)?;
        with_goal_service(|service| service.period_view(kind, &reference, &Local::now()))
    });
    match result {
        Ok(view) => to_period_view_response(view),
        Err(message) => {
            warn!("event=ffi_call module=ffi status=error call=goals_for_period");
            PeriodViewResponse {
                ok: false,
                title: String::new(),
                is_current: false,
                items: Vec::new(),
                message: format!("goals_for_period failed: {message}"),
            }
        }
    }
}

/// Adds a goal to the `kind` period containing `reference_epoch_ms`.
///
/// # FFI contract
/// - Blank titles are rejected with `ok=false`.
/// - Returns the created goal on success.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_add(
    kind: String,
    reference_epoch_ms: i64,
    title: String,
    description: Option<String>,
) -> GoalActionResponse {
    let result = parse_kind(&kind).and_then(|kind| {
        let reference = local_from_epoch_ms(reference_epoch_ms)?;
        with_goal_service(|service| {
            service.add_goal(kind, &reference, &title, description.as_deref())
        })
    });
    match result {
        Ok(goal) => GoalActionResponse::success("Goal added.", Some(to_goal_item(goal, false))),
        Err(message) => GoalActionResponse::failure(format!("goal_add failed: {message}")),
    }
}

/// Advances a goal `todo -> in-progress -> done -> todo`.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_advance_status(goal_id: String) -> GoalActionResponse {
    let id = GoalId::from(goal_id.trim());
    match with_goal_service(|service| service.advance_status(&id)) {
        Ok(goal) => {
            GoalActionResponse::success("Status updated.", Some(to_goal_item(goal, false)))
        }
        Err(message) => {
            GoalActionResponse::failure(format!("goal_advance_status failed: {message}"))
        }
    }
}

/// Deletes a goal; unknown ids succeed without change.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_delete(goal_id: String) -> GoalActionResponse {
    let id = GoalId::from(goal_id.trim());
    match with_goal_service(|service| service.delete_goal(&id)) {
        Ok(_) => GoalActionResponse::success("Goal deleted.", None),
        Err(message) => GoalActionResponse::failure(format!("goal_delete failed: {message}")),
    }
}

/// Moves an unfinished goal into the current period and resets it to `todo`.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_rollover(goal_id: String) -> GoalActionResponse {
    let id = GoalId::from(goal_id.trim());
    match with_goal_service(|service| service.rollover_to_current(&id, &Local::now())) {
        Ok(goal) => GoalActionResponse::success("Goal moved to now.", Some(to_goal_item(goal, false))),
        Err(message) => GoalActionResponse::failure(format!("goal_rollover failed: {message}")),
    }
}

/// History sections for `30days|12months|5years`.
#[flutter_rust_bridge::frb(sync)]
pub fn goal_history(window: String) -> HistoryResponse {
    let result = HistoryWindow::parse(&window)
        .ok_or_else(|| format!("unsupported history window `{}`", window.trim()))
        .and_then(|window| with_goal_service(|service| service.history(window, &Local::now())));
    match result {
        Ok(groups) => {
            let sections = groups
                .into_iter()
                .map(to_history_section)
                .collect::<Vec<_>>();
            let message = if sections.is_empty() {
                "No goals found in this period.".to_string()
            } else {
                format!("Found {} section(s).", sections.len())
            };
            HistoryResponse {
                ok: true,
                sections,
                message,
            }
        }
        Err(message) => HistoryResponse {
            ok: false,
            sections: Vec::new(),
            message: format!("goal_history failed: {message}"),
        },
    }
}

/// Steps `reference_epoch_ms` one `kind` unit forward or back.
///
/// Returns the input unchanged when it cannot be interpreted.
#[flutter_rust_bridge::frb(sync)]
pub fn period_step(kind: String, reference_epoch_ms: i64, forward: bool) -> i64 {
    let direction = if forward {
        StepDirection::Next
    } else {
        StepDirection::Previous
    };
    match (parse_kind(&kind), local_from_epoch_ms(reference_epoch_ms)) {
        (Ok(kind), Ok(reference)) => {
            advance_period(kind, &reference, direction).timestamp_millis()
        }
        _ => reference_epoch_ms,
    }
}

fn parse_kind(kind: &str) -> Result<PeriodKind, String> {
    PeriodKind::parse(kind).ok_or_else(|| format!("unsupported goal kind `{}`", kind.trim()))
}

fn local_from_epoch_ms(epoch_ms: i64) -> Result<DateTime<Local>, String> {
    Local
        .timestamp_millis_opt(epoch_ms)
        .single()
        .ok_or_else(|| format!("invalid epoch milliseconds `{epoch_ms}`"))
}

fn resolve_goal_db_path() -> PathBuf {
    GOAL_DB_PATH.get_or_init(|| resolve_db_path(None)).clone()
}

fn with_goal_service<T>(
    f: impl FnOnce(&GoalService<SqliteKeyValueStore<'_>>) -> lazygoal_core::StoreResult<T>,
) -> Result<T, String> {
    let db_path = resolve_goal_db_path();
    let conn = open_db(&db_path).map_err(|err| format!("goal DB open failed: {err}"))?;
    let storage = SqliteKeyValueStore::try_new(&conn)
        .map_err(|err| format!("goal storage init failed: {err}"))?;
    let service = GoalService::with_storage(storage);
    f(&service).map_err(|err| format!("[{}] {err}", err.code()))
}

fn to_period_view_response(view: PeriodView) -> PeriodViewResponse {
    let items = view
        .goals
        .into_iter()
        .map(|row| to_goal_item(row.goal, row.can_rollover))
        .collect::<Vec<_>>();
    let message = if items.is_empty() {
        format!("No goals set for this {}.", view.kind)
    } else {
        format!("Found {} goal(s).", items.len())
    };
    PeriodViewResponse {
        ok: true,
        title: view.title,
        is_current: view.is_current,
        items,
        message,
    }
}

fn to_history_section(group: HistoryGroup) -> HistorySection {
    HistorySection {
        label: group.label,
        items: group
            .goals
            .into_iter()
            .map(|goal| to_goal_item(goal, false))
            .collect(),
    }
}

fn to_goal_item(goal: Goal, can_rollover: bool) -> GoalItem {
    GoalItem {
        goal_id: goal.id.to_string(),
        title: goal.title,
        description: goal.description,
        status: goal.status.as_str().to_string(),
        kind: goal.kind.as_str().to_string(),
        date_epoch_ms: goal.date.timestamp_millis(),
        created_at_epoch_ms: goal.created_at.timestamp_millis(),
        can_rollover,
    }
}
