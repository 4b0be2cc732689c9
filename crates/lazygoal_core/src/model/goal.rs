//! Goal domain model.
//!
//! # Responsibility
//! - Define the canonical goal record persisted by the goal store.
//! - Define the closed status and period-kind vocabularies.
//!
//! # Invariants
//! - `id` is stable and never reused for another goal.
//! - `kind` never changes after creation.
//! - `date` is the canonical period start for `kind`.
//! - `status` only advances `todo -> in-progress -> done -> todo`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable goal identifier.
///
/// Stored as an opaque string so ids written by earlier app versions
/// (epoch-millisecond strings) keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GoalId(String);

impl GoalId {
    /// Generates a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<String> for GoalId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GoalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Display for GoalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar granularity a goal is scoped to.
///
/// Serialized as `type` on the goal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    Day,
    Month,
    Year,
}

impl PeriodKind {
    /// Stable wire label (`day|month|year`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Month => "month",
            Self::Year => "year",
        }
    }

    /// Parses a wire label, case-insensitive, surrounding whitespace ignored.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Some(Self::Day),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            _ => None,
        }
    }
}

impl Display for PeriodKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Goal lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    /// Created but not started.
    #[default]
    Todo,
    /// Work is in progress.
    InProgress,
    /// Completed.
    Done,
}

impl GoalStatus {
    /// Returns the next state in the cyclic lifecycle.
    ///
    /// `Done` wraps back to `Todo`; no state is ever skipped.
    pub fn next(self) -> Self {
        match self {
            Self::Todo => Self::InProgress,
            Self::InProgress => Self::Done,
            Self::Done => Self::Todo,
        }
    }

    /// Stable wire label (`todo|in-progress|done`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in-progress",
            Self::Done => "done",
        }
    }

    pub fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl Display for GoalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical persisted goal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: GoalStatus,
    /// Serialized as `type` to match the persisted record shape.
    #[serde(rename = "type")]
    pub kind: PeriodKind,
    /// Canonical period start for `kind`.
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    /// Validates domain invariants that can be checked on a single record.
    ///
    /// # Errors
    /// - Returns [`GoalValidationError::EmptyTitle`] for blank titles.
    pub fn validate(&self) -> Result<(), GoalValidationError> {
        if self.title.trim().is_empty() {
            return Err(GoalValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Returns a copy moved to `date` with status reset to `todo`.
    ///
    /// Identity, title, kind and creation time are preserved.
    pub fn rolled_over(&self, date: DateTime<Utc>) -> Self {
        Self {
            date,
            status: GoalStatus::Todo,
            ..self.clone()
        }
    }

    /// Returns a copy with status advanced one step.
    pub fn advanced(&self) -> Self {
        Self {
            status: self.status.next(),
            ..self.clone()
        }
    }
}

/// Caller-provided fields for goal creation.
///
/// `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGoal {
    pub title: String,
    pub description: Option<String>,
    pub status: GoalStatus,
    pub kind: PeriodKind,
    pub date: DateTime<Utc>,
}

impl NewGoal {
    /// Creates a `todo` goal input for the given period start.
    pub fn new(kind: PeriodKind, date: DateTime<Utc>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: GoalStatus::Todo,
            kind,
            date,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Materializes the record with store-assigned identity.
    pub fn into_goal(self, id: GoalId, created_at: DateTime<Utc>) -> Goal {
        Goal {
            id,
            title: self.title,
            description: self.description,
            status: self.status,
            kind: self.kind,
            date: self.date,
            created_at,
        }
    }
}

/// Validation failure for goal records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalValidationError {
    EmptyTitle,
    /// An update tried to change a field fixed at creation.
    ImmutableField(&'static str),
}

impl Display for GoalValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "goal title cannot be empty"),
            Self::ImmutableField(field) => write!(f, "goal field `{field}` cannot be changed"),
        }
    }
}

impl Error for GoalValidationError {}

#[cfg(test)]
mod tests {
    use super::{Goal, GoalId, GoalStatus, GoalValidationError, NewGoal, PeriodKind};
    use chrono::{TimeZone, Utc};

    fn sample_goal() -> Goal {
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        NewGoal::new(PeriodKind::Month, date, "read two books")
            .with_description("fiction")
            .into_goal(GoalId::from("1709251200000"), date)
    }

    #[test]
    fn status_cycles_through_three_states() {
        let start = GoalStatus::Todo;
        assert_eq!(start.next(), GoalStatus::InProgress);
        assert_eq!(start.next().next(), GoalStatus::Done);
        assert_eq!(start.next().next().next(), GoalStatus::Todo);
    }

    #[test]
    fn serializes_with_external_field_names() {
        let json = serde_json::to_value(sample_goal()).unwrap();
        assert_eq!(json["id"], "1709251200000");
        assert_eq!(json["type"], "month");
        assert_eq!(json["status"], "todo");
        assert_eq!(json["description"], "fiction");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn deserializes_records_written_by_the_app() {
        let raw = r#"{
            "id": "1710028800000",
            "title": "Run 5k",
            "description": "",
            "status": "in-progress",
            "type": "day",
            "date": "2024-03-10T00:00:00.000Z",
            "createdAt": "2024-03-10T08:12:45.120Z"
        }"#;
        let goal: Goal = serde_json::from_str(raw).unwrap();
        assert_eq!(goal.status, GoalStatus::InProgress);
        assert_eq!(goal.kind, PeriodKind::Day);
        assert_eq!(goal.date, Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap());
        assert_eq!(goal.description.as_deref(), Some(""));
    }

    #[test]
    fn rejects_unknown_status_at_boundary() {
        let raw = r#"{"id":"1","title":"x","status":"blocked","type":"day",
            "date":"2024-03-10T00:00:00Z","createdAt":"2024-03-10T00:00:00Z"}"#;
        assert!(serde_json::from_str::<Goal>(raw).is_err());
    }

    #[test]
    fn validate_rejects_blank_title() {
        let mut goal = sample_goal();
        goal.title = "   ".to_string();
        assert_eq!(goal.validate(), Err(GoalValidationError::EmptyTitle));
    }

    #[test]
    fn rolled_over_resets_status_and_keeps_identity() {
        let mut goal = sample_goal();
        goal.status = GoalStatus::InProgress;
        let next_month = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();

        let moved = goal.rolled_over(next_month);
        assert_eq!(moved.id, goal.id);
        assert_eq!(moved.title, goal.title);
        assert_eq!(moved.kind, goal.kind);
        assert_eq!(moved.created_at, goal.created_at);
        assert_eq!(moved.date, next_month);
        assert_eq!(moved.status, GoalStatus::Todo);
    }

    #[test]
    fn period_kind_parse_accepts_wire_labels() {
        assert_eq!(PeriodKind::parse(" Month "), Some(PeriodKind::Month));
        assert_eq!(PeriodKind::parse("week"), None);
    }
}
