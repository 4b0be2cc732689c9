//! Goal use-case service.
//!
//! # Responsibility
//! - Provide the entry points period views and the history view call.
//! - Combine store reads with period bucketing into ready-to-render views.
//!
//! # Invariants
//! - Dates handed to the store are always canonical period starts.
//! - Rollover is offered only for unfinished goals in past periods.
//! - Service layer remains storage-agnostic.

use crate::model::goal::{Goal, GoalId, NewGoal, PeriodKind};
use crate::period::bucket::{
    filter_by_period, is_current_period, is_past_period, period_start_utc, period_title,
};
use crate::period::history::{group_for_history, HistoryGroup, HistoryWindow};
use crate::repo::goal_store::GoalStore;
use crate::repo::kv_store::{KeyValueStore, StoreError, StoreResult};
use chrono::{DateTime, TimeZone};
use std::fmt::Display;

/// One goal row in a period view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodGoal {
    pub goal: Goal,
    /// Whether the row should offer "roll over to now".
    pub can_rollover: bool,
}

/// Ready-to-render goals for one day/month/year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodView {
    pub kind: PeriodKind,
    /// Header label, e.g. `March 2024`.
    pub title: String,
    /// False when the user navigated away; drives "go to today".
    pub is_current: bool,
    pub is_past: bool,
    pub goals: Vec<PeriodGoal>,
}

/// Use-case facade over a goal store.
pub struct GoalService<S: KeyValueStore> {
    store: GoalStore<S>,
}

impl<S: KeyValueStore> GoalService<S> {
    pub fn new(store: GoalStore<S>) -> Self {
        Self { store }
    }

    /// Builds a service directly over a medium.
    pub fn with_storage(storage: S) -> Self {
        Self::new(GoalStore::new(storage))
    }

    pub fn store(&self) -> &GoalStore<S> {
        &self.store
    }

    pub fn list_goals(&self) -> StoreResult<Vec<Goal>> {
        self.store.list()
    }

    /// Goals of `kind` in the period containing `reference`.
    pub fn period_view<Tz: TimeZone>(
        &self,
        kind: PeriodKind,
        reference: &DateTime<Tz>,
        now: &DateTime<Tz>,
    ) -> StoreResult<PeriodView>
    where
        Tz::Offset: Display,
    {
        let is_past = is_past_period(kind, reference, now);
        let goals = filter_by_period(&self.store.list()?, kind, reference)
            .into_iter()
            .map(|goal| PeriodGoal {
                can_rollover: is_past && !goal.status.is_done(),
                goal,
            })
            .collect();

        Ok(PeriodView {
            kind,
            title: period_title(kind, reference),
            is_current: is_current_period(kind, reference, now),
            is_past,
            goals,
        })
    }

    /// Adds a `todo` goal to the period containing `reference`.
    ///
    /// The title is trimmed; a blank description is stored as absent.
    pub fn add_goal<Tz: TimeZone>(
        &self,
        kind: PeriodKind,
        reference: &DateTime<Tz>,
        title: &str,
        description: Option<&str>,
    ) -> StoreResult<Goal> {
        let mut input = NewGoal::new(kind, period_start_utc(kind, reference), title.trim());
        input.description = description
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);
        self.store.create(input)
    }

    /// Advances one goal to its next status.
    pub fn advance_status(&self, id: &GoalId) -> StoreResult<Goal> {
        let goals = self.store.advance_status(id)?;
        find_goal(goals, id)
    }

    /// Moves a goal into the period containing `now`, status reset to `todo`.
    ///
    /// The target date is the canonical start of the goal's own kind.
    pub fn rollover_to_current<Tz: TimeZone>(
        &self,
        id: &GoalId,
        now: &DateTime<Tz>,
    ) -> StoreResult<Goal> {
        let kind = self
            .store
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.clone()))?
            .kind;
        let goals = self.store.rollover(id, period_start_utc(kind, now))?;
        find_goal(goals, id)
    }

    pub fn delete_goal(&self, id: &GoalId) -> StoreResult<Vec<Goal>> {
        self.store.delete(id)
    }

    /// History sections for the trailing `window` ending at `now`.
    pub fn history<Tz: TimeZone>(
        &self,
        window: HistoryWindow,
        now: &DateTime<Tz>,
    ) -> StoreResult<Vec<HistoryGroup>>
    where
        Tz::Offset: Display,
    {
        Ok(group_for_history(&self.store.list()?, window, now))
    }
}

fn find_goal(goals: Vec<Goal>, id: &GoalId) -> StoreResult<Goal> {
    goals
        .into_iter()
        .find(|goal| &goal.id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))
}
