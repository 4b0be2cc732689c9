//! Goal store over a single serialized collection.
//!
//! # Responsibility
//! - Persist the full goal list as one JSON array under one storage key.
//! - Provide create/update/delete/rollover/advance over that list.
//!
//! # Invariants
//! - Every mutation is one `update_item` call: read full, compute, write full.
//! - Write paths call `Goal::validate()` before persisting.
//! - Read paths reject corrupt payloads instead of masking them as empty.
//! - `kind` and `created_at` of a stored goal never change.

use crate::model::goal::{Goal, GoalId, GoalValidationError, NewGoal};
use crate::repo::kv_store::{KeyValueStore, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use log::{debug, error, info};

/// Storage key holding the serialized goal collection.
pub const GOALS_STORAGE_KEY: &str = "GOALS_STORAGE_KEY";

/// Whole-collection goal store owning its persistence medium.
pub struct GoalStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> GoalStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Returns the underlying medium.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns all stored goals in insertion order.
    ///
    /// An absent key yields an empty list. Unreadable or corrupt payloads are
    /// reported as errors so callers can tell them apart from "no goals".
    pub fn list(&self) -> StoreResult<Vec<Goal>> {
        let result = self
            .storage
            .get_item(GOALS_STORAGE_KEY)
            .and_then(|raw| decode_goals(raw.as_deref()));
        match &result {
            Ok(goals) => debug!(
                "event=goal_list module=store status=ok goal_count={}",
                goals.len()
            ),
            Err(err) => log_failure("goal_list", None, err),
        }
        result
    }

    /// Looks up one goal by id.
    pub fn get(&self, id: &GoalId) -> StoreResult<Option<Goal>> {
        Ok(self.list()?.into_iter().find(|goal| &goal.id == id))
    }

    /// Appends a new goal with a fresh id and `created_at = now`.
    pub fn create(&self, input: NewGoal) -> StoreResult<Goal> {
        let goal = input.into_goal(GoalId::generate(), Utc::now());
        let result = goal
            .validate()
            .map_err(StoreError::from)
            .and_then(|()| {
                self.mutate(|goals| {
                    if goals.iter().any(|existing| existing.id == goal.id) {
                        return Err(StoreError::InvalidData(format!(
                            "generated goal id `{}` already stored",
                            goal.id
                        )));
                    }
                    goals.push(goal.clone());
                    Ok(())
                })
            });
        log_mutation("goal_create", &goal.id, &result);
        result.map(|_| goal)
    }

    /// Replaces the stored goal with the same id by `goal`, verbatim.
    ///
    /// Missing ids are a no-op that still succeeds. Changing `kind` or
    /// `created_at` of an existing goal is rejected.
    pub fn update(&self, goal: &Goal) -> StoreResult<Vec<Goal>> {
        let result = goal
            .validate()
            .map_err(StoreError::from)
            .and_then(|()| {
                self.mutate(|goals| {
                    if let Some(slot) = goals.iter_mut().find(|existing| existing.id == goal.id) {
                        check_immutable_fields(slot, goal)?;
                        *slot = goal.clone();
                    }
                    Ok(())
                })
            });
        log_mutation("goal_update", &goal.id, &result);
        result.map(|(goals, ())| goals)
    }

    /// Removes the goal with `id`; missing ids are a no-op.
    pub fn delete(&self, id: &GoalId) -> StoreResult<Vec<Goal>> {
        let result = self.mutate(|goals| {
            goals.retain(|goal| &goal.id != id);
            Ok(())
        });
        log_mutation("goal_delete", id, &result);
        result.map(|(goals, ())| goals)
    }

    /// Moves a goal to `new_date` and resets its status to `todo`.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] without writing anything when `id` is absent.
    pub fn rollover(&self, id: &GoalId, new_date: DateTime<Utc>) -> StoreResult<Vec<Goal>> {
        let result = self.mutate(|goals| {
            let slot = find_mut(goals, id)?;
            *slot = slot.rolled_over(new_date);
            Ok(())
        });
        log_mutation("goal_rollover", id, &result);
        result.map(|(goals, ())| goals)
    }

    /// Advances the status of one goal along its cycle.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] without writing anything when `id` is absent.
    pub fn advance_status(&self, id: &GoalId) -> StoreResult<Vec<Goal>> {
        let result = self.mutate(|goals| {
            let slot = find_mut(goals, id)?;
            *slot = slot.advanced();
            Ok(())
        });
        log_mutation("goal_advance", id, &result);
        result.map(|(goals, ())| goals)
    }

    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Vec<Goal>) -> StoreResult<T>,
    ) -> StoreResult<(Vec<Goal>, T)> {
        self.storage.update_item(GOALS_STORAGE_KEY, |raw| {
            let mut goals = decode_goals(raw.as_deref())?;
            let output = f(&mut goals)?;
            let encoded = serde_json::to_string(&goals)?;
            Ok((encoded, (goals, output)))
        })
    }
}

fn decode_goals(raw: Option<&str>) -> StoreResult<Vec<Goal>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text)
            .map_err(|err| StoreError::InvalidData(format!("{GOALS_STORAGE_KEY}: {err}"))),
    }
}

fn find_mut<'a>(goals: &'a mut [Goal], id: &GoalId) -> StoreResult<&'a mut Goal> {
    goals
        .iter_mut()
        .find(|goal| &goal.id == id)
        .ok_or_else(|| StoreError::NotFound(id.clone()))
}

fn check_immutable_fields(stored: &Goal, incoming: &Goal) -> StoreResult<()> {
    if stored.kind != incoming.kind {
        return Err(GoalValidationError::ImmutableField("type").into());
    }
    if stored.created_at != incoming.created_at {
        return Err(GoalValidationError::ImmutableField("createdAt").into());
    }
    Ok(())
}

fn log_mutation<T>(event: &str, id: &GoalId, result: &StoreResult<(Vec<Goal>, T)>) {
    match result {
        Ok((goals, _)) => info!(
            "event={event} module=store status=ok goal_id={id} goal_count={}",
            goals.len()
        ),
        Err(err) => log_failure(event, Some(id), err),
    }
}

fn log_failure(event: &str, id: Option<&GoalId>, err: &StoreError) {
    let id = id.map_or("-", GoalId::as_str);
    if matches!(err, StoreError::NotFound(_)) {
        info!(
            "event={event} module=store status=skipped goal_id={id} error_code={}",
            err.code()
        );
    } else {
        error!(
            "event={event} module=store status=error goal_id={id} error_code={} error={err}",
            err.code()
        );
    }
}
