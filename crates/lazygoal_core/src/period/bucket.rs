//! Calendar bucketing for day/month/year period views.
//!
//! # Responsibility
//! - Compute canonical period starts in a reference time zone.
//! - Decide bucket membership, past/current checks and navigation steps.
//!
//! # Invariants
//! - Bucket membership is calendar equality in the reference zone, never
//!   range containment on raw instants.
//! - `period_start` is the only date ever handed to the store.

use crate::model::goal::{Goal, PeriodKind};
use chrono::{
    DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone,
    Utc,
};

/// Navigation direction for period stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Previous,
    Next,
}

/// Returns the canonical start instant of the period containing `reference`.
///
/// Start of day, first day of month, or January 1st, at local midnight in
/// the zone of `reference`. When local midnight does not exist (DST gap) the
/// first valid local instant of that day is used.
pub fn period_start<Tz: TimeZone>(kind: PeriodKind, reference: &DateTime<Tz>) -> DateTime<Tz> {
    let day = reference.date_naive();
    let first_day = match kind {
        PeriodKind::Day => Some(day),
        PeriodKind::Month => day.with_day(1),
        PeriodKind::Year => day.with_ordinal(1),
    }
    .unwrap_or(day);
    resolve_local(&reference.timezone(), first_day.and_time(NaiveTime::MIN))
}

/// Same as [`period_start`], normalized to UTC for persistence.
pub fn period_start_utc<Tz: TimeZone>(kind: PeriodKind, reference: &DateTime<Tz>) -> DateTime<Utc> {
    period_start(kind, reference).with_timezone(&Utc)
}

/// Returns whether `a` and `b` fall in the same `kind` bucket, evaluated in
/// the zone of `b`.
pub fn same_period<Tz1: TimeZone, Tz2: TimeZone>(
    kind: PeriodKind,
    a: &DateTime<Tz1>,
    b: &DateTime<Tz2>,
) -> bool {
    let a_local = a.with_timezone(&b.timezone());
    bucket_key(kind, a_local.date_naive()) == bucket_key(kind, b.date_naive())
}

/// Keeps goals of `kind` whose `date` lies in the same bucket as `reference`.
pub fn filter_by_period<Tz: TimeZone>(
    goals: &[Goal],
    kind: PeriodKind,
    reference: &DateTime<Tz>,
) -> Vec<Goal> {
    goals
        .iter()
        .filter(|goal| goal.kind == kind && same_period(kind, &goal.date, reference))
        .cloned()
        .collect()
}

/// True when the period of `reference` starts strictly before the period of
/// `now`. Past periods offer rollover for unfinished goals.
pub fn is_past_period<Tz: TimeZone>(
    kind: PeriodKind,
    reference: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> bool {
    period_start(kind, reference) < period_start(kind, now)
}

/// True when `reference` and `now` share a bucket.
pub fn is_current_period<Tz: TimeZone>(
    kind: PeriodKind,
    reference: &DateTime<Tz>,
    now: &DateTime<Tz>,
) -> bool {
    same_period(kind, reference, now)
}

/// Shifts `reference` by one calendar unit of `kind`, keeping local wall time.
///
/// Month and year steps clamp to the last day of shorter months. The result is
/// not re-canonicalized.
pub fn advance_period<Tz: TimeZone>(
    kind: PeriodKind,
    reference: &DateTime<Tz>,
    direction: StepDirection,
) -> DateTime<Tz> {
    let months = match kind {
        PeriodKind::Day => 0,
        PeriodKind::Month => 1,
        PeriodKind::Year => 12,
    };
    shift_local(reference, kind == PeriodKind::Day, months, direction)
        .unwrap_or_else(|| reference.clone())
}

/// Header label for a period view: `Sunday, Mar 10th`, `March 2024`, `2024`.
pub fn period_title<Tz: TimeZone>(kind: PeriodKind, reference: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match kind {
        PeriodKind::Day => {
            let day = reference.day();
            format!(
                "{}{}",
                reference.format("%A, %b %-d"),
                ordinal_suffix(day)
            )
        }
        PeriodKind::Month => reference.format("%B %Y").to_string(),
        PeriodKind::Year => reference.format("%Y").to_string(),
    }
}

/// Calendar subtraction used by history windows; days and months are applied
/// to local wall time.
pub(crate) fn shift_local<Tz: TimeZone>(
    reference: &DateTime<Tz>,
    one_day: bool,
    months: u32,
    direction: StepDirection,
) -> Option<DateTime<Tz>> {
    let naive = reference.naive_local();
    let shifted = match direction {
        StepDirection::Next => {
            let naive = if one_day { naive.checked_add_days(Days::new(1))? } else { naive };
            naive.checked_add_months(Months::new(months))?
        }
        StepDirection::Previous => {
            let naive = if one_day { naive.checked_sub_days(Days::new(1))? } else { naive };
            naive.checked_sub_months(Months::new(months))?
        }
    };
    Some(resolve_local(&reference.timezone(), shifted))
}

pub(crate) fn resolve_local<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            (1..=24).find_map(|hours| {
                tz.from_local_datetime(&(naive + TimeDelta::hours(hours)))
                    .earliest()
            })
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

fn bucket_key(kind: PeriodKind, date: NaiveDate) -> (i32, u32, u32) {
    match kind {
        PeriodKind::Day => (date.year(), date.month(), date.day()),
        PeriodKind::Month => (date.year(), date.month(), 0),
        PeriodKind::Year => (date.year(), 0, 0),
    }
}

fn ordinal_suffix(day: u32) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}
