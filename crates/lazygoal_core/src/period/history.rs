//! Trailing-window history grouping.
//!
//! # Responsibility
//! - Select goals inside a trailing window ending at `now`.
//! - Group them under calendar labels, most recent first.
//!
//! # Invariants
//! - Each window reads exactly one goal kind.
//! - Group order is first occurrence in date-descending order, not label order.
//! - The 30-day window labels carry day precision; the others only month+year.

use super::bucket::{resolve_local, shift_local, StepDirection};
use crate::model::goal::{Goal, PeriodKind};
use chrono::{DateTime, Days, TimeZone};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// Trailing history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistoryWindow {
    /// Day goals from the last 30 days.
    Last30Days,
    /// Month goals from the last 12 months.
    Last12Months,
    /// Year goals from the last 5 years.
    Last5Years,
}

impl HistoryWindow {
    pub const ALL: [HistoryWindow; 3] = [
        HistoryWindow::Last30Days,
        HistoryWindow::Last12Months,
        HistoryWindow::Last5Years,
    ];

    /// Goal kind shown by this window.
    pub fn kind(self) -> PeriodKind {
        match self {
            Self::Last30Days => PeriodKind::Day,
            Self::Last12Months => PeriodKind::Month,
            Self::Last5Years => PeriodKind::Year,
        }
    }

    /// Stable wire label (`30days|12months|5years`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Last30Days => "30days",
            Self::Last12Months => "12months",
            Self::Last5Years => "5years",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "30days" => Some(Self::Last30Days),
            "12months" => Some(Self::Last12Months),
            "5years" => Some(Self::Last5Years),
            _ => None,
        }
    }

    /// Exclusive lower bound: goals must be dated strictly after it.
    pub fn cutoff<Tz: TimeZone>(self, now: &DateTime<Tz>) -> DateTime<Tz> {
        let shifted = match self {
            Self::Last30Days => now
                .naive_local()
                .checked_sub_days(Days::new(30))
                .map(|naive| resolve_local(&now.timezone(), naive)),
            Self::Last12Months => shift_local(now, false, 12, StepDirection::Previous),
            Self::Last5Years => shift_local(now, false, 60, StepDirection::Previous),
        };
        shifted.unwrap_or_else(|| now.clone())
    }

    fn label<Tz: TimeZone>(self, date: &DateTime<Tz>) -> String
    where
        Tz::Offset: std::fmt::Display,
    {
        match self {
            Self::Last30Days => date.format("%b %-d, %Y").to_string(),
            Self::Last12Months | Self::Last5Years => date.format("%b %Y").to_string(),
        }
    }
}

impl Display for HistoryWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labeled history section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryGroup {
    pub label: String,
    pub goals: Vec<Goal>,
}

/// Groups goals of the window's kind dated after the window cutoff.
///
/// Labels are rendered in the zone of `now`.
pub fn group_for_history<Tz: TimeZone>(
    goals: &[Goal],
    window: HistoryWindow,
    now: &DateTime<Tz>,
) -> Vec<HistoryGroup>
where
    Tz::Offset: std::fmt::Display,
{
    let kind = window.kind();
    let cutoff = window.cutoff(now);
    let tz = now.timezone();

    let mut selected = goals
        .iter()
        .filter(|goal| goal.kind == kind && goal.date > cutoff)
        .collect::<Vec<_>>();
    selected.sort_by(|a, b| b.date.cmp(&a.date));

    let mut groups: Vec<HistoryGroup> = Vec::new();
    let mut index_by_label: HashMap<String, usize> = HashMap::new();
    for goal in selected {
        let label = window.label(&goal.date.with_timezone(&tz));
        match index_by_label.get(&label) {
            Some(&index) => groups[index].goals.push(goal.clone()),
            None => {
                index_by_label.insert(label.clone(), groups.len());
                groups.push(HistoryGroup {
                    label,
                    goals: vec![goal.clone()],
                });
            }
        }
    }
    groups
}
