//! Weeks: Monday-aligned date arithmetic and the weekly aggregate record.

use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  Error, Result,
  record::DailyRecord,
  scheme::{ScoredHabitRule, ScoringScheme},
  scoring::WeeklyScores,
};

// ─── Date arithmetic ─────────────────────────────────────────────────────────

fn out_of_range(date: NaiveDate) -> Error {
  Error::Validation(format!("the week of {date} is outside the representable range"))
}

/// The Monday on or before `date`.
pub fn week_start_of(date: NaiveDate) -> Result<NaiveDate> {
  let back = u64::from(date.weekday().num_days_from_monday());
  date.checked_sub_days(Days::new(back)).ok_or_else(|| out_of_range(date))
}

/// The Sunday closing the week that starts on `week_start`.
pub fn week_end_of(week_start: NaiveDate) -> Result<NaiveDate> {
  week_start
    .checked_add_days(Days::new(6))
    .ok_or_else(|| out_of_range(week_start))
}

pub fn is_week_start(date: NaiveDate) -> bool {
  date.weekday().num_days_from_monday() == 0
}

/// `count` consecutive week starts ending with the week containing
/// `through`, oldest first.
pub fn recent_week_starts(through: NaiveDate, count: u32) -> Result<Vec<NaiveDate>> {
  let last = week_start_of(through)?;
  (0..count)
    .rev()
    .map(|back| {
      last
        .checked_sub_days(Days::new(7 * u64::from(back)))
        .ok_or_else(|| out_of_range(through))
    })
    .collect()
}

// ─── Weekly aggregate ────────────────────────────────────────────────────────

/// The per-owner, per-week record holding the bound scheme and cached score.
///
/// `week_start` never changes after creation. `scheme_id` changes only through
/// a scheme switch, `score` only through recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyAggregate {
  pub aggregate_id: Uuid,
  pub owner_id:     Uuid,
  pub week_start:   NaiveDate,
  pub scheme_id:    Uuid,
  /// `None` until the first recomputation.
  pub score:        Option<f64>,
  pub created_at:   DateTime<Utc>,
}

impl WeeklyAggregate {
  pub fn week_end(&self) -> Result<NaiveDate> { week_end_of(self.week_start) }
}

/// A weekly aggregate with the scheme it is scored against.
///
/// `active_scheme` is the owner's globally active scheme, which may differ
/// from the week's bound scheme (or be absent). Scoring always follows the
/// bound scheme; which of the two drives "today's habits" is left to the
/// caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekView {
  pub aggregate:     WeeklyAggregate,
  pub scheme:        ScoringScheme,
  pub rules:         Vec<ScoredHabitRule>,
  pub active_scheme: Option<ScoringScheme>,
}

/// Full breakdown of a week, computed from current state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeekReport {
  pub view:    WeekView,
  pub records: Vec<DailyRecord>,
  pub scores:  WeeklyScores,
}

/// One point of the score history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekScore {
  pub week_start:  NaiveDate,
  /// 0 for weeks that were never tracked.
  pub score:       f64,
  pub scheme_name: Option<String>,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
  }

  #[test]
  fn week_start_is_monday_on_or_before() {
    // 2024-06-10 is a Monday.
    assert_eq!(week_start_of(d(2024, 6, 10)).unwrap(), d(2024, 6, 10));
    assert_eq!(week_start_of(d(2024, 6, 12)).unwrap(), d(2024, 6, 10));
    assert_eq!(week_start_of(d(2024, 6, 16)).unwrap(), d(2024, 6, 10));
    assert_eq!(week_start_of(d(2024, 6, 17)).unwrap(), d(2024, 6, 17));
  }

  #[test]
  fn week_start_crosses_year_boundary() {
    // 2025-01-01 is a Wednesday.
    assert_eq!(week_start_of(d(2025, 1, 1)).unwrap(), d(2024, 12, 30));
  }

  #[test]
  fn week_end_is_six_days_later() {
    assert_eq!(week_end_of(d(2024, 6, 10)).unwrap(), d(2024, 6, 16));
  }

  #[test]
  fn is_week_start_only_for_mondays() {
    assert!(is_week_start(d(2024, 6, 10)));
    assert!(!is_week_start(d(2024, 6, 11)));
    assert!(!is_week_start(d(2024, 6, 9)));
  }

  #[test]
  fn recent_week_starts_oldest_first() {
    let weeks = recent_week_starts(d(2024, 6, 13), 3).unwrap();
    assert_eq!(weeks, vec![d(2024, 5, 27), d(2024, 6, 3), d(2024, 6, 10)]);
  }

  #[test]
  fn recent_week_starts_zero_is_empty() {
    assert!(recent_week_starts(d(2024, 6, 13), 0).unwrap().is_empty());
  }

  #[test]
  fn arithmetic_at_calendar_limits_is_an_error() {
    assert!(matches!(week_end_of(NaiveDate::MAX), Err(Error::Validation(_))));
    assert!(matches!(week_start_of(NaiveDate::MIN), Err(Error::Validation(_))));
    assert!(matches!(
      recent_week_starts(NaiveDate::MIN, 104),
      Err(Error::Validation(_))
    ));
  }
}
