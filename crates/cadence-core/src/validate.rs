//! Boundary checks applied before anything touches the store.
//!
//! Every function returns [`Error::Validation`] with a message suitable for
//! showing to the caller.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};

use crate::{
  Error, Result,
  habit::HabitKind,
  record::{DailyRecordInput, EntryInput},
  scheme::{NewRule, RulePatch},
  week::{is_week_start, week_end_of, week_start_of},
};

/// Longest score history a caller may request.
pub const MAX_HISTORY_WEEKS: u32 = 104;

/// Years a tracked week may fall in. Dates are stored as `YYYY-MM-DD` text and
/// compared lexically, which only holds for four-digit years.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

/// Reject dates whose week reaches outside [`MIN_YEAR`]..=[`MAX_YEAR`].
pub fn date(date: NaiveDate) -> Result<()> {
  let start = week_start_of(date)?;
  let end = week_end_of(start)?;
  if start.year() < MIN_YEAR || end.year() > MAX_YEAR {
    return Err(Error::Validation(format!(
      "the week of {date} falls outside years {MIN_YEAR} to {MAX_YEAR}"
    )));
  }
  Ok(())
}

pub fn week_start(date: NaiveDate) -> Result<()> {
  self::date(date)?;
  if !is_week_start(date) {
    return Err(Error::Validation(format!(
      "week start {date} is not a Monday"
    )));
  }
  Ok(())
}

pub fn weight(weight: f64) -> Result<()> {
  if !weight.is_finite() || weight <= 0.0 {
    return Err(Error::Validation(format!(
      "weight must be a positive number, got {weight}"
    )));
  }
  Ok(())
}

pub fn target_frequency(target: u32) -> Result<()> {
  if target == 0 {
    return Err(Error::Validation(
      "target frequency must be at least 1".to_string(),
    ));
  }
  Ok(())
}

/// Trim `name` and reject it if nothing is left.
pub fn name(what: &str, name: &str) -> Result<String> {
  let trimmed = name.trim();
  if trimmed.is_empty() {
    return Err(Error::Validation(format!("{what} name must not be empty")));
  }
  Ok(trimmed.to_string())
}

pub fn new_rule(rule: &NewRule) -> Result<()> {
  weight(rule.weight)?;
  target_frequency(rule.target_frequency)
}

pub fn rule_patch(patch: &RulePatch) -> Result<()> {
  if let Some(w) = patch.weight {
    weight(w)?;
  }
  if let Some(t) = patch.target_frequency {
    target_frequency(t)?;
  }
  Ok(())
}

pub fn daily_record(input: &DailyRecordInput) -> Result<()> {
  date(input.date)?;
  let mut seen = HashSet::with_capacity(input.entries.len());
  for entry in &input.entries {
    if !seen.insert(entry.habit_id) {
      return Err(Error::Validation(format!(
        "habit {} appears more than once",
        entry.habit_id
      )));
    }
    if let Some(v) = entry.value
      && !v.is_finite()
    {
      return Err(Error::Validation(format!(
        "value for habit {} is not a finite number",
        entry.habit_id
      )));
    }
  }
  Ok(())
}

/// Boolean habits take `completed`, numeric habits take `value`; never both.
pub fn entry_shape(entry: &EntryInput, kind: HabitKind) -> Result<()> {
  let ok = match kind {
    HabitKind::Boolean => entry.completed.is_some() && entry.value.is_none(),
    HabitKind::Numeric => entry.value.is_some() && entry.completed.is_none(),
  };
  if !ok {
    let expected = match kind {
      HabitKind::Boolean => "`completed` and no `value`",
      HabitKind::Numeric => "`value` and no `completed`",
    };
    return Err(Error::Validation(format!(
      "entry for {kind} habit {} must carry {expected}",
      entry.habit_id
    )));
  }
  Ok(())
}

pub fn history_weeks(weeks: u32) -> Result<()> {
  if weeks == 0 || weeks > MAX_HISTORY_WEEKS {
    return Err(Error::Validation(format!(
      "weeks must be between 1 and {MAX_HISTORY_WEEKS}, got {weeks}"
    )));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  #[test]
  fn rejects_non_monday_week_start() {
    let tuesday = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
    assert!(matches!(week_start(tuesday), Err(Error::Validation(_))));
    let monday = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    assert!(week_start(monday).is_ok());
  }

  #[test]
  fn dates_must_keep_their_week_within_four_digit_years() {
    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    assert!(date(d(2024, 6, 12)).is_ok());
    // 0001-01-01 is a Monday; 9999-12-26 is the last full Sunday.
    assert!(date(d(1, 1, 1)).is_ok());
    assert!(date(d(9999, 12, 26)).is_ok());
    for bad in [d(0, 12, 31), d(9999, 12, 27), NaiveDate::MIN, NaiveDate::MAX] {
      assert!(matches!(date(bad), Err(Error::Validation(_))), "accepted {bad}");
    }
    assert!(week_start(NaiveDate::MAX).is_err());
  }

  #[test]
  fn entry_shape_follows_habit_kind() {
    let habit = Uuid::new_v4();
    assert!(entry_shape(&EntryInput::done(habit), HabitKind::Boolean).is_ok());
    assert!(entry_shape(&EntryInput::measured(habit, 2.5), HabitKind::Numeric).is_ok());

    assert!(entry_shape(&EntryInput::done(habit), HabitKind::Numeric).is_err());
    assert!(entry_shape(&EntryInput::measured(habit, 2.5), HabitKind::Boolean).is_err());
    let both = EntryInput { habit_id: habit, value: Some(1.0), completed: Some(true) };
    assert!(entry_shape(&both, HabitKind::Boolean).is_err());
    assert!(entry_shape(&both, HabitKind::Numeric).is_err());
    let neither = EntryInput { habit_id: habit, value: None, completed: None };
    assert!(entry_shape(&neither, HabitKind::Boolean).is_err());
  }

  #[test]
  fn rejects_bad_weights() {
    for w in [0.0, -1.0, f64::NAN, f64::INFINITY] {
      assert!(weight(w).is_err(), "accepted {w}");
    }
    assert!(weight(0.25).is_ok());
  }

  #[test]
  fn rejects_zero_target() {
    assert!(target_frequency(0).is_err());
    assert!(target_frequency(1).is_ok());
  }

  #[test]
  fn trims_names() {
    assert_eq!(name("scheme", "  Focus  ").unwrap(), "Focus");
    assert!(name("scheme", "   ").is_err());
  }

  #[test]
  fn rule_patch_checks_only_present_fields() {
    assert!(rule_patch(&RulePatch::default()).is_ok());
    let bad = RulePatch { weight: Some(-2.0), ..Default::default() };
    assert!(rule_patch(&bad).is_err());
  }

  #[test]
  fn rejects_duplicate_habits_in_record() {
    let habit = Uuid::new_v4();
    let date = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
    let input = DailyRecordInput::new(
      date,
      vec![EntryInput::done(habit), EntryInput::skipped(habit)],
    );
    assert!(matches!(daily_record(&input), Err(Error::Validation(_))));
  }

  #[test]
  fn rejects_non_finite_values() {
    let date = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
    let input = DailyRecordInput::new(
      date,
      vec![EntryInput::measured(Uuid::new_v4(), f64::NAN)],
    );
    assert!(daily_record(&input).is_err());
  }

  #[test]
  fn history_window_bounds() {
    assert!(history_weeks(0).is_err());
    assert!(history_weeks(1).is_ok());
    assert!(history_weeks(MAX_HISTORY_WEEKS).is_ok());
    assert!(history_weeks(MAX_HISTORY_WEEKS + 1).is_err());
  }
}
