//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings, calendar dates as `YYYY-MM-DD`
//! (so lexical order is date order), enums as their snake_case names, and
//! UUIDs as hyphenated lowercase strings.

use cadence_core::{
  habit::{Habit, HabitKind},
  record::HabitEntry,
  scheme::{ScoredHabitRule, ScoringKind, ScoringScheme},
  week::WeeklyAggregate,
};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::Decode(format!("timestamp {s:?}: {e}")))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::Decode(format!("date {s:?}: {e}")))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_habit_kind(s: &str) -> Result<HabitKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown habit kind: {s:?}")))
}

pub fn decode_scoring_kind(s: &str) -> Result<ScoringKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown scoring kind: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const HABIT_COLUMNS: &str =
  "habit_id, owner_id, name, description, kind, created_at";

/// Raw strings read directly from a `habits` row.
pub struct RawHabit {
  pub habit_id:    String,
  pub owner_id:    String,
  pub name:        String,
  pub description: Option<String>,
  pub kind:        String,
  pub created_at:  String,
}

impl RawHabit {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      habit_id:    row.get(0)?,
      owner_id:    row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      kind:        row.get(4)?,
      created_at:  row.get(5)?,
    })
  }

  pub fn into_habit(self) -> Result<Habit> {
    Ok(Habit {
      habit_id:    decode_uuid(&self.habit_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      name:        self.name,
      description: self.description,
      kind:        decode_habit_kind(&self.kind)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const SCHEME_COLUMNS: &str =
  "scheme_id, owner_id, name, is_active, created_at";

/// Raw values read directly from a `scoring_schemes` row.
pub struct RawScheme {
  pub scheme_id:  String,
  pub owner_id:   String,
  pub name:       String,
  pub is_active:  bool,
  pub created_at: String,
}

impl RawScheme {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      scheme_id:  row.get(0)?,
      owner_id:   row.get(1)?,
      name:       row.get(2)?,
      is_active:  row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_scheme(self) -> Result<ScoringScheme> {
    Ok(ScoringScheme {
      scheme_id:  decode_uuid(&self.scheme_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      name:       self.name,
      is_active:  self.is_active,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

/// Rule columns joined with the habit name; expects `r` = rules, `h` = habits.
pub const RULE_COLUMNS: &str = "r.rule_id, r.scheme_id, r.habit_id, h.name, \
                                r.weight, r.target_frequency, r.scoring_kind";

pub struct RawRule {
  pub rule_id:          String,
  pub scheme_id:        String,
  pub habit_id:         String,
  pub habit_name:       String,
  pub weight:           f64,
  pub target_frequency: u32,
  pub scoring_kind:     String,
}

impl RawRule {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rule_id:          row.get(0)?,
      scheme_id:        row.get(1)?,
      habit_id:         row.get(2)?,
      habit_name:       row.get(3)?,
      weight:           row.get(4)?,
      target_frequency: row.get(5)?,
      scoring_kind:     row.get(6)?,
    })
  }

  pub fn into_rule(self) -> Result<ScoredHabitRule> {
    Ok(ScoredHabitRule {
      rule_id:          decode_uuid(&self.rule_id)?,
      scheme_id:        decode_uuid(&self.scheme_id)?,
      habit_id:         decode_uuid(&self.habit_id)?,
      habit_name:       self.habit_name,
      weight:           self.weight,
      target_frequency: self.target_frequency,
      scoring_kind:     decode_scoring_kind(&self.scoring_kind)?,
    })
  }
}

pub const AGGREGATE_COLUMNS: &str =
  "aggregate_id, owner_id, week_start, scheme_id, score, created_at";

pub struct RawAggregate {
  pub aggregate_id: String,
  pub owner_id:     String,
  pub week_start:   String,
  pub scheme_id:    String,
  pub score:        Option<f64>,
  pub created_at:   String,
}

impl RawAggregate {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      aggregate_id: row.get(0)?,
      owner_id:     row.get(1)?,
      week_start:   row.get(2)?,
      scheme_id:    row.get(3)?,
      score:        row.get(4)?,
      created_at:   row.get(5)?,
    })
  }

  pub fn into_aggregate(self) -> Result<WeeklyAggregate> {
    Ok(WeeklyAggregate {
      aggregate_id: decode_uuid(&self.aggregate_id)?,
      owner_id:     decode_uuid(&self.owner_id)?,
      week_start:   decode_date(&self.week_start)?,
      scheme_id:    decode_uuid(&self.scheme_id)?,
      score:        self.score,
      created_at:   decode_dt(&self.created_at)?,
    })
  }
}

pub const RECORD_COLUMNS: &str =
  "record_id, owner_id, date, aggregate_id, notes";

/// A `daily_records` row; entries are attached separately.
pub struct RawRecord {
  pub record_id:    String,
  pub owner_id:     String,
  pub date:         String,
  pub aggregate_id: Option<String>,
  pub notes:        Option<String>,
}

impl RawRecord {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      record_id:    row.get(0)?,
      owner_id:     row.get(1)?,
      date:         row.get(2)?,
      aggregate_id: row.get(3)?,
      notes:        row.get(4)?,
    })
  }
}

pub const ENTRY_COLUMNS: &str =
  "entry_id, record_id, habit_id, value, completed";

pub struct RawEntry {
  pub entry_id:  String,
  pub record_id: String,
  pub habit_id:  String,
  pub value:     Option<f64>,
  pub completed: Option<bool>,
}

impl RawEntry {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      entry_id:  row.get(0)?,
      record_id: row.get(1)?,
      habit_id:  row.get(2)?,
      value:     row.get(3)?,
      completed: row.get(4)?,
    })
  }

  pub fn into_entry(self) -> Result<HabitEntry> {
    Ok(HabitEntry {
      entry_id:  decode_uuid(&self.entry_id)?,
      record_id: decode_uuid(&self.record_id)?,
      habit_id:  decode_uuid(&self.habit_id)?,
      value:     self.value,
      completed: self.completed,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dates_sort_lexically() {
    let a = encode_date(NaiveDate::from_ymd_opt(2024, 9, 30).unwrap());
    let b = encode_date(NaiveDate::from_ymd_opt(2024, 10, 7).unwrap());
    assert_eq!(a, "2024-09-30");
    assert!(a < b);
  }

  #[test]
  fn date_round_trip_and_rejects_garbage() {
    let d = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
    assert_eq!(decode_date(&encode_date(d)).unwrap(), d);
    assert!(matches!(decode_date("06/01/2025"), Err(Error::Decode(_))));
  }

  #[test]
  fn enum_columns_use_snake_case() {
    assert_eq!(HabitKind::Numeric.to_string(), "numeric");
    assert_eq!(
      ScoringKind::LinearPositiveCapped.to_string(),
      "linear_positive_capped"
    );
    assert_eq!(
      decode_scoring_kind("one_off_bonus").unwrap(),
      ScoringKind::OneOffBonus
    );
    assert!(decode_habit_kind("percent").is_err());
  }
}
