//! Daily records (one per owner per calendar day) and their habit entries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single habit's outcome on one day. Boolean habits use `completed`,
/// numeric habits use `value`; the other field is normally `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitEntry {
  pub entry_id:  Uuid,
  pub record_id: Uuid,
  pub habit_id:  Uuid,
  pub value:     Option<f64>,
  pub completed: Option<bool>,
}

impl HabitEntry {
  /// Whether this entry counts as a completion for weekly scoring.
  ///
  /// Numeric values are stored but never count.
  pub fn is_completion(&self) -> bool { self.completed == Some(true) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
  pub record_id:    Uuid,
  pub owner_id:     Uuid,
  pub date:         NaiveDate,
  /// Weak back-reference to the week this day belongs to. `None` for records
  /// written before weeks were tracked; such records are still members of
  /// their week by date.
  pub aggregate_id: Option<Uuid>,
  pub notes:        Option<String>,
  pub entries:      Vec<HabitEntry>,
}

impl DailyRecord {
  pub fn entry_for(&self, habit_id: Uuid) -> Option<&HabitEntry> {
    self.entries.iter().find(|e| e.habit_id == habit_id)
  }

  pub fn completed(&self, habit_id: Uuid) -> bool {
    self.entry_for(habit_id).is_some_and(HabitEntry::is_completion)
  }
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct EntryInput {
  pub habit_id:  Uuid,
  #[serde(default)]
  pub value:     Option<f64>,
  #[serde(default)]
  pub completed: Option<bool>,
}

impl EntryInput {
  pub fn done(habit_id: Uuid) -> Self {
    Self { habit_id, value: None, completed: Some(true) }
  }

  pub fn skipped(habit_id: Uuid) -> Self {
    Self { habit_id, value: None, completed: Some(false) }
  }

  pub fn measured(habit_id: Uuid, value: f64) -> Self {
    Self { habit_id, value: Some(value), completed: None }
  }
}

/// Input to [`crate::store::TrackerStore::upsert_daily_record`].
///
/// Entries are upserted by habit; habits not mentioned keep whatever was
/// logged for them earlier that day.
#[derive(Debug, Clone, Deserialize)]
pub struct DailyRecordInput {
  pub date:      NaiveDate,
  #[serde(default)]
  pub notes:     Option<String>,
  /// Seeds the week's scheme if the week has no aggregate yet; ignored
  /// otherwise. Defaults to the owner's preferred scheme.
  #[serde(default)]
  pub scheme_id: Option<Uuid>,
  #[serde(default)]
  pub entries:   Vec<EntryInput>,
}

impl DailyRecordInput {
  pub fn new(date: NaiveDate, entries: Vec<EntryInput>) -> Self {
    Self { date, notes: None, scheme_id: None, entries }
  }
}
