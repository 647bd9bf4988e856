//! Habits: the things a user tracks day to day.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a habit is logged on a given day.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  strum::Display,
  strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum HabitKind {
  /// Done or not done.
  #[default]
  Boolean,
  /// A measured quantity (minutes, pages, glasses of water).
  Numeric,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
  pub habit_id:    Uuid,
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: Option<String>,
  pub kind:        HabitKind,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::TrackerStore::add_habit`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewHabit {
  pub name:        String,
  #[serde(default)]
  pub description: Option<String>,
  #[serde(default)]
  pub kind:        HabitKind,
}

/// Partial update for [`crate::store::TrackerStore::update_habit`]; absent
/// fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HabitPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
  pub kind:        Option<HabitKind>,
}
