//! Scoring schemes and the weighted rules they are made of.
//!
//! A scheme is a named set of [`ScoredHabitRule`]s. Each rule says how much of
//! the 100-point weekly total one habit is worth (its weight relative to the
//! other rules) and how many completions per week earn that share in full.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a rule turns completions into points.
///
/// Only [`ScoringKind::LinearPositiveCapped`] is evaluated today; the other
/// tags are accepted and stored so schemes can be authored ahead of the
/// engine, and are scored linearly until they gain their own modes.
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
pub enum ScoringKind {
  #[default]
  LinearPositiveCapped,
  LinearNegativeCapped,
  ThresholdTarget,
  OneOffBonus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringScheme {
  pub scheme_id:  Uuid,
  pub owner_id:   Uuid,
  pub name:       String,
  /// Global "active" marker. At most one scheme per owner carries it. It only
  /// seeds newly created weeks; each week keeps its own bound scheme.
  pub is_active:  bool,
  pub created_at: DateTime<Utc>,
}

/// One habit's share of a scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredHabitRule {
  pub rule_id:          Uuid,
  pub scheme_id:        Uuid,
  pub habit_id:         Uuid,
  /// Read-only; joined from the habit for display.
  pub habit_name:       String,
  pub weight:           f64,
  pub target_frequency: u32,
  pub scoring_kind:     ScoringKind,
}

/// A scheme together with its rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemeWithRules {
  #[serde(flatten)]
  pub scheme: ScoringScheme,
  pub rules:  Vec<ScoredHabitRule>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input to [`crate::store::TrackerStore::create_scheme`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewScheme {
  pub name:   String,
  /// New schemes become the active one unless told otherwise.
  #[serde(default = "default_true")]
  pub active: bool,
}

fn default_true() -> bool { true }

/// Partial update for a scheme. `active: Some(false)` clears the marker;
/// `active: Some(true)` performs the atomic set-active.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemePatch {
  pub name:   Option<String>,
  pub active: Option<bool>,
}

/// Input to [`crate::store::TrackerStore::add_rule`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
  pub habit_id:         Uuid,
  pub weight:           f64,
  #[serde(default = "default_target")]
  pub target_frequency: u32,
  #[serde(default)]
  pub scoring_kind:     ScoringKind,
}

fn default_target() -> u32 { 1 }

impl NewRule {
  pub fn new(habit_id: Uuid, weight: f64, target_frequency: u32) -> Self {
    Self {
      habit_id,
      weight,
      target_frequency,
      scoring_kind: ScoringKind::default(),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RulePatch {
  pub weight:           Option<f64>,
  pub target_frequency: Option<u32>,
  pub scoring_kind:     Option<ScoringKind>,
}
