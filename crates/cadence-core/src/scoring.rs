//! The weekly scoring calculator.
//!
//! Pure and deterministic: given a scheme's rules and the daily records of one
//! week, produce each habit's share of the week and the 0–100 total.
//!
//! For every rule:
//!
//! - `score_max = weight / Σ weights * 100` (0 for every rule when the weights
//!   sum to 0),
//! - `ratio = min(completions / target, 1)` with `target = max(target_frequency, 1)`,
//! - `weekly_score = ratio * score_max`.
//!
//! The total is the sum of `weekly_score` over all rules in input order. With
//! positive weights the `score_max` values sum to 100, so the total stays in
//! `[0, 100]`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{record::DailyRecord, scheme::ScoredHabitRule};

/// One rule's contribution to the week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitScore {
  pub habit_id:              Uuid,
  pub habit_name:            String,
  /// Days in the week on which the habit was marked completed.
  pub weekly_completions:    u32,
  pub target:                u32,
  pub score_max:             f64,
  /// `weekly_completions / target`, capped at 1.
  pub ratio:                 f64,
  pub weekly_score:          f64,
  /// Informational; not part of the total.
  pub points_per_completion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyScores {
  pub per_habit:        Vec<HabitScore>,
  pub total:            f64,
  /// Largest `score_max` among the rules, for normalising progress bars.
  pub max_among_habits: f64,
}

impl WeeklyScores {
  pub fn empty() -> Self {
    Self { per_habit: Vec::new(), total: 0.0, max_among_habits: 0.0 }
  }

  pub fn for_habit(&self, habit_id: Uuid) -> Option<&HabitScore> {
    self.per_habit.iter().find(|h| h.habit_id == habit_id)
  }

  /// The total as a percentage of `max_total`, clamped to `[0, 100]`.
  pub fn total_percent(&self, max_total: f64) -> f64 {
    if max_total <= 0.0 || !self.total.is_finite() {
      return 0.0;
    }
    self.total.clamp(0.0, max_total) / max_total * 100.0
  }
}

/// Number of records in which `habit_id` is marked completed.
///
/// A record without an entry for the habit counts as not completed.
pub fn weekly_completions(records: &[DailyRecord], habit_id: Uuid) -> u32 {
  records.iter().filter(|r| r.completed(habit_id)).count() as u32
}

/// `weight`'s share of 100 points among `total_weight`.
pub fn score_max(weight: f64, total_weight: f64) -> f64 {
  if total_weight == 0.0 {
    return 0.0;
  }
  weight / total_weight * 100.0
}

/// Score one week of `records` against `rules`.
pub fn score_week(rules: &[ScoredHabitRule], records: &[DailyRecord]) -> WeeklyScores {
  if rules.is_empty() {
    return WeeklyScores::empty();
  }

  let total_weight: f64 = rules.iter().map(|r| r.weight).sum();

  let per_habit: Vec<HabitScore> = rules
    .iter()
    .map(|rule| {
      let weekly_completions = weekly_completions(records, rule.habit_id);
      let target = rule.target_frequency.max(1);
      let score_max = score_max(rule.weight, total_weight);
      let ratio = (f64::from(weekly_completions) / f64::from(target)).min(1.0);

      HabitScore {
        habit_id: rule.habit_id,
        habit_name: rule.habit_name.clone(),
        weekly_completions,
        target,
        score_max,
        ratio,
        weekly_score: ratio * score_max,
        points_per_completion: score_max / f64::from(target),
      }
    })
    .collect();

  let total = per_habit.iter().map(|h| h.weekly_score).sum();
  let max_among_habits = per_habit
    .iter()
    .map(|h| h.score_max)
    .fold(0.0_f64, f64::max);

  WeeklyScores { per_habit, total, max_among_habits }
}
