//! The `TrackerStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `cadence-store-sqlite`).
//! The API layer depends on this abstraction, not on any concrete backend.
//!
//! Every mutating method is a single atomic unit: either all of its effects
//! (including the recomputed weekly score) become visible, or none do.

use std::future::Future;

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{
  Coded,
  habit::{Habit, HabitPatch, NewHabit},
  record::{DailyRecord, DailyRecordInput},
  scheme::{
    NewRule, NewScheme, RulePatch, SchemePatch, SchemeWithRules,
    ScoredHabitRule, ScoringScheme,
  },
  week::{WeekReport, WeekScore, WeekView, WeeklyAggregate},
};

/// Result of [`TrackerStore::upsert_daily_record`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct RecordOutcome {
  pub record:    DailyRecord,
  /// The record's week, with its freshly recomputed score.
  pub aggregate: WeeklyAggregate,
}

/// Abstraction over a Cadence store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait TrackerStore: Send + Sync {
  type Error: std::error::Error + Coded + Send + Sync + 'static;

  // ── Habits ────────────────────────────────────────────────────────────

  fn add_habit(
    &self,
    owner: Uuid,
    input: NewHabit,
  ) -> impl Future<Output = Result<Habit, Self::Error>> + Send + '_;

  fn list_habits(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<Habit>, Self::Error>> + Send + '_;

  fn get_habit(
    &self,
    owner: Uuid,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<Option<Habit>, Self::Error>> + Send + '_;

  /// Rename or re-describe a habit, or change its kind. A kind change is
  /// refused while the habit has logged entries.
  fn update_habit(
    &self,
    owner: Uuid,
    habit_id: Uuid,
    patch: HabitPatch,
  ) -> impl Future<Output = Result<Habit, Self::Error>> + Send + '_;

  /// Delete a habit together with its rules and logged entries, and
  /// recompute every week that scored or logged it. One transaction.
  fn delete_habit(
    &self,
    owner: Uuid,
    habit_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Schemes ───────────────────────────────────────────────────────────

  /// Create a scheme. If `input.active`, it becomes the owner's only active
  /// scheme in the same transaction.
  fn create_scheme(
    &self,
    owner: Uuid,
    input: NewScheme,
  ) -> impl Future<Output = Result<ScoringScheme, Self::Error>> + Send + '_;

  /// All schemes of `owner` with their rules, oldest first.
  fn list_schemes(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<Vec<SchemeWithRules>, Self::Error>> + Send + '_;

  fn get_scheme(
    &self,
    owner: Uuid,
    scheme_id: Uuid,
  ) -> impl Future<Output = Result<Option<SchemeWithRules>, Self::Error>> + Send + '_;

  fn update_scheme(
    &self,
    owner: Uuid,
    scheme_id: Uuid,
    patch: SchemePatch,
  ) -> impl Future<Output = Result<ScoringScheme, Self::Error>> + Send + '_;

  /// Mark `scheme_id` active and clear the marker on every other scheme of
  /// `owner`, atomically. No reader ever sees zero or two active schemes.
  fn set_active_scheme(
    &self,
    owner: Uuid,
    scheme_id: Uuid,
  ) -> impl Future<Output = Result<ScoringScheme, Self::Error>> + Send + '_;

  /// Delete a scheme and its rules. Refused for the active scheme and for a
  /// scheme any week is bound to.
  fn delete_scheme(
    &self,
    owner: Uuid,
    scheme_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Rules ─────────────────────────────────────────────────────────────

  fn add_rule(
    &self,
    owner: Uuid,
    scheme_id: Uuid,
    input: NewRule,
  ) -> impl Future<Output = Result<ScoredHabitRule, Self::Error>> + Send + '_;

  fn update_rule(
    &self,
    owner: Uuid,
    rule_id: Uuid,
    patch: RulePatch,
  ) -> impl Future<Output = Result<ScoredHabitRule, Self::Error>> + Send + '_;

  fn remove_rule(
    &self,
    owner: Uuid,
    rule_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Weekly aggregates ─────────────────────────────────────────────────

  /// Return the aggregate for the week containing `date`, creating it if
  /// needed.
  ///
  /// `scheme_id` only seeds a new aggregate; an existing one is returned
  /// unchanged. Without `scheme_id` the owner's active scheme (else newest)
  /// is used. Concurrent callers for the same week converge on one row.
  fn ensure_weekly_aggregate(
    &self,
    owner: Uuid,
    date: NaiveDate,
    scheme_id: Option<Uuid>,
  ) -> impl Future<Output = Result<WeekView, Self::Error>> + Send + '_;

  fn get_week(
    &self,
    owner: Uuid,
    week_start: NaiveDate,
  ) -> impl Future<Output = Result<Option<WeekView>, Self::Error>> + Send + '_;

  /// Re-score the aggregate from current state and persist the total.
  fn recompute_score(
    &self,
    aggregate_id: Uuid,
  ) -> impl Future<Output = Result<f64, Self::Error>> + Send + '_;

  /// Rebind the week starting on `week_start` to `scheme_id`.
  ///
  /// If the week has daily records and `confirm_delete` is false, fails with
  /// a `NeedsConfirmation` error and changes nothing. With confirmation the
  /// records and their entries are deleted, the scheme rebound, and the score
  /// recomputed, all in one transaction.
  fn change_scheme(
    &self,
    owner: Uuid,
    week_start: NaiveDate,
    scheme_id: Uuid,
    confirm_delete: bool,
  ) -> impl Future<Output = Result<WeekView, Self::Error>> + Send + '_;

  /// Per-habit breakdown of a week, computed from current state.
  fn weekly_report(
    &self,
    owner: Uuid,
    week_start: NaiveDate,
  ) -> impl Future<Output = Result<Option<WeekReport>, Self::Error>> + Send + '_;

  /// Scores of the `weeks` weeks ending with the week containing `through`,
  /// oldest first. Aggregates never scored are recomputed on the way.
  fn score_history(
    &self,
    owner: Uuid,
    through: NaiveDate,
    weeks: u32,
  ) -> impl Future<Output = Result<Vec<WeekScore>, Self::Error>> + Send + '_;

  // ── Daily records ─────────────────────────────────────────────────────

  /// Write one day's log: ensure the week, upsert the record and its entries,
  /// recompute the week's score. One transaction.
  fn upsert_daily_record(
    &self,
    owner: Uuid,
    input: DailyRecordInput,
  ) -> impl Future<Output = Result<RecordOutcome, Self::Error>> + Send + '_;

  fn get_daily_record(
    &self,
    owner: Uuid,
    date: NaiveDate,
  ) -> impl Future<Output = Result<Option<DailyRecord>, Self::Error>> + Send + '_;

  /// Records dated within the week starting on `week_start`, by date.
  fn list_week_records(
    &self,
    owner: Uuid,
    week_start: NaiveDate,
  ) -> impl Future<Output = Result<Vec<DailyRecord>, Self::Error>> + Send + '_;

  /// Link every record of `owner` that has no week back-reference to its
  /// week's aggregate (creating it if missing), then recompute those weeks.
  /// Returns the number of records linked.
  fn link_orphan_records(
    &self,
    owner: Uuid,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;
}
