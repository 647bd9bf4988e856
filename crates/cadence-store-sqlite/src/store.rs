//! [`SqliteStore`], the SQLite implementation of [`TrackerStore`].

use std::path::Path;

use cadence_core::{
  habit::{Habit, HabitPatch, NewHabit},
  record::{DailyRecord, DailyRecordInput},
  scheme::{
    NewRule, NewScheme, RulePatch, SchemePatch, SchemeWithRules,
    ScoredHabitRule, ScoringScheme,
  },
  store::{RecordOutcome, TrackerStore},
  week::{WeekReport, WeekScore, WeekView},
};
use chrono::NaiveDate;
use rusqlite::Transaction;
use uuid::Uuid;

use crate::{Error, Result, schema::SCHEMA, tx};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cadence store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All
/// statements run serially on the connection's thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run `f` in one transaction on the database thread. Any error rolls the
  /// whole transaction back.
  async fn transact<T, F>(&self, f: F) -> Result<T>
  where
    T: Send + 'static,
    F: FnOnce(&Transaction<'_>) -> Result<T> + Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(tx::with_tx(conn, f)))
      .await?
  }
}

// ─── TrackerStore impl ───────────────────────────────────────────────────────

impl TrackerStore for SqliteStore {
  type Error = Error;

  // ── Habits ────────────────────────────────────────────────────────────────

  async fn add_habit(&self, owner: Uuid, input: NewHabit) -> Result<Habit> {
    self.transact(move |conn| tx::add_habit(conn, owner, input)).await
  }

  async fn list_habits(&self, owner: Uuid) -> Result<Vec<Habit>> {
    self.transact(move |conn| tx::list_habits(conn, owner)).await
  }

  async fn get_habit(&self, owner: Uuid, habit_id: Uuid) -> Result<Option<Habit>> {
    self.transact(move |conn| tx::get_habit(conn, owner, habit_id)).await
  }

  async fn update_habit(
    &self,
    owner:    Uuid,
    habit_id: Uuid,
    patch:    HabitPatch,
  ) -> Result<Habit> {
    self
      .transact(move |conn| tx::update_habit(conn, owner, habit_id, patch))
      .await
  }

  async fn delete_habit(&self, owner: Uuid, habit_id: Uuid) -> Result<()> {
    self.transact(move |conn| tx::delete_habit(conn, owner, habit_id)).await
  }

  // ── Schemes ───────────────────────────────────────────────────────────────

  async fn create_scheme(&self, owner: Uuid, input: NewScheme) -> Result<ScoringScheme> {
    self.transact(move |conn| tx::create_scheme(conn, owner, input)).await
  }

  async fn list_schemes(&self, owner: Uuid) -> Result<Vec<SchemeWithRules>> {
    self.transact(move |conn| tx::list_schemes(conn, owner)).await
  }

  async fn get_scheme(
    &self,
    owner:     Uuid,
    scheme_id: Uuid,
  ) -> Result<Option<SchemeWithRules>> {
    self.transact(move |conn| tx::get_scheme(conn, owner, scheme_id)).await
  }

  async fn update_scheme(
    &self,
    owner:     Uuid,
    scheme_id: Uuid,
    patch:     SchemePatch,
  ) -> Result<ScoringScheme> {
    self
      .transact(move |conn| tx::update_scheme(conn, owner, scheme_id, patch))
      .await
  }

  async fn set_active_scheme(&self, owner: Uuid, scheme_id: Uuid) -> Result<ScoringScheme> {
    self.transact(move |conn| tx::set_active(conn, owner, scheme_id)).await
  }

  async fn delete_scheme(&self, owner: Uuid, scheme_id: Uuid) -> Result<()> {
    self.transact(move |conn| tx::delete_scheme(conn, owner, scheme_id)).await
  }

  // ── Rules ─────────────────────────────────────────────────────────────────

  async fn add_rule(
    &self,
    owner:     Uuid,
    scheme_id: Uuid,
    input:     NewRule,
  ) -> Result<ScoredHabitRule> {
    self
      .transact(move |conn| tx::add_rule(conn, owner, scheme_id, input))
      .await
  }

  async fn update_rule(
    &self,
    owner:   Uuid,
    rule_id: Uuid,
    patch:   RulePatch,
  ) -> Result<ScoredHabitRule> {
    self
      .transact(move |conn| tx::update_rule(conn, owner, rule_id, patch))
      .await
  }

  async fn remove_rule(&self, owner: Uuid, rule_id: Uuid) -> Result<()> {
    self.transact(move |conn| tx::remove_rule(conn, owner, rule_id)).await
  }

  // ── Weekly aggregates ─────────────────────────────────────────────────────

  async fn ensure_weekly_aggregate(
    &self,
    owner:     Uuid,
    date:      NaiveDate,
    scheme_id: Option<Uuid>,
  ) -> Result<WeekView> {
    self
      .transact(move |conn| tx::ensure_week_view(conn, owner, date, scheme_id))
      .await
  }

  async fn get_week(&self, owner: Uuid, week_start: NaiveDate) -> Result<Option<WeekView>> {
    self.transact(move |conn| tx::get_week(conn, owner, week_start)).await
  }

  async fn recompute_score(&self, aggregate_id: Uuid) -> Result<f64> {
    self.transact(move |conn| tx::recompute(conn, aggregate_id)).await
  }

  async fn change_scheme(
    &self,
    owner:          Uuid,
    week_start:     NaiveDate,
    scheme_id:      Uuid,
    confirm_delete: bool,
  ) -> Result<WeekView> {
    self
      .transact(move |conn| {
        tx::change_scheme(conn, owner, week_start, scheme_id, confirm_delete)
      })
      .await
  }

  async fn weekly_report(
    &self,
    owner:      Uuid,
    week_start: NaiveDate,
  ) -> Result<Option<WeekReport>> {
    self
      .transact(move |conn| tx::weekly_report(conn, owner, week_start))
      .await
  }

  async fn score_history(
    &self,
    owner:   Uuid,
    through: NaiveDate,
    weeks:   u32,
  ) -> Result<Vec<WeekScore>> {
    self
      .transact(move |conn| tx::score_history(conn, owner, through, weeks))
      .await
  }

  // ── Daily records ─────────────────────────────────────────────────────────

  async fn upsert_daily_record(
    &self,
    owner: Uuid,
    input: DailyRecordInput,
  ) -> Result<RecordOutcome> {
    self
      .transact(move |conn| tx::upsert_daily_record(conn, owner, input))
      .await
  }

  async fn get_daily_record(
    &self,
    owner: Uuid,
    date:  NaiveDate,
  ) -> Result<Option<DailyRecord>> {
    self
      .transact(move |conn| tx::get_daily_record(conn, owner, date))
      .await
  }

  async fn list_week_records(
    &self,
    owner:      Uuid,
    week_start: NaiveDate,
  ) -> Result<Vec<DailyRecord>> {
    self
      .transact(move |conn| tx::list_week_records(conn, owner, week_start))
      .await
  }

  async fn link_orphan_records(&self, owner: Uuid) -> Result<usize> {
    self
      .transact(move |conn| tx::link_orphan_records(conn, owner))
      .await
  }
}
