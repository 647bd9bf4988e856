//! Synchronous statement sequences executed on the database thread.
//!
//! Each public function here runs against a connection that the caller has
//! already wrapped in a transaction (see [`with_tx`]). Functions compose: a
//! daily-record write calls [`ensure_aggregate`] and [`recompute`] on the same
//! transaction, so a reader sees either none or all of their effects.

use std::collections::BTreeSet;

use cadence_core::{
  Error as CoreError,
  habit::{Habit, HabitPatch, NewHabit},
  record::{DailyRecord, DailyRecordInput, HabitEntry},
  scheme::{
    NewRule, NewScheme, RulePatch, SchemePatch, SchemeWithRules,
    ScoredHabitRule, ScoringScheme,
  },
  scoring::score_week,
  store::RecordOutcome,
  validate,
  week::{
    WeekReport, WeekScore, WeekView, WeeklyAggregate, recent_week_starts,
    week_end_of, week_start_of,
  },
};
use chrono::{NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension as _, Params, Row, Transaction};
use uuid::Uuid;

use crate::{
  Result,
  encode::{
    AGGREGATE_COLUMNS, ENTRY_COLUMNS, HABIT_COLUMNS, RECORD_COLUMNS,
    RULE_COLUMNS, RawAggregate, RawEntry, RawHabit, RawRecord, RawRule,
    RawScheme, SCHEME_COLUMNS, decode_date, decode_uuid, encode_date,
    encode_dt, encode_uuid,
  },
};

// ─── Plumbing ────────────────────────────────────────────────────────────────

/// Run `f` inside a transaction, committing only if it succeeds. Dropping an
/// uncommitted transaction rolls it back.
pub fn with_tx<T>(
  conn: &mut Connection,
  f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
  let tx = conn.transaction()?;
  let out = f(&tx)?;
  tx.commit()?;
  Ok(out)
}

fn query_all<T, P, F>(conn: &Connection, sql: &str, params: P, map: F) -> Result<Vec<T>>
where
  P: Params,
  F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
  let mut stmt = conn.prepare(sql)?;
  let rows = stmt
    .query_map(params, map)?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(rows)
}

// ─── Habits ──────────────────────────────────────────────────────────────────

pub fn add_habit(conn: &Connection, owner: Uuid, input: NewHabit) -> Result<Habit> {
  let habit = Habit {
    habit_id:    Uuid::new_v4(),
    owner_id:    owner,
    name:        validate::name("habit", &input.name)?,
    description: input.description,
    kind:        input.kind,
    created_at:  Utc::now(),
  };

  conn.execute(
    "INSERT INTO habits (habit_id, owner_id, name, description, kind, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(habit.habit_id),
      encode_uuid(owner),
      habit.name,
      habit.description,
      habit.kind.to_string(),
      encode_dt(habit.created_at),
    ],
  )?;
  Ok(habit)
}

pub fn list_habits(conn: &Connection, owner: Uuid) -> Result<Vec<Habit>> {
  let sql = format!(
    "SELECT {HABIT_COLUMNS} FROM habits WHERE owner_id = ?1 ORDER BY created_at, rowid"
  );
  query_all(conn, &sql, rusqlite::params![encode_uuid(owner)], RawHabit::from_row)?
    .into_iter()
    .map(RawHabit::into_habit)
    .collect()
}

pub fn get_habit(conn: &Connection, owner: Uuid, habit_id: Uuid) -> Result<Option<Habit>> {
  let sql = format!(
    "SELECT {HABIT_COLUMNS} FROM habits WHERE habit_id = ?1 AND owner_id = ?2"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(habit_id), encode_uuid(owner)],
      RawHabit::from_row,
    )
    .optional()?
    .map(RawHabit::into_habit)
    .transpose()
}

fn require_habit(conn: &Connection, owner: Uuid, habit_id: Uuid) -> Result<Habit> {
  get_habit(conn, owner, habit_id)?
    .ok_or_else(|| CoreError::HabitNotFound(habit_id).into())
}

pub fn update_habit(
  conn: &Connection,
  owner: Uuid,
  habit_id: Uuid,
  patch: HabitPatch,
) -> Result<Habit> {
  let habit = require_habit(conn, owner, habit_id)?;
  let name = patch
    .name
    .as_deref()
    .map(|name| validate::name("habit", name))
    .transpose()?;

  if let Some(kind) = patch.kind
    && kind != habit.kind
  {
    let entries: i64 = conn.query_row(
      "SELECT COUNT(*) FROM habit_entries WHERE habit_id = ?1",
      rusqlite::params![encode_uuid(habit_id)],
      |r| r.get(0),
    )?;
    if entries > 0 {
      return Err(
        CoreError::HabitKindLocked { habit_id, entries: entries as usize }.into(),
      );
    }
  }

  conn.execute(
    "UPDATE habits SET
       name        = COALESCE(?2, name),
       description = COALESCE(?3, description),
       kind        = COALESCE(?4, kind)
     WHERE habit_id = ?1",
    rusqlite::params![
      encode_uuid(habit_id),
      name,
      patch.description,
      patch.kind.map(|k| k.to_string()),
    ],
  )?;

  require_habit(conn, owner, habit_id)
}

/// Delete the habit; rules and entries go with it through the foreign keys.
/// Weeks bound to a scheme that rated the habit are re-scored, since the
/// remaining rules now split the 100 points between them.
pub fn delete_habit(conn: &Connection, owner: Uuid, habit_id: Uuid) -> Result<()> {
  require_habit(conn, owner, habit_id)?;

  let affected: Vec<String> = query_all(
    conn,
    "SELECT a.aggregate_id FROM weekly_aggregates a
     WHERE a.owner_id = ?1
       AND EXISTS (
         SELECT 1 FROM scored_habit_rules r
         WHERE r.scheme_id = a.scheme_id AND r.habit_id = ?2
       )
     ORDER BY a.week_start",
    rusqlite::params![encode_uuid(owner), encode_uuid(habit_id)],
    |r| r.get(0),
  )?;

  conn.execute(
    "DELETE FROM habits WHERE habit_id = ?1",
    rusqlite::params![encode_uuid(habit_id)],
  )?;

  for aggregate_id in &affected {
    recompute(conn, decode_uuid(aggregate_id)?)?;
  }

  tracing::info!(%owner, %habit_id, weeks = affected.len(), "deleted habit");
  Ok(())
}

// ─── Schemes ─────────────────────────────────────────────────────────────────

fn scheme_by_id(
  conn: &Connection,
  owner: Uuid,
  scheme_id: Uuid,
) -> Result<Option<ScoringScheme>> {
  let sql = format!(
    "SELECT {SCHEME_COLUMNS} FROM scoring_schemes WHERE scheme_id = ?1 AND owner_id = ?2"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(scheme_id), encode_uuid(owner)],
      RawScheme::from_row,
    )
    .optional()?
    .map(RawScheme::into_scheme)
    .transpose()
}

fn require_scheme(conn: &Connection, owner: Uuid, scheme_id: Uuid) -> Result<ScoringScheme> {
  scheme_by_id(conn, owner, scheme_id)?
    .ok_or_else(|| CoreError::SchemeNotFound(scheme_id).into())
}

fn active_scheme(conn: &Connection, owner: Uuid) -> Result<Option<ScoringScheme>> {
  let sql = format!(
    "SELECT {SCHEME_COLUMNS} FROM scoring_schemes WHERE owner_id = ?1 AND is_active = 1"
  );
  conn
    .query_row(&sql, rusqlite::params![encode_uuid(owner)], RawScheme::from_row)
    .optional()?
    .map(RawScheme::into_scheme)
    .transpose()
}

/// The scheme that seeds a new week: the active one, else the newest.
fn preferred_scheme(conn: &Connection, owner: Uuid) -> Result<Option<ScoringScheme>> {
  let sql = format!(
    "SELECT {SCHEME_COLUMNS} FROM scoring_schemes WHERE owner_id = ?1
     ORDER BY is_active DESC, created_at DESC, rowid DESC LIMIT 1"
  );
  conn
    .query_row(&sql, rusqlite::params![encode_uuid(owner)], RawScheme::from_row)
    .optional()?
    .map(RawScheme::into_scheme)
    .transpose()
}

fn rules_for(conn: &Connection, scheme_id: Uuid) -> Result<Vec<ScoredHabitRule>> {
  let sql = format!(
    "SELECT {RULE_COLUMNS}
     FROM scored_habit_rules r
     JOIN habits h ON h.habit_id = r.habit_id
     WHERE r.scheme_id = ?1
     ORDER BY r.rowid"
  );
  query_all(conn, &sql, rusqlite::params![encode_uuid(scheme_id)], RawRule::from_row)?
    .into_iter()
    .map(RawRule::into_rule)
    .collect()
}

fn with_rules(conn: &Connection, scheme: ScoringScheme) -> Result<SchemeWithRules> {
  let rules = rules_for(conn, scheme.scheme_id)?;
  Ok(SchemeWithRules { scheme, rules })
}

pub fn create_scheme(conn: &Connection, owner: Uuid, input: NewScheme) -> Result<ScoringScheme> {
  let name = validate::name("scheme", &input.name)?;
  let scheme_id = Uuid::new_v4();

  conn.execute(
    "INSERT INTO scoring_schemes (scheme_id, owner_id, name, is_active, created_at)
     VALUES (?1, ?2, ?3, 0, ?4)",
    rusqlite::params![
      encode_uuid(scheme_id),
      encode_uuid(owner),
      name,
      encode_dt(Utc::now()),
    ],
  )?;

  if input.active {
    return set_active(conn, owner, scheme_id);
  }
  require_scheme(conn, owner, scheme_id)
}

pub fn list_schemes(conn: &Connection, owner: Uuid) -> Result<Vec<SchemeWithRules>> {
  let sql = format!(
    "SELECT {SCHEME_COLUMNS} FROM scoring_schemes WHERE owner_id = ?1 ORDER BY created_at, rowid"
  );
  query_all(conn, &sql, rusqlite::params![encode_uuid(owner)], RawScheme::from_row)?
    .into_iter()
    .map(|raw| with_rules(conn, raw.into_scheme()?))
    .collect()
}

pub fn get_scheme(
  conn: &Connection,
  owner: Uuid,
  scheme_id: Uuid,
) -> Result<Option<SchemeWithRules>> {
  scheme_by_id(conn, owner, scheme_id)?
    .map(|scheme| with_rules(conn, scheme))
    .transpose()
}

/// Clear every active marker of `owner`, then set it on `scheme_id`. Two
/// statements so the partial unique index never sees two active rows.
pub fn set_active(conn: &Connection, owner: Uuid, scheme_id: Uuid) -> Result<ScoringScheme> {
  require_scheme(conn, owner, scheme_id)?;

  conn.execute(
    "UPDATE scoring_schemes SET is_active = 0 WHERE owner_id = ?1 AND is_active = 1",
    rusqlite::params![encode_uuid(owner)],
  )?;
  conn.execute(
    "UPDATE scoring_schemes SET is_active = 1 WHERE scheme_id = ?1",
    rusqlite::params![encode_uuid(scheme_id)],
  )?;

  require_scheme(conn, owner, scheme_id)
}

pub fn update_scheme(
  conn: &Connection,
  owner: Uuid,
  scheme_id: Uuid,
  patch: SchemePatch,
) -> Result<ScoringScheme> {
  require_scheme(conn, owner, scheme_id)?;

  if let Some(name) = patch.name {
    let name = validate::name("scheme", &name)?;
    conn.execute(
      "UPDATE scoring_schemes SET name = ?2 WHERE scheme_id = ?1",
      rusqlite::params![encode_uuid(scheme_id), name],
    )?;
  }

  match patch.active {
    Some(true) => return set_active(conn, owner, scheme_id),
    Some(false) => {
      conn.execute(
        "UPDATE scoring_schemes SET is_active = 0 WHERE scheme_id = ?1",
        rusqlite::params![encode_uuid(scheme_id)],
      )?;
    }
    None => {}
  }

  require_scheme(conn, owner, scheme_id)
}

pub fn delete_scheme(conn: &Connection, owner: Uuid, scheme_id: Uuid) -> Result<()> {
  let scheme = require_scheme(conn, owner, scheme_id)?;
  if scheme.is_active {
    return Err(CoreError::SchemeActive(scheme_id).into());
  }

  let weeks: i64 = conn.query_row(
    "SELECT COUNT(*) FROM weekly_aggregates WHERE scheme_id = ?1",
    rusqlite::params![encode_uuid(scheme_id)],
    |r| r.get(0),
  )?;
  if weeks > 0 {
    return Err(
      CoreError::SchemeInUse { scheme_id, weeks: weeks as usize }.into(),
    );
  }

  conn.execute(
    "DELETE FROM scoring_schemes WHERE scheme_id = ?1",
    rusqlite::params![encode_uuid(scheme_id)],
  )?;
  Ok(())
}

// ─── Rules ───────────────────────────────────────────────────────────────────

fn rule_owned(conn: &Connection, owner: Uuid, rule_id: Uuid) -> Result<ScoredHabitRule> {
  let sql = format!(
    "SELECT {RULE_COLUMNS}
     FROM scored_habit_rules r
     JOIN habits h          ON h.habit_id  = r.habit_id
     JOIN scoring_schemes s ON s.scheme_id = r.scheme_id
     WHERE r.rule_id = ?1 AND s.owner_id = ?2"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(rule_id), encode_uuid(owner)],
      RawRule::from_row,
    )
    .optional()?
    .ok_or(CoreError::RuleNotFound(rule_id))?
    .into_rule()
}

pub fn add_rule(
  conn: &Connection,
  owner: Uuid,
  scheme_id: Uuid,
  input: NewRule,
) -> Result<ScoredHabitRule> {
  validate::new_rule(&input)?;
  require_scheme(conn, owner, scheme_id)?;
  require_habit(conn, owner, input.habit_id)?;

  let duplicate = conn
    .query_row(
      "SELECT 1 FROM scored_habit_rules WHERE scheme_id = ?1 AND habit_id = ?2",
      rusqlite::params![encode_uuid(scheme_id), encode_uuid(input.habit_id)],
      |_| Ok(()),
    )
    .optional()?
    .is_some();
  if duplicate {
    return Err(
      CoreError::DuplicateRule { scheme_id, habit_id: input.habit_id }.into(),
    );
  }

  let rule_id = Uuid::new_v4();
  conn.execute(
    "INSERT INTO scored_habit_rules
       (rule_id, scheme_id, habit_id, weight, target_frequency, scoring_kind)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    rusqlite::params![
      encode_uuid(rule_id),
      encode_uuid(scheme_id),
      encode_uuid(input.habit_id),
      input.weight,
      input.target_frequency,
      input.scoring_kind.to_string(),
    ],
  )?;

  rule_owned(conn, owner, rule_id)
}

pub fn update_rule(
  conn: &Connection,
  owner: Uuid,
  rule_id: Uuid,
  patch: RulePatch,
) -> Result<ScoredHabitRule> {
  validate::rule_patch(&patch)?;
  rule_owned(conn, owner, rule_id)?;

  conn.execute(
    "UPDATE scored_habit_rules SET
       weight           = COALESCE(?2, weight),
       target_frequency = COALESCE(?3, target_frequency),
       scoring_kind     = COALESCE(?4, scoring_kind)
     WHERE rule_id = ?1",
    rusqlite::params![
      encode_uuid(rule_id),
      patch.weight,
      patch.target_frequency,
      patch.scoring_kind.map(|k| k.to_string()),
    ],
  )?;

  rule_owned(conn, owner, rule_id)
}

pub fn remove_rule(conn: &Connection, owner: Uuid, rule_id: Uuid) -> Result<()> {
  rule_owned(conn, owner, rule_id)?;
  conn.execute(
    "DELETE FROM scored_habit_rules WHERE rule_id = ?1",
    rusqlite::params![encode_uuid(rule_id)],
  )?;
  Ok(())
}

// ─── Weekly aggregates ───────────────────────────────────────────────────────

fn aggregate_by_id(conn: &Connection, aggregate_id: Uuid) -> Result<Option<WeeklyAggregate>> {
  let sql = format!(
    "SELECT {AGGREGATE_COLUMNS} FROM weekly_aggregates WHERE aggregate_id = ?1"
  );
  conn
    .query_row(&sql, rusqlite::params![encode_uuid(aggregate_id)], RawAggregate::from_row)
    .optional()?
    .map(RawAggregate::into_aggregate)
    .transpose()
}

fn require_aggregate(conn: &Connection, aggregate_id: Uuid) -> Result<WeeklyAggregate> {
  aggregate_by_id(conn, aggregate_id)?
    .ok_or_else(|| CoreError::AggregateNotFound(aggregate_id).into())
}

fn aggregate_for_week(
  conn: &Connection,
  owner: Uuid,
  week_start: NaiveDate,
) -> Result<Option<WeeklyAggregate>> {
  let sql = format!(
    "SELECT {AGGREGATE_COLUMNS} FROM weekly_aggregates WHERE owner_id = ?1 AND week_start = ?2"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(owner), encode_date(week_start)],
      RawAggregate::from_row,
    )
    .optional()?
    .map(RawAggregate::into_aggregate)
    .transpose()
}

fn week_view(conn: &Connection, aggregate: WeeklyAggregate) -> Result<WeekView> {
  let scheme = require_scheme(conn, aggregate.owner_id, aggregate.scheme_id)?;
  let rules = rules_for(conn, aggregate.scheme_id)?;
  let active_scheme = active_scheme(conn, aggregate.owner_id)?;
  Ok(WeekView { aggregate, scheme, rules, active_scheme })
}

/// Fetch the aggregate for the week containing `date`, creating it bound to
/// `scheme_id` (or the preferred scheme) if absent. An existing aggregate is
/// returned untouched.
pub fn ensure_aggregate(
  conn: &Connection,
  owner: Uuid,
  date: NaiveDate,
  scheme_id: Option<Uuid>,
) -> Result<WeeklyAggregate> {
  validate::date(date)?;
  let week_start = week_start_of(date)?;
  if let Some(existing) = aggregate_for_week(conn, owner, week_start)? {
    return Ok(existing);
  }

  let scheme = match scheme_id {
    Some(id) => require_scheme(conn, owner, id)?,
    None => preferred_scheme(conn, owner)?.ok_or(CoreError::NoScheme)?,
  };

  // A concurrent creator may win between the read above and this insert; the
  // unique key turns our insert into a no-op and the read below finds theirs.
  conn.execute(
    "INSERT INTO weekly_aggregates
       (aggregate_id, owner_id, week_start, scheme_id, score, created_at)
     VALUES (?1, ?2, ?3, ?4, NULL, ?5)
     ON CONFLICT (owner_id, week_start) DO NOTHING",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(owner),
      encode_date(week_start),
      encode_uuid(scheme.scheme_id),
      encode_dt(Utc::now()),
    ],
  )?;

  aggregate_for_week(conn, owner, week_start)?
    .ok_or_else(|| CoreError::WeekNotFound(week_start).into())
}

pub fn ensure_week_view(
  conn: &Connection,
  owner: Uuid,
  date: NaiveDate,
  scheme_id: Option<Uuid>,
) -> Result<WeekView> {
  let aggregate = ensure_aggregate(conn, owner, date, scheme_id)?;
  week_view(conn, aggregate)
}

pub fn get_week(
  conn: &Connection,
  owner: Uuid,
  week_start: NaiveDate,
) -> Result<Option<WeekView>> {
  validate::week_start(week_start)?;
  aggregate_for_week(conn, owner, week_start)?
    .map(|aggregate| week_view(conn, aggregate))
    .transpose()
}

/// Score the aggregate's week from current state and persist the total.
pub fn recompute(conn: &Connection, aggregate_id: Uuid) -> Result<f64> {
  let aggregate = require_aggregate(conn, aggregate_id)?;
  let rules = rules_for(conn, aggregate.scheme_id)?;
  let records = records_in_range(
    conn,
    aggregate.owner_id,
    aggregate.week_start,
    aggregate.week_end()?,
  )?;

  let scores = score_week(&rules, &records);
  // Clamp away float drift; the column CHECK rejects anything outside [0, 100].
  let score = if scores.total.is_finite() {
    scores.total.clamp(0.0, 100.0)
  } else {
    0.0
  };

  conn.execute(
    "UPDATE weekly_aggregates SET score = ?2 WHERE aggregate_id = ?1",
    rusqlite::params![encode_uuid(aggregate_id), score],
  )?;

  tracing::debug!(
    %aggregate_id,
    week_start = %aggregate.week_start,
    rules = rules.len(),
    records = records.len(),
    score,
    "recomputed weekly score"
  );
  Ok(score)
}

/// Record ids belonging to the aggregate's week: linked by back-reference, or
/// unlinked but dated within the week.
fn linked_record_ids(conn: &Connection, aggregate: &WeeklyAggregate) -> Result<Vec<String>> {
  query_all(
    conn,
    "SELECT record_id FROM daily_records
     WHERE aggregate_id = ?1
        OR (aggregate_id IS NULL AND owner_id = ?2 AND date BETWEEN ?3 AND ?4)",
    rusqlite::params![
      encode_uuid(aggregate.aggregate_id),
      encode_uuid(aggregate.owner_id),
      encode_date(aggregate.week_start),
      encode_date(aggregate.week_end()?),
    ],
    |r| r.get(0),
  )
}

pub fn change_scheme(
  conn: &Connection,
  owner: Uuid,
  week_start: NaiveDate,
  scheme_id: Uuid,
  confirm_delete: bool,
) -> Result<WeekView> {
  validate::week_start(week_start)?;
  require_scheme(conn, owner, scheme_id)?;
  let aggregate = aggregate_for_week(conn, owner, week_start)?
    .ok_or(CoreError::WeekNotFound(week_start))?;

  let linked = linked_record_ids(conn, &aggregate)?;
  if !linked.is_empty() && !confirm_delete {
    return Err(
      CoreError::NeedsConfirmation { linked_records: linked.len() }.into(),
    );
  }

  if !linked.is_empty() {
    let mut delete_entries =
      conn.prepare_cached("DELETE FROM habit_entries WHERE record_id = ?1")?;
    let mut delete_record =
      conn.prepare_cached("DELETE FROM daily_records WHERE record_id = ?1")?;
    for record_id in &linked {
      delete_entries.execute(rusqlite::params![record_id])?;
      delete_record.execute(rusqlite::params![record_id])?;
    }
  }

  conn.execute(
    "UPDATE weekly_aggregates SET scheme_id = ?2 WHERE aggregate_id = ?1",
    rusqlite::params![encode_uuid(aggregate.aggregate_id), encode_uuid(scheme_id)],
  )?;
  let score = recompute(conn, aggregate.aggregate_id)?;

  tracing::info!(
    %owner,
    %week_start,
    from = %aggregate.scheme_id,
    to = %scheme_id,
    deleted_records = linked.len(),
    score,
    "changed weekly scoring scheme"
  );

  let aggregate = require_aggregate(conn, aggregate.aggregate_id)?;
  week_view(conn, aggregate)
}

pub fn weekly_report(
  conn: &Connection,
  owner: Uuid,
  week_start: NaiveDate,
) -> Result<Option<WeekReport>> {
  let Some(view) = get_week(conn, owner, week_start)? else {
    return Ok(None);
  };
  let records = records_in_range(conn, owner, week_start, week_end_of(week_start)?)?;
  let scores = score_week(&view.rules, &records);
  Ok(Some(WeekReport { view, records, scores }))
}

pub fn score_history(
  conn: &Connection,
  owner: Uuid,
  through: NaiveDate,
  weeks: u32,
) -> Result<Vec<WeekScore>> {
  validate::history_weeks(weeks)?;
  validate::date(through)?;
  let starts = recent_week_starts(through, weeks)?;

  let mut points = Vec::with_capacity(starts.len());
  for week_start in starts {
    let point = match aggregate_for_week(conn, owner, week_start)? {
      Some(aggregate) => {
        let score = match aggregate.score {
          Some(score) => score,
          None => recompute(conn, aggregate.aggregate_id)?,
        };
        let scheme = require_scheme(conn, owner, aggregate.scheme_id)?;
        WeekScore { week_start, score, scheme_name: Some(scheme.name) }
      }
      None => WeekScore { week_start, score: 0.0, scheme_name: None },
    };
    points.push(point);
  }
  Ok(points)
}

// ─── Daily records ───────────────────────────────────────────────────────────

fn entries_for(conn: &Connection, record_id: &str) -> Result<Vec<HabitEntry>> {
  let sql = format!(
    "SELECT {ENTRY_COLUMNS} FROM habit_entries WHERE record_id = ?1 ORDER BY rowid"
  );
  query_all(conn, &sql, rusqlite::params![record_id], RawEntry::from_row)?
    .into_iter()
    .map(RawEntry::into_entry)
    .collect()
}

fn hydrate(conn: &Connection, raw: RawRecord) -> Result<DailyRecord> {
  let entries = entries_for(conn, &raw.record_id)?;
  Ok(DailyRecord {
    record_id: decode_uuid(&raw.record_id)?,
    owner_id: decode_uuid(&raw.owner_id)?,
    date: decode_date(&raw.date)?,
    aggregate_id: raw.aggregate_id.as_deref().map(decode_uuid).transpose()?,
    notes: raw.notes,
    entries,
  })
}

/// Records of `owner` dated in `[from, to]`, oldest first, with entries.
fn records_in_range(
  conn: &Connection,
  owner: Uuid,
  from: NaiveDate,
  to: NaiveDate,
) -> Result<Vec<DailyRecord>> {
  let sql = format!(
    "SELECT {RECORD_COLUMNS} FROM daily_records
     WHERE owner_id = ?1 AND date BETWEEN ?2 AND ?3
     ORDER BY date"
  );
  query_all(
    conn,
    &sql,
    rusqlite::params![encode_uuid(owner), encode_date(from), encode_date(to)],
    RawRecord::from_row,
  )?
  .into_iter()
  .map(|raw| hydrate(conn, raw))
  .collect()
}

pub fn get_daily_record(
  conn: &Connection,
  owner: Uuid,
  date: NaiveDate,
) -> Result<Option<DailyRecord>> {
  validate::date(date)?;
  let sql = format!(
    "SELECT {RECORD_COLUMNS} FROM daily_records WHERE owner_id = ?1 AND date = ?2"
  );
  conn
    .query_row(
      &sql,
      rusqlite::params![encode_uuid(owner), encode_date(date)],
      RawRecord::from_row,
    )
    .optional()?
    .map(|raw| hydrate(conn, raw))
    .transpose()
}

pub fn list_week_records(
  conn: &Connection,
  owner: Uuid,
  week_start: NaiveDate,
) -> Result<Vec<DailyRecord>> {
  validate::week_start(week_start)?;
  records_in_range(conn, owner, week_start, week_end_of(week_start)?)
}

/// Ensure the week, write the day, recompute the week.
pub fn upsert_daily_record(
  conn: &Connection,
  owner: Uuid,
  input: DailyRecordInput,
) -> Result<RecordOutcome> {
  validate::daily_record(&input)?;
  for entry in &input.entries {
    let habit = require_habit(conn, owner, entry.habit_id)?;
    validate::entry_shape(entry, habit.kind)?;
  }

  let aggregate = ensure_aggregate(conn, owner, input.date, input.scheme_id)?;
  let owner_str = encode_uuid(owner);
  let date_str = encode_date(input.date);

  conn.execute(
    "INSERT INTO daily_records (record_id, owner_id, date, aggregate_id, notes)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (owner_id, date) DO UPDATE SET
       notes        = COALESCE(excluded.notes, daily_records.notes),
       aggregate_id = excluded.aggregate_id",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      owner_str,
      date_str,
      encode_uuid(aggregate.aggregate_id),
      input.notes,
    ],
  )?;

  let record_id: String = conn.query_row(
    "SELECT record_id FROM daily_records WHERE owner_id = ?1 AND date = ?2",
    rusqlite::params![owner_str, date_str],
    |r| r.get(0),
  )?;

  let mut upsert_entry = conn.prepare_cached(
    "INSERT INTO habit_entries (entry_id, record_id, habit_id, value, completed)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (record_id, habit_id) DO UPDATE SET
       value     = excluded.value,
       completed = excluded.completed",
  )?;
  for entry in &input.entries {
    upsert_entry.execute(rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      record_id,
      encode_uuid(entry.habit_id),
      entry.value,
      entry.completed,
    ])?;
  }

  recompute(conn, aggregate.aggregate_id)?;

  let record = get_daily_record(conn, owner, input.date)?
    .ok_or_else(|| crate::Error::Decode(format!("record {record_id} vanished mid-transaction")))?;
  let aggregate = require_aggregate(conn, aggregate.aggregate_id)?;
  Ok(RecordOutcome { record, aggregate })
}

pub fn link_orphan_records(conn: &Connection, owner: Uuid) -> Result<usize> {
  let orphans: Vec<(String, String)> = query_all(
    conn,
    "SELECT record_id, date FROM daily_records
     WHERE owner_id = ?1 AND aggregate_id IS NULL
     ORDER BY date",
    rusqlite::params![encode_uuid(owner)],
    |r| Ok((r.get(0)?, r.get(1)?)),
  )?;

  let mut touched = BTreeSet::new();
  for (record_id, date) in &orphans {
    let aggregate = ensure_aggregate(conn, owner, decode_date(date)?, None)?;
    conn.execute(
      "UPDATE daily_records SET aggregate_id = ?2 WHERE record_id = ?1",
      rusqlite::params![record_id, encode_uuid(aggregate.aggregate_id)],
    )?;
    touched.insert(aggregate.aggregate_id);
  }

  for aggregate_id in &touched {
    recompute(conn, *aggregate_id)?;
  }

  if !orphans.is_empty() {
    tracing::info!(
      %owner,
      linked = orphans.len(),
      weeks = touched.len(),
      "linked orphan daily records"
    );
  }
  Ok(orphans.len())
}
