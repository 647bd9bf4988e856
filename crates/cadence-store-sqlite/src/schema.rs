//! SQL schema for the Cadence SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS habits (
    habit_id    TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    description TEXT,
    kind        TEXT NOT NULL,   -- 'boolean' | 'numeric'
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS scoring_schemes (
    scheme_id   TEXT PRIMARY KEY,
    owner_id    TEXT NOT NULL,
    name        TEXT NOT NULL,
    is_active   INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

-- At most one active scheme per owner.
CREATE UNIQUE INDEX IF NOT EXISTS schemes_one_active_idx
    ON scoring_schemes(owner_id) WHERE is_active = 1;

CREATE TABLE IF NOT EXISTS scored_habit_rules (
    rule_id          TEXT PRIMARY KEY,
    scheme_id        TEXT NOT NULL REFERENCES scoring_schemes(scheme_id) ON DELETE CASCADE,
    habit_id         TEXT NOT NULL REFERENCES habits(habit_id) ON DELETE CASCADE,
    weight           REAL NOT NULL CHECK (weight > 0),
    target_frequency INTEGER NOT NULL DEFAULT 1 CHECK (target_frequency >= 1),
    scoring_kind     TEXT NOT NULL DEFAULT 'linear_positive_capped',
    UNIQUE (scheme_id, habit_id)
);

CREATE TABLE IF NOT EXISTS weekly_aggregates (
    aggregate_id TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL,
    week_start   TEXT NOT NULL,   -- YYYY-MM-DD, always a Monday
    scheme_id    TEXT NOT NULL REFERENCES scoring_schemes(scheme_id),
    score        REAL CHECK (score IS NULL OR (score >= 0 AND score <= 100)),
    created_at   TEXT NOT NULL,
    UNIQUE (owner_id, week_start)
);

CREATE TABLE IF NOT EXISTS daily_records (
    record_id    TEXT PRIMARY KEY,
    owner_id     TEXT NOT NULL,
    date         TEXT NOT NULL,   -- YYYY-MM-DD
    aggregate_id TEXT REFERENCES weekly_aggregates(aggregate_id) ON DELETE SET NULL,
    notes        TEXT,
    UNIQUE (owner_id, date)
);

CREATE TABLE IF NOT EXISTS habit_entries (
    entry_id  TEXT PRIMARY KEY,
    record_id TEXT NOT NULL REFERENCES daily_records(record_id) ON DELETE CASCADE,
    habit_id  TEXT NOT NULL REFERENCES habits(habit_id) ON DELETE CASCADE,
    value     REAL,
    completed INTEGER,
    UNIQUE (record_id, habit_id)
);

CREATE INDEX IF NOT EXISTS habits_owner_idx      ON habits(owner_id);
CREATE INDEX IF NOT EXISTS schemes_owner_idx     ON scoring_schemes(owner_id);
CREATE INDEX IF NOT EXISTS records_aggregate_idx ON daily_records(aggregate_id);

PRAGMA user_version = 1;
";
