//! Error types for `cadence-core`.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("habit not found: {0}")]
  HabitNotFound(Uuid),

  #[error("scoring scheme not found: {0}")]
  SchemeNotFound(Uuid),

  #[error("scored habit rule not found: {0}")]
  RuleNotFound(Uuid),

  #[error("weekly aggregate not found: {0}")]
  AggregateNotFound(Uuid),

  #[error("no weekly aggregate for the week starting {0}")]
  WeekNotFound(NaiveDate),

  #[error("owner has no scoring schemes")]
  NoScheme,

  /// A scheme switch would discard logged days and was not confirmed.
  #[error("{linked_records} daily record(s) exist for this week; confirm deletion to switch schemes")]
  NeedsConfirmation { linked_records: usize },

  #[error("habit {habit_id} is already scored by scheme {scheme_id}")]
  DuplicateRule { scheme_id: Uuid, habit_id: Uuid },

  #[error("cannot delete the active scoring scheme {0}")]
  SchemeActive(Uuid),

  #[error("scoring scheme {scheme_id} is bound to {weeks} week(s)")]
  SchemeInUse { scheme_id: Uuid, weeks: usize },

  /// Logged entries are shaped for the current kind.
  #[error("habit {habit_id} has {entries} logged entries; its kind cannot change")]
  HabitKindLocked { habit_id: Uuid, entries: usize },

  #[error("invalid input: {0}")]
  Validation(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// Stable, caller-facing classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
  NotFound,
  NeedsConfirmation,
  Conflict,
  Validation,
  /// Store or transaction failure. No partial effect was applied, so the
  /// operation may be retried.
  Internal,
}

impl ErrorCode {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::NotFound => "NOT_FOUND",
      Self::NeedsConfirmation => "NEEDS_CONFIRMATION",
      Self::Conflict => "CONFLICT",
      Self::Validation => "VALIDATION",
      Self::Internal => "INTERNAL",
    }
  }
}

/// Implemented by every error type that crosses the store boundary, so
/// higher layers can classify failures without knowing the backend.
pub trait Coded {
  fn code(&self) -> ErrorCode;
}

impl Coded for Error {
  fn code(&self) -> ErrorCode {
    match self {
      Self::HabitNotFound(_)
      | Self::SchemeNotFound(_)
      | Self::RuleNotFound(_)
      | Self::AggregateNotFound(_)
      | Self::WeekNotFound(_)
      | Self::NoScheme => ErrorCode::NotFound,
      Self::NeedsConfirmation { .. } => ErrorCode::NeedsConfirmation,
      Self::DuplicateRule { .. }
      | Self::SchemeActive(_)
      | Self::SchemeInUse { .. }
      | Self::HabitKindLocked { .. } => ErrorCode::Conflict,
      Self::Validation(_) => ErrorCode::Validation,
    }
  }
}

impl Coded for std::convert::Infallible {
  fn code(&self) -> ErrorCode { match *self {} }
}
