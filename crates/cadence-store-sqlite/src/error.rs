//! Error type for `cadence-store-sqlite`.

use cadence_core::{Coded, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Core(#[from] cadence_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  /// A stored column could not be decoded into its domain type.
  #[error("decode error: {0}")]
  Decode(String),
}

impl Coded for Error {
  fn code(&self) -> ErrorCode {
    match self {
      Self::Core(e) => e.code(),
      _ => ErrorCode::Internal,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
