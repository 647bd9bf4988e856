//! Handlers for `/weeks` and `/scores`.
//!
//! | Method | Path                            | Notes |
//! |--------|---------------------------------|-------|
//! | `POST` | `/weeks/ensure`                 | Body: `{"date":"2024-06-12","scheme_id"?}` |
//! | `GET`  | `/weeks/{week_start}`           | 404 if the week has no aggregate |
//! | `GET`  | `/weeks/{week_start}/report`    | Per-habit breakdown |
//! | `GET`  | `/weeks/{week_start}/records`   | Daily records of the week |
//! | `POST` | `/weeks/{week_start}/recompute` | `{"updated":false}` if no aggregate |
//! | `POST` | `/weeks/{week_start}/scheme`    | 409 `NEEDS_CONFIRMATION` unless confirmed |
//! | `GET`  | `/scores`                       | `?weeks=12&through=YYYY-MM-DD` |
//!
//! `week_start` must be a Monday; other dates are rejected with 400.

use axum::extract::State;
use cadence_core::{
  record::DailyRecord,
  store::TrackerStore,
  week::{WeekReport, WeekScore, WeekView},
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Owner,
  error::ApiError,
  extract::{Json, Path, Query},
};

fn week_not_found(week_start: NaiveDate) -> ApiError {
  ApiError::NotFound(format!("no weekly aggregate for the week starting {week_start}"))
}

// ─── Ensure ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct EnsureBody {
  /// Any date within the week.
  pub date:      NaiveDate,
  #[serde(default)]
  pub scheme_id: Option<Uuid>,
}

/// `POST /weeks/ensure`
pub async fn ensure<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Json(body): Json<EnsureBody>,
) -> Result<Json<WeekView>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let view = state
    .store
    .ensure_weekly_aggregate(owner, body.date, body.scheme_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(view))
}

// ─── Read ─────────────────────────────────────────────────────────────────────

/// `GET /weeks/{week_start}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(week_start): Path<NaiveDate>,
) -> Result<Json<WeekView>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let view = state
    .store
    .get_week(owner, week_start)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| week_not_found(week_start))?;
  Ok(Json(view))
}

/// `GET /weeks/{week_start}/report`
pub async fn report<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(week_start): Path<NaiveDate>,
) -> Result<Json<WeekReport>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let report = state
    .store
    .weekly_report(owner, week_start)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| week_not_found(week_start))?;
  Ok(Json(report))
}

/// `GET /weeks/{week_start}/records`
pub async fn records<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(week_start): Path<NaiveDate>,
) -> Result<Json<Vec<DailyRecord>>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let records = state
    .store
    .list_week_records(owner, week_start)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(records))
}

// ─── Recompute ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct RecomputeResponse {
  pub updated: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub score:   Option<f64>,
}

/// `POST /weeks/{week_start}/recompute`
///
/// A week without an aggregate has nothing to score; this is not an error.
pub async fn recompute<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(week_start): Path<NaiveDate>,
) -> Result<Json<RecomputeResponse>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let Some(view) = state
    .store
    .get_week(owner, week_start)
    .await
    .map_err(ApiError::store)?
  else {
    return Ok(Json(RecomputeResponse { updated: false, score: None }));
  };

  let score = state
    .store
    .recompute_score(view.aggregate.aggregate_id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(RecomputeResponse { updated: true, score: Some(score) }))
}

// ─── Scheme change ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ChangeSchemeBody {
  pub scheme_id:      Uuid,
  #[serde(default)]
  pub confirm_delete: bool,
}

/// `POST /weeks/{week_start}/scheme`
pub async fn change_scheme<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(week_start): Path<NaiveDate>,
  Json(body): Json<ChangeSchemeBody>,
) -> Result<Json<WeekView>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let view = state
    .store
    .change_scheme(owner, week_start, body.scheme_id, body.confirm_delete)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(view))
}

// ─── History ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  #[serde(default = "default_weeks")]
  pub weeks:   u32,
  /// Defaults to today (UTC).
  pub through: Option<NaiveDate>,
}

fn default_weeks() -> u32 { 12 }

/// `GET /scores[?weeks=<n>&through=<date>]`
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<WeekScore>>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let through = params.through.unwrap_or_else(|| Utc::now().date_naive());
  let points = state
    .store
    .score_history(owner, through, params.weeks)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(points))
}
