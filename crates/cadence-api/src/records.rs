//! Handlers for `/records/{date}`.

use axum::extract::State;
use cadence_core::{
  record::{DailyRecord, DailyRecordInput, EntryInput},
  store::{RecordOutcome, TrackerStore},
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  AppState,
  auth::Owner,
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /records/{date}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(date): Path<NaiveDate>,
) -> Result<Json<DailyRecord>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let record = state
    .store
    .get_daily_record(owner, date)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("no daily record for {date}")))?;
  Ok(Json(record))
}

/// Body of `PUT /records/{date}`; the date comes from the path.
#[derive(Debug, Deserialize)]
pub struct PutBody {
  #[serde(default)]
  pub notes:     Option<String>,
  #[serde(default)]
  pub scheme_id: Option<Uuid>,
  #[serde(default)]
  pub entries:   Vec<EntryInput>,
}

/// `PUT /records/{date}`: upserts the day and returns it with the week's
/// recomputed aggregate.
pub async fn put<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(date): Path<NaiveDate>,
  Json(body): Json<PutBody>,
) -> Result<Json<RecordOutcome>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let input = DailyRecordInput {
    date,
    notes: body.notes,
    scheme_id: body.scheme_id,
    entries: body.entries,
  };
  let outcome = state
    .store
    .upsert_daily_record(owner, input)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(outcome))
}
