//! Handlers for `/habits`.
//!
//! | Method   | Path           | Notes |
//! |----------|----------------|-------|
//! | `GET`    | `/habits`      | Oldest first |
//! | `POST`   | `/habits`      | Body: `{"name":"Read","kind":"boolean"}` |
//! | `GET`    | `/habits/{id}` | 404 if not found |
//! | `PATCH`  | `/habits/{id}` | Body: `{"name"?, "description"?, "kind"?}`; 409 on a kind change once logged |
//! | `DELETE` | `/habits/{id}` | Removes its rules and entries, re-scores affected weeks |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use cadence_core::{
  habit::{Habit, HabitPatch, NewHabit},
  store::TrackerStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Owner,
  error::ApiError,
  extract::{Json, Path},
};

/// `GET /habits`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
) -> Result<Json<Vec<Habit>>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let habits = state.store.list_habits(owner).await.map_err(ApiError::store)?;
  Ok(Json(habits))
}

/// `POST /habits`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Json(body): Json<NewHabit>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let habit = state
    .store
    .add_habit(owner, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(habit)))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<Json<Habit>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let habit = state
    .store
    .get_habit(owner, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("habit {id} not found")))?;
  Ok(Json(habit))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
  Json(body): Json<HabitPatch>,
) -> Result<Json<Habit>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let habit = state
    .store
    .update_habit(owner, id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(habit))
}

pub async fn delete<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  state
    .store
    .delete_habit(owner, id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
