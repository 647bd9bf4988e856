//! Handlers for `/schemes` and `/rules`.
//!
//! | Method   | Path                     | Notes |
//! |----------|--------------------------|-------|
//! | `GET`    | `/schemes`               | Schemes with their rules |
//! | `POST`   | `/schemes`               | Body: `{"name":"…","active":true}` |
//! | `GET`    | `/schemes/{id}`          | 404 if not found |
//! | `PATCH`  | `/schemes/{id}`          | Body: `{"name"?, "active"?}` |
//! | `DELETE` | `/schemes/{id}`          | 409 if active or bound to a week |
//! | `POST`   | `/schemes/{id}/activate` | Clears every other active marker |
//! | `POST`   | `/schemes/{id}/rules`    | Body: `{"habit_id","weight","target_frequency"?}` |
//! | `PATCH`  | `/rules/{id}`            | Partial update |
//! | `DELETE` | `/rules/{id}`            | |

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use cadence_core::{
  scheme::{
    NewRule, NewScheme, RulePatch, SchemePatch, SchemeWithRules,
    ScoredHabitRule, ScoringScheme,
  },
  store::TrackerStore,
};
use uuid::Uuid;

use crate::{
  AppState,
  auth::Owner,
  error::ApiError,
  extract::{Json, Path},
};

// ─── Schemes ──────────────────────────────────────────────────────────────────

/// `GET /schemes`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
) -> Result<Json<Vec<SchemeWithRules>>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let schemes = state.store.list_schemes(owner).await.map_err(ApiError::store)?;
  Ok(Json(schemes))
}

/// `POST /schemes`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Json(body): Json<NewScheme>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let scheme = state
    .store
    .create_scheme(owner, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(scheme)))
}

/// `GET /schemes/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<Json<SchemeWithRules>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let scheme = state
    .store
    .get_scheme(owner, id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("scoring scheme {id} not found")))?;
  Ok(Json(scheme))
}

/// `PATCH /schemes/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
  Json(body): Json<SchemePatch>,
) -> Result<Json<ScoringScheme>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let scheme = state
    .store
    .update_scheme(owner, id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(scheme))
}

/// `DELETE /schemes/{id}`
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
    .delete_scheme(owner, id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /schemes/{id}/activate`
pub async fn activate<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<Json<ScoringScheme>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let scheme = state
    .store
    .set_active_scheme(owner, id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(scheme))
}

// ─── Rules ────────────────────────────────────────────────────────────────────

/// `POST /schemes/{id}/rules`
pub async fn add_rule<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(scheme_id): Path<Uuid>,
  Json(body): Json<NewRule>,
) -> Result<impl IntoResponse, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let rule = state
    .store
    .add_rule(owner, scheme_id, body)
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(rule)))
}

/// `PATCH /rules/{id}`
pub async fn update_rule<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
  Json(body): Json<RulePatch>,
) -> Result<Json<ScoredHabitRule>, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  let rule = state
    .store
    .update_rule(owner, id, body)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(rule))
}

/// `DELETE /rules/{id}`
pub async fn remove_rule<S>(
  State(state): State<AppState<S>>,
  Owner(owner): Owner,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: TrackerStore + Clone + 'static,
{
  state
    .store
    .remove_rule(owner, id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
