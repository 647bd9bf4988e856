//! JSON REST API for Cadence.
//!
//! Exposes an axum [`Router`] backed by any [`TrackerStore`]. Every route
//! requires HTTP Basic auth; the authenticated user is mapped to an owner id
//! through the configured user table, and all store calls are scoped to it.

pub mod auth;
pub mod error;
pub mod extract;
pub mod habits;
pub mod records;
pub mod schemes;
pub mod weeks;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post},
};
use cadence_core::store::TrackerStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use auth::AuthConfig;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `CADENCE_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub users:      Vec<UserConfig>,
}

/// One login and the owner whose data it may touch.
#[derive(Deserialize, Clone)]
pub struct UserConfig {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  pub owner_id:      Uuid,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: TrackerStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: TrackerStore + Clone + 'static,
{
  Router::new()
    // Habits
    .route("/habits", get(habits::list::<S>).post(habits::create::<S>))
    .route(
      "/habits/{id}",
      get(habits::get_one::<S>)
        .patch(habits::update::<S>)
        .delete(habits::delete::<S>),
    )
    // Schemes and rules
    .route("/schemes", get(schemes::list::<S>).post(schemes::create::<S>))
    .route(
      "/schemes/{id}",
      get(schemes::get_one::<S>)
        .patch(schemes::update::<S>)
        .delete(schemes::delete::<S>),
    )
    .route("/schemes/{id}/activate", post(schemes::activate::<S>))
    .route("/schemes/{id}/rules", post(schemes::add_rule::<S>))
    .route(
      "/rules/{id}",
      patch(schemes::update_rule::<S>).delete(schemes::remove_rule::<S>),
    )
    // Weeks
    .route("/weeks/ensure", post(weeks::ensure::<S>))
    .route("/weeks/{week_start}", get(weeks::get_one::<S>))
    .route("/weeks/{week_start}/report", get(weeks::report::<S>))
    .route("/weeks/{week_start}/records", get(weeks::records::<S>))
    .route("/weeks/{week_start}/recompute", post(weeks::recompute::<S>))
    .route("/weeks/{week_start}/scheme", post(weeks::change_scheme::<S>))
    .route("/scores", get(weeks::history::<S>))
    // Daily records
    .route("/records/{date}", get(records::get_one::<S>).put(records::put::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use base64::Engine as _;
  use base64::engine::general_purpose::STANDARD as B64;
  use cadence_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  struct Harness {
    state: AppState<SqliteStore>,
    auth:  String,
  }

  impl Harness {
    async fn new() -> Self {
      let store = SqliteStore::open_in_memory().await.unwrap();
      let salt  = SaltString::generate(&mut OsRng);
      let hash  = Argon2::default()
        .hash_password(b"secret", &salt)
        .unwrap()
        .to_string();

      let state = AppState {
        store: Arc::new(store),
        auth:  Arc::new(AuthConfig {
          users: vec![UserConfig {
            username:      "user".to_string(),
            password_hash: hash,
            owner_id:      Uuid::new_v4(),
          }],
        }),
      };
      let auth = format!("Basic {}", B64.encode("user:secret"));
      Self { state, auth }
    }

    async fn call(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
      let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, &self.auth);
      let body = match body {
        Some(v) => {
          builder = builder.header(header::CONTENT_TYPE, "application/json");
          Body::from(v.to_string())
        }
        None => Body::empty(),
      };
      let resp = router(self.state.clone())
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

      let status = resp.status();
      let bytes  = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
      let value  = if bytes.is_empty() {
        Value::Null
      } else {
        serde_json::from_slice(&bytes).unwrap()
      };
      (status, value)
    }

    /// Two habits and an active scheme weighting them 30/70 with targets 3/7.
    async fn seed(&self) -> (String, String, String) {
      let (_, read) = self.call("POST", "/habits", Some(json!({ "name": "Read" }))).await;
      let (_, run)  = self.call("POST", "/habits", Some(json!({ "name": "Run" }))).await;
      let read = read["habit_id"].as_str().unwrap().to_string();
      let run  = run["habit_id"].as_str().unwrap().to_string();

      let (status, scheme) = self
        .call("POST", "/schemes", Some(json!({ "name": "Default" })))
        .await;
      assert_eq!(status, StatusCode::CREATED);
      let scheme = scheme["scheme_id"].as_str().unwrap().to_string();

      for (habit, weight, target) in [(&read, 30.0, 3), (&run, 70.0, 7)] {
        let (status, _) = self
          .call(
            "POST",
            &format!("/schemes/{scheme}/rules"),
            Some(json!({ "habit_id": habit, "weight": weight, "target_frequency": target })),
          )
          .await;
        assert_eq!(status, StatusCode::CREATED);
      }
      (read, run, scheme)
    }
  }

  #[tokio::test]
  async fn requests_without_credentials_are_rejected() {
    let h = Harness::new().await;
    let req = Request::builder().uri("/habits").body(Body::empty()).unwrap();
    let resp = router(h.state.clone()).oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
  }

  #[tokio::test]
  async fn logging_days_updates_the_week_score() {
    let h = Harness::new().await;
    let (read, run, _) = h.seed().await;

    let mut last = Value::Null;
    for date in ["2024-06-10", "2024-06-11", "2024-06-12"] {
      let (status, body) = h
        .call(
          "PUT",
          &format!("/records/{date}"),
          Some(json!({ "entries": [
            { "habit_id": read, "completed": true },
            { "habit_id": run, "completed": false },
          ]})),
        )
        .await;
      assert_eq!(status, StatusCode::OK, "{body}");
      last = body;
    }
    assert_eq!(last["aggregate"]["week_start"], "2024-06-10");
    assert!((last["aggregate"]["score"].as_f64().unwrap() - 30.0).abs() < 1e-9);

    let (status, week) = h.call("GET", "/weeks/2024-06-10", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(week["scheme"]["name"], "Default");
    assert_eq!(week["rules"].as_array().unwrap().len(), 2);

    let (_, records) = h.call("GET", "/weeks/2024-06-10/records", None).await;
    assert_eq!(records.as_array().unwrap().len(), 3);

    let (_, record) = h.call("GET", "/records/2024-06-11", None).await;
    assert_eq!(record["entries"].as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn scheme_change_requires_confirmation_when_days_exist() {
    let h = Harness::new().await;
    let (read, run, _) = h.seed().await;
    let (_, other) = h
      .call("POST", "/schemes", Some(json!({ "name": "Focus", "active": false })))
      .await;
    let other = other["scheme_id"].as_str().unwrap().to_string();
    h.call(
      "POST",
      &format!("/schemes/{other}/rules"),
      Some(json!({ "habit_id": run, "weight": 1.0 })),
    )
    .await;

    h.call(
      "PUT",
      "/records/2024-06-10",
      Some(json!({ "entries": [{ "habit_id": read, "completed": true }] })),
    )
    .await;

    let (status, body) = h
      .call("POST", "/weeks/2024-06-10/scheme", Some(json!({ "scheme_id": other })))
      .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NEEDS_CONFIRMATION");

    let (_, records) = h.call("GET", "/weeks/2024-06-10/records", None).await;
    assert_eq!(records.as_array().unwrap().len(), 1);

    let (status, body) = h
      .call(
        "POST",
        "/weeks/2024-06-10/scheme",
        Some(json!({ "scheme_id": other, "confirm_delete": true })),
      )
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["aggregate"]["scheme_id"], other.as_str());
    assert_eq!(body["aggregate"]["score"], 0.0);

    let (_, records) = h.call("GET", "/weeks/2024-06-10/records", None).await;
    assert!(records.as_array().unwrap().is_empty());
  }

  #[tokio::test]
  async fn recompute_without_aggregate_is_a_noop() {
    let h = Harness::new().await;
    h.seed().await;

    let (status, body) = h.call("POST", "/weeks/2024-06-10/recompute", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "updated": false }));

    h.call("POST", "/weeks/ensure", Some(json!({ "date": "2024-06-13" }))).await;
    let (_, body) = h.call("POST", "/weeks/2024-06-10/recompute", None).await;
    assert_eq!(body, json!({ "updated": true, "score": 0.0 }));
  }

  #[tokio::test]
  async fn non_monday_week_start_is_a_bad_request() {
    let h = Harness::new().await;
    let (status, body) = h.call("GET", "/weeks/2024-06-12", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
  }

  #[tokio::test]
  async fn missing_week_is_not_found() {
    let h = Harness::new().await;
    let (status, body) = h.call("GET", "/weeks/2024-06-10/report", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
  }

  #[tokio::test]
  async fn deleting_the_active_scheme_conflicts() {
    let h = Harness::new().await;
    let (_, _, scheme) = h.seed().await;
    let (status, body) = h.call("DELETE", &format!("/schemes/{scheme}"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
  }

  #[tokio::test]
  async fn activating_a_scheme_moves_the_marker() {
    let h = Harness::new().await;
    let (_, _, first) = h.seed().await;
    let (_, second) = h
      .call("POST", "/schemes", Some(json!({ "name": "Other", "active": false })))
      .await;
    let second = second["scheme_id"].as_str().unwrap().to_string();

    let (status, body) = h
      .call("POST", &format!("/schemes/{second}/activate"), None)
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], true);

    let (_, body) = h.call("GET", &format!("/schemes/{first}"), None).await;
    assert_eq!(body["is_active"], false);
  }

  #[tokio::test]
  async fn score_history_covers_requested_window() {
    let h = Harness::new().await;
    let (read, _, _) = h.seed().await;
    h.call(
      "PUT",
      "/records/2024-06-10",
      Some(json!({ "entries": [{ "habit_id": read, "completed": true }] })),
    )
    .await;

    let (status, body) = h
      .call("GET", "/scores?weeks=3&through=2024-06-12", None)
      .await;
    assert_eq!(status, StatusCode::OK);
    let points = body.as_array().unwrap();
    assert_eq!(points.len(), 3);
    assert_eq!(points[2]["week_start"], "2024-06-10");
    assert!((points[2]["score"].as_f64().unwrap() - 10.0).abs() < 1e-9);
    assert_eq!(points[0]["score"], 0.0);
  }

  #[tokio::test]
  async fn malformed_input_gets_a_validation_body() {
    let h = Harness::new().await;

    let (status, body) = h.call("POST", "/schemes", Some(json!({ "nam": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
    assert!(body["error"].as_str().unwrap().contains("name"));

    let (status, body) = h.call("GET", "/weeks/not-a-date", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = h.call("GET", "/scores?weeks=many", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = h.call("DELETE", "/habits/42", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
  }

  #[tokio::test]
  async fn extreme_dates_are_rejected_without_breaking_the_server() {
    let h = Harness::new().await;
    let (read, _, _) = h.seed().await;

    let (status, body) = h
      .call(
        "PUT",
        &format!("/records/{}", chrono::NaiveDate::MAX),
        Some(json!({ "entries": [{ "habit_id": read, "completed": true }] })),
      )
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "VALIDATION");

    let (status, body) = h
      .call(
        "GET",
        &format!("/scores?weeks=104&through={}", chrono::NaiveDate::MIN),
        None,
      )
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(body["code"], "VALIDATION");

    let (status, habits) = h.call("GET", "/habits", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(habits.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn habit_lifecycle() {
    let h = Harness::new().await;
    let (read, run, _) = h.seed().await;
    for date in ["2024-06-10", "2024-06-11", "2024-06-12"] {
      h.call(
        "PUT",
        &format!("/records/{date}"),
        Some(json!({ "entries": [{ "habit_id": read, "completed": true }] })),
      )
      .await;
    }

    let (status, body) = h
      .call("PATCH", &format!("/habits/{read}"), Some(json!({ "name": "Reading" })))
      .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Reading");

    let (status, body) = h
      .call("PATCH", &format!("/habits/{read}"), Some(json!({ "kind": "numeric" })))
      .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = h
      .call(
        "PUT",
        "/records/2024-06-13",
        Some(json!({ "entries": [{ "habit_id": run, "value": 5.0 }] })),
      )
      .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");

    let (status, _) = h.call("DELETE", &format!("/habits/{read}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = h.call("GET", &format!("/habits/{read}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Only Run is left to score the week, and it was never completed.
    let (_, week) = h.call("GET", "/weeks/2024-06-10", None).await;
    assert_eq!(week["aggregate"]["score"], 0.0);
    assert_eq!(week["rules"].as_array().unwrap().len(), 1);
  }
}
