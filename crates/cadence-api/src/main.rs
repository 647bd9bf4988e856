//! Cadence server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for a `[[users]]` entry in config.toml:
//!
//! ```
//! cargo run -p cadence-api --bin server -- --hash-password
//! ```
//!
//! # Backfill
//!
//! `--backfill` links every daily record that predates week tracking to its
//! week, for each configured owner, then exits.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use cadence_api::{AppState, ServerConfig, auth::AuthConfig};
use cadence_core::store::TrackerStore as _;
use cadence_store_sqlite::SqliteStore;
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Cadence weekly habit scoring server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Link orphaned daily records to their weeks for every configured owner,
  /// then exit.
  #[arg(long)]
  backfill: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();
  tracing_subscriber::fmt().with_env_filter(filter).init();

  let cli = Cli::parse();
  if cli.hash_password {
    return print_password_hash();
  }

  let cfg = load_config(cli.config)?;
  let store_path = expand_tilde(&cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("cannot open store at {}", store_path.display()))?;

  if cli.backfill {
    backfill(&store, &cfg).await
  } else {
    serve(store, cfg).await
  }
}

fn load_config(path: PathBuf) -> anyhow::Result<ServerConfig> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("CADENCE"))
    .build()
    .context("cannot read configuration")?
    .try_deserialize()
    .context("invalid server configuration")
}

async fn serve(store: SqliteStore, cfg: ServerConfig) -> anyhow::Result<()> {
  if cfg.users.is_empty() {
    tracing::warn!("no users configured; every request will be rejected");
  }

  let app = cadence_api::router(AppState {
    store: Arc::new(store),
    auth:  Arc::new(AuthConfig { users: cfg.users }),
  });

  let address = format!("{}:{}", cfg.host, cfg.port);
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("cannot bind {address}"))?;
  tracing::info!(%address, "cadence listening");

  axum::serve(listener, app).await.context("server error")
}

async fn backfill(store: &SqliteStore, cfg: &ServerConfig) -> anyhow::Result<()> {
  for user in &cfg.users {
    let linked = store
      .link_orphan_records(user.owner_id)
      .await
      .with_context(|| format!("backfill failed for {}", user.username))?;
    tracing::info!(user = %user.username, linked, "backfill complete");
  }
  Ok(())
}

/// Prompt for a password on stdin and print its argon2 PHC string.
fn print_password_hash() -> anyhow::Result<()> {
  use std::io::{self, BufRead, Write};

  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\r', '\n']);

  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2: {e}"))?;
  println!("{hash}");
  Ok(())
}

/// Expand a leading `~/` to `$HOME`.
fn expand_tilde(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}
