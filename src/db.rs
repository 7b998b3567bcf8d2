use std::env;
use std::fs;
use std::path::PathBuf;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::store::StoreError;

pub type DbPool = SqlitePool;

/// Resolve the database file path: `ZONE_LOG_DB` override, otherwise
/// `~/.zone-log/zone-log.db`.
fn db_path() -> Result<PathBuf, StoreError> {
  if let Ok(path) = env::var("ZONE_LOG_DB") {
    return Ok(PathBuf::from(path));
  }

  let home = env::var("HOME").map_err(|_| StoreError::Config("HOME is not set".into()))?;
  let data_dir = PathBuf::from(home).join(".zone-log");
  fs::create_dir_all(&data_dir)?;
  Ok(data_dir.join("zone-log.db"))
}

/// Initialize the database connection pool and run migrations.
pub async fn connect() -> Result<DbPool, StoreError> {
  let path = db_path()?;
  let db_url = format!("sqlite://{}?mode=rwc", path.display());

  info!("opening state database at {}", path.display());

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}

/// In-memory database for tests.
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases.
pub async fn connect_in_memory() -> Result<DbPool, StoreError> {
  let pool = SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}
