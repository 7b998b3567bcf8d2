//! Durable state slot
//!
//! The whole application state persists as one JSON document in a fixed slot.
//! Loading tolerates an absent or corrupt slot (defaults, never a crash);
//! saving is write-through and a failed save is logged and swallowed, since
//! losing state is acceptable and aborting the user's action is not.

use std::fs;
use std::path::Path;

use async_trait::async_trait;
use tracing::warn;

use crate::db::DbPool;
use crate::models::state::PersistedState;

const STATE_SLOT: &str = "default";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Missing configuration: {0}")]
  Config(String),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Database error: {0}")]
  Database(#[from] sqlx::Error),

  #[error("Migration error: {0}")]
  Migration(#[from] sqlx::migrate::MigrateError),
}

/// ---------------------------------------------------------------------------
/// Store Interface
/// ---------------------------------------------------------------------------

/// Injected storage collaborator. Production uses SQLite; tests can
/// substitute anything implementing load/save.
#[async_trait]
pub trait StateStore {
  async fn load(&self) -> Result<Option<PersistedState>, StoreError>;
  async fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}

pub struct SqliteStateStore {
  pool: DbPool,
}

impl SqliteStateStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl StateStore for SqliteStateStore {
  async fn load(&self) -> Result<Option<PersistedState>, StoreError> {
    let row: Option<(String,)> =
      sqlx::query_as("SELECT state_json FROM app_state WHERE slot = ?1")
        .bind(STATE_SLOT)
        .fetch_optional(&self.pool)
        .await?;

    Ok(row.map(|(json,)| PersistedState::from_json_lenient(&json)))
  }

  async fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
    sqlx::query(
      r#"
      INSERT INTO app_state (slot, state_json, updated_at)
      VALUES (?1, ?2, CURRENT_TIMESTAMP)
      ON CONFLICT(slot) DO UPDATE SET
        state_json = excluded.state_json,
        updated_at = excluded.updated_at
      "#,
    )
    .bind(STATE_SLOT)
    .bind(state.to_json())
    .execute(&self.pool)
    .await?;

    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Startup / Write-Through Helpers
/// ---------------------------------------------------------------------------

/// Load the persisted state, falling back to defaults on an empty slot or a
/// load failure.
pub async fn load_or_default<S: StateStore + Sync>(store: &S) -> PersistedState {
  match store.load().await {
    Ok(Some(state)) => state,
    Ok(None) => PersistedState::default(),
    Err(e) => {
      warn!("failed to load persisted state, starting fresh: {}", e);
      PersistedState::default()
    }
  }
}

/// Write-through save. Failure is logged, never surfaced.
pub async fn save_quietly<S: StateStore + Sync>(store: &S, state: &PersistedState) {
  if let Err(e) = store.save(state).await {
    warn!("failed to persist state: {}", e);
  }
}

/// ---------------------------------------------------------------------------
/// File Export / Import
/// ---------------------------------------------------------------------------

/// Export the full state as a transportable JSON document.
pub fn export_to_file(state: &PersistedState, path: &Path) -> Result<(), StoreError> {
  fs::write(path, state.to_json_pretty())?;
  Ok(())
}

/// Import a state document, applying the same per-field defaulting as startup
/// load. Only the file read itself can fail; content never does.
pub fn import_from_file(path: &Path) -> Result<PersistedState, StoreError> {
  let text = fs::read_to_string(path)?;
  Ok(PersistedState::from_json_lenient(&text))
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
