//! Session reconciliation with the activity provider
//!
//! Brings the window's externally sourced sessions up to date without
//! disturbing manual data or external data belonging to other windows.
//! One logical pass per sync: list, normalize, classify (bounded fan-out,
//! per-activity failures isolated), merge.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::session::{ActivityType, Session, Source, ZoneMinutes};
use crate::models::state::ZoneThresholds;
use crate::weekly::WINDOW_DAYS;
use crate::zones::classify_zones;

/// Upper bound on per-activity stream fetches in one sync. Activities beyond
/// the cap keep zero zone minutes.
pub const STREAM_FETCH_CAP: usize = 25;

/// ---------------------------------------------------------------------------
/// Provider Contract
/// ---------------------------------------------------------------------------

/// Activity summary as reported by the provider's listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityMeta {
  pub id: i64,
  #[serde(default)]
  pub name: String,
  /// Legacy activity type; newer records carry `sport_type` as well
  #[serde(rename = "type", default)]
  pub activity_type: String,
  #[serde(default)]
  pub sport_type: Option<String>,
  pub start_date: DateTime<Utc>,
  #[serde(default)]
  pub elapsed_time: i64,
  #[serde(default)]
  pub moving_time: i64,
  #[serde(default)]
  pub average_heartrate: Option<f64>,
  #[serde(default)]
  pub max_heartrate: Option<f64>,
}

impl ActivityMeta {
  /// Whether the summary reports any heart-rate statistic. Only these
  /// activities are worth a stream fetch.
  pub fn has_heartrate(&self) -> bool {
    self
      .average_heartrate
      .or(self.max_heartrate)
      .map(|hr| hr.is_finite() && hr > 0.0)
      .unwrap_or(false)
  }
}

/// Paired time/heart-rate samples for one activity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleStream {
  #[serde(default)]
  pub time: Vec<f64>,
  #[serde(default)]
  pub heartrate: Vec<f64>,
}

impl SampleStream {
  pub fn is_empty(&self) -> bool {
    self.time.is_empty() && self.heartrate.is_empty()
  }
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
  #[error("Provider request failed: {0}")]
  Provider(String),

  #[error("Not connected to the activity provider")]
  NotConnected,
}

/// The provider seam. The Strava client implements this for real use; tests
/// substitute a stub.
#[async_trait]
pub trait ActivityProvider {
  /// List activities with a start time inside `[start, end)`.
  async fn list_activities(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<ActivityMeta>, SyncError>;

  /// Fetch the time/heart-rate stream for one activity. `Ok(None)` means the
  /// provider has no stream for it (manual upload, no monitor worn).
  async fn fetch_stream(&self, activity_id: i64) -> Result<Option<SampleStream>, SyncError>;
}

/// ---------------------------------------------------------------------------
/// Normalization of Provider Records
/// ---------------------------------------------------------------------------

/// Build the external session for a fetched activity. The session id is
/// derived from the provider's native id, so re-syncing the same activity
/// overwrites instead of duplicating.
pub fn session_from_activity(meta: &ActivityMeta) -> Session {
  let label = meta
    .sport_type
    .as_deref()
    .filter(|s| !s.is_empty())
    .unwrap_or(&meta.activity_type);

  // Moving time is what the athlete actually trained; elapsed is the fallback
  let seconds = if meta.moving_time > 0 {
    meta.moving_time
  } else {
    meta.elapsed_time
  };

  Session {
    id: format!("strava-{}", meta.id),
    date: meta.start_date.date_naive(),
    activity_type: ActivityType::from_label(label),
    duration_minutes: ((seconds.max(0) as f64) / 60.0).round() as i64,
    zone_minutes: ZoneMinutes::default(),
    notes: (!meta.name.is_empty()).then(|| meta.name.clone()),
    source: Source::External,
    external_id: Some(meta.id.to_string()),
  }
}

/// ---------------------------------------------------------------------------
/// Merge
/// ---------------------------------------------------------------------------

/// Merge freshly synced external sessions into an existing collection.
///
/// Keeps every manual session and every external session dated outside the
/// synced window; the fresh set replaces everything else. Returns a new
/// collection; the caller persists it in one write.
pub fn merge_window(existing: &[Session], fresh: Vec<Session>, window_start: NaiveDate) -> Vec<Session> {
  let window_end = window_start + Duration::days(WINDOW_DAYS);

  let mut merged: Vec<Session> = existing
    .iter()
    .filter(|s| s.source == Source::Manual || s.date < window_start || s.date >= window_end)
    .cloned()
    .collect();
  merged.extend(fresh);
  merged
}

/// ---------------------------------------------------------------------------
/// Sync
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct SyncOutcome {
  /// The new session collection (not yet persisted).
  pub sessions: Vec<Session>,
  /// Activities reported by the provider for the window.
  pub fetched: usize,
  /// Activities whose streams were classified into zone minutes.
  pub classified: usize,
  /// Activities skipped: no stream, classification declined, or fetch failed.
  pub skipped: usize,
}

/// Sync the window's external sessions from the provider.
///
/// A listing failure is fatal and leaves the collection untouched. A failure
/// fetching or classifying one activity's stream is isolated: that activity
/// keeps zero zone minutes and the loop continues.
pub async fn sync_window<P: ActivityProvider + Sync>(
  provider: &P,
  existing: &[Session],
  thresholds: &ZoneThresholds,
  window_start: NaiveDate,
) -> Result<SyncOutcome, SyncError> {
  let window_end = window_start + Duration::days(WINDOW_DAYS);

  let activities = provider.list_activities(window_start, window_end).await?;
  let mut fresh: Vec<Session> = activities.iter().map(session_from_activity).collect();

  let mut classified = 0;
  let mut skipped = 0;

  for meta in activities
    .iter()
    .filter(|m| m.has_heartrate())
    .take(STREAM_FETCH_CAP)
  {
    let breakdown = match provider.fetch_stream(meta.id).await {
      Ok(Some(stream)) => classify_zones(&stream.time, &stream.heartrate, thresholds),
      Ok(None) => {
        skipped += 1;
        continue;
      }
      Err(e) => {
        warn!("skipping stream for activity {}: {}", meta.id, e);
        skipped += 1;
        continue;
      }
    };

    if !breakdown.has_data {
      skipped += 1;
      continue;
    }

    // Join classified minutes back onto the normalized session
    let native_id = meta.id.to_string();
    if let Some(session) = fresh
      .iter_mut()
      .find(|s| s.external_id.as_deref() == Some(native_id.as_str()))
    {
      session.zone_minutes = breakdown.minutes;
      classified += 1;
    }
  }

  info!(
    "sync for week of {}: {} fetched, {} classified, {} skipped",
    window_start,
    activities.len(),
    classified,
    skipped
  );

  Ok(SyncOutcome {
    sessions: merge_window(existing, fresh, window_start),
    fetched: activities.len(),
    classified,
    skipped,
  })
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
