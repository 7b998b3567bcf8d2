//! Test utilities and helpers
//!
//! Mock data factories and a stub activity provider shared across the
//! module test suites.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};

use crate::models::session::{ActivityType, Session, Source, ZoneMinutes};
use crate::sync::{ActivityMeta, ActivityProvider, SampleStream, SyncError};

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_manual_session(id: &str, date: NaiveDate, duration_minutes: i64) -> Session {
  Session {
    id: id.to_string(),
    date,
    activity_type: ActivityType::Run,
    duration_minutes,
    zone_minutes: ZoneMinutes::default(),
    notes: None,
    source: Source::Manual,
    external_id: None,
  }
}

pub fn mock_activity(
  id: i64,
  date: NaiveDate,
  sport: &str,
  moving_time: i64,
  average_heartrate: Option<f64>,
) -> ActivityMeta {
  ActivityMeta {
    id,
    name: format!("Activity {}", id),
    activity_type: sport.to_string(),
    sport_type: None,
    start_date: date.and_time(NaiveTime::MIN).and_utc(),
    elapsed_time: moving_time,
    moving_time,
    average_heartrate,
    max_heartrate: None,
  }
}

/// A stream holding `seconds` of samples at a constant heart rate, one
/// sample every 10 seconds.
pub fn steady_stream(seconds: i64, heartrate: f64) -> SampleStream {
  let samples = (seconds / 10) + 1;
  SampleStream {
    time: (0..samples).map(|i| (i * 10) as f64).collect(),
    heartrate: vec![heartrate; samples as usize],
  }
}

/// ---------------------------------------------------------------------------
/// Stub Activity Provider
/// ---------------------------------------------------------------------------

/// Configurable in-memory provider for reconciliation tests.
#[derive(Default)]
pub struct StubProvider {
  pub activities: Vec<ActivityMeta>,
  pub streams: HashMap<i64, SampleStream>,
  /// Activity ids whose stream fetch fails.
  pub failing: HashSet<i64>,
  /// Whether the listing call itself fails.
  pub fail_listing: bool,
  stream_call_count: AtomicUsize,
}

impl StubProvider {
  pub fn stream_calls(&self) -> usize {
    self.stream_call_count.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ActivityProvider for StubProvider {
  async fn list_activities(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<ActivityMeta>, SyncError> {
    if self.fail_listing {
      return Err(SyncError::Provider("listing unavailable".to_string()));
    }
    Ok(
      self
        .activities
        .iter()
        .filter(|a| {
          let date = a.start_date.date_naive();
          date >= start && date < end
        })
        .cloned()
        .collect(),
    )
  }

  async fn fetch_stream(&self, activity_id: i64) -> Result<Option<SampleStream>, SyncError> {
    self.stream_call_count.fetch_add(1, Ordering::SeqCst);
    if self.failing.contains(&activity_id) {
      return Err(SyncError::Provider(format!(
        "stream fetch failed for {}",
        activity_id
      )));
    }
    Ok(self.streams.get(&activity_id).cloned())
  }
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_steady_stream_shape() {
    let stream = steady_stream(600, 140.0);
    assert_eq!(stream.time.len(), stream.heartrate.len());
    assert_eq!(stream.time.first(), Some(&0.0));
    assert_eq!(stream.time.last(), Some(&600.0));
  }

  #[tokio::test]
  async fn test_stub_provider_filters_by_window() {
    let mut provider = StubProvider::default();
    let inside = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
    let outside = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
    provider.activities = vec![
      mock_activity(1, inside, "Run", 600, None),
      mock_activity(2, outside, "Run", 600, None),
    ];

    let start = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let end = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let listed = provider.list_activities(start, end).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, 1);
  }
}
