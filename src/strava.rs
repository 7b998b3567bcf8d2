//! Strava API client
//!
//! Implements the `ActivityProvider` seam over the Strava v3 REST API.
//! Authentication (OAuth, token refresh) is outside this crate; the client
//! consumes a ready access token from the environment.

use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use url::Url;

use crate::sync::{ActivityMeta, ActivityProvider, SampleStream, SyncError};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const STRAVA_API_BASE: &str = "https://www.strava.com/api/v3";
const ACTIVITIES_PER_PAGE: u32 = 100;

/// ---------------------------------------------------------------------------
/// Configuration
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StravaConfig {
  pub access_token: String,
  pub api_base: String,
}

impl StravaConfig {
  pub fn new(access_token: impl Into<String>) -> Self {
    Self {
      access_token: access_token.into(),
      api_base: STRAVA_API_BASE.to_string(),
    }
  }

  pub fn from_env() -> Result<Self, StravaError> {
    let access_token = env::var("STRAVA_ACCESS_TOKEN")
      .map_err(|_| StravaError::MissingConfig("STRAVA_ACCESS_TOKEN".into()))?;
    Ok(Self::new(access_token))
  }

  /// Point the client at a different API host. Used by tests.
  pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
    self.api_base = api_base.into();
    self
  }
}

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum StravaError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Strava API error: {0}")]
  Api(String),

  #[error("Not authenticated with Strava")]
  NotAuthenticated,
}

impl From<StravaError> for SyncError {
  fn from(err: StravaError) -> Self {
    match err {
      StravaError::NotAuthenticated | StravaError::MissingConfig(_) => SyncError::NotConnected,
      other => SyncError::Provider(other.to_string()),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

pub struct StravaClient {
  config: StravaConfig,
  http: Client,
}

/// Stream entry in Strava's `key_by_type=true` object format:
/// `{"time": {"data": [...]}, "heartrate": {"data": [...]}}`
#[derive(Debug, Clone, Deserialize)]
struct KeyedStream {
  #[serde(default)]
  data: Vec<Value>,
}

impl StravaClient {
  pub fn new(config: StravaConfig) -> Self {
    Self {
      config,
      http: Client::new(),
    }
  }

  async fn list_activities_page(&self, after: i64, before: i64) -> Result<Vec<ActivityMeta>, StravaError> {
    let mut url = Url::parse(&format!("{}/athlete/activities", self.config.api_base))
      .map_err(|e| StravaError::Api(e.to_string()))?;
    url
      .query_pairs_mut()
      .append_pair("after", &after.to_string())
      .append_pair("before", &before.to_string())
      .append_pair("per_page", &ACTIVITIES_PER_PAGE.to_string());

    let response = self
      .http
      .get(url)
      .header("Authorization", format!("Bearer {}", self.config.access_token))
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
      return Err(StravaError::NotAuthenticated);
    }

    if !response.status().is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StravaError::Api(format!(
        "Failed to fetch activities: {}",
        error_text
      )));
    }

    let response_text = response.text().await?;
    let activities: Vec<ActivityMeta> = serde_json::from_str(&response_text).map_err(|e| {
      warn!(
        "Failed to parse activities response (first 500 chars): {}",
        &response_text[..response_text.len().min(500)]
      );
      StravaError::Api(format!("Failed to parse activities: {}", e))
    })?;

    Ok(activities)
  }

  async fn fetch_activity_stream(&self, activity_id: i64) -> Result<Option<SampleStream>, StravaError> {
    let url = format!(
      "{}/activities/{}/streams?keys=time,heartrate&key_by_type=true",
      self.config.api_base, activity_id
    );

    let response = self
      .http
      .get(&url)
      .header("Authorization", format!("Bearer {}", self.config.access_token))
      .send()
      .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
      return Err(StravaError::NotAuthenticated);
    }

    // 404 means no streams exist for this activity (manual entry, no device)
    if response.status() == reqwest::StatusCode::NOT_FOUND {
      return Ok(None);
    }

    if !response.status().is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(StravaError::Api(format!(
        "Failed to fetch streams: {}",
        error_text
      )));
    }

    let response_text = response.text().await?;
    let keyed: HashMap<String, KeyedStream> = serde_json::from_str(&response_text)
      .map_err(|e| StravaError::Api(format!("Failed to parse streams: {}", e)))?;

    let series = |key: &str| -> Vec<f64> {
      keyed
        .get(key)
        .map(|s| s.data.iter().filter_map(Value::as_f64).collect())
        .unwrap_or_default()
    };

    let stream = SampleStream {
      time: series("time"),
      heartrate: series("heartrate"),
    };

    if stream.time.is_empty() || stream.heartrate.is_empty() {
      return Ok(None);
    }
    Ok(Some(stream))
  }
}

fn epoch_start_of_day(date: NaiveDate) -> i64 {
  date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[async_trait]
impl ActivityProvider for StravaClient {
  async fn list_activities(
    &self,
    start: NaiveDate,
    end: NaiveDate,
  ) -> Result<Vec<ActivityMeta>, SyncError> {
    let activities = self
      .list_activities_page(epoch_start_of_day(start), epoch_start_of_day(end))
      .await?;
    Ok(activities)
  }

  async fn fetch_stream(&self, activity_id: i64) -> Result<Option<SampleStream>, SyncError> {
    Ok(self.fetch_activity_stream(activity_id).await?)
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  fn client_for(server: &mockito::ServerGuard) -> StravaClient {
    StravaClient::new(StravaConfig::new("test-token").with_api_base(server.url()))
  }

  fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
  }

  #[test]
  #[serial]
  fn test_config_from_env() {
    temp_env::with_var("STRAVA_ACCESS_TOKEN", None::<&str>, || {
      assert!(StravaConfig::from_env().is_err());
    });

    temp_env::with_var("STRAVA_ACCESS_TOKEN", Some("abc123"), || {
      let config = StravaConfig::from_env().unwrap();
      assert_eq!(config.access_token, "abc123");
      assert_eq!(config.api_base, STRAVA_API_BASE);
    });
  }

  #[tokio::test]
  async fn test_list_activities_parses_summary() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"[
      {
        "id": 101,
        "name": "Morning Run",
        "type": "Run",
        "sport_type": "TrailRun",
        "start_date": "2025-03-11T07:30:00Z",
        "elapsed_time": 3700,
        "moving_time": 3600,
        "average_heartrate": 148.2,
        "max_heartrate": 171.0
      },
      { "id": 102, "name": "Lunch Swim", "type": "Swim", "start_date": "2025-03-12T12:00:00Z" }
    ]"#;
    let mock = server
      .mock("GET", "/athlete/activities")
      .match_query(mockito::Matcher::Any)
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(body)
      .create_async()
      .await;

    let activities = client_for(&server)
      .list_activities(date(10), date(17))
      .await
      .unwrap();

    mock.assert_async().await;
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].id, 101);
    assert_eq!(activities[0].sport_type.as_deref(), Some("TrailRun"));
    assert!(activities[0].has_heartrate());
    // Missing fields default rather than failing the parse
    assert_eq!(activities[1].moving_time, 0);
    assert!(!activities[1].has_heartrate());
  }

  #[tokio::test]
  async fn test_unauthorized_maps_to_not_connected() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/athlete/activities")
      .match_query(mockito::Matcher::Any)
      .with_status(401)
      .with_body(r#"{"message":"Authorization Error"}"#)
      .create_async()
      .await;

    let result = client_for(&server).list_activities(date(10), date(17)).await;
    assert!(matches!(result, Err(SyncError::NotConnected)));
  }

  #[tokio::test]
  async fn test_fetch_stream_keyed_format() {
    let mut server = mockito::Server::new_async().await;
    let body = r#"{
      "time": { "data": [0, 60, 120], "series_type": "time" },
      "heartrate": { "data": [100, 160, 190], "series_type": "time" }
    }"#;
    let _mock = server
      .mock("GET", "/activities/101/streams")
      .match_query(mockito::Matcher::Any)
      .with_status(200)
      .with_body(body)
      .create_async()
      .await;

    let stream = client_for(&server).fetch_stream(101).await.unwrap().unwrap();
    assert_eq!(stream.time, vec![0.0, 60.0, 120.0]);
    assert_eq!(stream.heartrate, vec![100.0, 160.0, 190.0]);
  }

  #[tokio::test]
  async fn test_fetch_stream_404_means_absent() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/activities/101/streams")
      .match_query(mockito::Matcher::Any)
      .with_status(404)
      .with_body(r#"{"message":"Record Not Found"}"#)
      .create_async()
      .await;

    let stream = client_for(&server).fetch_stream(101).await.unwrap();
    assert!(stream.is_none());
  }

  #[tokio::test]
  async fn test_fetch_stream_missing_series_means_absent() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("GET", "/activities/101/streams")
      .match_query(mockito::Matcher::Any)
      .with_status(200)
      .with_body(r#"{ "time": { "data": [0, 60] } }"#)
      .create_async()
      .await;

    let stream = client_for(&server).fetch_stream(101).await.unwrap();
    assert!(stream.is_none());
  }
}
