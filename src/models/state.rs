use chrono::{Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::session::Session;
use crate::normalize::normalize_session;

/// ---------------------------------------------------------------------------
/// Zone Thresholds
/// ---------------------------------------------------------------------------

/// Lower-bound BPM for zones 2 through 5. Z1 is implicitly everything below
/// `z2_low`. Invariant: bounds are monotonically non-decreasing; `sanitized`
/// restores that for untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneThresholds {
  #[serde(rename = "z2")]
  pub z2_low: f64,
  #[serde(rename = "z3")]
  pub z3_low: f64,
  #[serde(rename = "z4")]
  pub z4_low: f64,
  #[serde(rename = "z5")]
  pub z5_low: f64,
}

impl Default for ZoneThresholds {
  fn default() -> Self {
    Self {
      z2_low: 130.0,
      z3_low: 150.0,
      z4_low: 165.0,
      z5_low: 180.0,
    }
  }
}

impl ZoneThresholds {
  /// Replace non-finite or negative bounds with defaults, then clamp each
  /// bound to at least its predecessor so the ascending invariant holds.
  pub fn sanitized(&self) -> Self {
    let defaults = Self::default();
    let keep = |v: f64, fallback: f64| if v.is_finite() && v >= 0.0 { v } else { fallback };

    let z2 = keep(self.z2_low, defaults.z2_low);
    let z3 = keep(self.z3_low, defaults.z3_low).max(z2);
    let z4 = keep(self.z4_low, defaults.z4_low).max(z3);
    let z5 = keep(self.z5_low, defaults.z5_low).max(z4);

    Self {
      z2_low: z2,
      z3_low: z3,
      z4_low: z4,
      z5_low: z5,
    }
  }

  /// Field-by-field lenient read of an untrusted thresholds object.
  pub fn from_value_lenient(value: &Value) -> Self {
    let defaults = Self::default();
    let field = |key: &str, fallback: f64| -> f64 {
      value.get(key).and_then(Value::as_f64).unwrap_or(fallback)
    };

    Self {
      z2_low: field("z2", defaults.z2_low),
      z3_low: field("z3", defaults.z3_low),
      z4_low: field("z4", defaults.z4_low),
      z5_low: field("z5", defaults.z5_low),
    }
    .sanitized()
  }
}

/// ---------------------------------------------------------------------------
/// Connection Status
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
  #[default]
  Disconnected,
  Connected,
}

/// ---------------------------------------------------------------------------
/// Persisted State
/// ---------------------------------------------------------------------------

/// The whole application state, persisted as one JSON document in a single
/// durable slot. Export and import use the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
  pub window_start: NaiveDate,
  #[serde(default)]
  pub sessions: Vec<Session>,
  #[serde(rename = "zoneThresholds", default)]
  pub thresholds: ZoneThresholds,
  #[serde(rename = "connectionStatus", default)]
  pub connection: ConnectionStatus,
}

impl Default for PersistedState {
  fn default() -> Self {
    Self {
      window_start: current_week_start(),
      sessions: Vec::new(),
      thresholds: ZoneThresholds::default(),
      connection: ConnectionStatus::Disconnected,
    }
  }
}

/// Monday of the current UTC week.
pub fn current_week_start() -> NaiveDate {
  let today = Utc::now().date_naive();
  today - Duration::days(i64::from(today.weekday().num_days_from_monday()))
}

impl PersistedState {
  /// Parse a persisted or imported document, degrading field-by-field to
  /// defaults. Total over any input; a corrupt slot never aborts startup.
  pub fn from_json_lenient(text: &str) -> Self {
    let value: Value = serde_json::from_str(text).unwrap_or(Value::Null);
    Self::from_value_lenient(&value)
  }

  pub fn from_value_lenient(value: &Value) -> Self {
    let mut state = Self::default();

    if let Some(raw) = value.get("windowStart").and_then(Value::as_str) {
      if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        state.window_start = date;
      }
    }

    if let Some(entries) = value.get("sessions").and_then(Value::as_array) {
      state.sessions = entries.iter().map(normalize_session).collect();
    }

    if let Some(thresholds) = value.get("zoneThresholds") {
      state.thresholds = ZoneThresholds::from_value_lenient(thresholds);
    }

    if value.get("connectionStatus").and_then(Value::as_str) == Some("connected") {
      state.connection = ConnectionStatus::Connected;
    }

    state
  }

  pub fn to_json(&self) -> String {
    serde_json::to_string(self).unwrap_or_default()
  }

  pub fn to_json_pretty(&self) -> String {
    serde_json::to_string_pretty(self).unwrap_or_default()
  }

  /// ---------------------------------------------------------------------
  /// Session edits (manual entry path)
  /// ---------------------------------------------------------------------

  /// Normalize and append a session from an untrusted record. Returns the
  /// stored session.
  pub fn add_session(&mut self, raw: &Value) -> Session {
    let session = normalize_session(raw);
    self.sessions.push(session.clone());
    session
  }

  /// Remove a session by id. The only path that destroys a manual session.
  pub fn delete_session(&mut self, id: &str) -> bool {
    let before = self.sessions.len();
    self.sessions.retain(|s| s.id != id);
    self.sessions.len() < before
  }

  pub fn set_thresholds(&mut self, thresholds: ZoneThresholds) {
    self.thresholds = thresholds.sanitized();
  }

  pub fn set_window_start(&mut self, start: NaiveDate) {
    self.window_start = start;
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
