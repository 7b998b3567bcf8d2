//! Session normalization
//!
//! Coerces any raw or partial session payload into a canonical `Session`.
//! Input comes from manual entry forms, import files, and previously
//! persisted documents; none of it is trusted. The function is total:
//! malformed input degrades to safe defaults instead of failing the caller.

use chrono::{NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::models::session::{ActivityType, Session, Source, ZoneMinutes};

/// Normalize an untrusted record into a valid `Session`.
///
/// Enforces the source invariant: a session is External only when the record
/// explicitly says so and carries a recoverable external id; anything else is
/// Manual with no external id.
pub fn normalize_session(raw: &Value) -> Session {
  let id = string_field(raw, &["id"])
    .filter(|s| !s.is_empty())
    .unwrap_or_else(|| Uuid::new_v4().to_string());

  let date = string_field(raw, &["date"])
    .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
    .unwrap_or_else(|| Utc::now().date_naive());

  let activity_type = string_field(raw, &["activityType", "activity_type", "type"])
    .map(|s| ActivityType::from_label(&s))
    .unwrap_or(ActivityType::Cardio);

  let duration_minutes = minutes_field(raw, &["durationMinutes", "duration_minutes", "duration"]);

  let zone_minutes = zone_minutes_field(raw);

  let notes = string_field(raw, &["notes"]).filter(|s| !s.is_empty());

  let external_id = external_id_field(raw);
  let wants_external = string_field(raw, &["source"])
    .map(|s| s.eq_ignore_ascii_case("external"))
    .unwrap_or(false);

  let (source, external_id) = match external_id {
    Some(eid) if wants_external => (Source::External, Some(eid)),
    _ => (Source::Manual, None),
  };

  Session {
    id,
    date,
    activity_type,
    duration_minutes,
    zone_minutes,
    notes,
    source,
    external_id,
  }
}

/// First present string among aliased keys.
fn string_field(raw: &Value, keys: &[&str]) -> Option<String> {
  keys
    .iter()
    .find_map(|key| raw.get(*key))
    .and_then(Value::as_str)
    .map(str::to_string)
}

/// Numeric field as whole minutes: non-finite and negative values clamp to 0,
/// fractional values round. Numeric strings are accepted.
fn minutes_field(raw: &Value, keys: &[&str]) -> i64 {
  keys
    .iter()
    .find_map(|key| raw.get(*key))
    .map(clamp_minutes)
    .unwrap_or(0)
}

fn clamp_minutes(value: &Value) -> i64 {
  let number = match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse::<f64>().ok(),
    _ => None,
  };
  match number {
    Some(v) if v.is_finite() && v > 0.0 => v.round() as i64,
    _ => 0,
  }
}

/// Zone minutes from either an object `{z1..z5}` or a 5-element array.
fn zone_minutes_field(raw: &Value) -> ZoneMinutes {
  let value = match raw.get("zoneMinutes").or_else(|| raw.get("zones")) {
    Some(v) => v,
    None => return ZoneMinutes::default(),
  };

  match value {
    Value::Object(map) => ZoneMinutes {
      z1: map.get("z1").map(clamp_minutes).unwrap_or(0),
      z2: map.get("z2").map(clamp_minutes).unwrap_or(0),
      z3: map.get("z3").map(clamp_minutes).unwrap_or(0),
      z4: map.get("z4").map(clamp_minutes).unwrap_or(0),
      z5: map.get("z5").map(clamp_minutes).unwrap_or(0),
    },
    Value::Array(items) => {
      let at = |i: usize| items.get(i).map(clamp_minutes).unwrap_or(0);
      ZoneMinutes {
        z1: at(0),
        z2: at(1),
        z3: at(2),
        z4: at(3),
        z5: at(4),
      }
    }
    _ => ZoneMinutes::default(),
  }
}

/// External ids arrive as strings or provider-native numbers.
fn external_id_field(raw: &Value) -> Option<String> {
  let value = raw.get("externalId").or_else(|| raw.get("external_id"))?;
  match value {
    Value::String(s) if !s.is_empty() => Some(s.clone()),
    Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
