use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// ---------------------------------------------------------------------------
/// Activity Types
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
  Run,
  Lift,
  Swim,
  Bike,
  Cardio,
}

impl ActivityType {
  pub const ALL: [ActivityType; 5] = [
    ActivityType::Run,
    ActivityType::Lift,
    ActivityType::Swim,
    ActivityType::Bike,
    ActivityType::Cardio,
  ];

  /// Map a free-form label (manual entry or provider sport type) onto a
  /// canonical activity type. Case-insensitive, tolerant of separators,
  /// anything unrecognized lands in Cardio.
  pub fn from_label(label: &str) -> Self {
    let key: String = label
      .trim()
      .to_lowercase()
      .chars()
      .filter(|c| c.is_ascii_alphanumeric())
      .collect();

    match key.as_str() {
      "run" | "running" | "jog" | "jogging" | "trailrun" | "virtualrun" | "treadmill" => {
        ActivityType::Run
      }
      "lift" | "lifting" | "weights" | "strength" | "weighttraining" | "gym" => ActivityType::Lift,
      "swim" | "swimming" | "openwaterswim" | "poolswim" => ActivityType::Swim,
      "bike" | "biking" | "ride" | "cycle" | "cycling" | "virtualride" | "mountainbikeride"
      | "gravelride" | "ebikeride" => ActivityType::Bike,
      _ => ActivityType::Cardio,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      ActivityType::Run => "run",
      ActivityType::Lift => "lift",
      ActivityType::Swim => "swim",
      ActivityType::Bike => "bike",
      ActivityType::Cardio => "cardio",
    }
  }
}

/// ---------------------------------------------------------------------------
/// Session Source
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
  #[default]
  Manual,
  External,
}

/// ---------------------------------------------------------------------------
/// Zone Minutes
/// ---------------------------------------------------------------------------

/// Minutes spent in each heart-rate zone. Totals need not add up to the
/// session duration; the shortfall is implicit unzoned time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneMinutes {
  #[serde(default)]
  pub z1: i64,
  #[serde(default)]
  pub z2: i64,
  #[serde(default)]
  pub z3: i64,
  #[serde(default)]
  pub z4: i64,
  #[serde(default)]
  pub z5: i64,
}

impl ZoneMinutes {
  pub fn total(&self) -> i64 {
    self.z1 + self.z2 + self.z3 + self.z4 + self.z5
  }

  /// Z1 + Z2
  pub fn aerobic(&self) -> i64 {
    self.z1 + self.z2
  }

  /// Z4 + Z5
  pub fn anaerobic(&self) -> i64 {
    self.z4 + self.z5
  }
}

/// ---------------------------------------------------------------------------
/// Session
/// ---------------------------------------------------------------------------

/// Canonical unit of training.
///
/// Invariant: `source == External` exactly when `external_id` is set. The
/// normalizer enforces this for any input shape; code constructing sessions
/// directly is expected to hold it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
  pub id: String,
  pub date: NaiveDate,
  pub activity_type: ActivityType,
  pub duration_minutes: i64,
  #[serde(default)]
  pub zone_minutes: ZoneMinutes,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes: Option<String>,
  #[serde(default)]
  pub source: Source,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub external_id: Option<String>,
}

impl Session {
  /// Duration not attributed to any zone. Folded into Z1 by the weekly
  /// aggregator so no time is silently dropped.
  pub fn unzoned_minutes(&self) -> i64 {
    (self.duration_minutes - self.zone_minutes.total()).max(0)
  }

  /// Zone minutes exceeding the recorded duration. Flagged, never corrected.
  pub fn over_zoned(&self) -> bool {
    self.zone_minutes.total() > self.duration_minutes
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_activity_type_synonyms() {
    assert_eq!(ActivityType::from_label("Ride"), ActivityType::Bike);
    assert_eq!(ActivityType::from_label("cycling"), ActivityType::Bike);
    assert_eq!(ActivityType::from_label("VirtualRide"), ActivityType::Bike);
    assert_eq!(ActivityType::from_label("weights"), ActivityType::Lift);
    assert_eq!(ActivityType::from_label("Strength"), ActivityType::Lift);
    assert_eq!(ActivityType::from_label("WeightTraining"), ActivityType::Lift);
    assert_eq!(ActivityType::from_label("TrailRun"), ActivityType::Run);
    assert_eq!(ActivityType::from_label(" swim "), ActivityType::Swim);
    assert_eq!(ActivityType::from_label("Elliptical"), ActivityType::Cardio);
    assert_eq!(ActivityType::from_label(""), ActivityType::Cardio);
  }

  #[test]
  fn test_unzoned_minutes() {
    let mut session = Session {
      id: "s1".to_string(),
      date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
      activity_type: ActivityType::Run,
      duration_minutes: 90,
      zone_minutes: ZoneMinutes {
        z2: 60,
        ..ZoneMinutes::default()
      },
      notes: None,
      source: Source::Manual,
      external_id: None,
    };

    assert_eq!(session.unzoned_minutes(), 30);
    assert!(!session.over_zoned());

    // Fully zoned
    session.zone_minutes.z3 = 30;
    assert_eq!(session.unzoned_minutes(), 0);

    // Over-zoned: flagged, not clamped away
    session.zone_minutes.z4 = 15;
    assert_eq!(session.unzoned_minutes(), 0);
    assert!(session.over_zoned());
  }

  #[test]
  fn test_zone_minutes_aggregates() {
    let zones = ZoneMinutes {
      z1: 10,
      z2: 20,
      z3: 5,
      z4: 3,
      z5: 2,
    };
    assert_eq!(zones.total(), 40);
    assert_eq!(zones.aerobic(), 30);
    assert_eq!(zones.anaerobic(), 5);
  }

  #[test]
  fn test_session_json_shape() {
    let session = Session {
      id: "strava-42".to_string(),
      date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
      activity_type: ActivityType::Bike,
      duration_minutes: 60,
      zone_minutes: ZoneMinutes::default(),
      notes: None,
      source: Source::External,
      external_id: Some("42".to_string()),
    };

    let json = serde_json::to_value(&session).unwrap();
    assert_eq!(json["activityType"], "bike");
    assert_eq!(json["durationMinutes"], 60);
    assert_eq!(json["source"], "external");
    assert_eq!(json["externalId"], "42");
  }
}
