//! Heart-rate zone classification
//!
//! Converts a paired (timestamp, heart-rate) sample stream into per-zone
//! elapsed time. Streaming single pass: each consecutive sample pair
//! contributes its elapsed interval to the zone of the later sample.

use crate::models::session::ZoneMinutes;
use crate::models::state::ZoneThresholds;

/// Result of classifying one stream. `has_data` distinguishes "zero effort"
/// from "no usable stream".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ZoneBreakdown {
  pub minutes: ZoneMinutes,
  pub has_data: bool,
}

impl ZoneBreakdown {
  pub fn no_data() -> Self {
    Self::default()
  }
}

/// Classify a sample stream into per-zone minutes.
///
/// Both sequences must be present, equal length, and at least 2 samples long;
/// anything else is a no-data result. Out-of-order or duplicate timestamps
/// contribute zero elapsed time. Seconds are converted to minutes once at the
/// end, so rounding error stays bounded regardless of sample count.
pub fn classify_zones(time: &[f64], heartrate: &[f64], thresholds: &ZoneThresholds) -> ZoneBreakdown {
  if time.len() < 2 || time.len() != heartrate.len() {
    return ZoneBreakdown::no_data();
  }

  let thresholds = thresholds.sanitized();
  let mut seconds = [0.0_f64; 5];

  for i in 1..time.len() {
    let dt = (time[i] - time[i - 1]).max(0.0);
    seconds[zone_index(heartrate[i], &thresholds)] += dt;
  }

  ZoneBreakdown {
    minutes: ZoneMinutes {
      z1: to_minutes(seconds[0]),
      z2: to_minutes(seconds[1]),
      z3: to_minutes(seconds[2]),
      z4: to_minutes(seconds[3]),
      z5: to_minutes(seconds[4]),
    },
    has_data: true,
  }
}

/// Descending threshold comparison. Every BPM value (including NaN, which
/// fails all comparisons) lands in exactly one zone.
fn zone_index(hr: f64, thresholds: &ZoneThresholds) -> usize {
  if hr >= thresholds.z5_low {
    4
  } else if hr >= thresholds.z4_low {
    3
  } else if hr >= thresholds.z3_low {
    2
  } else if hr >= thresholds.z2_low {
    1
  } else {
    0
  }
}

fn to_minutes(seconds: f64) -> i64 {
  (seconds / 60.0).round() as i64
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
