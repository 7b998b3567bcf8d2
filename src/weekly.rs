//! Weekly aggregation
//!
//! Reduces a session collection over a 7-day window into zone totals,
//! aerobic/anaerobic splits, per-activity totals, and per-day totals.
//! Pure function of (collection, window start): recomputed from scratch on
//! every call, nothing cached, nothing persisted.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::session::{ActivityType, Session, ZoneMinutes};

/// Days covered by one aggregation window.
pub const WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, Serialize)]
pub struct DayTotal {
  pub date: NaiveDate,
  pub minutes: i64,
}

/// Derived weekly projection. `zone_minutes.z1` is adjusted Z1: raw Z1 plus
/// every session's unzoned time, so no recorded duration is silently dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyTotals {
  pub window_start: NaiveDate,
  pub zone_minutes: ZoneMinutes,
  pub total_min: i64,
  pub aerobic_min: i64,
  pub anaerobic_min: i64,
  pub activity_minutes: BTreeMap<ActivityType, i64>,
  pub daily_minutes: Vec<DayTotal>,
  pub session_count: usize,
  /// Sessions whose zone minutes exceed their duration. Flagged, not fixed.
  pub over_zoned_sessions: usize,
}

/// Aggregate the sessions falling inside `[window_start, window_start + 7d)`.
pub fn weekly_totals(sessions: &[Session], window_start: NaiveDate) -> WeeklyTotals {
  let window_end = window_start + Duration::days(WINDOW_DAYS);

  let mut in_window: Vec<&Session> = sessions
    .iter()
    .filter(|s| s.date >= window_start && s.date < window_end)
    .collect();
  // Stable sort: same-date sessions keep their original order
  in_window.sort_by_key(|s| s.date);

  let mut zone_minutes = ZoneMinutes::default();
  let mut activity_minutes: BTreeMap<ActivityType, i64> =
    ActivityType::ALL.iter().map(|t| (*t, 0)).collect();
  let mut daily: BTreeMap<NaiveDate, i64> = (0..WINDOW_DAYS)
    .map(|offset| (window_start + Duration::days(offset), 0))
    .collect();
  let mut over_zoned_sessions = 0;

  for session in &in_window {
    zone_minutes.z1 += session.zone_minutes.z1 + session.unzoned_minutes();
    zone_minutes.z2 += session.zone_minutes.z2;
    zone_minutes.z3 += session.zone_minutes.z3;
    zone_minutes.z4 += session.zone_minutes.z4;
    zone_minutes.z5 += session.zone_minutes.z5;

    if session.over_zoned() {
      over_zoned_sessions += 1;
    }

    *activity_minutes.entry(session.activity_type).or_insert(0) += session.duration_minutes;
    *daily.entry(session.date).or_insert(0) += session.duration_minutes;
  }

  WeeklyTotals {
    window_start,
    total_min: zone_minutes.total(),
    aerobic_min: zone_minutes.aerobic(),
    anaerobic_min: zone_minutes.anaerobic(),
    zone_minutes,
    activity_minutes,
    daily_minutes: daily
      .into_iter()
      .map(|(date, minutes)| DayTotal { date, minutes })
      .collect(),
    session_count: in_window.len(),
    over_zoned_sessions,
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
