//! Heart-rate zone training log.
//!
//! Classifies training effort by heart-rate zone and reconciles manually
//! entered sessions with sessions imported from Strava over a 7-day window.
//! The core is pure: classification, normalization, and aggregation are
//! side-effect-free functions over the canonical `Session` collection, with
//! the provider and the durable store injected behind traits.

pub mod db;
pub mod models;
pub mod normalize;
pub mod store;
pub mod strava;
pub mod sync;
pub mod weekly;
pub mod zones;

#[cfg(test)]
pub mod test_utils;

pub use models::session::{ActivityType, Session, Source, ZoneMinutes};
pub use models::state::{current_week_start, ConnectionStatus, PersistedState, ZoneThresholds};
pub use normalize::normalize_session;
pub use sync::{merge_window, sync_window, ActivityProvider, SyncOutcome};
pub use weekly::{weekly_totals, WeeklyTotals};
pub use zones::{classify_zones, ZoneBreakdown};
