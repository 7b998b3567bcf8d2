pub mod session;
pub mod state;

pub use session::{ActivityType, Session, Source, ZoneMinutes};
pub use state::{current_week_start, ConnectionStatus, PersistedState, ZoneThresholds};
