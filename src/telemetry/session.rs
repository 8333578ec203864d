use chrono::Local;

use super::events::{TelemetryEvent, TelemetryRecord};
use crate::core::constants::{SESSION_ID_FORMAT, TIMESTAMP_FORMAT};

/// Identifies one process run and stamps records with wall-clock time.
#[derive(Debug, Clone)]
pub struct SessionClock {
    session_id: String,
}

impl SessionClock {
    /// Starts a session keyed by the current local time (`YYYYMMDD_HHMMSS`).
    pub fn start() -> Self {
        Self {
            session_id: Local::now().format(SESSION_ID_FORMAT).to_string(),
        }
    }

    pub fn with_id(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Current local time at second resolution.
    pub fn timestamp(&self) -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn stamp(&self, floor: u32, event: TelemetryEvent) -> TelemetryRecord {
        TelemetryRecord {
            session_id: self.session_id.clone(),
            timestamp: self.timestamp(),
            floor,
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    #[test]
    fn test_session_id_format() {
        let clock = SessionClock::start();
        let id = clock.session_id();
        assert_eq!(id.len(), 15);
        assert_eq!(&id[8..9], "_");
        assert!(NaiveDateTime::parse_from_str(id, SESSION_ID_FORMAT).is_ok());
    }

    #[test]
    fn test_timestamp_format() {
        let clock = SessionClock::start();
        assert!(NaiveDateTime::parse_from_str(&clock.timestamp(), TIMESTAMP_FORMAT).is_ok());
    }

    #[test]
    fn test_stamp_keeps_session_and_floor() {
        let clock = SessionClock::with_id("20240101_000000");
        let record = clock.stamp(4, TelemetryEvent::health(50, 100));
        assert_eq!(record.session_id, "20240101_000000");
        assert_eq!(record.floor, 4);
        assert_eq!(record.event, TelemetryEvent::health(50, 100));
    }
}
