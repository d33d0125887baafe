//! # Clock Injection
//!
//! Usage-window resolution must be deterministic and testable, so the
//! engine never reads the wall clock directly — "now" comes from an
//! injected [`Clock`]. Production uses [`SystemClock`]; tests pin and
//! advance a [`ManualClock`] to walk invoices across window boundaries.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for every engine operation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests.
///
/// Hold an `Arc<ManualClock>`, hand a clone to the engine, then `set` or
/// `advance` to move time between operations.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        ManualClock {
            now: Mutex::new(start),
        }
    }

    /// Pins the clock to an instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().expect("clock mutex poisoned") = instant;
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock mutex poisoned");
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock mutex poisoned")
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_manual_clock_set_and_advance() {
        let start = Utc.with_ymd_and_hms(2026, 8, 8, 10, 0, 0).unwrap();
        let clock = ManualClock::new(start);
        assert_eq!(clock.now(), start);

        clock.advance(Duration::days(1));
        assert_eq!(clock.now(), start + Duration::days(1));

        let pinned = Utc.with_ymd_and_hms(2026, 9, 1, 0, 0, 0).unwrap();
        clock.set(pinned);
        assert_eq!(clock.now(), pinned);
    }
}
