//! # Usage Window Resolver
//!
//! Calendar-window math for usage-limited benefits.
//!
//! ## Window Shapes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  All windows are half-open [start, end) calendar blocks containing      │
//! │  the reference instant:                                                 │
//! │                                                                         │
//! │  day      calendar day            [00:00, next day 00:00)              │
//! │  week     most recent Monday      [Mon 00:00, next Mon 00:00)          │
//! │  month    calendar month          [1st 00:00, 1st of next month)       │
//! │  quarter  3-month calendar block  [Jan|Apr|Jul|Oct 1st, +3 months)     │
//! │  year     calendar year           [Jan 1st, next Jan 1st)              │
//! │                                                                         │
//! │  An invoice dated one second before `end` counts toward the window;    │
//! │  one second after does not.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//! Resolution depends only on the supplied reference instant — there is no
//! hidden clock read anywhere in this module. The engine injects "now".

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// =============================================================================
// Window Kind
// =============================================================================

/// The calendar period a usage limit rolls over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    Day,
    Week,
    Month,
    Quarter,
    Year,
}

// =============================================================================
// Usage Window
// =============================================================================

/// A resolved half-open `[start, end)` window instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct UsageWindow {
    pub kind: WindowKind,
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl UsageWindow {
    /// Resolves the window instance containing `reference`.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::{TimeZone, Utc};
    /// use meridian_core::window::{UsageWindow, WindowKind};
    ///
    /// let now = Utc.with_ymd_and_hms(2026, 8, 8, 13, 45, 0).unwrap();
    /// let w = UsageWindow::containing(WindowKind::Week, now);
    ///
    /// // 2026-08-08 is a Saturday; the week started Monday the 3rd
    /// assert_eq!(w.start, Utc.with_ymd_and_hms(2026, 8, 3, 0, 0, 0).unwrap());
    /// assert_eq!(w.end, Utc.with_ymd_and_hms(2026, 8, 10, 0, 0, 0).unwrap());
    /// ```
    pub fn containing(kind: WindowKind, reference: DateTime<Utc>) -> UsageWindow {
        let date = reference.date_naive();

        let (start_date, end_date) = match kind {
            WindowKind::Day => (date, date + Days::new(1)),
            WindowKind::Week => {
                let monday = date - Days::new(date.weekday().num_days_from_monday() as u64);
                (monday, monday + Days::new(7))
            }
            WindowKind::Month => {
                let first = first_of_month(date);
                (first, first + Months::new(1))
            }
            WindowKind::Quarter => {
                let first = first_of_month(date) - Months::new(date.month0() % 3);
                (first, first + Months::new(3))
            }
            WindowKind::Year => {
                let first = first_of_month(date) - Months::new(date.month0());
                (first, first + Months::new(12))
            }
        };

        UsageWindow {
            kind,
            start: midnight(start_date),
            end: midnight(end_date),
        }
    }

    /// Half-open containment check: `start <= instant < end`.
    #[inline]
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }

    /// Human-readable label for the window instance, used in discount
    /// decisions ("you have 1 use left this month").
    pub fn label(&self) -> String {
        let d = self.start.date_naive();
        match self.kind {
            WindowKind::Day => d.format("%Y-%m-%d").to_string(),
            WindowKind::Week => format!("week of {}", d.format("%Y-%m-%d")),
            WindowKind::Month => d.format("%Y-%m").to_string(),
            WindowKind::Quarter => format!("Q{} {}", d.month0() / 3 + 1, d.year()),
            WindowKind::Year => d.year().to_string(),
        }
    }
}

/// First day of the date's month. Pure date arithmetic, cannot fail.
fn first_of_month(date: NaiveDate) -> NaiveDate {
    date - Days::new(date.day0() as u64)
}

/// Start-of-day instant for a date.
fn midnight(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Unit Tests
// =============================================================================
