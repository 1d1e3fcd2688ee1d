//! Month-granularity publication window.
//!
//! A window of `months` ends at the current calendar month and starts
//! `months` calendar months earlier. `0` and `1` both mean "this month
//! only". Day-of-month and time-of-day never matter.

use chrono::{DateTime, Datelike, Utc};

/// Inclusive range of calendar months, as `year * 12 + month` ordinals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    start: i64,
    end: i64,
}

fn ordinal(year: i32, month: u32) -> i64 {
    i64::from(year) * 12 + i64::from(month)
}

impl DateWindow {
    pub fn new(now: DateTime<Utc>, months: u32) -> Self {
        let end = ordinal(now.year(), now.month());
        if months <= 1 {
            return Self { start: end, end };
        }

        // Stepping the ordinal back borrows years; any u32 fits in i64.
        Self {
            start: end - i64::from(months),
            end,
        }
    }

    /// First month of the window as `(year, month)`.
    pub fn start(&self) -> (i32, u32) {
        split(self.start)
    }

    /// Last month of the window as `(year, month)`.
    pub fn end(&self) -> (i32, u32) {
        split(self.end)
    }

    pub fn contains(&self, candidate: DateTime<Utc>) -> bool {
        let c = ordinal(candidate.year(), candidate.month());
        self.start <= c && c <= self.end
    }
}

fn split(ordinal: i64) -> (i32, u32) {
    // Month 12 of year Y has the same ordinal as a nonexistent month 0 of Y+1.
    let year = (ordinal - 1).div_euclid(12);
    let month = (ordinal - 1).rem_euclid(12) + 1;
    (year as i32, month as u32)
}
