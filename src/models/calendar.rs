//! Machine calendar and time window models.
//!
//! Every machine works the same daily pattern: it is available for
//! `daily_available_minutes` from the start of each day and then enters a
//! maintenance window until the day ends. Work that reaches the maintenance
//! boundary pauses and resumes at the start of the next day.
//!
//! # Time Model
//! All times are integer seconds relative to the scheduling epoch (t=0),
//! which is the start of day 0.
//!
//! ```text
//! day d:  [d*86400 ............ d*86400+avail)[ maintenance )[day d+1 ...
//! ```

use serde::{Deserialize, Serialize};

/// Seconds in one calendar day.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: u32 = 1_440;

/// Default daily availability: 22 working hours (2 h maintenance).
pub const DEFAULT_DAILY_AVAILABLE_MINUTES: u32 = 1_320;

/// A time interval [start, end).
///
/// Half-open interval: includes start, excludes end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    /// Interval start (s, inclusive).
    pub start: i64,
    /// Interval end (s, exclusive).
    pub end: i64,
}

impl TimeWindow {
    /// Creates a new time window.
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Duration of this window (s).
    #[inline]
    pub fn duration(&self) -> i64 {
        self.end - self.start
    }

    /// Whether a timestamp falls within this window.
    #[inline]
    pub fn contains(&self, time: i64) -> bool {
        time >= self.start && time < self.end
    }

    /// Whether two windows overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Recurring daily availability of one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCalendar {
    available_secs: i64,
}

impl Default for DailyCalendar {
    fn default() -> Self {
        Self::new(DEFAULT_DAILY_AVAILABLE_MINUTES)
    }
}

impl DailyCalendar {
    /// Creates a calendar with the given daily availability.
    ///
    /// Values above a full day are clamped to 1440 minutes (no maintenance).
    pub fn new(daily_available_minutes: u32) -> Self {
        let minutes = daily_available_minutes.min(MINUTES_PER_DAY);
        Self {
            available_secs: i64::from(minutes) * 60,
        }
    }

    /// A calendar without maintenance.
    pub fn always_available() -> Self {
        Self::new(MINUTES_PER_DAY)
    }

    /// Working seconds per day.
    #[inline]
    pub fn available_secs_per_day(&self) -> i64 {
        self.available_secs
    }

    /// Maintenance seconds per day.
    #[inline]
    pub fn maintenance_secs_per_day(&self) -> i64 {
        SECONDS_PER_DAY - self.available_secs
    }

    /// Whether the machine can work at all.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.available_secs > 0
    }

    /// Maintenance window of the given day, `None` if there is no maintenance.
    pub fn maintenance_window(&self, day: i64) -> Option<TimeWindow> {
        if self.maintenance_secs_per_day() == 0 {
            return None;
        }
        let day_start = day * SECONDS_PER_DAY;
        Some(TimeWindow::new(
            day_start + self.available_secs,
            day_start + SECONDS_PER_DAY,
        ))
    }

    /// Whether a timestamp is within working time.
    pub fn is_working_time(&self, time: i64) -> bool {
        time.rem_euclid(SECONDS_PER_DAY) < self.available_secs
    }

    /// Finds the next working time at or after `from`.
    ///
    /// Returns `None` if the machine has no daily capacity.
    pub fn next_available_time(&self, from: i64) -> Option<i64> {
        if !self.has_capacity() {
            return None;
        }
        if self.is_working_time(from) {
            Some(from)
        } else {
            Some((from.div_euclid(SECONDS_PER_DAY) + 1) * SECONDS_PER_DAY)
        }
    }

    /// Lays `work_secs` of processing out over working time, starting no
    /// earlier than `from`.
    ///
    /// Each returned segment ends at or before a maintenance boundary; the
    /// first segment's start is the actual start and the last segment's end
    /// is the finish. Zero work yields a single empty segment at the next
    /// working time. Returns `None` if the machine has no daily capacity.
    pub fn lay_out(&self, from: i64, work_secs: i64) -> Option<Vec<TimeWindow>> {
        let mut t = self.next_available_time(from)?;
        if work_secs <= 0 {
            return Some(vec![TimeWindow::new(t, t)]);
        }
        if self.maintenance_secs_per_day() == 0 {
            return Some(vec![TimeWindow::new(t, t + work_secs)]);
        }

        let mut remaining = work_secs;
        let mut segments = Vec::with_capacity(1);
        while remaining > 0 {
            t = self.next_available_time(t)?;
            let day_end = t.div_euclid(SECONDS_PER_DAY) * SECONDS_PER_DAY + self.available_secs;
            let chunk = remaining.min(day_end - t);
            segments.push(TimeWindow::new(t, t + chunk));
            remaining -= chunk;
            t += chunk;
        }
        Some(segments)
    }

    /// Computes total working time within a range [start, end).
    pub fn available_time_in_range(&self, start: i64, end: i64) -> i64 {
        if end <= start {
            return 0;
        }
        self.working_secs_before(end) - self.working_secs_before(start)
    }

    /// Working seconds in [start of day 0, t), negative for t < 0.
    fn working_secs_before(&self, t: i64) -> i64 {
        let day = t.div_euclid(SECONDS_PER_DAY);
        let into_day = t.rem_euclid(SECONDS_PER_DAY);
        day * self.available_secs + into_day.min(self.available_secs)
    }
}
