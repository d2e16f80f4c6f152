//! Weekly recurring time spans
//!
//! A [`WeeklyCalendar`] is a sorted set of non-overlapping [`TimeSpan`]s that
//! repeat every week. Spans are half-open: the start minute is inside, the end
//! minute is not. A span never wraps across the Sunday/Monday seam; encode such
//! a window as two spans.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Weekday};
use std::fmt;

use crate::{CalendarError, CalendarResult};

const MINUTES_PER_HOUR: u32 = 60;
const MINUTES_PER_DAY: u32 = 24 * MINUTES_PER_HOUR;

/// A (weekday, hour, minute) position within a week.
///
/// Weekday 0 is Monday, 6 is Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimePoint {
    weekday: u8,
    hour: u8,
    minute: u8,
}

impl TimePoint {
    pub fn new(weekday: u8, hour: u8, minute: u8) -> CalendarResult<Self> {
        if weekday > 6 {
            return Err(CalendarError::WeekdayOutOfRange(weekday.into()));
        }
        if hour > 23 {
            return Err(CalendarError::HourOutOfRange(hour.into()));
        }
        if minute > 59 {
            return Err(CalendarError::MinuteOutOfRange(minute.into()));
        }
        Ok(Self {
            weekday,
            hour,
            minute,
        })
    }

    /// The position of `dt` within its week, in the timezone of `dt`
    pub fn from_datetime<Tz: TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self {
            weekday: dt.weekday().num_days_from_monday() as u8,
            hour: dt.hour() as u8,
            minute: dt.minute() as u8,
        }
    }

    pub fn weekday(&self) -> u8 {
        self.weekday
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Minutes elapsed since Monday 00:00
    pub fn minutes_since_week_start(&self) -> u32 {
        self.weekday as u32 * MINUTES_PER_DAY + self.hour as u32 * MINUTES_PER_HOUR + self.minute as u32
    }

    fn chrono_weekday(&self) -> Weekday {
        match self.weekday {
            0 => Weekday::Mon,
            1 => Weekday::Tue,
            2 => Weekday::Wed,
            3 => Weekday::Thu,
            4 => Weekday::Fri,
            5 => Weekday::Sat,
            _ => Weekday::Sun,
        }
    }
}

impl TryFrom<[i64; 3]> for TimePoint {
    type Error = CalendarError;

    fn try_from([weekday, hour, minute]: [i64; 3]) -> CalendarResult<Self> {
        let weekday = u8::try_from(weekday).map_err(|_| CalendarError::WeekdayOutOfRange(weekday))?;
        let hour = u8::try_from(hour).map_err(|_| CalendarError::HourOutOfRange(hour))?;
        let minute = u8::try_from(minute).map_err(|_| CalendarError::MinuteOutOfRange(minute))?;
        Self::new(weekday, hour, minute)
    }
}

impl PartialOrd for TimePoint {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimePoint {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.minutes_since_week_start()
            .cmp(&other.minutes_since_week_start())
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:{:02}", self.chrono_weekday(), self.hour, self.minute)
    }
}

/// Half-open interval `[start, end)` within a week
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    start: TimePoint,
    end: TimePoint,
}

impl TimeSpan {
    pub fn new(start: TimePoint, end: TimePoint) -> CalendarResult<Self> {
        if start >= end {
            return Err(CalendarError::EmptySpan { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> TimePoint {
        self.start
    }

    pub fn end(&self) -> TimePoint {
        self.end
    }

    pub fn contains(&self, point: TimePoint) -> bool {
        self.start <= point && point < self.end
    }

    /// Contiguous spans (one ends where the other starts) do not overlap.
    pub fn overlaps(&self, other: &TimeSpan) -> bool {
        self.start.max(other.start) < self.end.min(other.end)
    }
}

impl fmt::Display for TimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} - {})", self.start, self.end)
    }
}

/// Immutable set of non-overlapping weekly spans with O(log n) lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeeklyCalendar {
    /// Sorted by start
    spans: Vec<TimeSpan>,
    /// `spans[i].start()`, kept separately for the binary search
    start_points: Vec<TimePoint>,
}

impl WeeklyCalendar {
    /// Build a calendar, rejecting any pair of overlapping spans
    pub fn new(spans: impl IntoIterator<Item = TimeSpan>) -> CalendarResult<Self> {
        let mut accepted: Vec<TimeSpan> = Vec::new();
        for span in spans {
            if let Some(existing) = accepted.iter().find(|s| s.overlaps(&span)) {
                return Err(CalendarError::Overlap {
                    first: *existing,
                    second: span,
                });
            }
            accepted.push(span);
        }

        accepted.sort_by_key(|s| s.start());
        let start_points = accepted.iter().map(|s| s.start()).collect();

        Ok(Self {
            spans: accepted,
            start_points,
        })
    }

    /// Check whether (weekday, hour, minute) falls inside any span
    pub fn contains(&self, weekday: u8, hour: u8, minute: u8) -> CalendarResult<bool> {
        Ok(self.contains_point(TimePoint::new(weekday, hour, minute)?))
    }

    pub fn contains_point(&self, point: TimePoint) -> bool {
        // Index of the first span starting after `point`; the only candidate
        // is the span right before it.
        let idx = self.start_points.partition_point(|start| *start <= point);
        if idx == 0 {
            return false;
        }
        self.spans[idx - 1].contains(point)
    }

    pub fn spans(&self) -> &[TimeSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}
