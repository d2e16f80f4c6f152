//! Error types for the weekly calendar

use thiserror::Error;

use crate::{TimePoint, TimeSpan};

/// Errors raised while building time points, spans and calendars
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("Weekday must be between 0 and 6, got {0}")]
    WeekdayOutOfRange(i64),

    #[error("Hour must be between 0 and 23, got {0}")]
    HourOutOfRange(i64),

    #[error("Minute must be between 0 and 59, got {0}")]
    MinuteOutOfRange(i64),

    #[error("Start time {start} must be strictly before end time {end}")]
    EmptySpan { start: TimePoint, end: TimePoint },

    #[error("Overlapping timespans detected: {first} and {second}")]
    Overlap { first: TimeSpan, second: TimeSpan },
}

pub type CalendarResult<T> = Result<T, CalendarError>;
