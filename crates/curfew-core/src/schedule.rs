//! Built-in schedule used when no configuration has ever been loaded

use curfew_util::TimePoint;

/// Whether `point` is restricted by the built-in schedule.
///
/// Unlike a configured calendar, this marks restricted windows directly:
/// - Saturday, Sunday: before 10:00 and from 21:00
/// - Monday, Tuesday: all day
/// - Wednesday to Friday: up to 16:59 and from 20:00
pub fn fallback_is_restricted(point: TimePoint) -> bool {
    let hour = point.hour();
    match point.weekday() {
        0 | 1 => true,
        2..=4 => hour <= 16 || hour >= 20,
        _ => hour >= 21 || hour < 10,
    }
}
