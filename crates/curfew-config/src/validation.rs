//! Configuration validation

use curfew_util::{CalendarError, TimePoint, TimeSpan, WeeklyCalendar};
use regex::{Regex, RegexBuilder};
use thiserror::Error;

use crate::schema::RawTimeSpan;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("unrestricted_times[{index}]: {source}")]
    InvalidTimeSpan {
        index: usize,
        #[source]
        source: CalendarError,
    },

    #[error("unrestricted_times: {0}")]
    OverlappingTimeSpans(CalendarError),

    #[error("rules[{rule}].{field}: invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        rule: usize,
        field: &'static str,
        pattern: String,
        message: String,
    },
}

/// Parse one `[[d, h, m], [d, h, m]]` pair into a span
pub fn parse_time_span(index: usize, raw: &RawTimeSpan) -> Result<TimeSpan, ValidationError> {
    let to_error = |source| ValidationError::InvalidTimeSpan { index, source };

    let start = TimePoint::try_from(raw[0]).map_err(to_error)?;
    let end = TimePoint::try_from(raw[1]).map_err(to_error)?;
    TimeSpan::new(start, end).map_err(to_error)
}

/// Parse every span and assemble the calendar, reporting all problems at once
pub fn build_calendar(raw: &[RawTimeSpan]) -> Result<WeeklyCalendar, Vec<ValidationError>> {
    let mut errors = Vec::new();
    let mut spans = Vec::with_capacity(raw.len());

    for (index, raw_span) in raw.iter().enumerate() {
        match parse_time_span(index, raw_span) {
            Ok(span) => spans.push(span),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    WeeklyCalendar::new(spans).map_err(|e| vec![ValidationError::OverlappingTimeSpans(e)])
}

/// Compile a case-insensitive pattern.
///
/// A missing or empty pattern yields `None`, meaning "matches anything".
pub fn compile_pattern(
    rule: usize,
    field: &'static str,
    pattern: Option<&str>,
) -> Result<Option<Regex>, ValidationError> {
    let Some(pattern) = pattern.filter(|p| !p.is_empty()) else {
        return Ok(None);
    };

    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| ValidationError::InvalidPattern {
            rule,
            field,
            pattern: pattern.to_string(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_time_span() {
        let span = parse_time_span(0, &[[0, 10, 0], [0, 12, 0]]).unwrap();
        assert_eq!(span.start().hour(), 10);
        assert_eq!(span.end().hour(), 12);
    }

    #[test]
    fn test_parse_time_span_out_of_range() {
        let err = parse_time_span(3, &[[0, 10, 0], [0, 24, 0]]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTimeSpan {
                index: 3,
                source: CalendarError::HourOutOfRange(24)
            }
        ));
    }

    #[test]
    fn test_parse_time_span_inverted() {
        let err = parse_time_span(0, &[[1, 0, 0], [0, 23, 0]]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidTimeSpan {
                source: CalendarError::EmptySpan { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_build_calendar_collects_all_span_errors() {
        let errors = build_calendar(&[
            [[9, 0, 0], [0, 1, 0]],
            [[0, 10, 0], [0, 12, 0]],
            [[0, 0, 70], [0, 1, 0]],
        ])
        .unwrap_err();

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidTimeSpan { index: 0, .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidTimeSpan { index: 2, .. })));
    }

    #[test]
    fn test_build_calendar_overlap() {
        let errors = build_calendar(&[[[0, 10, 0], [0, 12, 0]], [[0, 11, 0], [0, 13, 0]]]).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::OverlappingTimeSpans(CalendarError::Overlap { .. })]
        ));
    }

    #[test]
    fn test_compile_pattern_is_case_insensitive() {
        let re = compile_pattern(0, "title_regex", Some("minecraft")).unwrap().unwrap();
        assert!(re.is_match("MINECRAFT Launcher"));
    }

    #[test]
    fn test_compile_pattern_absent_or_empty() {
        assert!(compile_pattern(0, "process_regex", None).unwrap().is_none());
        assert!(compile_pattern(0, "process_regex", Some("")).unwrap().is_none());
    }

    #[test]
    fn test_compile_pattern_invalid() {
        let err = compile_pattern(4, "process_regex", Some("chrome(")).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::InvalidPattern { rule: 4, field: "process_regex", .. }
        ));
        assert!(err.to_string().contains("rules[4].process_regex"));
    }
}
