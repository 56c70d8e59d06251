// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for repeating-schedule evaluation and business calendars.

use crate::observability::messages::StructuredLog;
use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A schedule specification was parsed.
///
/// # Log Level
/// `debug!` - Parsing happens for every timer evaluation
pub struct ScheduleParsed<'a> {
    pub spec: &'a str,
    pub repeating: bool,
    pub repetitions: Option<u32>,
    pub has_anchor: bool,
    pub has_boundary: bool,
}

impl Display for ScheduleParsed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let repetitions = match (self.repeating, self.repetitions) {
            (false, _) => "none".to_string(),
            (true, None) => "unbounded".to_string(),
            (true, Some(n)) => n.to_string(),
        };
        write!(
            f,
            "Parsed schedule '{}': repetitions={}, explicit_anchor={}, boundary={}",
            self.spec, repetitions, self.has_anchor, self.has_boundary
        )
    }
}

impl StructuredLog for ScheduleParsed<'_> {
    fn log(&self) {
        tracing::debug!(
            spec = self.spec,
            repeating = self.repeating,
            repetitions = ?self.repetitions,
            has_anchor = self.has_anchor,
            has_boundary = self.has_boundary,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!("schedule", span_name = name, spec = self.spec)
    }
}

/// The next occurrence of a schedule was computed.
///
/// # Log Level
/// `debug!` - Per-evaluation detail
pub struct OccurrenceComputed<'a> {
    pub spec: &'a str,
    pub now: &'a DateTime<Tz>,
    pub occurrence: &'a DateTime<Tz>,
    pub index: u64,
}

impl Display for OccurrenceComputed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Schedule '{}' evaluated at {}: occurrence #{} at {}",
            self.spec,
            self.now.to_rfc3339(),
            self.index,
            self.occurrence.to_rfc3339()
        )
    }
}

impl StructuredLog for OccurrenceComputed<'_> {
    fn log(&self) {
        tracing::debug!(
            spec = self.spec,
            now = %self.now.to_rfc3339(),
            occurrence = %self.occurrence.to_rfc3339(),
            index = self.index,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "occurrence",
            span_name = name,
            spec = self.spec,
            index = self.index,
        )
    }
}

/// Why a schedule stopped producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampReason {
    RepetitionsExhausted,
    EndBoundary,
    PeriodDoesNotAdvance,
}

impl Display for ClampReason {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ClampReason::RepetitionsExhausted => write!(f, "repetitions exhausted"),
            ClampReason::EndBoundary => write!(f, "end boundary reached"),
            ClampReason::PeriodDoesNotAdvance => write!(f, "period does not advance"),
        }
    }
}

/// A schedule had no occurrence after "now" and returned its last permitted one.
///
/// # Log Level
/// `debug!` - Expected for finished cycles
pub struct OccurrenceClamped<'a> {
    pub spec: &'a str,
    pub reason: ClampReason,
    pub occurrence: &'a DateTime<Tz>,
}

impl Display for OccurrenceClamped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Schedule '{}' clamped to {} ({})",
            self.spec,
            self.occurrence.to_rfc3339(),
            self.reason
        )
    }
}

impl StructuredLog for OccurrenceClamped<'_> {
    fn log(&self) {
        tracing::debug!(
            spec = self.spec,
            reason = %self.reason,
            occurrence = %self.occurrence.to_rfc3339(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::debug_span!(
            "occurrence_clamped",
            span_name = name,
            spec = self.spec,
            reason = %self.reason,
        )
    }
}

/// A business calendar resolved a timer expression to a due date.
///
/// # Log Level
/// `info!` - Timer scheduling is operationally relevant
pub struct DueDateResolved<'a> {
    pub calendar: &'a str,
    pub expression: &'a str,
    pub due: &'a DateTime<Tz>,
}

impl Display for DueDateResolved<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Calendar '{}' resolved '{}' to {}",
            self.calendar,
            self.expression,
            self.due.to_rfc3339()
        )
    }
}

impl StructuredLog for DueDateResolved<'_> {
    fn log(&self) {
        tracing::info!(
            calendar = self.calendar,
            expression = self.expression,
            due = %self.due.to_rfc3339(),
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "due_date",
            span_name = name,
            calendar = self.calendar,
            expression = self.expression,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_schedule_parsed_display() {
        let msg = ScheduleParsed {
            spec: "R2/PT10S",
            repeating: true,
            repetitions: Some(2),
            has_anchor: false,
            has_boundary: false,
        };
        assert_eq!(
            msg.to_string(),
            "Parsed schedule 'R2/PT10S': repetitions=2, explicit_anchor=false, boundary=false"
        );

        let unbounded = ScheduleParsed {
            spec: "R/PT1H",
            repeating: true,
            repetitions: None,
            has_anchor: false,
            has_boundary: false,
        };
        assert!(unbounded.to_string().contains("repetitions=unbounded"));
    }

    #[test]
    fn test_occurrence_clamped_display() {
        let at = chrono_tz::UTC.with_ymd_and_hms(1970, 1, 1, 0, 0, 20).unwrap();
        let msg = OccurrenceClamped {
            spec: "R2/PT10S",
            reason: ClampReason::RepetitionsExhausted,
            occurrence: &at,
        };
        assert_eq!(
            msg.to_string(),
            "Schedule 'R2/PT10S' clamped to 1970-01-01T00:00:20+00:00 (repetitions exhausted)"
        );
    }
}
