// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised while parsing a repeating-schedule specification.

use thiserror::Error;

/// A malformed `R<n>/<anchor>/<period-or-end>` specification.
///
/// Every variant names the offending token so a process author can locate it
/// in the timer definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScheduleParseError {
    #[error("Empty schedule specification")]
    Empty,

    #[error("Schedule '{spec}' has {segments} segments, at most 3 are allowed")]
    TooManySegments { spec: String, segments: usize },

    #[error("Invalid repetition token '{0}'")]
    InvalidRepetition(String),

    #[error("Invalid ISO-8601 duration '{0}'")]
    InvalidDuration(String),

    #[error("Invalid ISO-8601 date-time '{0}'")]
    InvalidDateTime(String),

    #[error("Schedule '{0}' does not define a period")]
    MissingPeriod(String),

    #[error("Schedule '{spec}' ends at '{end}' which is before its start")]
    EndBeforeStart { spec: String, end: String },
}

/// Failure to compute a timer's due date.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimerError {
    #[error(transparent)]
    Schedule(#[from] ScheduleParseError),

    #[error("Unknown business calendar '{0}'")]
    UnknownCalendar(String),

    #[error("Invalid timer definition: {0}")]
    InvalidTimer(String),
}
