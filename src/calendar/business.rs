// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::calendar::clock::Clock;
use crate::calendar::duration::{parse_date_time, DurationHelper};
use crate::errors::{ScheduleParseError, TimerError};
use crate::model::{TimerEventDefinition, TimerValue};
use crate::observability::messages::calendar::DueDateResolved;
use crate::observability::messages::StructuredLog;
use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;

pub const CYCLE_CALENDAR: &str = "cycle";
pub const DURATION_CALENDAR: &str = "duration";
pub const DUE_DATE_CALENDAR: &str = "dueDate";

/// Turns a timer expression into a concrete due date.
pub trait BusinessCalendar: Send + Sync {
    fn name(&self) -> &str;

    fn resolve_due_date(
        &self,
        expression: &str,
        end_date: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<DateTime<Tz>, ScheduleParseError>;

    /// Whether `candidate` may still fire given the timer's end date.
    fn validate_due_date(
        &self,
        _expression: &str,
        end_date: Option<&str>,
        clock: &dyn Clock,
        candidate: &DateTime<Tz>,
    ) -> Result<bool, ScheduleParseError> {
        match end_date.filter(|end| !end.trim().is_empty()) {
            Some(end) => Ok(*candidate <= parse_date_time(end)?.resolve(&clock.zone())),
            None => Ok(true),
        }
    }
}

/// Repeating schedules, bounded by the timer's end date.
#[derive(Debug, Default)]
pub struct CycleBusinessCalendar;

impl BusinessCalendar for CycleBusinessCalendar {
    fn name(&self) -> &str {
        CYCLE_CALENDAR
    }

    fn resolve_due_date(
        &self,
        expression: &str,
        end_date: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<DateTime<Tz>, ScheduleParseError> {
        // A fresh helper per call: a cycle without a start is anchored at the
        // clock every time, so its repeat count only bounds schedules that name
        // a start. Callers that need the count to run out keep one DurationHelper.
        let helper = DurationHelper::new(expression)?.with_end_boundary(end_date.unwrap_or_default())?;
        Ok(helper.next_occurrence(clock))
    }

    fn validate_due_date(
        &self,
        expression: &str,
        end_date: Option<&str>,
        _clock: &dyn Clock,
        candidate: &DateTime<Tz>,
    ) -> Result<bool, ScheduleParseError> {
        let helper = DurationHelper::new(expression)?.with_end_boundary(end_date.unwrap_or_default())?;
        Ok(helper.is_valid_date(candidate))
    }
}

/// A single delay from now, e.g. `PT15M`.
#[derive(Debug, Default)]
pub struct DurationBusinessCalendar;

impl BusinessCalendar for DurationBusinessCalendar {
    fn name(&self) -> &str {
        DURATION_CALENDAR
    }

    fn resolve_due_date(
        &self,
        expression: &str,
        _end_date: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<DateTime<Tz>, ScheduleParseError> {
        Ok(DurationHelper::new(expression)?.next_occurrence(clock))
    }
}

/// An absolute date-time, or a delay when the expression is a period.
#[derive(Debug, Default)]
pub struct DueDateBusinessCalendar;

impl BusinessCalendar for DueDateBusinessCalendar {
    fn name(&self) -> &str {
        DUE_DATE_CALENDAR
    }

    fn resolve_due_date(
        &self,
        expression: &str,
        _end_date: Option<&str>,
        clock: &dyn Clock,
    ) -> Result<DateTime<Tz>, ScheduleParseError> {
        let expression = expression.trim();
        if expression.starts_with('P') {
            return Ok(DurationHelper::new(expression)?.next_occurrence(clock));
        }
        Ok(parse_date_time(expression)?.resolve(&clock.zone()))
    }
}

/// Calendars addressable by name from a timer's `calendar_name`.
#[derive(Clone)]
pub struct BusinessCalendarManager {
    calendars: HashMap<String, Arc<dyn BusinessCalendar>>,
}

impl BusinessCalendarManager {
    pub fn empty() -> Self {
        Self {
            calendars: HashMap::new(),
        }
    }

    /// The `cycle`, `duration` and `dueDate` calendars.
    pub fn standard() -> Self {
        Self::empty()
            .with_calendar(Arc::new(CycleBusinessCalendar))
            .with_calendar(Arc::new(DurationBusinessCalendar))
            .with_calendar(Arc::new(DueDateBusinessCalendar))
    }

    pub fn with_calendar(mut self, calendar: Arc<dyn BusinessCalendar>) -> Self {
        self.register(calendar);
        self
    }

    /// Add a calendar, replacing any calendar of the same name.
    pub fn register(&mut self, calendar: Arc<dyn BusinessCalendar>) {
        self.calendars.insert(calendar.name().to_string(), calendar);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn BusinessCalendar>, TimerError> {
        self.calendars
            .get(name)
            .cloned()
            .ok_or_else(|| TimerError::UnknownCalendar(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.calendars.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for BusinessCalendarManager {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for BusinessCalendarManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessCalendarManager")
            .field("calendars", &self.names())
            .finish()
    }
}

impl TimerEventDefinition {
    /// The explicit calendar name, else the calendar matching the value kind.
    pub fn calendar_for(&self) -> Result<&str, TimerError> {
        if let Some(name) = self.calendar_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Ok(name);
        }
        Ok(match self.value().map_err(TimerError::InvalidTimer)? {
            TimerValue::Date(_) => DUE_DATE_CALENDAR,
            TimerValue::Duration(_) => DURATION_CALENDAR,
            TimerValue::Cycle(_) => CYCLE_CALENDAR,
        })
    }

    /// When this timer fires next, according to `clock`.
    pub fn due_date(
        &self,
        manager: &BusinessCalendarManager,
        clock: &dyn Clock,
    ) -> Result<DateTime<Tz>, TimerError> {
        let value = self.value().map_err(TimerError::InvalidTimer)?;
        let name = self.calendar_for()?;
        let calendar = manager.get(name)?;
        let due = calendar.resolve_due_date(value.text().trim(), self.end_date.as_deref(), clock)?;

        DueDateResolved {
            calendar: name,
            expression: value.text(),
            due: &due,
        }
        .log();

        Ok(due)
    }
}
