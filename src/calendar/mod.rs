// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Timer due-date computation.
//!
//! [`DurationHelper`] evaluates the `R<n>/<anchor>/<period-or-end>` grammar
//! against a [`Clock`]. Business calendars pick the right evaluation for the
//! three kinds of timer value (date, duration, cycle).

mod business;
mod clock;
mod duration;

pub use business::{
    BusinessCalendar, BusinessCalendarManager, CycleBusinessCalendar, DueDateBusinessCalendar,
    DurationBusinessCalendar, CYCLE_CALENDAR, DUE_DATE_CALENDAR, DURATION_CALENDAR,
};
pub use clock::{Clock, DefaultClock};
pub use duration::{parse_date_time, DateSpec, DurationHelper, IsoPeriod, Repetition};
