// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Repeating-schedule evaluation.
//!
//! A schedule is written `[R[n]/]<anchor-or-period>[/<period-or-end>]`:
//!
//! | Form | Example | Meaning |
//! |---|---|---|
//! | period | `R3/PT10M` | every 10 minutes from the first evaluation, 3 repeats |
//! | period/end | `R/PT1H/2024-01-01T00:00:00Z` | hourly from the first evaluation until the end |
//! | start/period | `R/2024-01-01T08:00:00/P1D` | daily at 08:00 local time |
//! | start/end | `R2/2024-01-01T00:00:00Z/2024-01-01T00:10:00Z` | every 10 minutes from the start |
//!
//! Date fields of a period (`Y`, `M`, `W`, `D`) move the local wall clock in the
//! evaluation zone, so `P1D` always lands on the same local time even across a
//! daylight-saving transition. Time fields (`H`, `M`, `S`) are elapsed time.

use crate::calendar::clock::Clock;
use crate::errors::ScheduleParseError;
use crate::observability::messages::calendar::{
    ClampReason, OccurrenceClamped, OccurrenceComputed, ScheduleParsed,
};
use crate::observability::messages::StructuredLog;
use chrono::{
    DateTime, Days, Duration, FixedOffset, LocalResult, Months, NaiveDate, NaiveDateTime,
    NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use std::sync::OnceLock;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

/// How many times a schedule repeats after its anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    Bounded(u32),
    Unbounded,
}

impl Repetition {
    fn parse(token: &str) -> Result<Self, ScheduleParseError> {
        let count = token
            .strip_prefix('R')
            .ok_or_else(|| ScheduleParseError::InvalidRepetition(token.to_string()))?;
        if count.is_empty() {
            return Ok(Repetition::Unbounded);
        }
        if !count.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ScheduleParseError::InvalidRepetition(token.to_string()));
        }
        count
            .parse::<u32>()
            .map(Repetition::Bounded)
            .map_err(|_| ScheduleParseError::InvalidRepetition(token.to_string()))
    }

    fn limit(&self) -> Option<u64> {
        match self {
            Repetition::Bounded(n) => Some(u64::from(*n)),
            Repetition::Unbounded => None,
        }
    }
}

/// An ISO-8601 duration `PnYnMnWnDTnHnMnS`. Only seconds may carry a fraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IsoPeriod {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
    pub nanos: u32,
}

impl IsoPeriod {
    pub fn parse(token: &str) -> Result<Self, ScheduleParseError> {
        let invalid = || ScheduleParseError::InvalidDuration(token.to_string());
        let body = token.strip_prefix('P').ok_or_else(invalid)?;
        let (date_part, time_part) = match body.split_once('T') {
            Some((date, time)) => (date, Some(time)),
            None => (body, None),
        };

        let mut period = IsoPeriod::default();
        let mut seen_any = false;

        let mut next_unit = 0;
        for (number, unit) in components(date_part).ok_or_else(invalid)? {
            let position = ['Y', 'M', 'W', 'D']
                .iter()
                .position(|u| *u == unit)
                .filter(|position| *position >= next_unit)
                .ok_or_else(invalid)?;
            next_unit = position + 1;
            let value: u32 = parse_whole(number).ok_or_else(invalid)?;
            match unit {
                'Y' => period.years = value,
                'M' => period.months = value,
                'W' => period.weeks = value,
                _ => period.days = value,
            }
            seen_any = true;
        }

        if let Some(time) = time_part {
            if time.is_empty() {
                return Err(invalid());
            }
            let mut next_unit = 0;
            for (number, unit) in components(time).ok_or_else(invalid)? {
                let position = ['H', 'M', 'S']
                    .iter()
                    .position(|u| *u == unit)
                    .filter(|position| *position >= next_unit)
                    .ok_or_else(invalid)?;
                next_unit = position + 1;
                match unit {
                    'H' => period.hours = parse_whole(number).ok_or_else(invalid)?,
                    'M' => period.minutes = parse_whole(number).ok_or_else(invalid)?,
                    _ => {
                        let (seconds, nanos) = parse_seconds(number).ok_or_else(invalid)?;
                        period.seconds = seconds;
                        period.nanos = nanos;
                    }
                }
                seen_any = true;
            }
        }

        if !seen_any {
            return Err(invalid());
        }
        Ok(period)
    }

    /// A time-only period of exactly `elapsed`. Negative input yields zero.
    pub fn from_elapsed(elapsed: Duration) -> Self {
        if elapsed <= Duration::zero() {
            return IsoPeriod::default();
        }
        IsoPeriod {
            seconds: elapsed.num_seconds().unsigned_abs(),
            nanos: elapsed.subsec_nanos().unsigned_abs(),
            ..IsoPeriod::default()
        }
    }

    pub fn has_date_fields(&self) -> bool {
        self.years > 0 || self.months > 0 || self.weeks > 0 || self.days > 0
    }

    pub fn is_zero(&self) -> bool {
        !self.has_date_fields() && self.hours == 0 && self.minutes == 0 && self.seconds == 0 && self.nanos == 0
    }

    /// Elapsed length of the time fields; `None` on overflow.
    pub fn time_part(&self) -> Option<Duration> {
        let seconds = self
            .hours
            .checked_mul(3600)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        Duration::try_seconds(i64::try_from(seconds).ok()?)?
            .checked_add(&Duration::nanoseconds(i64::from(self.nanos)))
    }

    /// The exact length of the period when it has no calendar fields.
    pub fn fixed_length(&self) -> Option<Duration> {
        if self.has_date_fields() {
            None
        } else {
            self.time_part()
        }
    }

    /// `start` moved by this period in `start`'s zone; `None` when the result
    /// is out of range.
    pub fn add_to(&self, start: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.add_times_to(start, 1)
    }

    /// `start` moved by `count` whole periods at once.
    ///
    /// Every field is scaled by `count` and the wall-clock time is resolved a
    /// single time, so a clamped month end or a time shifted out of a
    /// daylight-saving gap does not carry over into later occurrences.
    pub fn add_times_to(&self, start: &DateTime<Tz>, count: u64) -> Option<DateTime<Tz>> {
        let shifted = if self.has_date_fields() && count > 0 {
            let local = start.naive_local();
            let months = u64::from(self.years)
                .checked_mul(12)?
                .checked_add(u64::from(self.months))?
                .checked_mul(count)?;
            let days = (u64::from(self.weeks) * 7 + u64::from(self.days)).checked_mul(count)?;
            let date = local
                .date()
                .checked_add_months(Months::new(u32::try_from(months).ok()?))?
                .checked_add_days(Days::new(days))?;
            resolve_local(&start.timezone(), date.and_time(local.time()))
        } else {
            *start
        };
        let elapsed = total_nanos(self.time_part()?).checked_mul(i128::from(count))?;
        shifted.checked_add_signed(from_nanos(elapsed)?)
    }
}

/// Split `"1Y2M"` into `[("1", 'Y'), ("2", 'M')]`.
fn components(text: &str) -> Option<Vec<(&str, char)>> {
    let mut result = Vec::new();
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        if ch.is_ascii_digit() || ch == '.' || ch == ',' {
            continue;
        }
        let number = &text[start..index];
        if number.is_empty() {
            return None;
        }
        result.push((number, ch));
        start = index + ch.len_utf8();
    }
    if start != text.len() {
        return None;
    }
    Some(result)
}

fn parse_whole<T: std::str::FromStr>(number: &str) -> Option<T> {
    if number.bytes().all(|b| b.is_ascii_digit()) {
        number.parse().ok()
    } else {
        None
    }
}

fn parse_seconds(number: &str) -> Option<(u64, u32)> {
    let Some((whole, fraction)) = number.split_once(['.', ',']) else {
        return parse_whole(number).map(|seconds| (seconds, 0));
    };
    if fraction.is_empty() || !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seconds = parse_whole(whole)?;
    let padded: String = fraction.chars().chain(std::iter::repeat('0')).take(9).collect();
    Some((seconds, padded.parse().ok()?))
}

/// A date-time as written in a schedule: either a fixed instant or a local
/// wall-clock time interpreted in the evaluation zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSpec {
    Instant(DateTime<FixedOffset>),
    Local(NaiveDateTime),
}

impl DateSpec {
    pub fn resolve(&self, zone: &Tz) -> DateTime<Tz> {
        match self {
            DateSpec::Instant(instant) => instant.with_timezone(zone),
            DateSpec::Local(local) => resolve_local(zone, *local),
        }
    }
}

/// Parse `YYYY-MM-DDThh:mm[:ss[.fff]][Z|±hh:mm|±hhmm]` or `YYYY-MM-DD`.
pub fn parse_date_time(token: &str) -> Result<DateSpec, ScheduleParseError> {
    const OFFSET_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f%:z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M%:z",
        "%Y-%m-%dT%H:%M%z",
    ];
    const LOCAL_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

    let text = token.trim();
    let normalized = match text.strip_suffix(['Z', 'z']) {
        Some(rest) => format!("{rest}+00:00"),
        None => text.to_string(),
    };

    for format in OFFSET_FORMATS {
        if let Ok(instant) = DateTime::parse_from_str(&normalized, format) {
            return Ok(DateSpec::Instant(instant));
        }
    }
    for format in LOCAL_FORMATS {
        if let Ok(local) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(DateSpec::Local(local));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Ok(DateSpec::Local(date.and_time(NaiveTime::MIN)));
    }
    Err(ScheduleParseError::InvalidDateTime(token.to_string()))
}

/// Wall-clock time in `zone`. Ambiguous times take the earlier instant; times
/// skipped by a forward transition use the offset in effect before the gap.
fn resolve_local(zone: &Tz, local: NaiveDateTime) -> DateTime<Tz> {
    match zone.from_local_datetime(&local) {
        LocalResult::Single(resolved) => resolved,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let before_gap = local.checked_sub_days(Days::new(1)).unwrap_or(local);
            let offset = zone.offset_from_utc_datetime(&before_gap).fix();
            let utc = local
                .checked_sub_signed(Duration::seconds(i64::from(offset.local_minus_utc())))
                .unwrap_or(local);
            zone.from_utc_datetime(&utc)
        }
    }
}

fn total_nanos(duration: Duration) -> i128 {
    i128::from(duration.num_seconds()) * NANOS_PER_SECOND + i128::from(duration.subsec_nanos())
}

fn from_nanos(nanos: i128) -> Option<Duration> {
    let seconds = i64::try_from(nanos / NANOS_PER_SECOND).ok()?;
    let rest = i64::try_from(nanos % NANOS_PER_SECOND).ok()?;
    Duration::try_seconds(seconds)?.checked_add(&Duration::nanoseconds(rest))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PeriodSpec {
    Iso(IsoPeriod),
    /// `start/end` form: the period is the distance from the start to this end.
    Until(DateSpec),
}

/// A parsed schedule that computes due dates against a clock.
///
/// When the schedule names no start, the anchor is the evaluation time of the
/// first call and stays fixed for the lifetime of the helper.
#[derive(Debug, Clone)]
pub struct DurationHelper {
    expression: String,
    repetition: Option<Repetition>,
    start: Option<DateSpec>,
    period: PeriodSpec,
    end: Option<DateSpec>,
    end_boundary: Option<DateSpec>,
    first_evaluation: OnceLock<DateTime<Utc>>,
}

impl DurationHelper {
    pub fn new(expression: &str) -> Result<Self, ScheduleParseError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ScheduleParseError::Empty);
        }

        let segments: Vec<&str> = trimmed.split('/').map(str::trim).collect();
        if segments.len() > 3 {
            return Err(ScheduleParseError::TooManySegments {
                spec: trimmed.to_string(),
                segments: segments.len(),
            });
        }

        let (repetition, rest) = if segments[0].starts_with('R') {
            (Some(Repetition::parse(segments[0])?), &segments[1..])
        } else {
            (None, &segments[..])
        };

        let (start, period, end) = match rest {
            [] => return Err(ScheduleParseError::MissingPeriod(trimmed.to_string())),
            [single] if is_period(single) => (None, PeriodSpec::Iso(IsoPeriod::parse(single)?), None),
            [single] => {
                parse_date_time(single)?;
                return Err(ScheduleParseError::MissingPeriod(trimmed.to_string()));
            }
            [period, end] if is_period(period) => (
                None,
                PeriodSpec::Iso(IsoPeriod::parse(period)?),
                Some(parse_date_time(end)?),
            ),
            [start, second] => {
                let start = parse_date_time(start)?;
                let period = if is_period(second) {
                    PeriodSpec::Iso(IsoPeriod::parse(second)?)
                } else {
                    let end = parse_date_time(second)?;
                    if ends_before(&start, &end) {
                        return Err(ScheduleParseError::EndBeforeStart {
                            spec: trimmed.to_string(),
                            end: second.to_string(),
                        });
                    }
                    PeriodSpec::Until(end)
                };
                (Some(start), period, None)
            }
            [first, ..] => return Err(ScheduleParseError::InvalidRepetition(first.to_string())),
        };

        let helper = DurationHelper {
            expression: trimmed.to_string(),
            repetition,
            start,
            period,
            end,
            end_boundary: None,
            first_evaluation: OnceLock::new(),
        };

        ScheduleParsed {
            spec: &helper.expression,
            repeating: helper.repetition.is_some(),
            repetitions: match helper.repetition {
                Some(Repetition::Bounded(n)) => Some(n),
                _ => None,
            },
            has_anchor: helper.start.is_some(),
            has_boundary: helper.end.is_some(),
        }
        .log();

        Ok(helper)
    }

    /// Add a hard end such as a timer's `endDate`. Blank input changes nothing.
    pub fn with_end_boundary(mut self, end_date: &str) -> Result<Self, ScheduleParseError> {
        if !end_date.trim().is_empty() {
            self.end_boundary = Some(parse_date_time(end_date)?);
        }
        Ok(self)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn repetition(&self) -> Option<Repetition> {
        self.repetition
    }

    pub fn is_repeating(&self) -> bool {
        self.repetition.is_some()
    }

    /// Next due date after the clock's current time, in the clock's zone.
    pub fn next_occurrence(&self, clock: &dyn Clock) -> DateTime<Tz> {
        self.occurrence_after(clock.now_local())
    }

    /// Next due date after `instant`, in the clock's zone.
    pub fn next_occurrence_after(&self, instant: DateTime<Utc>, clock: &dyn Clock) -> DateTime<Tz> {
        self.occurrence_after(instant.with_timezone(&clock.zone()))
    }

    /// Next due date after `now`. Calendar arithmetic uses `now`'s zone.
    pub fn occurrence_after(&self, now: DateTime<Tz>) -> DateTime<Tz> {
        let zone = now.timezone();
        let anchor = self.anchor(&now);
        let period = self.period_from(&anchor);
        let boundary = self.boundary(&zone);

        let (occurrence, index, clamp) = match self.repetition {
            Some(repetition) => walk(anchor, &period, repetition.limit(), boundary, &now),
            None => {
                let due = period.add_to(&anchor).unwrap_or(anchor);
                match boundary {
                    Some(boundary) if due > boundary => (boundary, 1, Some(ClampReason::EndBoundary)),
                    _ => (due, 1, None),
                }
            }
        };

        OccurrenceComputed {
            spec: &self.expression,
            now: &now,
            occurrence: &occurrence,
            index,
        }
        .log();
        if let Some(reason) = clamp {
            OccurrenceClamped {
                spec: &self.expression,
                reason,
                occurrence: &occurrence,
            }
            .log();
        }

        occurrence
    }

    /// Whether `candidate` is not past the schedule's end.
    pub fn is_valid_date(&self, candidate: &DateTime<Tz>) -> bool {
        self.boundary(&candidate.timezone())
            .map_or(true, |boundary| *candidate <= boundary)
    }

    /// The earliest of the schedule's own end and the added end boundary.
    pub fn boundary(&self, zone: &Tz) -> Option<DateTime<Tz>> {
        [self.end, self.end_boundary]
            .iter()
            .flatten()
            .map(|end| end.resolve(zone))
            .min()
    }

    fn anchor(&self, now: &DateTime<Tz>) -> DateTime<Tz> {
        match &self.start {
            Some(start) => start.resolve(&now.timezone()),
            None => self
                .first_evaluation
                .get_or_init(|| now.with_timezone(&Utc))
                .with_timezone(&now.timezone()),
        }
    }

    fn period_from(&self, anchor: &DateTime<Tz>) -> IsoPeriod {
        match &self.period {
            PeriodSpec::Iso(period) => *period,
            PeriodSpec::Until(end) => IsoPeriod::from_elapsed(end.resolve(&anchor.timezone()) - *anchor),
        }
    }
}

fn is_period(token: &str) -> bool {
    token.starts_with('P')
}

fn ends_before(start: &DateSpec, end: &DateSpec) -> bool {
    match (start, end) {
        (DateSpec::Instant(start), DateSpec::Instant(end)) => end < start,
        (DateSpec::Local(start), DateSpec::Local(end)) => end < start,
        _ => false,
    }
}

/// First permitted occurrence strictly after `now`, else the last permitted one.
fn walk(
    anchor: DateTime<Tz>,
    period: &IsoPeriod,
    limit: Option<u64>,
    boundary: Option<DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> (DateTime<Tz>, u64, Option<ClampReason>) {
    if let Some(boundary) = boundary {
        if anchor > boundary {
            return (boundary, 0, Some(ClampReason::EndBoundary));
        }
    }

    let (mut current, mut index) = fast_forward(anchor, period, limit, boundary, now);
    loop {
        if current > *now {
            return (current, index, None);
        }
        if limit.is_some_and(|limit| index >= limit) {
            return (current, index, Some(ClampReason::RepetitionsExhausted));
        }
        // Occurrence k is always anchor + k periods, never derived from occurrence k - 1.
        let next = match index.checked_add(1).and_then(|k| period.add_times_to(&anchor, k)) {
            Some(next) if next > current => next,
            _ => return (current, index, Some(ClampReason::PeriodDoesNotAdvance)),
        };
        if boundary.is_some_and(|boundary| next > boundary) {
            return (current, index, Some(ClampReason::EndBoundary));
        }
        current = next;
        index += 1;
    }
}

/// Jump straight to the last occurrence not after `now` for time-only periods.
fn fast_forward(
    anchor: DateTime<Tz>,
    period: &IsoPeriod,
    limit: Option<u64>,
    boundary: Option<DateTime<Tz>>,
    now: &DateTime<Tz>,
) -> (DateTime<Tz>, u64) {
    let Some(step) = period.fixed_length().map(total_nanos).filter(|step| *step > 0) else {
        return (anchor, 0);
    };
    if *now <= anchor {
        return (anchor, 0);
    }

    let mut steps = total_nanos(*now - anchor) / step;
    if let Some(limit) = limit {
        steps = steps.min(i128::from(limit));
    }
    if let Some(boundary) = boundary {
        steps = steps.min(total_nanos(boundary - anchor) / step);
    }

    let Ok(index) = u64::try_from(steps) else {
        return (anchor, 0);
    };
    match period.add_times_to(&anchor, index) {
        Some(current) => (current, index),
        None => (anchor, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::clock::DefaultClock;
    use chrono_tz::{Europe, US};
    use proptest::prelude::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn epoch_plus(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn test_parse_errors_name_the_token() {
        let cases = vec![
            ("", ScheduleParseError::Empty),
            (
                "R2/PT1H/P1D/PT1S",
                ScheduleParseError::TooManySegments {
                    spec: "R2/PT1H/P1D/PT1S".to_string(),
                    segments: 4,
                },
            ),
            ("Rx/PT1H", ScheduleParseError::InvalidRepetition("Rx".to_string())),
            ("R-1/PT1H", ScheduleParseError::InvalidRepetition("R-1".to_string())),
            ("R2/P", ScheduleParseError::InvalidDuration("P".to_string())),
            ("R2/PT", ScheduleParseError::InvalidDuration("PT".to_string())),
            ("R2/P1H", ScheduleParseError::InvalidDuration("P1H".to_string())),
            ("R2/P1D2Y", ScheduleParseError::InvalidDuration("P1D2Y".to_string())),
            ("R2/PT1.5H", ScheduleParseError::InvalidDuration("PT1.5H".to_string())),
            (
                "R2/tomorrow/PT1H",
                ScheduleParseError::InvalidDateTime("tomorrow".to_string()),
            ),
            (
                "2013-11-03T00:00:00",
                ScheduleParseError::MissingPeriod("2013-11-03T00:00:00".to_string()),
            ),
            (
                "PT1H/PT1H/PT1H",
                ScheduleParseError::InvalidRepetition("PT1H".to_string()),
            ),
            (
                "R/2013-01-02T00:00:00Z/2013-01-01T00:00:00Z",
                ScheduleParseError::EndBeforeStart {
                    spec: "R/2013-01-02T00:00:00Z/2013-01-01T00:00:00Z".to_string(),
                    end: "2013-01-01T00:00:00Z".to_string(),
                },
            ),
        ];

        for (spec, expected) in cases {
            assert_eq!(DurationHelper::new(spec).unwrap_err(), expected, "spec: {spec:?}");
        }
    }

    #[test]
    fn test_parse_full_period() {
        let period = IsoPeriod::parse("P1Y2M3W4DT5H6M7.25S").unwrap();
        assert_eq!(
            period,
            IsoPeriod {
                years: 1,
                months: 2,
                weeks: 3,
                days: 4,
                hours: 5,
                minutes: 6,
                seconds: 7,
                nanos: 250_000_000,
            }
        );
        assert!(period.has_date_fields());
        assert_eq!(period.fixed_length(), None);
        assert_eq!(
            IsoPeriod::parse("PT1M30S").unwrap().fixed_length(),
            Some(Duration::seconds(90))
        );
    }

    #[test]
    fn test_parse_date_time_forms() {
        let offset = parse_date_time("2013-11-03T00:45:00-04:00").unwrap();
        assert!(matches!(offset, DateSpec::Instant(t) if t.with_timezone(&Utc) == utc(2013, 11, 3, 4, 45, 0)));

        let compact = parse_date_time("2013-11-03T00:45-0400").unwrap();
        assert_eq!(compact, offset);

        let zulu = parse_date_time("2013-11-03T04:45:00.000Z").unwrap();
        assert!(matches!(zulu, DateSpec::Instant(t) if t.with_timezone(&Utc) == utc(2013, 11, 3, 4, 45, 0)));

        let local = parse_date_time("2013-11-03T00:45").unwrap();
        assert!(matches!(local, DateSpec::Local(t) if t.to_string() == "2013-11-03 00:45:00"));

        let date = parse_date_time("2013-11-03").unwrap();
        assert!(matches!(date, DateSpec::Local(t) if t.to_string() == "2013-11-03 00:00:00"));
    }

    #[test]
    fn test_fall_back_hourly_cycle() {
        let spec = "R2/2013-11-03T00:45:00-04:00/PT1H";

        let clock = DefaultClock::fixed(utc(2013, 11, 3, 4, 45, 0), US::Eastern);
        let first = DurationHelper::new(spec).unwrap().next_occurrence(&clock);
        assert_eq!(first.with_timezone(&Utc), utc(2013, 11, 3, 5, 45, 0));

        clock.set_current_time(utc(2013, 11, 3, 5, 45, 0));
        let second = DurationHelper::new(spec).unwrap().next_occurrence(&clock);
        assert_eq!(second.with_timezone(&Utc), utc(2013, 11, 3, 6, 45, 0));
    }

    #[test]
    fn test_fall_back_repeated_hour_anchors() {
        let clock = DefaultClock::fixed(utc(2013, 11, 3, 5, 45, 0), US::Eastern);
        let first_hour = DurationHelper::new("R2/2013-11-03T01:45:00-04:00/PT1H").unwrap();
        assert_eq!(
            first_hour.next_occurrence(&clock).with_timezone(&Utc),
            utc(2013, 11, 3, 6, 45, 0)
        );

        clock.set_current_time(utc(2013, 11, 3, 6, 45, 0));
        let second_hour = DurationHelper::new("R2/2013-11-03T01:45:00-05:00/PT1H").unwrap();
        assert_eq!(
            second_hour.next_occurrence(&clock).with_timezone(&Utc),
            utc(2013, 11, 3, 7, 45, 0)
        );
    }

    #[test]
    fn test_fall_back_observed_wall_clock() {
        let clock = DefaultClock::fixed(utc(2013, 11, 3, 4, 45, 0), US::Eastern);
        let helper = DurationHelper::new("R2/2013-11-03T00:45:00-04:00/PT2H").unwrap();
        assert_eq!(helper.next_occurrence(&clock).to_rfc3339(), "2013-11-03T01:45:00-05:00");
    }

    #[test]
    fn test_spring_forward_hourly_cycle() {
        let spec = "R2/2014-03-09T00:45:00-05:00/PT1H";
        let clock = DefaultClock::fixed(utc(2014, 3, 9, 5, 45, 0), US::Eastern);
        let first = DurationHelper::new(spec).unwrap().next_occurrence(&clock);
        assert_eq!(first.with_timezone(&Utc), utc(2014, 3, 9, 6, 45, 0));
        assert_eq!(first.to_rfc3339(), "2014-03-09T01:45:00-05:00");

        clock.set_current_time(utc(2014, 3, 9, 6, 45, 0));
        let second = DurationHelper::new(spec).unwrap().next_occurrence(&clock);
        assert_eq!(second.to_rfc3339(), "2014-03-09T03:45:00-04:00");
    }

    #[test]
    fn test_spring_forward_local_anchor() {
        let clock = DefaultClock::fixed(utc(2014, 3, 9, 6, 45, 0), US::Eastern);
        let helper = DurationHelper::new("R2/2014-03-09T01:45:00/PT1H").unwrap();
        assert_eq!(helper.next_occurrence(&clock).to_rfc3339(), "2014-03-09T03:45:00-04:00");
    }

    #[test]
    fn test_local_anchor_inside_gap_moves_forward() {
        let clock = DefaultClock::fixed(utc(2014, 3, 9, 6, 0, 0), US::Eastern);
        let helper = DurationHelper::new("R/2014-03-09T02:30:00/PT1H").unwrap();
        assert_eq!(helper.next_occurrence(&clock).to_rfc3339(), "2014-03-09T03:30:00-04:00");
    }

    #[test]
    fn test_daily_wall_clock_survives_spring_forward_gap() {
        let helper = DurationHelper::new("R/2014-03-08T02:30:00/P1D").unwrap();
        let cases = vec![
            (utc(2014, 3, 9, 5, 0, 0), "2014-03-09T03:30:00-04:00"),
            (utc(2014, 3, 9, 12, 0, 0), "2014-03-10T02:30:00-04:00"),
            (utc(2014, 3, 12, 12, 0, 0), "2014-03-13T02:30:00-04:00"),
        ];

        for (now, expected) in cases {
            let clock = DefaultClock::fixed(now, US::Eastern);
            assert_eq!(helper.next_occurrence(&clock).to_rfc3339(), expected, "now {now}");
        }
    }

    #[test]
    fn test_daily_period_lands_on_local_midnight() {
        struct Case {
            spec: &'static str,
            zone: Tz,
            now: DateTime<Utc>,
            next_local: &'static str,
            elapsed_hours: i64,
        }

        let cases = vec![
            Case {
                spec: "R2/2013-11-03T00:00:00/P1D",
                zone: US::Eastern,
                now: utc(2013, 11, 3, 4, 0, 0),
                next_local: "2013-11-04 00:00:00",
                elapsed_hours: 25,
            },
            Case {
                spec: "R2/2014-03-09T00:00:00/P1D",
                zone: US::Eastern,
                now: utc(2014, 3, 9, 5, 0, 0),
                next_local: "2014-03-10 00:00:00",
                elapsed_hours: 23,
            },
            Case {
                spec: "R2/2013-10-27T00:00:00/P1D",
                zone: Europe::Amsterdam,
                now: utc(2013, 10, 26, 22, 0, 0),
                next_local: "2013-10-28 00:00:00",
                elapsed_hours: 25,
            },
            Case {
                spec: "R2/2014-03-30T00:00:00/P1D",
                zone: Europe::Amsterdam,
                now: utc(2014, 3, 29, 23, 0, 0),
                next_local: "2014-03-31 00:00:00",
                elapsed_hours: 23,
            },
        ];

        for case in cases {
            let clock = DefaultClock::fixed(case.now, case.zone);
            let next = DurationHelper::new(case.spec).unwrap().next_occurrence(&clock);
            assert_eq!(next.naive_local().to_string(), case.next_local, "spec: {}", case.spec);
            assert_eq!(
                (next.with_timezone(&Utc) - case.now).num_hours(),
                case.elapsed_hours,
                "spec: {}",
                case.spec
            );
        }
    }

    #[test]
    fn test_anchor_fixed_at_first_evaluation() {
        let clock = DefaultClock::fixed(epoch_plus(0), chrono_tz::UTC);
        let helper = DurationHelper::new("R2/PT10S").unwrap();

        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(10));

        clock.set_current_time(epoch_plus(15));
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(20));

        clock.set_current_time(epoch_plus(30));
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(20));
    }

    #[test]
    fn test_start_end_form_derives_period() {
        let helper = DurationHelper::new("R2/1970-01-01T00:00:00/1970-01-01T00:00:10").unwrap();
        let clock = DefaultClock::fixed(epoch_plus(15), chrono_tz::UTC);
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(20));

        clock.set_current_time(epoch_plus(30));
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(20));
    }

    #[test]
    fn test_period_end_form_clamps_to_boundary() {
        let clock = DefaultClock::fixed(epoch_plus(0), chrono_tz::UTC);
        let helper = DurationHelper::new("R5/PT10S/1970-01-01T00:00:35Z").unwrap();
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(10));

        clock.set_current_time(epoch_plus(12));
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(20));

        clock.set_current_time(epoch_plus(32));
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(30));
    }

    #[test]
    fn test_non_repeating_forms() {
        let clock = DefaultClock::fixed(epoch_plus(100), chrono_tz::UTC);
        let plain = DurationHelper::new("PT1H").unwrap();
        assert!(!plain.is_repeating());
        assert_eq!(plain.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(3700));

        let bounded = DurationHelper::new("PT10S/1970-01-01T00:01:45Z").unwrap();
        assert_eq!(bounded.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(105));
    }

    #[test]
    fn test_unbounded_hourly_uses_division() {
        let clock = DefaultClock::fixed(utc(2013, 1, 1, 5, 30, 0), chrono_tz::UTC);
        let helper = DurationHelper::new("R/2013-01-01T00:00:00Z/PT1H").unwrap();
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), utc(2013, 1, 1, 6, 0, 0));
    }

    #[test]
    fn test_fractional_seconds() {
        let clock = DefaultClock::fixed(Utc.timestamp_opt(1, 200_000_000).unwrap(), chrono_tz::UTC);
        let helper = DurationHelper::new("R/1970-01-01T00:00:00Z/PT0.5S").unwrap();
        assert_eq!(
            helper.next_occurrence(&clock).with_timezone(&Utc),
            Utc.timestamp_opt(1, 500_000_000).unwrap()
        );
    }

    #[test]
    fn test_month_end_clamps_day() {
        let clock = DefaultClock::fixed(utc(2013, 2, 1, 0, 0, 0), chrono_tz::UTC);
        let helper = DurationHelper::new("R/2013-01-31T00:00:00Z/P1M").unwrap();
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), utc(2013, 2, 28, 0, 0, 0));
    }

    #[test]
    fn test_month_end_anchor_is_kept_after_short_month() {
        let helper = DurationHelper::new("R/2013-01-31T00:00:00Z/P1M").unwrap();
        let cases = vec![
            (utc(2013, 3, 1, 0, 0, 0), utc(2013, 3, 31, 0, 0, 0)),
            (utc(2013, 4, 1, 0, 0, 0), utc(2013, 4, 30, 0, 0, 0)),
            (utc(2013, 5, 1, 0, 0, 0), utc(2013, 5, 31, 0, 0, 0)),
            (utc(2014, 2, 1, 0, 0, 0), utc(2014, 2, 28, 0, 0, 0)),
        ];

        for (now, expected) in cases {
            let clock = DefaultClock::fixed(now, chrono_tz::UTC);
            assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), expected, "now {now}");
        }
    }

    #[test]
    fn test_future_anchor_is_first_occurrence() {
        let clock = DefaultClock::fixed(utc(2013, 1, 1, 0, 0, 0), chrono_tz::UTC);
        let helper = DurationHelper::new("R3/2013-06-01T12:00:00Z/P1D").unwrap();
        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), utc(2013, 6, 1, 12, 0, 0));
    }

    #[test]
    fn test_next_occurrence_after_explicit_instant() {
        let clock = DefaultClock::fixed(utc(2000, 1, 1, 0, 0, 0), US::Eastern);
        let helper = DurationHelper::new("R/2013-01-01T00:00:00Z/PT1H").unwrap();
        let next = helper.next_occurrence_after(utc(2013, 1, 1, 2, 10, 0), &clock);
        assert_eq!(next.with_timezone(&Utc), utc(2013, 1, 1, 3, 0, 0));
        assert_eq!(next.timezone(), US::Eastern);
    }

    #[test]
    fn test_end_boundary_and_valid_dates() {
        let helper = DurationHelper::new("R/1970-01-01T00:00:00Z/PT10S")
            .unwrap()
            .with_end_boundary("1970-01-01T00:00:25Z")
            .unwrap();
        let clock = DefaultClock::fixed(epoch_plus(40), chrono_tz::UTC);

        assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), epoch_plus(20));
        assert!(helper.is_valid_date(&epoch_plus(25).with_timezone(&chrono_tz::UTC)));
        assert!(!helper.is_valid_date(&epoch_plus(26).with_timezone(&chrono_tz::UTC)));

        let unbounded = DurationHelper::new("R/PT10S").unwrap().with_end_boundary("  ").unwrap();
        assert!(unbounded.is_valid_date(&epoch_plus(i64::from(i32::MAX)).with_timezone(&chrono_tz::UTC)));
    }

    #[test]
    fn test_boundary_takes_earliest_end() {
        let helper = DurationHelper::new("R/PT10S/1970-01-01T00:01:00Z")
            .unwrap()
            .with_end_boundary("1970-01-01T00:00:30Z")
            .unwrap();
        assert_eq!(
            helper.boundary(&chrono_tz::UTC).map(|b| b.with_timezone(&Utc)),
            Some(epoch_plus(30))
        );
    }

    proptest! {
        #[test]
        fn repetition_ceiling_is_never_exceeded(n in 0u32..20, step in 1i64..3600, elapsed in 0i64..200_000) {
            let helper = DurationHelper::new(&format!("R{n}/1970-01-01T00:00:00Z/PT{step}S")).unwrap();
            let clock = DefaultClock::fixed(epoch_plus(elapsed), chrono_tz::UTC);
            let offset = (helper.next_occurrence(&clock).with_timezone(&Utc) - epoch_plus(0)).num_seconds();

            prop_assert!(offset <= i64::from(n) * step);
            prop_assert_eq!(offset % step, 0);
            if elapsed < i64::from(n) * step {
                prop_assert!(offset > elapsed);
                prop_assert!(offset - step <= elapsed);
            }
        }

        #[test]
        fn kth_occurrence_is_anchor_plus_k_periods(
            months in 0u32..13,
            days in 0u64..40,
            hours in 0i64..48,
            day in 28u32..=31,
            k in 1u32..40,
        ) {
            prop_assume!(u64::from(months) + days + hours.unsigned_abs() > 0);
            let expected = |k: u32| {
                let date = NaiveDate::from_ymd_opt(2013, 1, day)
                    .and_then(|date| date.checked_add_months(Months::new(months * k)))
                    .and_then(|date| date.checked_add_days(Days::new(days * u64::from(k))))
                    .unwrap();
                Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
                    + Duration::hours(hours * i64::from(k))
            };

            let helper = DurationHelper::new(&format!("R/2013-01-{day:02}T00:00:00Z/P{months}M{days}DT{hours}H")).unwrap();
            let clock = DefaultClock::fixed(expected(k - 1), chrono_tz::UTC);
            prop_assert_eq!(helper.next_occurrence(&clock).with_timezone(&Utc), expected(k));
        }

        #[test]
        fn end_boundary_is_never_exceeded(step in 1i64..600, end in 0i64..10_000, elapsed in 0i64..20_000) {
            let boundary = epoch_plus(end);
            let helper = DurationHelper::new(&format!("R/1970-01-01T00:00:00Z/PT{step}S"))
                .unwrap()
                .with_end_boundary(&boundary.to_rfc3339())
                .unwrap();
            let clock = DefaultClock::fixed(epoch_plus(elapsed), chrono_tz::UTC);
            let due = helper.next_occurrence(&clock).with_timezone(&Utc);

            prop_assert!(due <= boundary);
            prop_assert!(helper.is_valid_date(&due.with_timezone(&chrono_tz::UTC)));
        }
    }
}
