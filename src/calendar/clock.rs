// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::RwLock;

/// Source of "now" for timer evaluation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Zone used for calendar arithmetic and for date-times without an offset.
    fn zone(&self) -> Tz;

    fn now_in(&self, zone: Tz) -> DateTime<Tz> {
        self.now().with_timezone(&zone)
    }

    fn now_local(&self) -> DateTime<Tz> {
        self.now_in(self.zone())
    }
}

/// System clock that can be pinned to a fixed instant for deterministic tests.
#[derive(Debug)]
pub struct DefaultClock {
    pinned: RwLock<Option<DateTime<Utc>>>,
    zone: RwLock<Tz>,
}

impl DefaultClock {
    pub fn new(zone: Tz) -> Self {
        Self {
            pinned: RwLock::new(None),
            zone: RwLock::new(zone),
        }
    }

    /// A clock pinned at `instant` in `zone`.
    pub fn fixed(instant: DateTime<Utc>, zone: Tz) -> Self {
        let clock = Self::new(zone);
        clock.set_current_time(instant);
        clock
    }

    pub fn set_current_time(&self, instant: DateTime<Utc>) {
        *self.pinned.write() = Some(instant);
    }

    /// Pin both the instant and the zone from a zoned date-time.
    pub fn set_current_calendar(&self, time: DateTime<Tz>) {
        *self.zone.write() = time.timezone();
        *self.pinned.write() = Some(time.with_timezone(&Utc));
    }

    pub fn set_zone(&self, zone: Tz) {
        *self.zone.write() = zone;
    }

    /// Return to the system time.
    pub fn reset(&self) {
        *self.pinned.write() = None;
    }
}

impl Default for DefaultClock {
    fn default() -> Self {
        Self::new(chrono_tz::UTC)
    }
}

impl Clock for DefaultClock {
    fn now(&self) -> DateTime<Utc> {
        self.pinned.read().unwrap_or_else(Utc::now)
    }

    fn zone(&self) -> Tz {
        *self.zone.read()
    }
}
