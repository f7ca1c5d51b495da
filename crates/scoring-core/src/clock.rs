//! Wall-clock access.
//!
//! Birthday validation and the admin token both depend on "now". Everything
//! that needs the time takes a [`Clock`] so tests can pin it.

use std::fmt;

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Source of the current local time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Returns the current local date and time.
    fn now(&self) -> NaiveDateTime;

    /// Returns the current local date.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// The process wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stopped at a fixed instant.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use scoring_core::{Clock, FixedClock};
///
/// let now = NaiveDate::from_ymd_opt(2017, 7, 20).unwrap().and_hms_opt(13, 5, 0).unwrap();
/// let clock = FixedClock::new(now);
/// assert_eq!(clock.now(), now);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock {
    now: NaiveDateTime,
}

impl FixedClock {
    /// Creates a clock that always reports `now`.
    #[must_use]
    pub const fn new(now: NaiveDateTime) -> Self {
        Self { now }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now
    }
}
