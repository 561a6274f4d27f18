//! Calendar clocks used to date ledger entries.

use std::{cell::Cell, fmt, rc::Rc};

use chrono::{Days, Local, NaiveDate};

/// Source of the current calendar date
pub trait Clock: fmt::Debug {
    /// Today's date, truncated to day granularity
    fn today(&self) -> NaiveDate;
}

/// Reads the local calendar date
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A manually advanced clock; clones share the same date
#[derive(Debug, Clone)]
pub struct FixedClock {
    /// Shared current date
    date: Rc<Cell<NaiveDate>>,
}

impl FixedClock {
    /// Create a clock pinned to `date`
    #[must_use]
    pub fn new(date: NaiveDate) -> Self {
        Self { date: Rc::new(Cell::new(date)) }
    }

    /// Move the clock to a specific date
    pub fn set(&self, date: NaiveDate) {
        self.date.set(date);
    }

    /// Move the clock forward by whole days, saturating at the calendar maximum
    pub fn advance_days(&self, days: u64) {
        let current = self.date.get();
        self.date.set(current.checked_add_days(Days::new(days)).unwrap_or(NaiveDate::MAX));
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.date.get()
    }
}
