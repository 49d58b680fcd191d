//! Time source for the accounting service.

use chrono::NaiveDate;
use std::time::Instant;

/// Monotonic time for debouncing plus the local calendar day for rollover.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
    fn today(&self) -> NaiveDate;
}

/// Wall-clock time in the local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn today(&self) -> NaiveDate {
        chrono::Local::now().date_naive()
    }
}

/// Hand-driven clock for tests.
#[cfg(test)]
pub struct ManualClock {
    now: std::sync::Mutex<Instant>,
    today: std::sync::Mutex<NaiveDate>,
}

#[cfg(test)]
impl ManualClock {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            now: std::sync::Mutex::new(Instant::now()),
            today: std::sync::Mutex::new(today),
        }
    }

    pub fn advance(&self, by: std::time::Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set_today(&self, today: NaiveDate) {
        *self.today.lock().unwrap() = today;
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap()
    }

    fn today(&self) -> NaiveDate {
        *self.today.lock().unwrap()
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    fn today(&self) -> NaiveDate {
        (**self).today()
    }
}
