//! Wall-clock source for the tick driver.

use chrono::{Local, NaiveDateTime};

/// Source of the current local wall time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Clock backed by the system local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
