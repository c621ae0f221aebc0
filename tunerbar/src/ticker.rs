//! One-second tick driver.
//!
//! The timer wakes twice a second and hands every wall-clock second that
//! passed since the last wake to the callback, so a late wake never skips
//! the launch or close second of the viewer scheduler.

use std::future::Future;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use log::{debug, info};
use tokio::time::{interval, MissedTickBehavior};

use crate::clock::Clock;

/// Timer resolution. Half a second keeps each wall second hit at least once.
pub const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Seconds replayed after a stall. Longer gaps resume at the current second.
pub const MAX_CATCH_UP_SECS: i64 = 5;

/// Turns clock readings into a sequence of whole seconds.
#[derive(Debug)]
pub struct Ticker<C> {
    clock: C,
    last: Option<NaiveDateTime>,
}

impl<C: Clock> Ticker<C> {
    pub fn new(clock: C) -> Self {
        Self { clock, last: None }
    }

    /// Seconds due since the previous call, oldest first.
    pub fn due(&mut self) -> Vec<NaiveDateTime> {
        let now = truncate(self.clock.now());
        let Some(last) = self.last else {
            self.last = Some(now);
            return vec![now];
        };

        let gap = (now - last).num_seconds();
        if gap == 0 {
            return Vec::new();
        }
        if gap < 0 {
            if -gap > MAX_CATCH_UP_SECS {
                info!("Ticker: clock moved back {}s, resuming at {}", -gap, now);
                self.last = Some(now);
                return vec![now];
            }
            return Vec::new();
        }

        self.last = Some(now);
        if gap > MAX_CATCH_UP_SECS {
            info!("Ticker: skipped {}s, resuming at {}", gap, now);
            return vec![now];
        }
        (1..=gap)
            .map(|n| last + chrono::Duration::seconds(n))
            .collect()
    }

    /// Call `on_second` for every due second until `shutdown` resolves.
    pub async fn run<F, S>(mut self, mut on_second: F, shutdown: S)
    where
        F: FnMut(NaiveDateTime),
        S: Future<Output = ()>,
    {
        let mut timer = interval(TICK_INTERVAL);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!("Ticker: Started");
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Ticker: Shutdown requested");
                    break;
                }
                _ = timer.tick() => {
                    for second in self.due() {
                        on_second(second);
                    }
                }
            }
        }
        debug!("Ticker: Stopped");
    }
}

fn truncate(time: NaiveDateTime) -> NaiveDateTime {
    time.with_nanosecond(0).unwrap_or(time)
}
