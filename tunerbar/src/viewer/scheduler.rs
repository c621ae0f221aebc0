//! Minute-granular launch and close of viewer processes.
//!
//! # How It Works
//!
//! The scheduler is evaluated once per wall-clock second but only acts on two
//! seconds of each minute:
//!
//! 1. At `59 - open_margin` it launches a viewer for every channel with a
//!    reservation starting in the upcoming minute that is not tracked yet.
//! 2. At `close_margin` it prunes handles whose process is gone, then asks
//!    every tracked viewer whose channel has no reservation in progress to
//!    close.
//!
//! At most one handle is tracked per channel. Nothing is retried: a missed
//! launch or close is only reconsidered at the next qualifying second.

use std::collections::{HashMap, HashSet};
use std::fmt;

use chrono::{Duration, NaiveDateTime, Timelike};
use log::{debug, info, warn};
use tunerbar_protocol::{BandType, Reservation, ServiceKey};

use crate::error::AppError;

use super::{LaunchError, LaunchRequest, ViewerHandle, ViewerLauncher};

/// Viewer scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Global auto-open switch. Both phases are skipped when off.
    pub enabled: bool,
    /// Seconds before the minute boundary at which viewers are launched.
    pub open_margin: u32,
    /// Second of the minute at which finished viewers are closed.
    pub close_margin: u32,
    /// Launch for terrestrial channels.
    pub terrestrial: bool,
    /// Launch for BS channels.
    pub bs: bool,
    /// Launch for CS channels.
    pub cs: bool,
    /// Only launch for favorite channels.
    pub favorites_only: bool,
    /// Viewer options used for terrestrial channels.
    pub terrestrial_options: String,
    /// Viewer options used for BS/CS channels.
    pub satellite_options: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            open_margin: 10,
            close_margin: 10,
            terrestrial: true,
            bs: true,
            cs: true,
            favorites_only: false,
            terrestrial_options: String::new(),
            satellite_options: String::new(),
        }
    }
}

impl SchedulerConfig {
    /// Second of the minute on which the launch phase runs.
    pub fn launch_second(&self) -> u32 {
        59u32.saturating_sub(self.open_margin)
    }

    /// Launch options for a band, or None if the band is not enabled.
    fn options_for(&self, band: BandType) -> Option<&str> {
        match band {
            BandType::Terrestrial if self.terrestrial => Some(&self.terrestrial_options),
            BandType::BS if self.bs => Some(&self.satellite_options),
            BandType::CS if self.cs => Some(&self.satellite_options),
            _ => None,
        }
    }
}

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Channels a viewer was launched for.
    pub launched: Vec<ServiceKey>,
    /// Channels a close request was sent to.
    pub closed: Vec<ServiceKey>,
    /// Launches that failed.
    pub failures: Vec<(ServiceKey, LaunchError)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.launched.is_empty() && self.closed.is_empty() && self.failures.is_empty()
    }
}

/// Tracks viewer processes per channel.
pub struct ViewerScheduler {
    config: SchedulerConfig,
    tracked: HashMap<ServiceKey, Box<dyn ViewerHandle>>,
}

impl fmt::Debug for ViewerScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.tracked.keys().collect();
        keys.sort();
        f.debug_struct("ViewerScheduler")
            .field("config", &self.config)
            .field("tracked", &keys)
            .finish()
    }
}

impl ViewerScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            tracked: HashMap::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn is_tracked(&self, key: &ServiceKey) -> bool {
        self.tracked.contains_key(key)
    }

    /// Process id of the viewer tracked for `key`.
    pub fn pid(&self, key: &ServiceKey) -> Option<u32> {
        self.tracked.get(key).and_then(|handle| handle.id())
    }

    pub fn tracked_count(&self) -> usize {
        self.tracked.len()
    }

    /// Run the phases due at `now`.
    ///
    /// `reservations` is the raw reservation list of the current snapshot,
    /// duplicates included.
    pub fn tick<L: ViewerLauncher + ?Sized>(
        &mut self,
        now: NaiveDateTime,
        reservations: &[Reservation],
        favorites: &HashSet<ServiceKey>,
        launcher: &L,
    ) -> TickReport {
        let mut report = TickReport::default();
        if !self.config.enabled {
            return report;
        }

        let second = now.second();
        if second == self.config.launch_second() {
            self.launch_phase(now, reservations, favorites, launcher, &mut report);
        }
        if second == self.config.close_margin {
            self.close_phase(now, reservations, &mut report);
        }
        report
    }

    fn launch_phase<L: ViewerLauncher + ?Sized>(
        &mut self,
        now: NaiveDateTime,
        reservations: &[Reservation],
        favorites: &HashSet<ServiceKey>,
        launcher: &L,
        report: &mut TickReport,
    ) {
        // 59s ahead lands inside the upcoming minute for any launch second
        let check_time = now + Duration::seconds(59);
        let mut attempted = HashSet::new();

        for reservation in reservations
            .iter()
            .filter(|r| same_minute(r.start_time, check_time))
        {
            let key = reservation.service_key();
            if self.tracked.contains_key(&key) || attempted.contains(&key) {
                continue;
            }
            if self.config.favorites_only && !favorites.contains(&key) {
                continue;
            }
            let Some(options) = self.config.options_for(reservation.band()) else {
                continue;
            };

            attempted.insert(key);
            match launcher.launch(&LaunchRequest::channel(key, options)) {
                Ok(handle) => {
                    info!(
                        "ViewerScheduler: Launched viewer for {} ({}) starting at {}, pid {:?}",
                        key,
                        reservation.title,
                        reservation.start_time.format("%H:%M"),
                        handle.id()
                    );
                    self.tracked.insert(key, handle);
                    report.launched.push(key);
                }
                Err(e) => {
                    warn!("ViewerScheduler: Launch for {} failed: {}", key, e);
                    report.failures.push((key, e));
                }
            }
        }
    }

    fn close_phase(
        &mut self,
        now: NaiveDateTime,
        reservations: &[Reservation],
        report: &mut TickReport,
    ) {
        self.tracked.retain(|key, handle| match handle.has_exited() {
            Ok(false) => true,
            Ok(true) => {
                debug!("ViewerScheduler: Viewer for {} has exited", key);
                false
            }
            Err(e) => {
                debug!("ViewerScheduler: Cannot query viewer for {}: {}", key, e);
                false
            }
        });

        let in_progress: HashSet<ServiceKey> = reservations
            .iter()
            .filter(|r| r.start_time <= now && now < r.end_time())
            .map(Reservation::service_key)
            .collect();

        let mut to_close: Vec<ServiceKey> = self
            .tracked
            .keys()
            .filter(|key| !in_progress.contains(key) && !report.launched.contains(key))
            .copied()
            .collect();
        to_close.sort();

        for key in to_close {
            let Some(handle) = self.tracked.get_mut(&key) else {
                continue;
            };
            let pid = handle.id();
            match handle.request_close() {
                Ok(()) => {
                    info!("ViewerScheduler: Requested close of viewer for {} (pid {:?})", key, pid);
                    report.closed.push(key);
                }
                Err(e) => debug!("ViewerScheduler: {} ({})", AppError::ProcessCloseFailed(e), key),
            }
        }
    }
}

fn same_minute(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    a.date() == b.date() && a.hour() == b.hour() && a.minute() == b.minute()
}
