//! Application core: polls the scheduling service, keeps the lists in sync
//! and drives the viewer scheduler once per second.
//!
//! # Refresh pipeline
//!
//! 1. Poll the service (every minute at second 0, or on demand)
//! 2. Publish a new snapshot
//! 3. Lay out rows on structural refreshes (tab change, filter reset)
//! 4. Write current data into the rows, unless a filter is active
//! 5. Run the viewer scheduler
//!
//! Background failures (polling, automatic launches) are queued as notices
//! for the front-end; user actions return their errors directly.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use log::{debug, info};
use tunerbar_protocol::{BandType, EventKey, ServiceKey};
use url::Url;

use crate::config::Settings;
use crate::error::{AppError, Result};
use crate::service::ScheduleService;
use crate::state::{Snapshot, StateStore};
use crate::view::context::{self, ContextEntry, ReservationDetail};
use crate::view::grouped::{recorded_items, reservation_items};
use crate::view::{ChannelList, FilterOutcome, FilterView, GroupedList, ListRow, RowKey, Tab, TunerList};
use crate::viewer::{LaunchRequest, TickReport, ViewerLauncher, ViewerScheduler};
use crate::weblink;

/// Front-end state and actions.
pub struct App<S, L> {
    settings: Settings,
    service: S,
    launcher: L,
    store: StateStore,
    tab: Tab,
    grouped: GroupedList,
    channels: ChannelList,
    tuners: TunerList,
    filter: FilterView,
    viewers: ViewerScheduler,
    favorites: HashSet<ServiceKey>,
    notices: Vec<String>,
}

impl<S: ScheduleService, L: ViewerLauncher> App<S, L> {
    pub fn new(settings: Settings, service: S, launcher: L, tab: Tab) -> Self {
        let store = StateStore::new(settings.recorded_max);
        let viewers = ViewerScheduler::new(settings.scheduler.clone());
        let favorites = settings.favorites.iter().copied().collect();
        Self {
            settings,
            service,
            launcher,
            store,
            tab,
            grouped: GroupedList::default(),
            channels: ChannelList::default(),
            tuners: TunerList::default(),
            filter: FilterView::default(),
            viewers,
            favorites,
            notices: Vec::new(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.store.snapshot()
    }

    pub fn is_filtering(&self) -> bool {
        self.filter.is_active()
    }

    pub fn viewers(&self) -> &ViewerScheduler {
        &self.viewers
    }

    /// Rows of the current tab.
    pub fn rows(&self) -> &[ListRow] {
        if self.tab.is_channel_tab() {
            self.channels.rows()
        } else {
            self.grouped.rows()
        }
    }

    pub fn tuner_rows(&self) -> &[ListRow] {
        self.tuners.rows()
    }

    /// Drain queued user-visible notices.
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    /// Handle one wall-clock second.
    pub fn tick(&mut self, now: NaiveDateTime) -> TickReport {
        if now.second() == 0 {
            self.refresh(now, false, true);
        }

        let snapshot = self.store.snapshot();
        let report = self
            .viewers
            .tick(now, snapshot.reservations(), &self.favorites, &self.launcher);
        for (key, err) in &report.failures {
            self.notices
                .push(format!("{} のビューア起動に失敗しました: {}", key, err));
        }
        report
    }

    /// Poll if `transmit`, then bring the rows up to date.
    ///
    /// `structural` lays the rows out from scratch and clears any filter.
    /// Without it, rows are left alone while a filter is active.
    pub fn refresh(&mut self, now: NaiveDateTime, structural: bool, transmit: bool) {
        if transmit {
            let include_recorded = self.tab == Tab::Recorded;
            if let Err(e) = self.store.poll(&self.service, include_recorded) {
                self.notices.push(e.to_string());
            }
        }

        if self.filter.is_active() && !structural {
            debug!("App: filter active, rows left unchanged");
            return;
        }

        if structural {
            self.filter.reset();
            self.prepare(now);
        }

        let snapshot = self.store.snapshot();
        match self.tab {
            Tab::Reservations => {
                self.grouped.sync(&reservation_items(&snapshot, now), now);
            }
            Tab::Recorded => {
                self.grouped.sync(&recorded_items(&snapshot), now);
            }
            _ => self.channels.refresh(&snapshot, now),
        }
        self.tuners.refresh(&snapshot, now);
    }

    fn prepare(&mut self, now: NaiveDateTime) {
        if self.tab == Tab::Recorded && self.store.snapshot().recorded_files().is_empty() {
            if let Err(e) = self.store.fetch_recorded(&self.service) {
                self.notices.push(e.to_string());
            }
        }

        let snapshot = self.store.snapshot();
        match self.tab {
            Tab::Reservations => self.grouped.rebuild(&reservation_items(&snapshot, now)),
            Tab::Recorded => self.grouped.rebuild(&recorded_items(&snapshot)),
            tab => {
                let lineup = self.lineup(tab, &snapshot);
                self.channels.prepare(&lineup, tab, &snapshot);
            }
        }
        self.tuners.prepare(&snapshot, &self.settings.tuner_names);
    }

    fn lineup(&self, tab: Tab, snapshot: &Snapshot) -> Vec<ServiceKey> {
        if tab == Tab::Favorites {
            return self.settings.favorites.clone();
        }
        if !self.settings.channels.is_empty() {
            return self.settings.channels.clone();
        }
        snapshot
            .services()
            .iter()
            .map(|s| s.service_info.key())
            .collect()
    }

    pub fn select_tab(&mut self, tab: Tab, now: NaiveDateTime) {
        info!("App: switching to tab {}", tab.title());
        self.tab = tab;
        self.refresh(now, true, false);
    }

    /// Filter the current rows. Empty text resets the filter.
    pub fn apply_filter(&mut self, text: &str, now: NaiveDateTime) -> FilterOutcome {
        let rows = if self.tab.is_channel_tab() {
            self.channels.rows_mut()
        } else {
            self.grouped.rows_mut()
        };
        let outcome = self.filter.apply(rows, text);
        if outcome == FilterOutcome::Reset {
            self.refresh(now, true, false);
        }
        outcome
    }

    pub fn reset_filter(&mut self, now: NaiveDateTime) {
        self.filter.reset();
        self.refresh(now, true, false);
    }

    /// Flip recording of a reservation on or off.
    ///
    /// The change is sent on a copy and the service is polled again; local
    /// state only reflects what the poll returns.
    pub fn toggle_recording(&mut self, key: EventKey, now: NaiveDateTime) -> Result<()> {
        let snapshot = self.store.snapshot();
        let reservation = snapshot
            .reservation(&key)
            .ok_or_else(|| AppError::StaleKeyLookup(format!("reservation {}", key)))?;

        let fixed = self.settings.fix_no_rec_to_service_only;
        let mut changed = reservation.clone();
        changed.rec_mode = match (reservation.is_recording_disabled(), fixed) {
            (true, true) => 1,
            (true, false) => reservation.effective_rec_mode(),
            (false, true) => 5,
            (false, false) => reservation.disabled_rec_mode(),
        };
        info!(
            "App: changing rec mode of {} ({}) from {} to {}",
            key, reservation.title, reservation.rec_mode, changed.rec_mode
        );

        let code = self.service.change_reservation(&changed);
        self.refresh(now, false, true);
        code.into_result().map_err(AppError::ChangeReservationFailed)
    }

    /// Launch the viewer on a channel.
    pub fn open_channel(&mut self, key: ServiceKey) -> Result<()> {
        if !self.settings.viewer.double_click {
            return Err(AppError::LaunchDisabled);
        }
        let snapshot = self.store.snapshot();
        let service = snapshot
            .service(&key)
            .ok_or_else(|| AppError::StaleKeyLookup(format!("channel {}", key)))?;

        let options = if service.service_info.band() == BandType::Terrestrial {
            &self.settings.viewer.terrestrial_options
        } else {
            &self.settings.viewer.satellite_options
        };
        self.launcher.launch(&LaunchRequest::channel(key, options.as_str()))?;
        Ok(())
    }

    /// Play a recorded file in the viewer.
    pub fn open_recording(&mut self, id: u32) -> Result<()> {
        if !self.settings.viewer.double_click {
            return Err(AppError::LaunchDisabled);
        }
        let snapshot = self.store.snapshot();
        let file = snapshot
            .recorded(id)
            .ok_or_else(|| AppError::StaleKeyLookup(format!("recorded file {}", id)))?;

        let path = if self.settings.remote_service {
            let network_path = self
                .service
                .get_recording_file_network_path(&file.rec_file_path)
                .map_err(|code| AppError::NetworkPathUnavailable {
                    path: file.rec_file_path.clone(),
                    code,
                })?;
            if network_path.is_empty() {
                return Err(AppError::NetworkPathUnavailable {
                    path: file.rec_file_path.clone(),
                    code: tunerbar_protocol::ErrCode::NoRes,
                });
            }
            network_path
        } else {
            file.rec_file_path.clone()
        };

        self.launcher.launch(&LaunchRequest::file(
            path,
            self.settings.viewer.ts_file_options.as_str(),
        ))?;
        Ok(())
    }

    /// Upcoming programs of a channel.
    pub fn channel_entries(&self, key: ServiceKey, now: NaiveDateTime) -> Result<Vec<ContextEntry>> {
        context::channel_entries(&self.store.snapshot(), key, now)
    }

    /// Reservations bound to a tuner.
    pub fn tuner_entries(&self, tuner_id: u32) -> Result<Vec<ContextEntry>> {
        context::tuner_entries(&self.store.snapshot(), tuner_id)
    }

    pub fn reservation_detail(&self, key: EventKey) -> Result<ReservationDetail> {
        context::reservation_detail(&self.store.snapshot(), key)
    }

    /// Detail lines for a row, or the placeholder if the entity is gone.
    pub fn describe(&self, key: RowKey, now: NaiveDateTime) -> Vec<String> {
        let snapshot = self.store.snapshot();
        let lines = match key {
            RowKey::Service(key) => context::channel_entries(&snapshot, key, now)
                .map(|entries| entries.into_iter().map(|e| e.label).collect()),
            RowKey::Tuner(id) => context::tuner_entries(&snapshot, id)
                .map(|entries| entries.into_iter().map(|e| e.label).collect()),
            RowKey::Event(key) => context::reservation_detail(&snapshot, key).map(|d| d.lines()),
            RowKey::Recorded(id) => {
                context::recorded_detail(&snapshot, id).map(|sections| sections.join(&String::new()))
            }
        };
        lines.unwrap_or_else(|e| {
            debug!("App: {}", e);
            vec![AppError::PLACEHOLDER.to_string()]
        })
    }

    /// Web page of a program or recorded file, if web links are enabled.
    pub fn web_link(&self, key: RowKey) -> Result<Option<Url>> {
        let web = &self.settings.web_link;
        if !web.enabled {
            return Ok(None);
        }
        let snapshot = self.store.snapshot();
        match key {
            RowKey::Event(key) => {
                let event = snapshot
                    .event(&key)
                    .ok_or_else(|| AppError::StaleKeyLookup(format!("program {}", key)))?;
                weblink::event_url(&web.event_url, event).map(Some)
            }
            RowKey::Recorded(id) => {
                let file = snapshot
                    .recorded(id)
                    .ok_or_else(|| AppError::StaleKeyLookup(format!("recorded file {}", id)))?;
                weblink::recorded_url(&web.recorded_url, file).map(Some)
            }
            RowKey::Service(_) | RowKey::Tuner(_) => Ok(None),
        }
    }
}
