//! Poll state published to the views and the viewer scheduler.

pub mod reconciler;

use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{AppError, Result};
use crate::service::ScheduleService;

pub use reconciler::{cap_recorded, reconcile, RawPoll, Snapshot};

/// Result of a poll attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new snapshot was published.
    Updated,
    /// The service is marked unavailable; nothing was requested.
    Suppressed,
}

/// Owner of the current snapshot.
///
/// A new snapshot is built completely before it replaces the current one, so
/// holders of an earlier `Arc<Snapshot>` never observe a partial update.
#[derive(Debug)]
pub struct StateStore {
    current: Arc<Snapshot>,
    available: bool,
    recorded_cap: usize,
}

impl StateStore {
    pub fn new(recorded_cap: usize) -> Self {
        Self {
            current: Arc::new(Snapshot::default()),
            available: true,
            recorded_cap,
        }
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&self.current)
    }

    /// False once a poll has failed. Stays false for the rest of the session.
    pub fn is_available(&self) -> bool {
        self.available
    }

    pub fn recorded_cap(&self) -> usize {
        self.recorded_cap
    }

    /// Poll the service and publish a new snapshot.
    ///
    /// The first failure returns [`AppError::CollaboratorUnavailable`] and
    /// suppresses every later poll; the previous snapshot stays published.
    pub fn poll<S: ScheduleService>(
        &mut self,
        service: &S,
        include_recorded: bool,
    ) -> Result<PollOutcome> {
        if !self.available {
            return Ok(PollOutcome::Suppressed);
        }

        let raw = match service.fetch_poll(include_recorded) {
            Ok(raw) => raw,
            Err(code) => {
                self.available = false;
                warn!("StateStore: poll failed ({}), keeping the previous snapshot", code);
                return Err(AppError::CollaboratorUnavailable(code));
            }
        };

        let (reservations, services, tuners) =
            (raw.reservations.len(), raw.services.len(), raw.tuners.len());
        self.current = Arc::new(reconcile(raw, self.recorded_cap));
        debug!(
            "StateStore: published snapshot ({} reservations, {} services, {} tuners, {} recorded)",
            reservations,
            services,
            tuners,
            self.current.recorded_files().len()
        );
        Ok(PollOutcome::Updated)
    }

    /// Refresh only the recorded files, keeping every other index.
    pub fn fetch_recorded<S: ScheduleService>(&mut self, service: &S) -> Result<PollOutcome> {
        if !self.available {
            return Ok(PollOutcome::Suppressed);
        }

        match service.enum_rec_info_basic() {
            Ok(files) => {
                info!("StateStore: fetched {} recorded files", files.len());
                self.current = Arc::new(self.current.with_recorded(files, self.recorded_cap));
                Ok(PollOutcome::Updated)
            }
            Err(code) => {
                self.available = false;
                warn!("StateStore: recorded fetch failed ({})", code);
                Err(AppError::CollaboratorUnavailable(code))
            }
        }
    }
}
