//! Client interface to the EpgTimerSrv scheduling service.
//!
//! The wire protocol is owned by the implementation; the core only sees
//! the enumerations below, each of which yields data only on success.

pub mod snapshot;

use tunerbar_protocol::{ErrCode, RecordedFile, Reservation, ServiceEvent, TunerState};

use crate::state::RawPoll;

pub use snapshot::{SnapshotError, SnapshotService};

/// Operations consumed from the scheduling service.
pub trait ScheduleService {
    /// Enumerate all reservations.
    fn enum_reserve(&self) -> Result<Vec<Reservation>, ErrCode>;

    /// Enumerate all services with their current and future programs.
    fn enum_pg_all(&self) -> Result<Vec<ServiceEvent>, ErrCode>;

    /// Enumerate tuners and the reservations bound to each.
    fn enum_tuner_reserve(&self) -> Result<Vec<TunerState>, ErrCode>;

    /// Enumerate recorded files, oldest first.
    fn enum_rec_info_basic(&self) -> Result<Vec<RecordedFile>, ErrCode>;

    /// Replace a reservation (matched by reservation id).
    fn change_reservation(&self, reservation: &Reservation) -> ErrCode;

    /// Translate a recorder-local file path into a network path.
    fn get_recording_file_network_path(&self, local_path: &str) -> Result<String, ErrCode>;

    /// Everything one poll needs. Stops at the first failing enumeration.
    ///
    /// Services that can read their state atomically override this so the
    /// collections of one poll come from the same version.
    fn fetch_poll(&self, include_recorded: bool) -> Result<RawPoll, ErrCode> {
        let reservations = self.enum_reserve()?;
        let services = self.enum_pg_all()?;
        let tuners = self.enum_tuner_reserve()?;
        let recorded = if include_recorded {
            Some(self.enum_rec_info_basic()?)
        } else {
            None
        };

        Ok(RawPoll {
            reservations,
            services,
            tuners,
            recorded,
        })
    }
}

impl<S: ScheduleService + ?Sized> ScheduleService for &S {
    fn enum_reserve(&self) -> Result<Vec<Reservation>, ErrCode> {
        (**self).enum_reserve()
    }

    fn enum_pg_all(&self) -> Result<Vec<ServiceEvent>, ErrCode> {
        (**self).enum_pg_all()
    }

    fn enum_tuner_reserve(&self) -> Result<Vec<TunerState>, ErrCode> {
        (**self).enum_tuner_reserve()
    }

    fn enum_rec_info_basic(&self) -> Result<Vec<RecordedFile>, ErrCode> {
        (**self).enum_rec_info_basic()
    }

    fn change_reservation(&self, reservation: &Reservation) -> ErrCode {
        (**self).change_reservation(reservation)
    }

    fn get_recording_file_network_path(&self, local_path: &str) -> Result<String, ErrCode> {
        (**self).get_recording_file_network_path(local_path)
    }

    fn fetch_poll(&self, include_recorded: bool) -> Result<RawPoll, ErrCode> {
        (**self).fetch_poll(include_recorded)
    }
}
