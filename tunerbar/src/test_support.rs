//! Fixtures and fake collaborators shared by the unit tests.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};
use std::io;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use tunerbar_protocol::{
    ErrCode, Overlap, ProgramEvent, RecordedFile, Reservation, ServiceEvent, ServiceInfo,
    ShortInfo, TunerState,
};

use crate::clock::Clock;
use crate::service::ScheduleService;
use crate::viewer::{LaunchError, LaunchRequest, ViewerHandle, ViewerLauncher};

/// (onid, tsid, sid) of NHK総合 Tokyo.
pub const TERRESTRIAL: (u16, u16, u16) = (0x7FE0, 32736, 1024);
/// (onid, tsid, sid) of BS11.
pub const BS: (u16, u16, u16) = (4, 16625, 211);
/// (onid, tsid, sid) of a 110度CS channel.
pub const CS: (u16, u16, u16) = (6, 24608, 333);

pub fn on_day(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

/// 2024-04-01 at h:m:00.
pub fn at(h: u32, m: u32) -> NaiveDateTime {
    on_day(1, h, m)
}

pub fn at_hms(h: u32, m: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 4, 1)
        .unwrap()
        .and_hms_opt(h, m, s)
        .unwrap()
}

/// Terrestrial reservation with recording enabled and no overlap.
pub fn reservation(reserve_id: u32, event_id: u16, start: NaiveDateTime, duration_sec: u32) -> Reservation {
    reservation_on(TERRESTRIAL, reserve_id, event_id, start, duration_sec)
}

pub fn reservation_on(
    channel: (u16, u16, u16),
    reserve_id: u32,
    event_id: u16,
    start: NaiveDateTime,
    duration_sec: u32,
) -> Reservation {
    Reservation {
        reserve_id,
        onid: channel.0,
        tsid: channel.1,
        sid: channel.2,
        event_id,
        start_time: start,
        duration_sec,
        station_name: format!("station {}", channel.2),
        title: format!("program {}", event_id),
        comment: String::new(),
        rec_mode: 1,
        overlap: Overlap::None,
    }
}

pub fn program(
    channel: (u16, u16, u16),
    event_id: u16,
    start: NaiveDateTime,
    duration_sec: u32,
    title: &str,
) -> ProgramEvent {
    ProgramEvent {
        onid: channel.0,
        tsid: channel.1,
        sid: channel.2,
        event_id,
        start_time: start,
        duration_sec,
        short_info: Some(ShortInfo {
            event_name: title.to_string(),
            text: format!("{} summary", title),
        }),
        ext_text: None,
    }
}

pub fn service_event(channel: (u16, u16, u16), name: &str, events: Vec<ProgramEvent>) -> ServiceEvent {
    ServiceEvent {
        service_info: ServiceInfo {
            onid: channel.0,
            tsid: channel.1,
            sid: channel.2,
            service_name: name.to_string(),
            network_name: String::new(),
        },
        event_list: events,
    }
}

pub fn recorded(id: u32, start: NaiveDateTime, rec_status: u32) -> RecordedFile {
    RecordedFile {
        id,
        onid: TERRESTRIAL.0,
        tsid: TERRESTRIAL.1,
        sid: TERRESTRIAL.2,
        event_id: id as u16,
        start_time: start,
        duration_sec: 1800,
        service_name: "NHK総合1・東京".to_string(),
        title: format!("recorded {}", id),
        comment: String::new(),
        rec_status,
        drops: 0,
        scrambles: 0,
        rec_file_path: format!("D:\\rec\\{}.ts", id),
    }
}

pub fn tuner(tuner_id: u32, name: &str, reserve_list: Vec<u32>) -> TunerState {
    TunerState {
        tuner_id,
        tuner_name: name.to_string(),
        reserve_list,
    }
}

/// Clock returning a settable time.
#[derive(Debug)]
pub struct ManualClock(pub Cell<NaiveDateTime>);

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self(Cell::new(now))
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.0.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        self.0.get()
    }
}

/// In-memory scheduling service.
#[derive(Debug, Default)]
pub struct FakeService {
    reservations: RefCell<Vec<Reservation>>,
    services: RefCell<Vec<ServiceEvent>>,
    tuners: RefCell<Vec<TunerState>>,
    recorded: RefCell<Vec<RecordedFile>>,
    network_paths: RefCell<HashMap<String, String>>,
    failure: Cell<Option<ErrCode>>,
    change_result: Cell<Option<ErrCode>>,
    changes: RefCell<Vec<Reservation>>,
    calls: Cell<usize>,
}

impl FakeService {
    pub fn set_reservations(&self, reservations: Vec<Reservation>) {
        *self.reservations.borrow_mut() = reservations;
    }

    pub fn set_services(&self, services: Vec<ServiceEvent>) {
        *self.services.borrow_mut() = services;
    }

    pub fn set_tuners(&self, tuners: Vec<TunerState>) {
        *self.tuners.borrow_mut() = tuners;
    }

    pub fn set_recorded(&self, recorded: Vec<RecordedFile>) {
        *self.recorded.borrow_mut() = recorded;
    }

    pub fn set_network_path(&self, local: &str, network: &str) {
        self.network_paths
            .borrow_mut()
            .insert(local.to_string(), network.to_string());
    }

    /// Make every enumeration fail with `code`.
    pub fn fail_with(&self, code: ErrCode) {
        self.failure.set(Some(code));
    }

    pub fn set_change_result(&self, code: ErrCode) {
        self.change_result.set(Some(code));
    }

    /// Reservations passed to `change_reservation`.
    pub fn changes(&self) -> Vec<Reservation> {
        self.changes.borrow().clone()
    }

    /// Number of service calls made.
    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    fn enumerate<T: Clone>(&self, items: &RefCell<Vec<T>>) -> Result<Vec<T>, ErrCode> {
        self.calls.set(self.calls.get() + 1);
        match self.failure.get() {
            Some(code) => Err(code),
            None => Ok(items.borrow().clone()),
        }
    }
}

impl ScheduleService for FakeService {
    fn enum_reserve(&self) -> Result<Vec<Reservation>, ErrCode> {
        self.enumerate(&self.reservations)
    }

    fn enum_pg_all(&self) -> Result<Vec<ServiceEvent>, ErrCode> {
        self.enumerate(&self.services)
    }

    fn enum_tuner_reserve(&self) -> Result<Vec<TunerState>, ErrCode> {
        self.enumerate(&self.tuners)
    }

    fn enum_rec_info_basic(&self) -> Result<Vec<RecordedFile>, ErrCode> {
        self.enumerate(&self.recorded)
    }

    fn change_reservation(&self, reservation: &Reservation) -> ErrCode {
        self.calls.set(self.calls.get() + 1);
        self.changes.borrow_mut().push(reservation.clone());
        self.change_result.get().unwrap_or(ErrCode::Success)
    }

    fn get_recording_file_network_path(&self, local_path: &str) -> Result<String, ErrCode> {
        self.calls.set(self.calls.get() + 1);
        self.network_paths
            .borrow()
            .get(local_path)
            .cloned()
            .ok_or(ErrCode::NoRes)
    }
}

#[derive(Debug, Default)]
struct LauncherLog {
    launches: Vec<LaunchRequest>,
    close_requests: usize,
    exited: HashSet<usize>,
    liveness_unknown: HashSet<usize>,
    fail_launch: bool,
    fail_close: bool,
    exit_on_close: bool,
}

/// Launcher recording requests instead of spawning processes.
#[derive(Debug, Clone, Default)]
pub struct FakeLauncher {
    log: Rc<RefCell<LauncherLog>>,
}

impl FakeLauncher {
    /// Successful launches, in order.
    pub fn launches(&self) -> Vec<LaunchRequest> {
        self.log.borrow().launches.clone()
    }

    /// Close requests received, failed ones included.
    pub fn close_requests(&self) -> usize {
        self.log.borrow().close_requests
    }

    pub fn set_fail_launch(&self, fail: bool) {
        self.log.borrow_mut().fail_launch = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.log.borrow_mut().fail_close = fail;
    }

    pub fn set_exit_on_close(&self, exit: bool) {
        self.log.borrow_mut().exit_on_close = exit;
    }

    /// Mark the `index`-th launched viewer as exited.
    pub fn exit(&self, index: usize) {
        self.log.borrow_mut().exited.insert(index);
    }

    pub fn set_liveness_unknown(&self, index: usize) {
        self.log.borrow_mut().liveness_unknown.insert(index);
    }
}

impl ViewerLauncher for FakeLauncher {
    fn launch(&self, request: &LaunchRequest) -> Result<Box<dyn ViewerHandle>, LaunchError> {
        let mut log = self.log.borrow_mut();
        if log.fail_launch {
            return Err(LaunchError::Spawn {
                program: "viewer".into(),
                source: io::Error::new(io::ErrorKind::NotFound, "not found"),
            });
        }
        log.launches.push(request.clone());
        Ok(Box::new(FakeHandle {
            index: log.launches.len() - 1,
            log: Rc::clone(&self.log),
        }))
    }
}

struct FakeHandle {
    index: usize,
    log: Rc<RefCell<LauncherLog>>,
}

impl ViewerHandle for FakeHandle {
    fn id(&self) -> Option<u32> {
        Some(1000 + self.index as u32)
    }

    fn has_exited(&mut self) -> io::Result<bool> {
        let log = self.log.borrow();
        if log.liveness_unknown.contains(&self.index) {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        Ok(log.exited.contains(&self.index))
    }

    fn request_close(&mut self) -> io::Result<()> {
        let mut log = self.log.borrow_mut();
        log.close_requests += 1;
        if log.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "no main window"));
        }
        if log.exit_on_close {
            log.exited.insert(self.index);
        }
        Ok(())
    }
}
