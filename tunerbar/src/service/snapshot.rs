//! File-backed scheduling service.
//!
//! Reads a JSON document describing the recorder state on every call, so an
//! external exporter can refresh it between polls. Reservation changes are
//! written back to the same document.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tunerbar_protocol::{ErrCode, RecordedFile, Reservation, ServiceEvent, TunerState};

use super::ScheduleService;
use crate::state::RawPoll;

/// Snapshot document errors.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid snapshot document {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// On-disk layout of the recorder state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotDocument {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    #[serde(default)]
    pub services: Vec<ServiceEvent>,
    #[serde(default)]
    pub tuners: Vec<TunerState>,
    #[serde(default)]
    pub recorded: Vec<RecordedFile>,
    /// Recorder-local path to network path.
    #[serde(default)]
    pub network_paths: HashMap<String, String>,
}

/// Scheduling service backed by a JSON snapshot file.
#[derive(Debug, Clone)]
pub struct SnapshotService {
    path: PathBuf,
}

impl SnapshotService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the snapshot document.
    pub fn load(&self) -> Result<SnapshotDocument, SnapshotError> {
        let contents = fs::read_to_string(&self.path).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SnapshotError::Json {
            path: self.path.clone(),
            source,
        })
    }

    /// Write the snapshot document back.
    pub fn store(&self, document: &SnapshotDocument) -> Result<(), SnapshotError> {
        let contents = serde_json::to_string_pretty(document).map_err(|source| SnapshotError::Json {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, contents).map_err(|source| SnapshotError::Io {
            path: self.path.clone(),
            source,
        })
    }

    fn read(&self) -> Result<SnapshotDocument, ErrCode> {
        self.load().map_err(|e| {
            warn!("SnapshotService: {}", e);
            ErrCode::Connect
        })
    }
}

impl ScheduleService for SnapshotService {
    fn enum_reserve(&self) -> Result<Vec<Reservation>, ErrCode> {
        Ok(self.read()?.reservations)
    }

    fn enum_pg_all(&self) -> Result<Vec<ServiceEvent>, ErrCode> {
        Ok(self.read()?.services)
    }

    fn enum_tuner_reserve(&self) -> Result<Vec<TunerState>, ErrCode> {
        Ok(self.read()?.tuners)
    }

    fn enum_rec_info_basic(&self) -> Result<Vec<RecordedFile>, ErrCode> {
        Ok(self.read()?.recorded)
    }

    fn fetch_poll(&self, include_recorded: bool) -> Result<RawPoll, ErrCode> {
        let document = self.read()?;
        Ok(RawPoll {
            reservations: document.reservations,
            services: document.services,
            tuners: document.tuners,
            recorded: include_recorded.then_some(document.recorded),
        })
    }

    fn change_reservation(&self, reservation: &Reservation) -> ErrCode {
        let mut document = match self.read() {
            Ok(d) => d,
            Err(code) => return code,
        };

        let Some(slot) = document
            .reservations
            .iter_mut()
            .find(|r| r.reserve_id == reservation.reserve_id)
        else {
            debug!("SnapshotService: reservation {} not found", reservation.reserve_id);
            return ErrCode::InvalidArg;
        };
        *slot = reservation.clone();

        match self.store(&document) {
            Ok(()) => ErrCode::Success,
            Err(e) => {
                warn!("SnapshotService: {}", e);
                ErrCode::Err
            }
        }
    }

    fn get_recording_file_network_path(&self, local_path: &str) -> Result<String, ErrCode> {
        self.read()?
            .network_paths
            .remove(local_path)
            .filter(|p| !p.is_empty())
            .ok_or(ErrCode::NoRes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, recorded, reservation, tuner};

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tunerbar-{}-{}.json", name, std::process::id()))
    }

    #[test]
    fn test_missing_file_is_connect_error() {
        let service = SnapshotService::new(temp_path("missing"));
        assert_eq!(service.enum_reserve(), Err(ErrCode::Connect));
        assert_eq!(service.enum_tuner_reserve(), Err(ErrCode::Connect));
    }

    #[test]
    fn test_invalid_json_is_connect_error() {
        let path = temp_path("invalid");
        fs::write(&path, "{ not json").unwrap();
        let service = SnapshotService::new(&path);
        assert_eq!(service.enum_pg_all(), Err(ErrCode::Connect));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_change_reservation_writes_back() {
        let path = temp_path("change");
        let service = SnapshotService::new(&path);
        let document = SnapshotDocument {
            reservations: vec![reservation(1, 100, at(10, 0), 1800)],
            network_paths: HashMap::from([(
                "D:\\rec\\a.ts".to_string(),
                "\\\\server\\rec\\a.ts".to_string(),
            )]),
            ..Default::default()
        };
        service.store(&document).unwrap();

        let mut changed = document.reservations[0].clone();
        changed.rec_mode = changed.disabled_rec_mode();
        assert_eq!(service.change_reservation(&changed), ErrCode::Success);

        let reloaded = service.enum_reserve().unwrap();
        assert!(reloaded[0].is_recording_disabled());

        let mut unknown = changed.clone();
        unknown.reserve_id = 99;
        assert_eq!(service.change_reservation(&unknown), ErrCode::InvalidArg);

        assert_eq!(
            service.get_recording_file_network_path("D:\\rec\\a.ts").as_deref(),
            Ok("\\\\server\\rec\\a.ts")
        );
        assert_eq!(service.get_recording_file_network_path("D:\\rec\\b.ts"), Err(ErrCode::NoRes));

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_fetch_poll_reads_one_document() {
        let path = temp_path("poll");
        let service = SnapshotService::new(&path);
        service
            .store(&SnapshotDocument {
                reservations: vec![reservation(1, 100, at(10, 0), 1800)],
                tuners: vec![tuner(1, "BonDriver_PT3-T.dll", vec![1])],
                recorded: vec![recorded(7, at(8, 0), 1)],
                ..Default::default()
            })
            .unwrap();

        let raw = service.fetch_poll(false).unwrap();
        assert_eq!(raw.reservations.len(), 1);
        assert_eq!(raw.tuners[0].reserve_list, vec![1]);
        assert!(raw.recorded.is_none());

        let raw = service.fetch_poll(true).unwrap();
        assert_eq!(raw.recorded.map(|files| files.len()), Some(1));

        let _ = fs::remove_file(&path);
        assert_eq!(service.fetch_poll(false).err(), Some(ErrCode::Connect));
    }
}
