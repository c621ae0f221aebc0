//! Record types enumerated by the scheduling service.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Tuner id reported for tuners that do not carry a sequence number.
pub const UNNUMBERED_TUNER_ID: u32 = 0xFFFF_FFFF;

/// Band a channel is broadcast on, as far as auto-open and the band tabs
/// care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BandType {
    Terrestrial,
    BS,
    /// 110度CS
    CS,
    /// Anything else (4K, cable, 124/128度CS)
    Other,
}

impl BandType {
    /// Classify by original network id. Terrestrial ids span 0x7800-0x7FFF.
    pub fn from_nid(nid: u16) -> Self {
        match nid {
            0x0004 => BandType::BS,
            0x0006 | 0x0007 => BandType::CS,
            0x7800..=0x7FFF => BandType::Terrestrial,
            _ => BandType::Other,
        }
    }
}

/// Key identifying a broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    /// Transport Stream ID
    pub tsid: u16,
    /// Service ID
    pub sid: u16,
}

impl ServiceKey {
    pub fn new(tsid: u16, sid: u16) -> Self {
        Self { tsid, sid }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.tsid, self.sid)
    }
}

/// Key identifying one scheduled program instance on a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventKey {
    pub service: ServiceKey,
    pub event_id: u16,
}

impl EventKey {
    pub fn new(tsid: u16, sid: u16, event_id: u16) -> Self {
        Self {
            service: ServiceKey::new(tsid, sid),
            event_id,
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.service, self.event_id)
    }
}

/// Channel metadata from the program guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    /// Original network ID
    pub onid: u16,
    pub tsid: u16,
    pub sid: u16,
    pub service_name: String,
    #[serde(default)]
    pub network_name: String,
}

impl ServiceInfo {
    pub fn key(&self) -> ServiceKey {
        ServiceKey::new(self.tsid, self.sid)
    }

    pub fn band(&self) -> BandType {
        BandType::from_nid(self.onid)
    }
}

/// Event name and description text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortInfo {
    pub event_name: String,
    #[serde(default)]
    pub text: String,
}

/// One broadcast in the program guide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramEvent {
    pub onid: u16,
    pub tsid: u16,
    pub sid: u16,
    pub event_id: u16,
    pub start_time: NaiveDateTime,
    pub duration_sec: u32,
    #[serde(default)]
    pub short_info: Option<ShortInfo>,
    /// Extended description text.
    #[serde(default)]
    pub ext_text: Option<String>,
}

impl ProgramEvent {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.tsid, self.sid, self.event_id)
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.start_time + Duration::seconds(i64::from(self.duration_sec))
    }

    /// Event name, empty when the guide carries no short info.
    pub fn title(&self) -> &str {
        self.short_info
            .as_ref()
            .map(|info| info.event_name.as_str())
            .unwrap_or("")
    }

    /// Returns true if the program is airing at `now` (both ends inclusive).
    pub fn is_on_air(&self, now: NaiveDateTime) -> bool {
        self.start_time <= now && now <= self.end_time()
    }
}

/// A channel with its current and future broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEvent {
    pub service_info: ServiceInfo,
    #[serde(default)]
    pub event_list: Vec<ProgramEvent>,
}

/// Upstream classification of a reservation against tuner capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum Overlap {
    /// No conflict.
    None,
    /// Only part of the program can be recorded.
    Partial,
    /// Tuner unit shortage; the program cannot be recorded.
    Unrecordable,
}

impl From<u8> for Overlap {
    fn from(value: u8) -> Self {
        match value {
            0 => Overlap::None,
            1 => Overlap::Partial,
            _ => Overlap::Unrecordable,
        }
    }
}

impl From<Overlap> for u8 {
    fn from(value: Overlap) -> Self {
        match value {
            Overlap::None => 0,
            Overlap::Partial => 1,
            Overlap::Unrecordable => 2,
        }
    }
}

/// Recording modes 5..=9 keep the previous mode while recording is disabled.
pub const REC_MODE_DISABLED_BASE: u8 = 5;

/// A recording reservation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub reserve_id: u32,
    pub onid: u16,
    pub tsid: u16,
    pub sid: u16,
    pub event_id: u16,
    pub start_time: NaiveDateTime,
    pub duration_sec: u32,
    pub station_name: String,
    pub title: String,
    #[serde(default)]
    pub comment: String,
    /// Raw recording mode (EDCB encoding).
    pub rec_mode: u8,
    pub overlap: Overlap,
}

impl Reservation {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.tsid, self.sid, self.event_id)
    }

    pub fn service_key(&self) -> ServiceKey {
        ServiceKey::new(self.tsid, self.sid)
    }

    pub fn band(&self) -> BandType {
        BandType::from_nid(self.onid)
    }

    pub fn end_time(&self) -> NaiveDateTime {
        self.start_time + Duration::seconds(i64::from(self.duration_sec))
    }

    /// Returns true if recording has been explicitly disabled.
    pub fn is_recording_disabled(&self) -> bool {
        self.rec_mode / REC_MODE_DISABLED_BASE % 2 != 0
    }

    /// The recording mode this reservation records with once enabled.
    pub fn effective_rec_mode(&self) -> u8 {
        let mode = u16::from(self.rec_mode);
        let base = u16::from(REC_MODE_DISABLED_BASE);
        ((mode + mode / base % 2) % base) as u8
    }

    /// The disabled encoding that remembers the current mode.
    pub fn disabled_rec_mode(&self) -> u8 {
        let base = u16::from(REC_MODE_DISABLED_BASE);
        REC_MODE_DISABLED_BASE + ((u16::from(self.rec_mode) + 4) % base) as u8
    }
}

/// A finished recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedFile {
    pub id: u32,
    pub onid: u16,
    pub tsid: u16,
    pub sid: u16,
    pub event_id: u16,
    pub start_time: NaiveDateTime,
    pub duration_sec: u32,
    pub service_name: String,
    pub title: String,
    /// Result text reported by the recorder.
    #[serde(default)]
    pub comment: String,
    /// Raw end-status code.
    pub rec_status: u32,
    pub drops: i64,
    pub scrambles: i64,
    pub rec_file_path: String,
}

impl RecordedFile {
    pub fn end_time(&self) -> NaiveDateTime {
        self.start_time + Duration::seconds(i64::from(self.duration_sec))
    }
}

/// Reservations bound to one tuner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunerState {
    pub tuner_id: u32,
    /// BonDriver file name.
    pub tuner_name: String,
    #[serde(default)]
    pub reserve_list: Vec<u32>,
}

impl TunerState {
    /// Sequence number shown next to the tuner name, if any.
    pub fn sequence(&self) -> Option<u32> {
        (self.tuner_id != UNNUMBERED_TUNER_ID).then_some(self.tuner_id & 0xFFFF)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 4, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn reservation(rec_mode: u8) -> Reservation {
        Reservation {
            reserve_id: 1,
            onid: 0x7FE8,
            tsid: 32736,
            sid: 1024,
            event_id: 100,
            start_time: at(10, 0),
            duration_sec: 1800,
            station_name: "NHK総合1・東京".to_string(),
            title: "ニュース".to_string(),
            comment: String::new(),
            rec_mode,
            overlap: Overlap::None,
        }
    }

    #[test]
    fn test_band_classification() {
        assert_eq!(BandType::from_nid(0x7FE8), BandType::Terrestrial);
        assert_eq!(BandType::from_nid(0x7880), BandType::Terrestrial);
        assert_eq!(BandType::from_nid(4), BandType::BS);
        assert_eq!(BandType::from_nid(6), BandType::CS);
        assert_eq!(BandType::from_nid(7), BandType::CS);
        assert_eq!(BandType::from_nid(0x000B), BandType::Other);
        assert_eq!(BandType::from_nid(0x1234), BandType::Other);
    }

    #[test]
    fn test_keys_in_hashmap() {
        let mut map = HashMap::new();
        map.insert(EventKey::new(32736, 1024, 100), 1);
        assert_eq!(map.get(&EventKey::new(32736, 1024, 100)), Some(&1));
        assert_eq!(map.get(&EventKey::new(32736, 1024, 101)), None);
        assert_eq!(EventKey::new(1, 2, 3).to_string(), "1-2-3");
    }

    #[test]
    fn test_rec_mode_disable_roundtrip() {
        for mode in 0..5u8 {
            let enabled = reservation(mode);
            assert!(!enabled.is_recording_disabled());

            let disabled = reservation(enabled.disabled_rec_mode());
            assert!(disabled.is_recording_disabled());
            assert_eq!(disabled.effective_rec_mode(), mode);
        }
    }

    #[test]
    fn test_overlap_from_raw() {
        assert_eq!(Overlap::from(0), Overlap::None);
        assert_eq!(Overlap::from(1), Overlap::Partial);
        assert_eq!(Overlap::from(2), Overlap::Unrecordable);
        assert_eq!(Overlap::from(9), Overlap::Unrecordable);
        assert_eq!(u8::from(Overlap::Partial), 1);
    }

    #[test]
    fn test_reservation_deserialize() {
        let json = r#"{
            "reserve_id": 7, "onid": 4, "tsid": 16625, "sid": 211, "event_id": 5,
            "start_time": "2024-04-01T21:00:00", "duration_sec": 3600,
            "station_name": "BS11", "title": "アニメ", "rec_mode": 1, "overlap": 1
        }"#;
        let r: Reservation = serde_json::from_str(json).unwrap();
        assert_eq!(r.overlap, Overlap::Partial);
        assert_eq!(r.band(), BandType::BS);
        assert_eq!(r.end_time(), NaiveDate::from_ymd_opt(2024, 4, 1).unwrap().and_hms_opt(22, 0, 0).unwrap());
        assert!(r.comment.is_empty());
    }

    #[test]
    fn test_event_on_air_is_inclusive() {
        let ev = ProgramEvent {
            onid: 0x7FE8,
            tsid: 32736,
            sid: 1024,
            event_id: 1,
            start_time: at(10, 0),
            duration_sec: 1800,
            short_info: None,
            ext_text: None,
        };
        assert!(ev.is_on_air(at(10, 0)));
        assert!(ev.is_on_air(at(10, 30)));
        assert!(!ev.is_on_air(at(10, 31)));
        assert_eq!(ev.title(), "");
    }

    #[test]
    fn test_tuner_sequence() {
        let numbered = TunerState { tuner_id: 0x0001_0002, tuner_name: "BonDriver_PT3-T.dll".into(), reserve_list: vec![] };
        let unnumbered = TunerState { tuner_id: UNNUMBERED_TUNER_ID, tuner_name: "".into(), reserve_list: vec![] };
        assert_eq!(numbered.sequence(), Some(2));
        assert_eq!(unnumbered.sequence(), None);
    }
}
