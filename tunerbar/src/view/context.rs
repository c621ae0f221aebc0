//! Context entries and detail texts for list rows.

use chrono::NaiveDateTime;
use tunerbar_protocol::{EventKey, ProgramEvent, RecordedFile, Reservation, ServiceKey};

use super::{break_lines, full_time_range, short_time_range};
use crate::error::{AppError, Result};
use crate::state::Snapshot;
use crate::status::{classify_reservation, EventLookup, ReserveStatus};

/// Maximum number of entries listed for a channel or tuner.
pub const CONTEXT_ENTRY_LIMIT: usize = 30;

/// Characters per line of description text.
const TEXT_WIDTH: usize = 40;
/// Characters per line of a recorded file path.
const PATH_WIDTH: usize = 50;

/// Label of the recording toggle for a reservation.
pub fn toggle_label(reservation: &Reservation) -> &'static str {
    if reservation.is_recording_disabled() {
        "録画を有効にする"
    } else {
        "録画を無効にする"
    }
}

/// One program or reservation in a context list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub key: EventKey,
    pub label: String,
    pub status: ReserveStatus,
    /// Short and extended description, when the program is in the guide.
    pub sections: Vec<Vec<String>>,
}

/// Description sections of a program: short text, then extended text.
pub fn event_sections(event: &ProgramEvent) -> Vec<Vec<String>> {
    let short = event
        .short_info
        .as_ref()
        .map(|info| break_lines(&info.text, TEXT_WIDTH))
        .unwrap_or_default();
    let ext = event
        .ext_text
        .as_deref()
        .map(|text| break_lines(text, TEXT_WIDTH))
        .unwrap_or_default();
    vec![short, ext]
}

/// Upcoming programs of a channel (not yet ended, ascending by start).
pub fn channel_entries(
    snapshot: &Snapshot,
    key: ServiceKey,
    now: NaiveDateTime,
) -> Result<Vec<ContextEntry>> {
    let service = snapshot
        .service(&key)
        .ok_or_else(|| AppError::StaleKeyLookup(format!("channel {}", key)))?;

    let mut events: Vec<&ProgramEvent> = service
        .event_list
        .iter()
        .filter(|ev| ev.end_time() >= now)
        .collect();
    events.sort_by_key(|ev| ev.start_time);

    Ok(events
        .into_iter()
        .take(CONTEXT_ENTRY_LIMIT)
        .map(|ev| {
            let status = classify_reservation(
                snapshot.reservation(&ev.key()),
                EventLookup::Found(ev),
            );
            ContextEntry {
                key: ev.key(),
                label: format!(
                    "{}  {}  {}",
                    short_time_range(ev.start_time, ev.end_time()),
                    status.label(),
                    ev.title()
                ),
                status,
                sections: event_sections(ev),
            }
        })
        .collect())
}

/// Reservations bound to a tuner, ascending by start.
///
/// Reservations whose program has left the guide are marked disappeared.
pub fn tuner_entries(snapshot: &Snapshot, tuner_id: u32) -> Result<Vec<ContextEntry>> {
    let tuner = snapshot
        .tuner(tuner_id)
        .ok_or_else(|| AppError::StaleKeyLookup(format!("tuner {}", tuner_id)))?;

    let mut reservations: Vec<&Reservation> =
        snapshot.reservations_by_id(&tuner.reserve_list).collect();
    reservations.sort_by_key(|r| r.start_time);

    Ok(reservations
        .into_iter()
        .take(CONTEXT_ENTRY_LIMIT)
        .map(|r| {
            let event = snapshot.event(&r.key());
            let status = classify_reservation(Some(r), EventLookup::from(event));
            ContextEntry {
                key: r.key(),
                label: format!(
                    "{}  {}    {}    {}",
                    short_time_range(r.start_time, r.end_time()),
                    status.label(),
                    r.station_name,
                    r.title
                ),
                status,
                sections: event.map(event_sections).unwrap_or_default(),
            }
        })
        .collect())
}

/// Detail of a reserved program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationDetail {
    pub key: EventKey,
    pub time_range: String,
    /// Recording toggle label, present when the program is reserved.
    pub toggle: Option<&'static str>,
    /// Reservation comment, when not empty.
    pub comment: Option<String>,
    pub short_text: Vec<String>,
    pub ext_text: Vec<String>,
}

impl ReservationDetail {
    /// Lines in display order, sections separated by an empty line.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![self.time_range.clone(), String::new()];
        if let Some(comment) = &self.comment {
            lines.push(comment.clone());
            lines.push(String::new());
        }
        lines.extend(self.short_text.iter().cloned());
        lines.push(String::new());
        lines.extend(self.ext_text.iter().cloned());
        lines
    }
}

/// Detail of the program behind a reservation row.
pub fn reservation_detail(snapshot: &Snapshot, key: EventKey) -> Result<ReservationDetail> {
    let event = snapshot
        .event(&key)
        .ok_or_else(|| AppError::StaleKeyLookup(format!("program {}", key)))?;
    let reservation = snapshot.reservation(&key);

    let mut sections = event_sections(event).into_iter();
    Ok(ReservationDetail {
        key,
        time_range: full_time_range(event.start_time, event.end_time()),
        toggle: reservation.map(toggle_label),
        comment: reservation
            .map(|r| r.comment.clone())
            .filter(|c| !c.is_empty()),
        short_text: sections.next().unwrap_or_default(),
        ext_text: sections.next().unwrap_or_default(),
    })
}

/// Detail sections of a recorded file: time, names, result, ids, errors.
pub fn recorded_sections(file: &RecordedFile) -> Vec<Vec<String>> {
    let mut result = vec![format!("結果 : {}", file.comment)];
    result.extend(break_lines(&format!("録画ファイル : {}", file.rec_file_path), PATH_WIDTH));

    vec![
        vec![full_time_range(file.start_time, file.end_time())],
        vec![file.service_name.clone(), file.title.clone()],
        result,
        vec![
            format!("OriginalNetworkID : {} (0x{:04X})", file.onid, file.onid),
            format!("TransportStreamID : {} (0x{:04X})", file.tsid, file.tsid),
            format!("ServiceID : {} (0x{:04X})", file.sid, file.sid),
            format!("EventID : {} (0x{:04X})", file.event_id, file.event_id),
        ],
        vec![
            format!("Drop : {}", file.drops),
            format!("Scramble : {}", file.scrambles),
        ],
    ]
}

/// Tooltip of a recorded row: the detail sections separated by blank lines.
pub fn recorded_tooltip(file: &RecordedFile) -> String {
    recorded_sections(file)
        .iter()
        .map(|section| section.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Detail sections of the recorded file behind a row.
pub fn recorded_detail(snapshot: &Snapshot, id: u32) -> Result<Vec<Vec<String>>> {
    snapshot
        .recorded(id)
        .map(recorded_sections)
        .ok_or_else(|| AppError::StaleKeyLookup(format!("recorded file {}", id)))
}
