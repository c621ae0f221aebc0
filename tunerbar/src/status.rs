//! Display-status classification for reservations and recordings.

use tunerbar_protocol::{Overlap, ProgramEvent, Reservation};

/// Reservation state shown next to a program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReserveStatus {
    /// No reservation.
    None,
    /// Reserved and recordable.
    Ok,
    /// Only part of the program can be recorded.
    Partial,
    /// Cannot be recorded (tuner unit shortage).
    Ng,
    /// Recording explicitly disabled.
    Disabled,
    /// Reserved, but the program no longer exists in the guide.
    Disappeared,
}

impl ReserveStatus {
    /// Short marker shown in the status column.
    pub fn label(self) -> &'static str {
        match self {
            ReserveStatus::None => "",
            ReserveStatus::Ok => "○",
            ReserveStatus::Partial => "△",
            ReserveStatus::Ng => "×",
            ReserveStatus::Disabled => "－",
            ReserveStatus::Disappeared => "？",
        }
    }
}

/// Whether the caller looked up the live program for a reservation.
#[derive(Debug, Clone, Copy)]
pub enum EventLookup<'a> {
    /// The caller did not ask whether the program still exists.
    NotChecked,
    /// The program is still in the guide.
    Found(&'a ProgramEvent),
    /// The program was looked up and is gone.
    Missing,
}

impl<'a> From<Option<&'a ProgramEvent>> for EventLookup<'a> {
    fn from(event: Option<&'a ProgramEvent>) -> Self {
        match event {
            Some(ev) => EventLookup::Found(ev),
            None => EventLookup::Missing,
        }
    }
}

/// Classify a reservation, in strict priority order.
pub fn classify_reservation(
    reservation: Option<&Reservation>,
    event: EventLookup<'_>,
) -> ReserveStatus {
    let Some(reservation) = reservation else {
        return ReserveStatus::None;
    };

    if reservation.is_recording_disabled() {
        return ReserveStatus::Disabled;
    }

    match reservation.overlap {
        Overlap::None => match event {
            EventLookup::Missing => ReserveStatus::Disappeared,
            EventLookup::NotChecked | EventLookup::Found(_) => ReserveStatus::Ok,
        },
        Overlap::Partial => ReserveStatus::Partial,
        Overlap::Unrecordable => ReserveStatus::Ng,
    }
}

/// Completion outcome of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecEndStatus {
    Normal,
    /// Start or end time changed while recording.
    ChgTime,
    /// Ended early for the next reservation.
    NextStartEnd,
    /// Recorded to a sub folder.
    EndSubrec,
    /// Error during recording.
    ErrEnd,
    /// Beginning of the program was not recorded.
    NotStartHead,
    /// Recording disabled.
    NoRecMode,
    Other,
}

impl RecEndStatus {
    /// Decode the raw end-status code reported by the recorder.
    pub fn from_code(code: u32) -> Self {
        match code {
            1 => RecEndStatus::Normal,
            3 => RecEndStatus::ErrEnd,
            4 => RecEndStatus::NextStartEnd,
            6 => RecEndStatus::ChgTime,
            8 => RecEndStatus::NoRecMode,
            11 => RecEndStatus::EndSubrec,
            13 => RecEndStatus::NotStartHead,
            _ => RecEndStatus::Other,
        }
    }

    /// Outcomes that count as a successful recording.
    pub fn is_clean(self) -> bool {
        matches!(
            self,
            RecEndStatus::Normal | RecEndStatus::ChgTime | RecEndStatus::NextStartEnd
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            RecEndStatus::Normal => "正常",
            RecEndStatus::ChgTime => "時間変更",
            RecEndStatus::NextStartEnd => "次予約",
            RecEndStatus::EndSubrec => "サブ",
            RecEndStatus::ErrEnd => "エラー",
            RecEndStatus::NotStartHead => "一部",
            RecEndStatus::NoRecMode => "無効",
            RecEndStatus::Other => "失敗",
        }
    }
}

/// Display tier of a recorded row. Colors are looked up by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayTier {
    Normal,
    Notice,
    Warning,
    Error,
    Disabled,
}

/// Classify a finished recording into its outcome and display tier.
pub fn classify_recording_outcome(
    code: u32,
    drop_count: i64,
    scramble_count: i64,
) -> (RecEndStatus, DisplayTier) {
    let outcome = RecEndStatus::from_code(code);

    let tier = if outcome.is_clean() {
        if scramble_count > 0 {
            DisplayTier::Warning
        } else if drop_count > 0 {
            DisplayTier::Error
        } else {
            DisplayTier::Normal
        }
    } else {
        match outcome {
            RecEndStatus::EndSubrec => DisplayTier::Notice,
            RecEndStatus::ErrEnd | RecEndStatus::NotStartHead => DisplayTier::Warning,
            RecEndStatus::NoRecMode => DisplayTier::Disabled,
            _ => DisplayTier::Error,
        }
    };

    (outcome, tier)
}
