//! Rendered list rows and the views that produce them.
//!
//! Every list shares one row shape: four text columns (label, time range,
//! status marker, title), a tooltip, a display status for the renderer's
//! color lookup, and the identity key of the entity the row shows.

pub mod context;
pub mod filter;
pub mod grouped;
pub mod live;

use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use tunerbar_protocol::{BandType, EventKey, ServiceKey};

use crate::status::{DisplayTier, RecEndStatus, ReserveStatus};

pub use filter::{FilterOutcome, FilterView};
pub use grouped::{GroupedItem, GroupedList, SyncOutcome};
pub use live::{ChannelList, TunerList};

/// Number of text columns in a row.
pub const COLUMNS: usize = 4;

/// Caption of the time column in header rows.
pub const TIME_CAPTION: &str = "時間";
/// Caption of the title column in header rows.
pub const TITLE_CAPTION: &str = "番組名";

/// Identity of the entity a row shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowKey {
    Service(ServiceKey),
    Event(EventKey),
    Recorded(u32),
    Tuner(u32),
}

/// Display status of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Row without status (skeleton, or a channel with nothing on air).
    Blank,
    /// Date header.
    Header,
    /// Program or reservation with its reservation state.
    Reserve { status: ReserveStatus, active: bool },
    /// Finished recording.
    Recorded { outcome: RecEndStatus, tier: DisplayTier },
    /// Tuner with its worst bound reservation state.
    Tuner { warning: ReserveStatus, recording: bool },
}

/// One rendered list row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRow {
    pub key: Option<RowKey>,
    pub columns: [String; COLUMNS],
    pub tooltip: String,
    pub status: RowStatus,
}

impl ListRow {
    /// Row carrying only a label.
    pub fn skeleton(label: impl Into<String>) -> Self {
        Self {
            key: None,
            columns: [label.into(), String::new(), String::new(), String::new()],
            tooltip: String::new(),
            status: RowStatus::Blank,
        }
    }

    /// Skeleton of a date header.
    pub fn header_skeleton(date: NaiveDate) -> Self {
        Self {
            status: RowStatus::Header,
            ..Self::skeleton(date_label(date))
        }
    }

    /// Fully rendered date header.
    pub fn header(date: NaiveDate) -> Self {
        Self {
            key: None,
            columns: [
                date_label(date),
                TIME_CAPTION.to_string(),
                String::new(),
                TITLE_CAPTION.to_string(),
            ],
            tooltip: String::new(),
            status: RowStatus::Header,
        }
    }

    pub fn is_header(&self) -> bool {
        self.status == RowStatus::Header
    }

    /// Primary label (channel, station or tuner name).
    pub fn label(&self) -> &str {
        &self.columns[0]
    }

    /// Free text (program title).
    pub fn text(&self) -> &str {
        &self.columns[3]
    }

    /// Tab-separated columns, as written by print mode.
    pub fn to_line(&self) -> String {
        self.columns.join("\t")
    }
}

/// Tab of the main list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
pub enum Tab {
    #[default]
    Favorites,
    All,
    Terrestrial,
    Bs,
    Cs,
    Reservations,
    Recorded,
}

impl Tab {
    /// Band shown by a channel tab, if the tab is restricted to one.
    pub fn band(self) -> Option<BandType> {
        match self {
            Tab::Terrestrial => Some(BandType::Terrestrial),
            Tab::Bs => Some(BandType::BS),
            Tab::Cs => Some(BandType::CS),
            _ => None,
        }
    }

    /// True for tabs listing channels rather than grouped items.
    pub fn is_channel_tab(self) -> bool {
        !matches!(self, Tab::Reservations | Tab::Recorded)
    }

    pub fn title(self) -> &'static str {
        match self {
            Tab::Favorites => "お気に入り",
            Tab::All => "全て",
            Tab::Terrestrial => "地デジ",
            Tab::Bs => "BS",
            Tab::Cs => "CS",
            Tab::Reservations => "予約",
            Tab::Recorded => "録画済",
        }
    }
}

fn weekday_ja(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "月",
        Weekday::Tue => "火",
        Weekday::Wed => "水",
        Weekday::Thu => "木",
        Weekday::Fri => "金",
        Weekday::Sat => "土",
        Weekday::Sun => "日",
    }
}

/// `2024/04/01(月)`
pub fn date_label(date: NaiveDate) -> String {
    format!("{}({})", date.format("%Y/%m/%d"), weekday_ja(date.weekday()))
}

/// `10:00-10:30`
pub fn time_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!("{}-{}", start.format("%H:%M"), end.format("%H:%M"))
}

/// `2024/04/01(月) 10:00-10:30`
pub fn full_time_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!(
        "{} {}-{}",
        date_label(start.date()),
        start.format("%H:%M"),
        end.format("%H:%M")
    )
}

/// `04/01 10:00～10:30`
pub fn short_time_range(start: NaiveDateTime, end: NaiveDateTime) -> String {
    format!("{}～{}", start.format("%m/%d %H:%M"), end.format("%H:%M"))
}

/// Split text into display lines of at most `width` characters.
pub fn break_lines(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    for line in text.lines() {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() || width == 0 {
            lines.push(line.to_string());
            continue;
        }
        for chunk in chars.chunks(width) {
            lines.push(chunk.iter().collect());
        }
    }
    lines
}
