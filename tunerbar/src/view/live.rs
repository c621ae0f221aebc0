//! Channel and tuner lists showing what is on air and recording now.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tunerbar_protocol::{Overlap, ServiceKey, TunerState};

use super::{time_range, ListRow, RowKey, RowStatus, Tab};
use crate::state::Snapshot;
use crate::status::{classify_reservation, EventLookup, ReserveStatus};

/// Channel rows of the channel tabs.
#[derive(Debug, Clone, Default)]
pub struct ChannelList {
    rows: Vec<ListRow>,
}

impl ChannelList {
    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<ListRow> {
        &mut self.rows
    }

    /// Lay out one row per lineup channel known to the snapshot and shown
    /// by `tab`. Channels missing from the guide are skipped.
    pub fn prepare(&mut self, lineup: &[ServiceKey], tab: Tab, snapshot: &Snapshot) {
        self.rows.clear();
        for key in lineup {
            let Some(service) = snapshot.service(key) else {
                continue;
            };
            if let Some(band) = tab.band() {
                if service.service_info.band() != band {
                    continue;
                }
            }
            if self.rows.iter().any(|r| r.key == Some(RowKey::Service(*key))) {
                continue;
            }
            self.rows.push(ListRow {
                key: Some(RowKey::Service(*key)),
                ..ListRow::skeleton(service.service_info.service_name.clone())
            });
        }
    }

    /// Fill every row with the program on air at `now`.
    pub fn refresh(&mut self, snapshot: &Snapshot, now: NaiveDateTime) {
        for row in &mut self.rows {
            let Some(RowKey::Service(key)) = row.key else {
                continue;
            };
            let Some(service) = snapshot.service(&key) else {
                continue;
            };

            let on_air = service.event_list.iter().find(|ev| ev.is_on_air(now));
            match on_air {
                Some(ev) => {
                    let status = classify_reservation(
                        snapshot.reservation(&ev.key()),
                        EventLookup::NotChecked,
                    );
                    row.columns[1] = time_range(ev.start_time, ev.end_time());
                    row.columns[2] = status.label().to_string();
                    row.columns[3] = ev.title().to_string();
                    row.tooltip = ev.title().to_string();
                    row.status = RowStatus::Reserve { status, active: true };
                }
                None => {
                    row.columns[1].clear();
                    row.columns[2].clear();
                    row.columns[3].clear();
                    row.tooltip.clear();
                    row.status = RowStatus::Blank;
                }
            }
        }
    }
}

/// Default display name for a BonDriver: `BonDriver_PT3-T.dll` → `PT3-T`.
pub fn default_tuner_name(bon_driver: &str) -> String {
    let name = bon_driver.rsplit(['/', '\\']).next().unwrap_or(bon_driver);
    let name = strip_prefix_ignore_case(name, "BonDriver_");
    let name = strip_suffix_ignore_case(name, ".dll");
    let name = strip_suffix_ignore_case(name, ".so");
    name.to_string()
}

fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
        _ => s,
    }
}

fn strip_suffix_ignore_case<'a>(s: &'a str, suffix: &str) -> &'a str {
    let Some(cut) = s.len().checked_sub(suffix.len()) else {
        return s;
    };
    match s.get(cut..) {
        Some(tail) if tail.eq_ignore_ascii_case(suffix) => &s[..cut],
        _ => s,
    }
}

/// Display name of a tuner: configured or default name plus its sequence.
pub fn tuner_display_name(tuner: &TunerState, names: &HashMap<String, String>) -> String {
    let mut name = names
        .get(&tuner.tuner_name)
        .cloned()
        .unwrap_or_else(|| default_tuner_name(&tuner.tuner_name));
    if let Some(seq) = tuner.sequence() {
        name.push_str(&seq.to_string());
    }
    name
}

/// Tuner rows, one per tuner.
#[derive(Debug, Clone, Default)]
pub struct TunerList {
    rows: Vec<ListRow>,
}

impl TunerList {
    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn prepare(&mut self, snapshot: &Snapshot, names: &HashMap<String, String>) {
        self.rows = snapshot
            .tuners()
            .iter()
            .map(|tuner| ListRow {
                key: Some(RowKey::Tuner(tuner.tuner_id)),
                ..ListRow::skeleton(tuner_display_name(tuner, names))
            })
            .collect();
    }

    /// Show the reservation recording now and the worst overlap among all
    /// reservations bound to each tuner.
    pub fn refresh(&mut self, snapshot: &Snapshot, now: NaiveDateTime) {
        for tuner in snapshot.tuners() {
            let Some(row) = self
                .rows
                .iter_mut()
                .find(|r| r.key == Some(RowKey::Tuner(tuner.tuner_id)))
            else {
                continue;
            };

            let bound: Vec<_> = snapshot.reservations_by_id(&tuner.reserve_list).collect();
            let current = bound
                .iter()
                .find(|r| r.start_time <= now && now <= r.end_time());

            let title = current.map(|r| r.title.clone()).unwrap_or_default();
            row.columns[1] = title.clone();
            row.tooltip = title;

            let warning = if bound.iter().any(|r| r.overlap == Overlap::Partial) {
                ReserveStatus::Partial
            } else if bound.iter().any(|r| r.overlap == Overlap::Unrecordable) {
                ReserveStatus::Ng
            } else {
                ReserveStatus::None
            };
            row.status = RowStatus::Tuner {
                warning,
                recording: current.is_some(),
            };
        }
    }
}
