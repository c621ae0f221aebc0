//! Date-grouped lists (reservations, recorded files).
//!
//! Rows are synchronized in place: a rebuild only happens when the list has
//! fewer rows than needed, otherwise existing rows are overwritten in order
//! and the surplus is truncated. Every field of every row is written by the
//! walk, so a rebuilt list and a walked list end up identical.

use chrono::{NaiveDate, NaiveDateTime};
use tunerbar_protocol::{RecordedFile, Reservation};

use super::context::recorded_tooltip;
use super::{full_time_range, time_range, ListRow, RowKey, RowStatus};
use crate::state::Snapshot;
use crate::status::{classify_recording_outcome, classify_reservation, EventLookup};

/// An item shown in a grouped list.
pub trait GroupedItem {
    fn start_time(&self) -> NaiveDateTime;

    /// Label written into the row before it is rendered.
    fn skeleton_label(&self) -> &str;

    /// Fully rendered row.
    fn render(&self, now: NaiveDateTime) -> ListRow;
}

impl<T: GroupedItem + ?Sized> GroupedItem for &T {
    fn start_time(&self) -> NaiveDateTime {
        (**self).start_time()
    }

    fn skeleton_label(&self) -> &str {
        (**self).skeleton_label()
    }

    fn render(&self, now: NaiveDateTime) -> ListRow {
        (**self).render(now)
    }
}

impl GroupedItem for Reservation {
    fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    fn skeleton_label(&self) -> &str {
        &self.station_name
    }

    fn render(&self, now: NaiveDateTime) -> ListRow {
        let end = self.end_time();
        let status = classify_reservation(Some(self), EventLookup::NotChecked);
        ListRow {
            key: Some(RowKey::Event(self.key())),
            columns: [
                self.station_name.clone(),
                time_range(self.start_time, end),
                status.label().to_string(),
                self.title.clone(),
            ],
            tooltip: format!("{} {}", full_time_range(self.start_time, end), self.title),
            status: RowStatus::Reserve {
                status,
                active: self.start_time <= now && now <= end,
            },
        }
    }
}

impl GroupedItem for RecordedFile {
    fn start_time(&self) -> NaiveDateTime {
        self.start_time
    }

    fn skeleton_label(&self) -> &str {
        &self.service_name
    }

    fn render(&self, _now: NaiveDateTime) -> ListRow {
        let (outcome, tier) = classify_recording_outcome(self.rec_status, self.drops, self.scrambles);
        ListRow {
            key: Some(RowKey::Recorded(self.id)),
            columns: [
                self.service_name.clone(),
                time_range(self.start_time, self.end_time()),
                outcome.label().to_string(),
                self.title.clone(),
            ],
            tooltip: recorded_tooltip(self),
            status: RowStatus::Recorded { outcome, tier },
        }
    }
}

/// Reservations to list at `now`: not yet ended, ascending by start.
pub fn reservation_items(snapshot: &Snapshot, now: NaiveDateTime) -> Vec<&Reservation> {
    let mut items: Vec<&Reservation> = snapshot
        .reservations()
        .iter()
        .filter(|r| r.end_time() >= now)
        .collect();
    items.sort_by_key(|r| r.start_time);
    items
}

/// Recorded files to list, in their stored newest-first order.
pub fn recorded_items(snapshot: &Snapshot) -> Vec<&RecordedFile> {
    snapshot.recorded_files().iter().collect()
}

/// How a sync updated the rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    /// The rows were rebuilt from skeletons before the walk.
    pub rebuilt: bool,
    /// Rows whose content changed, appended and removed rows included.
    pub changed: usize,
}

/// Rows of a date-grouped list.
#[derive(Debug, Clone, Default)]
pub struct GroupedList {
    rows: Vec<ListRow>,
    header_count: usize,
}

impl GroupedList {
    pub fn rows(&self) -> &[ListRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut Vec<ListRow> {
        &mut self.rows
    }

    /// Header rows currently in the list.
    pub fn header_count(&self) -> usize {
        self.header_count
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.header_count = 0;
    }

    /// Replace the rows with one skeleton per date change and per item.
    pub fn rebuild<T: GroupedItem>(&mut self, items: &[T]) {
        self.clear();
        let mut last_date: Option<NaiveDate> = None;
        for item in items {
            let date = item.start_time().date();
            if last_date != Some(date) {
                self.rows.push(ListRow::header_skeleton(date));
                self.header_count += 1;
                last_date = Some(date);
            }
            self.rows.push(ListRow::skeleton(item.skeleton_label()));
        }
    }

    /// Bring the rows in line with `items`, which must be sorted the way they
    /// are to be shown.
    pub fn sync<T: GroupedItem>(&mut self, items: &[T], now: NaiveDateTime) -> SyncOutcome {
        let rebuilt = self.rows.len() < items.len() + self.header_count;
        if rebuilt {
            self.rebuild(items);
        }

        let mut changed = 0;
        let mut index = 0;
        let mut headers = 0;
        let mut last_date: Option<NaiveDate> = None;
        for item in items {
            let date = item.start_time().date();
            if last_date != Some(date) {
                changed += usize::from(self.put(index, ListRow::header(date)));
                index += 1;
                headers += 1;
                last_date = Some(date);
            }
            changed += usize::from(self.put(index, item.render(now)));
            index += 1;
        }

        changed += self.rows.len().saturating_sub(index);
        self.rows.truncate(index);
        self.header_count = headers;

        SyncOutcome { rebuilt, changed }
    }

    fn put(&mut self, index: usize, row: ListRow) -> bool {
        match self.rows.get_mut(index) {
            Some(existing) if *existing == row => false,
            Some(existing) => {
                *existing = row;
                true
            }
            None => {
                self.rows.push(row);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{reconcile, RawPoll};
    use crate::status::{DisplayTier, RecEndStatus, ReserveStatus};
    use crate::test_support::{at, on_day, recorded, reservation};
    use tunerbar_protocol::Overlap;

    fn three_days() -> Vec<Reservation> {
        vec![
            reservation(1, 1, on_day(1, 10, 0), 1800),
            reservation(2, 2, on_day(1, 21, 0), 1800),
            reservation(3, 3, on_day(2, 9, 0), 1800),
            reservation(4, 4, on_day(3, 9, 0), 1800),
            reservation(5, 5, on_day(3, 22, 0), 1800),
        ]
    }

    #[test]
    fn test_rebuild_row_count() {
        let items = three_days();
        let mut list = GroupedList::default();
        let outcome = list.sync(&items, at(0, 0));

        assert!(outcome.rebuilt);
        assert_eq!(list.rows().len(), items.len() + 3);
        assert_eq!(list.header_count(), 3);
        assert!(list.rows()[0].is_header());
        assert_eq!(list.rows()[0].label(), "2024/04/01(月)");
        assert_eq!(list.rows()[1].key, Some(RowKey::Event(items[0].key())));
        assert!(list.rows()[3].is_header());
    }

    #[test]
    fn test_sync_is_idempotent() {
        let items = three_days();
        let mut list = GroupedList::default();
        list.sync(&items, at(0, 0));
        let before = list.rows().to_vec();

        let outcome = list.sync(&items, at(0, 0));
        assert!(!outcome.rebuilt);
        assert_eq!(outcome.changed, 0);
        assert_eq!(list.rows(), before.as_slice());
    }

    #[test]
    fn test_walk_matches_rebuild_when_shrinking() {
        let items = three_days();
        let mut walked = GroupedList::default();
        walked.sync(&items, at(0, 0));

        let fewer = &items[1..4];
        let outcome = walked.sync(fewer, at(0, 0));
        assert!(!outcome.rebuilt);

        let mut rebuilt = GroupedList::default();
        rebuilt.sync(fewer, at(0, 0));
        assert_eq!(walked.rows(), rebuilt.rows());
    }

    #[test]
    fn test_sync_after_shrink_across_dates_is_idempotent() {
        let items = vec![
            reservation(1, 1, on_day(1, 10, 0), 1800),
            reservation(2, 2, on_day(2, 10, 0), 1800),
            reservation(3, 3, on_day(3, 10, 0), 1800),
        ];
        let mut list = GroupedList::default();
        list.sync(&items, at(0, 0));
        assert_eq!(list.header_count(), 3);

        let first = list.sync(&items[..1], at(0, 0));
        assert!(!first.rebuilt);
        assert_eq!(list.header_count(), 1);
        let shrunk = list.rows().to_vec();

        let second = list.sync(&items[..1], at(0, 0));
        assert_eq!(second, SyncOutcome { rebuilt: false, changed: 0 });
        assert_eq!(list.rows(), shrunk.as_slice());
    }

    #[test]
    fn test_walk_appends_for_new_date() {
        // two items on one day, then one moves to the next day
        let before = vec![
            reservation(1, 1, on_day(1, 10, 0), 600),
            reservation(2, 2, on_day(1, 11, 0), 600),
            reservation(3, 3, on_day(1, 12, 0), 600),
        ];
        let after = vec![
            reservation(1, 1, on_day(1, 10, 0), 600),
            reservation(2, 2, on_day(1, 11, 0), 600),
            reservation(3, 3, on_day(2, 12, 0), 600),
        ];

        let mut walked = GroupedList::default();
        walked.sync(&before, at(0, 0));
        assert_eq!(walked.rows().len(), 4);

        let outcome = walked.sync(&after, at(0, 0));
        assert!(!outcome.rebuilt);

        let mut rebuilt = GroupedList::default();
        rebuilt.sync(&after, at(0, 0));
        assert_eq!(walked.rows(), rebuilt.rows());
        assert_eq!(walked.rows().len(), 5);
    }

    #[test]
    fn test_reservation_row_status() {
        let mut partial = reservation(1, 1, at(10, 0), 1800);
        partial.overlap = Overlap::Partial;
        let active = reservation(2, 2, at(10, 0), 1800);
        let mut disabled = reservation(3, 3, at(10, 0), 1800);
        disabled.rec_mode = 5;

        let now = at(10, 30);
        assert_eq!(
            partial.render(now).status,
            RowStatus::Reserve { status: ReserveStatus::Partial, active: true }
        );
        let row = active.render(now);
        assert_eq!(row.status, RowStatus::Reserve { status: ReserveStatus::Ok, active: true });
        assert_eq!(row.columns[1], "10:00-10:30");
        assert_eq!(row.columns[2], "○");
        assert_eq!(row.tooltip, "2024/04/01(月) 10:00-10:30 program 2");
        assert_eq!(
            active.render(at(10, 31)).status,
            RowStatus::Reserve { status: ReserveStatus::Ok, active: false }
        );
        assert_eq!(disabled.render(now).columns[2], "－");
    }

    #[test]
    fn test_ended_reservation_excluded_but_indexed() {
        let snapshot = reconcile(
            RawPoll {
                reservations: vec![reservation(1, 100, at(10, 0), 1800)],
                ..Default::default()
            },
            0,
        );

        assert_eq!(reservation_items(&snapshot, at(10, 15)).len(), 1);
        assert_eq!(
            classify_reservation(
                snapshot.reservations().first(),
                EventLookup::NotChecked
            ),
            ReserveStatus::Ok
        );
        // end is inclusive: still listed at 10:30, gone at 10:31
        assert_eq!(reservation_items(&snapshot, at(10, 30)).len(), 1);
        assert!(reservation_items(&snapshot, at(10, 31)).is_empty());
        assert!(snapshot.reservation(&snapshot.reservations()[0].key()).is_some());
    }

    #[test]
    fn test_reservation_items_sorted() {
        let snapshot = reconcile(
            RawPoll {
                reservations: vec![
                    reservation(1, 1, at(12, 0), 600),
                    reservation(2, 2, at(10, 0), 600),
                    reservation(3, 3, at(11, 0), 600),
                ],
                ..Default::default()
            },
            0,
        );
        let ids: Vec<u32> = reservation_items(&snapshot, at(0, 0))
            .iter()
            .map(|r| r.reserve_id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_recorded_rows_newest_first() {
        let files: Vec<_> = (1..=8).map(|id| recorded(id, on_day(id, 20, 0), 1)).collect();
        let snapshot = reconcile(
            RawPoll {
                recorded: Some(files),
                ..Default::default()
            },
            5,
        );

        let mut list = GroupedList::default();
        list.sync(&recorded_items(&snapshot), at(0, 0));
        let keys: Vec<RowKey> = list.rows().iter().filter_map(|r| r.key).collect();
        assert_eq!(
            keys,
            [8, 7, 6, 5, 4].map(RowKey::Recorded).to_vec()
        );
        // one header per day
        assert_eq!(list.rows().len(), 10);
    }

    #[test]
    fn test_recorded_row_tier() {
        let mut file = recorded(1, at(10, 0), 1);
        file.drops = 4;
        let row = file.render(at(12, 0));
        assert_eq!(
            row.status,
            RowStatus::Recorded { outcome: RecEndStatus::Normal, tier: DisplayTier::Error }
        );
        assert_eq!(row.columns[2], "正常");
        assert!(row.tooltip.contains("Drop : 4"));
    }
}
