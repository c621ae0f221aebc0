//! Builds composite-key indices from one poll's raw collections.
//!
//! Every collection is walked once in enumeration order and inserted into
//! its index only if the key is absent, so the earliest record wins and later
//! duplicates are dropped without merging.

use std::collections::HashMap;
use std::hash::Hash;

use tunerbar_protocol::{
    EventKey, ProgramEvent, RecordedFile, Reservation, ServiceEvent, ServiceKey, TunerState,
};

/// Raw collections returned by one successful poll.
#[derive(Debug, Clone, Default)]
pub struct RawPoll {
    pub reservations: Vec<Reservation>,
    pub services: Vec<ServiceEvent>,
    pub tuners: Vec<TunerState>,
    /// Recorded files in fetch order, if they were requested.
    pub recorded: Option<Vec<RecordedFile>>,
}

/// Immutable set of lookup indices built from one poll.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    services: Vec<ServiceEvent>,
    service_index: HashMap<ServiceKey, usize>,
    events: HashMap<EventKey, ProgramEvent>,
    reservations: Vec<Reservation>,
    reservation_index: HashMap<EventKey, usize>,
    tuners: Vec<TunerState>,
    recorded: Vec<RecordedFile>,
    recorded_index: HashMap<u32, usize>,
}

/// Build a snapshot from one poll. `recorded_cap` of 0 keeps every file.
pub fn reconcile(raw: RawPoll, recorded_cap: usize) -> Snapshot {
    let service_index = first_wins(&raw.services, |s| s.service_info.key());

    let mut events = HashMap::new();
    for service in &raw.services {
        for ev in &service.event_list {
            events.entry(ev.key()).or_insert_with(|| ev.clone());
        }
    }

    let reservation_index = first_wins(&raw.reservations, Reservation::key);

    let recorded = cap_recorded(raw.recorded.unwrap_or_default(), recorded_cap);
    let recorded_index = first_wins(&recorded, |r| r.id);

    Snapshot {
        services: raw.services,
        service_index,
        events,
        reservations: raw.reservations,
        reservation_index,
        tuners: raw.tuners,
        recorded,
        recorded_index,
    }
}

/// Keep the newest `cap` recorded files and order them newest first.
///
/// Files arrive oldest first. With `cap > 0` and more than `cap` files, the
/// last `cap` are retained; the retained slice is then reversed.
pub fn cap_recorded(mut files: Vec<RecordedFile>, cap: usize) -> Vec<RecordedFile> {
    if cap > 0 && files.len() > cap {
        files.drain(..files.len() - cap);
    }
    files.reverse();
    files
}

fn first_wins<T, K, F>(items: &[T], key: F) -> HashMap<K, usize>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut index = HashMap::with_capacity(items.len());
    for (pos, item) in items.iter().enumerate() {
        index.entry(key(item)).or_insert(pos);
    }
    index
}

impl Snapshot {
    /// Copy of this snapshot with the recorded index replaced.
    pub fn with_recorded(&self, files: Vec<RecordedFile>, recorded_cap: usize) -> Snapshot {
        let recorded = cap_recorded(files, recorded_cap);
        let recorded_index = first_wins(&recorded, |r| r.id);
        Snapshot {
            recorded,
            recorded_index,
            ..self.clone()
        }
    }

    /// Services in enumeration order, duplicates included.
    pub fn services(&self) -> &[ServiceEvent] {
        &self.services
    }

    pub fn service(&self, key: &ServiceKey) -> Option<&ServiceEvent> {
        self.service_index.get(key).map(|&i| &self.services[i])
    }

    pub fn event(&self, key: &EventKey) -> Option<&ProgramEvent> {
        self.events.get(key)
    }

    /// Reservations in enumeration order, duplicates included.
    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn reservation(&self, key: &EventKey) -> Option<&Reservation> {
        self.reservation_index.get(key).map(|&i| &self.reservations[i])
    }

    /// Reservations whose id is in `ids`, in enumeration order.
    pub fn reservations_by_id<'a>(&'a self, ids: &'a [u32]) -> impl Iterator<Item = &'a Reservation> + 'a {
        self.reservations
            .iter()
            .filter(move |r| ids.contains(&r.reserve_id))
    }

    pub fn tuners(&self) -> &[TunerState] {
        &self.tuners
    }

    pub fn tuner(&self, tuner_id: u32) -> Option<&TunerState> {
        self.tuners.iter().find(|t| t.tuner_id == tuner_id)
    }

    /// Recorded files, newest first.
    pub fn recorded_files(&self) -> &[RecordedFile] {
        &self.recorded
    }

    pub fn recorded(&self, id: u32) -> Option<&RecordedFile> {
        self.recorded_index.get(&id).map(|&i| &self.recorded[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{at, program, recorded, reservation, service_event, TERRESTRIAL};

    #[test]
    fn test_reservations_first_wins() {
        let mut first = reservation(1, 100, at(10, 0), 1800);
        first.title = "first".into();
        let mut second = reservation(2, 100, at(10, 0), 1800);
        second.title = "second".into();

        let snapshot = reconcile(
            RawPoll {
                reservations: vec![first, second],
                ..Default::default()
            },
            0,
        );

        let found = snapshot.reservation(&EventKey::new(TERRESTRIAL.1, TERRESTRIAL.2, 100)).unwrap();
        assert_eq!(found.title, "first");
        assert_eq!(found.reserve_id, 1);
        // the raw list keeps both for consumers that iterate it
        assert_eq!(snapshot.reservations().len(), 2);
    }

    #[test]
    fn test_services_and_events_first_wins() {
        let a = service_event(
            TERRESTRIAL,
            "first",
            vec![program(TERRESTRIAL, 1, at(10, 0), 600, "news")],
        );
        let b = service_event(
            TERRESTRIAL,
            "second",
            vec![program(TERRESTRIAL, 1, at(11, 0), 600, "dup")],
        );

        let snapshot = reconcile(
            RawPoll {
                services: vec![a, b],
                ..Default::default()
            },
            0,
        );

        let key = ServiceKey::new(TERRESTRIAL.1, TERRESTRIAL.2);
        assert_eq!(snapshot.service(&key).unwrap().service_info.service_name, "first");
        let ev = snapshot.event(&EventKey::new(TERRESTRIAL.1, TERRESTRIAL.2, 1)).unwrap();
        assert_eq!(ev.title(), "news");
    }

    #[test]
    fn test_recorded_cap_keeps_newest_reversed() {
        let files: Vec<_> = (1..=8).map(|id| recorded(id, at(id, 0), 1)).collect();
        let capped = cap_recorded(files, 5);
        let ids: Vec<u32> = capped.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![8, 7, 6, 5, 4]);
    }

    #[test]
    fn test_recorded_uncapped_is_reversed() {
        let files: Vec<_> = (1..=3).map(|id| recorded(id, at(id, 0), 1)).collect();
        let ids: Vec<u32> = cap_recorded(files.clone(), 0).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        let ids: Vec<u32> = cap_recorded(files, 10).iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_recorded_index_first_wins() {
        let mut older = recorded(5, at(1, 0), 1);
        older.title = "older".into();
        let mut newer = recorded(5, at(2, 0), 1);
        newer.title = "newer".into();

        let snapshot = reconcile(
            RawPoll {
                recorded: Some(vec![older, newer]),
                ..Default::default()
            },
            0,
        );
        // after reversal the newer record is enumerated first
        assert_eq!(snapshot.recorded(5).unwrap().title, "newer");
        assert!(snapshot.recorded(6).is_none());
    }

    #[test]
    fn test_with_recorded_leaves_original_untouched() {
        let snapshot = reconcile(
            RawPoll {
                reservations: vec![reservation(1, 100, at(10, 0), 1800)],
                ..Default::default()
            },
            0,
        );
        let next = snapshot.with_recorded(vec![recorded(1, at(9, 0), 1)], 0);
        assert!(snapshot.recorded_files().is_empty());
        assert_eq!(next.recorded_files().len(), 1);
        assert_eq!(next.reservations().len(), 1);
    }
}
