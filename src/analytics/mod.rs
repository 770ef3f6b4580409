//! Read-side views over stored swimmers: valid results, competitions, best times.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::models::{Participation, Place, SwimmerRecord};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub style: String,
    pub time: String,
    pub place: Place,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Competition {
    /// `"{name}-{start}"`, e.g. `City Cup-2023-05-01`
    pub id: String,
    pub name: String,
    pub start: NaiveDate,
    pub events: Vec<Event>,
}

pub fn competition_id(name: &str, start: NaiveDate) -> String {
    format!("{}-{}", name, start)
}

/// Results with a real time and a ranked place.
pub fn valid_events(participation: &Participation) -> Vec<Event> {
    participation
        .results
        .iter()
        .filter(|r| r.is_valid())
        .map(|r| Event {
            style: r.style.clone(),
            time: r.time.clone(),
            place: r.place,
        })
        .collect()
}

fn newest_first(competitions: &mut [Competition]) {
    competitions.sort_by(|a, b| b.start.cmp(&a.start));
}

/// Competitions merged across all swimmers. Within one competition the first
/// valid event seen for a style wins.
pub fn aggregate_competitions(swimmers: &[SwimmerRecord]) -> Vec<Competition> {
    let mut out: Vec<Competition> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for participation in swimmers.iter().flat_map(|s| &s.participations) {
        let id = competition_id(&participation.competition_name, participation.date_range.start);
        let slot = *index.entry(id.clone()).or_insert_with(|| {
            out.push(Competition {
                id,
                name: participation.competition_name.clone(),
                start: participation.date_range.start,
                events: Vec::new(),
            });
            out.len() - 1
        });

        let competition = &mut out[slot];
        for event in valid_events(participation) {
            if !competition.events.iter().any(|e| e.style == event.style) {
                competition.events.push(event);
            }
        }
    }

    newest_first(&mut out);
    out
}

/// One swimmer's competitions, without those that have no valid event.
pub fn swimmer_competitions(swimmer: &SwimmerRecord) -> Vec<Competition> {
    let mut out: Vec<Competition> = swimmer
        .participations
        .iter()
        .map(|p| Competition {
            id: competition_id(&p.competition_name, p.date_range.start),
            name: p.competition_name.clone(),
            start: p.date_range.start,
            events: valid_events(p),
        })
        .filter(|c| !c.events.is_empty())
        .collect();

    newest_first(&mut out);
    out
}

/// Memoised competition views. Owned by whoever serves them; call
/// `invalidate` after storing new data.
#[derive(Debug, Default)]
pub struct CompetitionCache {
    all: Option<Vec<Competition>>,
    per_swimmer: HashMap<u32, Vec<Competition>>,
}

impl CompetitionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn competitions(&mut self, swimmers: &[SwimmerRecord]) -> &[Competition] {
        self.all.get_or_insert_with(|| {
            let built = aggregate_competitions(swimmers);
            debug!("Built {} competitions from {} swimmers", built.len(), swimmers.len());
            built
        })
    }

    pub fn swimmer_competitions(&mut self, swimmer: &SwimmerRecord) -> &[Competition] {
        self.per_swimmer
            .entry(swimmer.external_id)
            .or_insert_with(|| swimmer_competitions(swimmer))
    }

    /// `Some(id)` drops that swimmer's entry and the merged list it feeds;
    /// `None` drops everything.
    pub fn invalidate(&mut self, swimmer: Option<u32>) {
        match swimmer {
            Some(id) => {
                self.per_swimmer.remove(&id);
            }
            None => self.per_swimmer.clear(),
        }
        self.all = None;
    }
}

/// Numeric parts of a time such as `00:28:50` or `1:02.34`, for ordering.
fn time_key(time: &str) -> Option<Vec<u64>> {
    time.split([':', '.'])
        .map(|part| part.trim().parse::<u64>().ok())
        .collect()
}

/// Fastest valid time per style across all participations.
pub fn best_times(swimmer: &SwimmerRecord) -> BTreeMap<String, String> {
    let mut best: BTreeMap<String, (Vec<u64>, String)> = BTreeMap::new();

    for event in swimmer.participations.iter().flat_map(valid_events) {
        let Some(key) = time_key(&event.time) else {
            continue;
        };
        let faster = match best.get(&event.style) {
            Some((current, _)) => (key.len(), &key) < (current.len(), current),
            None => true,
        };
        if faster {
            best.insert(event.style, (key, event.time));
        }
    }

    best.into_iter().map(|(style, (_, time))| (style, time)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, NO_TIME, SwimResult};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn result(style: &str, time: &str, place: Place) -> SwimResult {
        SwimResult {
            style: style.into(),
            time: time.into(),
            place,
        }
    }

    fn meet(name: &str, start: NaiveDate, results: Vec<SwimResult>) -> Participation {
        Participation {
            competition_name: name.into(),
            date_range: DateRange::single(start),
            results,
        }
    }

    fn swimmer(id: u32, participations: Vec<Participation>) -> SwimmerRecord {
        SwimmerRecord {
            external_id: id,
            name: format!("Swimmer {}", id),
            gender: "F".into(),
            birth_year: 2005,
            club_name: "Aqua Stars".into(),
            lpin_license_number: String::new(),
            federation_license_number: String::new(),
            participations,
            personal_bests: vec![],
        }
    }

    #[test]
    fn test_sentinels_are_not_valid_events() {
        let p = meet(
            "City Cup",
            day(2023, 5, 1),
            vec![
                result("50m Freestyle", "00:28:50", Place::Ranked(2)),
                result("100m Freestyle", NO_TIME, Place::Ranked(5)),
                result("50m Back", "00:33:10", Place::Disqualified),
                result("50m Fly", "00:31:00", Place::Unranked),
            ],
        );
        let events = valid_events(&p);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].style, "50m Freestyle");
    }

    #[test]
    fn test_aggregate_merges_and_dedupes_by_style() {
        let a = swimmer(
            1,
            vec![meet("City Cup", day(2023, 5, 1), vec![result("50m Freestyle", "00:28:50", Place::Ranked(2))])],
        );
        let b = swimmer(
            2,
            vec![
                meet(
                    "City Cup",
                    day(2023, 5, 1),
                    vec![
                        result("50m Freestyle", "00:27:90", Place::Ranked(1)),
                        result("100m Back", "01:10:00", Place::Ranked(3)),
                    ],
                ),
                meet("Winter Open", day(2024, 1, 20), vec![]),
            ],
        );

        let all = aggregate_competitions(&[a, b]);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "Winter Open-2024-01-20");
        assert_eq!(all[1].id, "City Cup-2023-05-01");
        let styles: Vec<_> = all[1].events.iter().map(|e| (e.style.as_str(), e.time.as_str())).collect();
        assert_eq!(styles, vec![("50m Freestyle", "00:28:50"), ("100m Back", "01:10:00")]);
    }

    #[test]
    fn test_swimmer_view_drops_empty_competitions() {
        let s = swimmer(
            7,
            vec![
                meet("Old Meet", day(2021, 3, 1), vec![result("50m Fly", "00:35:00", Place::Ranked(4))]),
                meet("All DQ", day(2022, 6, 1), vec![result("50m Fly", "00:34:00", Place::Disqualified)]),
                meet("New Meet", day(2023, 9, 1), vec![result("50m Fly", "00:33:00", Place::Ranked(1))]),
            ],
        );
        let names: Vec<_> = swimmer_competitions(&s).into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["New Meet", "Old Meet"]);
    }

    #[test]
    fn test_cache_until_invalidated() {
        let mut cache = CompetitionCache::new();
        let first = vec![swimmer(
            1,
            vec![meet("City Cup", day(2023, 5, 1), vec![result("50m Freestyle", "00:28:50", Place::Ranked(2))])],
        )];
        assert_eq!(cache.competitions(&first).len(), 1);

        let mut updated = first.clone();
        updated[0]
            .participations
            .push(meet("Winter Open", day(2024, 1, 20), vec![result("50m Freestyle", "00:28:00", Place::Ranked(1))]));

        assert_eq!(cache.competitions(&updated).len(), 1);
        assert_eq!(cache.swimmer_competitions(&first[0]).len(), 1);

        cache.invalidate(Some(1));
        assert_eq!(cache.swimmer_competitions(&updated[0]).len(), 2);
        assert_eq!(cache.competitions(&updated).len(), 2);
    }

    #[test]
    fn test_invalidate_one_keeps_other_swimmers() {
        let mut cache = CompetitionCache::new();
        let a = swimmer(1, vec![meet("A", day(2023, 1, 1), vec![result("50m Fly", "00:35:00", Place::Ranked(1))])]);
        let mut b = swimmer(2, vec![meet("B", day(2023, 2, 1), vec![result("50m Fly", "00:34:00", Place::Ranked(1))])]);
        cache.swimmer_competitions(&a);
        cache.swimmer_competitions(&b);

        b.participations.clear();
        cache.invalidate(Some(1));
        assert_eq!(cache.swimmer_competitions(&b).len(), 1);

        cache.invalidate(None);
        assert!(cache.swimmer_competitions(&b).is_empty());
    }

    #[test]
    fn test_best_times_per_style() {
        let s = swimmer(
            3,
            vec![
                meet(
                    "A",
                    day(2023, 1, 1),
                    vec![
                        result("50m Freestyle", "00:29:10", Place::Ranked(3)),
                        result("100m Back", "01:12:00", Place::Ranked(2)),
                    ],
                ),
                meet(
                    "B",
                    day(2023, 6, 1),
                    vec![
                        result("50m Freestyle", "00:28:40", Place::Ranked(1)),
                        result("100m Back", "01:05:00", Place::Disqualified),
                    ],
                ),
            ],
        );
        let best = best_times(&s);
        assert_eq!(best["50m Freestyle"], "00:28:40");
        assert_eq!(best["100m Back"], "01:12:00");
    }

    #[test]
    fn test_time_key_orders_numerically() {
        assert!(time_key("00:59:99").unwrap() < time_key("01:00:00").unwrap());
        assert_eq!(time_key("1:02.34"), Some(vec![1, 2, 34]));
        assert_eq!(time_key("n/a"), None);
    }
}
