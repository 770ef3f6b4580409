use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Time value the site uses for events that have no recorded swim yet.
pub const NO_TIME: &str = "99:99:99";

/// Place text the site uses for a disqualification.
pub const DISQUALIFIED: &str = "descalificat";

/// Placeholder for club fields the site does not publish.
pub const UNKNOWN: &str = "Unknown";

// ── Swimmer ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwimmerRecord {
    pub external_id: u32,
    /// Artifacts written before names were extracted load with an empty name.
    #[serde(default)]
    pub name: String,
    pub gender: String,
    pub birth_year: i32,
    pub club_name: String,
    pub lpin_license_number: String,
    pub federation_license_number: String,
    /// Page order, not chronological.
    pub participations: Vec<Participation>,
    pub personal_bests: Vec<PersonalBest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Participation {
    pub competition_name: String,
    pub date_range: DateRange,
    pub results: Vec<SwimResult>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn single(day: NaiveDate) -> Self {
        Self { start: day, end: day }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwimResult {
    pub style: String,
    /// `MM:SS:cc` as printed by the site; [`NO_TIME`] when nothing was swum.
    pub time: String,
    pub place: Place,
}

impl SwimResult {
    pub fn has_time(&self) -> bool {
        self.time != NO_TIME
    }

    /// A result that belongs in rankings and statistics.
    pub fn is_valid(&self) -> bool {
        self.has_time() && self.place.rank().is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalBest {
    pub style: String,
    pub time: String,
    pub competition: String,
    pub date: NaiveDate,
}

// ── Place ─────────────────────────────────────────────────────────────────────

/// Finishing place. Only `Ranked` carries a number; the other two never
/// collapse to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Place {
    Ranked(u32),
    Disqualified,
    Unranked,
}

impl Place {
    /// "2" → Ranked(2), "descalificat" → Disqualified, "0" / "-" / "" → Unranked.
    /// Leading digits win, so "3 (final)" is still Ranked(3).
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        if s.eq_ignore_ascii_case(DISQUALIFIED) {
            return Place::Disqualified;
        }
        let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
        match digits.parse::<u32>() {
            Ok(n) if n > 0 => Place::Ranked(n),
            _ => Place::Unranked,
        }
    }

    pub fn rank(&self) -> Option<u32> {
        match self {
            Place::Ranked(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Place::Ranked(n) => write!(f, "{}", n),
            Place::Disqualified => f.write_str(DISQUALIFIED),
            Place::Unranked => f.write_str("-"),
        }
    }
}

// Ranked → number, Disqualified → "descalificat", Unranked → null
impl Serialize for Place {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Place::Ranked(n) => serializer.serialize_u32(*n),
            Place::Disqualified => serializer.serialize_str(DISQUALIFIED),
            Place::Unranked => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Place {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Number(u32),
            Text(String),
        }

        Ok(match Option::<Repr>::deserialize(deserializer)? {
            Some(Repr::Number(0)) | None => Place::Unranked,
            Some(Repr::Number(n)) => Place::Ranked(n),
            Some(Repr::Text(s)) => Place::parse(&s),
        })
    }
}

// ── Club ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClubRecord {
    pub name: String,
    pub city: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub website: String,
    pub coach: String,
}

impl ClubRecord {
    /// Club known only by name, as referenced from a swimmer page.
    pub fn placeholder(name: &str) -> Self {
        Self {
            name: name.to_string(),
            city: UNKNOWN.to_string(),
            address: UNKNOWN.to_string(),
            phone: UNKNOWN.to_string(),
            email: UNKNOWN.to_string(),
            website: UNKNOWN.to_string(),
            coach: UNKNOWN.to_string(),
        }
    }
}

// ── Extraction intermediates ──────────────────────────────────────────────────

/// Scalar swimmer fields read from the info table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicInfo {
    pub name: String,
    pub gender: String,
    pub birth_year: i32,
    pub club_name: String,
    pub lpin_license_number: String,
    pub federation_license_number: String,
}

/// Lines dropped during extraction, per field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipReport {
    pub participations: usize,
    pub results: usize,
    pub personal_bests: usize,
    pub clubs: usize,
}

impl SkipReport {
    pub fn total(&self) -> usize {
        self.participations + self.results + self.personal_bests + self.clubs
    }

    pub fn merge(&mut self, other: &SkipReport) {
        self.participations += other.participations;
        self.results += other.results;
        self.personal_bests += other.personal_bests;
        self.clubs += other.clubs;
    }
}
