use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;

/// A result row keyed by column name, as handed to the table view and the
/// text formatters.
pub type Record = BTreeMap<String, String>;

pub trait ToRecord {
    fn to_record(&self) -> Record;
}

fn record<const N: usize>(pairs: [(&str, String); N]) -> Record {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

/// The award categories a user may nominate in.
pub const AWARD_CATEGORIES: [&str; 10] = [
    "Best Picture",
    "Best Director",
    "Best Actor",
    "Best Actress",
    "Best Supporting Actor",
    "Best Supporting Actress",
    "Best Original Screenplay",
    "Best Adapted Screenplay",
    "Best Cinematography",
    "Best Original Score",
];

/// The lead-actor category used by the birth-country report.
pub const LEAD_ACTOR_CATEGORY: &str = "Best Actor";

pub fn is_award_category(category: &str) -> bool {
    AWARD_CATEGORIES.contains(&category)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Role {
    Director,
    Actor,
    Actress,
    Producer,
    Singer,
}

impl Role {
    /// Dream-team order.
    pub const ALL: [Role; 5] = [
        Role::Director,
        Role::Actor,
        Role::Actress,
        Role::Producer,
        Role::Singer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Director => "director",
            Role::Actor => "actor",
            Role::Actress => "actress",
            Role::Producer => "producer",
            Role::Singer => "singer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Director => "Director",
            Role::Actor => "Actor",
            Role::Actress => "Actress",
            Role::Producer => "Producer",
            Role::Singer => "Singer",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(s.trim()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub age: i64,
    pub gender: String,
    pub country: String,
}

/// Registration input before the row exists.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub country: String,
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_year: i32,
    pub language: String,
    pub production_company_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Staff {
    pub id: i64,
    pub name: String,
    pub birth_country: String,
    pub role: String,
    pub is_alive: bool,
}

impl ToRecord for Staff {
    fn to_record(&self) -> Record {
        record([
            ("id", self.id.to_string()),
            ("name", self.name.clone()),
            ("birth_country", self.birth_country.clone()),
            ("role", self.role.clone()),
            ("is_alive", if self.is_alive { "yes" } else { "no" }.to_string()),
        ])
    }
}

pub const STAFF_COLUMNS: &[&str] = &["id", "name", "birth_country", "role", "is_alive"];

/// An official nomination. A win is stored as the same row in `oscars`.
#[derive(Debug, Clone)]
pub struct Nomination {
    pub staff_id: i64,
    pub movie_id: i64,
    pub category: String,
    pub year: i32,
}

#[derive(Debug, Clone)]
pub struct UserNomination {
    pub id: i64,
    pub user_id: i64,
    pub staff_id: i64,
    pub movie_id: i64,
    pub category: String,
}

// ---------------------------------------------------------------------------
// Report rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct UserNominationView {
    pub id: i64,
    pub staff_name: String,
    pub movie_title: String,
    pub category: String,
}

impl ToRecord for UserNominationView {
    fn to_record(&self) -> Record {
        record([
            ("id", self.id.to_string()),
            ("staff_name", self.staff_name.clone()),
            ("movie_title", self.movie_title.clone()),
            ("category", self.category.clone()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovieCount {
    pub title: String,
    pub nomination_count: i64,
}

impl ToRecord for MovieCount {
    fn to_record(&self) -> Record {
        record([
            ("title", self.title.clone()),
            ("nomination_count", self.nomination_count.to_string()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct StaffStats {
    pub name: String,
    pub role: String,
    pub nomination_count: i64,
    pub oscar_count: i64,
}

impl ToRecord for StaffStats {
    fn to_record(&self) -> Record {
        record([
            ("name", self.name.clone()),
            ("role", self.role.clone()),
            ("nomination_count", self.nomination_count.to_string()),
            ("oscar_count", self.oscar_count.to_string()),
        ])
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CountryCount {
    pub birth_country: String,
    pub winner_count: i64,
}

impl ToRecord for CountryCount {
    fn to_record(&self) -> Record {
        record([
            ("birth_country", self.birth_country.clone()),
            ("winner_count", self.winner_count.to_string()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct CountryStaff {
    pub name: String,
    pub categories: String,
    pub nomination_count: i64,
    pub oscar_count: i64,
}

impl ToRecord for CountryStaff {
    fn to_record(&self) -> Record {
        record([
            ("name", self.name.clone()),
            ("categories", self.categories.clone()),
            ("nomination_count", self.nomination_count.to_string()),
            ("oscar_count", self.oscar_count.to_string()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct DreamTeamPick {
    pub role: Role,
    pub staff_id: i64,
    pub name: String,
    pub oscar_count: i64,
}

impl ToRecord for DreamTeamPick {
    fn to_record(&self) -> Record {
        record([
            ("role", self.role.as_str().to_string()),
            ("name", self.name.clone()),
            ("oscar_count", self.oscar_count.to_string()),
        ])
    }
}

/// Best living staff member per role, in `Role::ALL` order.
pub type DreamTeam = Vec<DreamTeamPick>;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyCount {
    pub name: String,
    pub oscar_count: i64,
}

impl ToRecord for CompanyCount {
    fn to_record(&self) -> Record {
        record([
            ("name", self.name.clone()),
            ("oscar_count", self.oscar_count.to_string()),
        ])
    }
}

#[derive(Debug, Clone)]
pub struct ForeignWinner {
    pub title: String,
    pub language: String,
    pub year: i32,
    pub category: String,
}

impl ToRecord for ForeignWinner {
    fn to_record(&self) -> Record {
        record([
            ("title", self.title.clone()),
            ("language", self.language.clone()),
            ("year", self.year.to_string()),
            ("category", self.category.clone()),
        ])
    }
}

pub fn to_records<T: ToRecord>(rows: &[T]) -> Vec<Record> {
    rows.iter().map(ToRecord::to_record).collect()
}
