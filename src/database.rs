use chrono::{Local, NaiveDate};
use rusqlite::Connection;

use crate::db::{init_db, Store};
use crate::error::Result;
use crate::models::{
    CompanyCount, CountryCount, CountryStaff, DreamTeam, ForeignWinner, Movie, MovieCount,
    NewUser, Staff, StaffStats, User, UserNomination, UserNominationView,
};
use crate::settings::Settings;
use crate::{nominations, reports, users};

/// Data access entry point: one method per operation. Every call checks a
/// connection out of the pool for its own duration, and failures are logged
/// here before being handed back to the caller.
pub struct Database {
    store: Store,
    default_language: String,
    staff_list_limit: u32,
}

impl Database {
    pub fn new(store: Store, settings: &Settings) -> Self {
        Self {
            store,
            default_language: settings.default_language.clone(),
            staff_list_limit: settings.staff_list_limit,
        }
    }

    /// Open the configured database file, creating the directory and schema
    /// when missing.
    pub fn open(settings: &Settings) -> Result<Self> {
        std::fs::create_dir_all(settings.data_path())?;
        let store = Store::open(&settings.db_path(), settings.pool_size)?;
        let db = Self::new(store, settings);
        db.with_conn("initialize schema", init_db)?;
        Ok(db)
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn with_conn<T>(&self, what: &str, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let result = self.store.conn().and_then(|conn| f(&*conn));
        if let Err(e) = &result {
            log::warn!("{what} failed: {e}");
        }
        result
    }

    pub fn register_user(&self, user: &NewUser) -> Result<i64> {
        self.register_user_on(user, Local::now().date_naive())
    }

    pub fn register_user_on(&self, user: &NewUser, today: NaiveDate) -> Result<i64> {
        let id = self.with_conn("register user", |c| users::register_user(c, user, today))?;
        log::info!("registered user {} (id {id})", user.username);
        Ok(id)
    }

    pub fn user(&self, user_id: i64) -> Result<Option<User>> {
        self.with_conn("load user", |c| users::get_user(c, user_id))
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.with_conn("authenticate", |c| users::authenticate(c, username, password))
    }

    pub fn add_nomination(
        &self,
        user_id: i64,
        staff_id: i64,
        movie_id: i64,
        category: &str,
    ) -> Result<UserNomination> {
        self.with_conn("add nomination", |c| {
            nominations::add_nomination(c, user_id, staff_id, movie_id, category)
        })
    }

    pub fn find_staff_by_name(&self, name: &str) -> Result<Option<Staff>> {
        self.with_conn("find staff", |c| nominations::find_staff_by_name(c, name))
    }

    pub fn find_movie_by_title(&self, title: &str) -> Result<Option<Movie>> {
        self.with_conn("find movie", |c| nominations::find_movie_by_title(c, title))
    }

    pub fn user_nominations(&self, user_id: i64) -> Result<Vec<UserNominationView>> {
        self.with_conn("user nominations", |c| nominations::get_user_nominations(c, user_id))
    }

    pub fn top_nominated_movies(
        &self,
        category: Option<&str>,
        year: Option<i32>,
    ) -> Result<Vec<MovieCount>> {
        self.with_conn("top nominated movies", |c| {
            reports::top_nominated_movies(c, category, year)
        })
    }

    pub fn staff_stats(&self, staff_id: i64) -> Result<Option<StaffStats>> {
        self.with_conn("staff stats", |c| reports::staff_stats(c, staff_id))
    }

    pub fn staff_stats_by_name(&self, name: &str) -> Result<Option<StaffStats>> {
        self.with_conn("staff stats", |c| reports::staff_stats_by_name(c, name))
    }

    pub fn top_actor_birth_countries(&self) -> Result<Vec<CountryCount>> {
        self.with_conn("top actor birth countries", reports::top_actor_birth_countries)
    }

    pub fn staff_by_country(&self, country: &str) -> Result<Vec<CountryStaff>> {
        self.with_conn("staff by country", |c| reports::staff_by_country(c, country))
    }

    pub fn dream_team(&self) -> Result<DreamTeam> {
        self.with_conn("dream team", reports::dream_team)
    }

    pub fn top_production_companies(&self) -> Result<Vec<CompanyCount>> {
        self.with_conn("top production companies", reports::top_production_companies)
    }

    pub fn non_english_oscar_winners(&self) -> Result<Vec<ForeignWinner>> {
        self.with_conn("non-English winners", |c| {
            reports::non_english_oscar_winners(c, &self.default_language)
        })
    }

    /// Staff ordered by id; `None` uses the configured limit.
    pub fn staff_list(&self, limit: Option<u32>) -> Result<Vec<Staff>> {
        let limit = limit.unwrap_or(self.staff_list_limit);
        self.with_conn("staff list", |c| reports::staff_list(c, limit))
    }
}

#[cfg(test)]
pub(crate) fn demo_database() -> (tempfile::TempDir, Database) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        data_dir: dir.path().to_string_lossy().to_string(),
        ..Settings::default()
    };
    let db = Database::open(&settings).unwrap();
    crate::cli::demo::insert_demo_data(&db.store().conn().unwrap()).unwrap();
    (dir, db)
}
