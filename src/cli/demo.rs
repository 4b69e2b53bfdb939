use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use rusqlite::Connection;

use crate::auth::hash_password;
use crate::db::{init_db, Store};
use crate::error::{OracleError, Result};
use crate::models::{NewUser, Nomination};
use crate::nominations::record_official_nomination;
use crate::settings::Settings;
use crate::users::register_user;

/// Username and password of the seeded account that can log in.
pub const DEMO_USER: &str = "demo";
pub const DEMO_PASSWORD: &str = "Oscars2024";

const COMPANIES: &[&str] = &[
    "Warner Bros.",
    "Paramount Pictures",
    "Neon",
    "A24",
    "Universal Pictures",
    "Columbia Pictures",
    "20th Century Fox",
    "Lionsgate",
    "DreamWorks Pictures",
    "United Artists",
    "Marvel Studios",
];

// (title, release_year, language, company)
const MOVIES: &[(&str, i32, &str, Option<&str>)] = &[
    ("Parasite", 2019, "Korean", Some("Neon")),
    ("Roma", 2018, "Spanish", None),
    ("Oppenheimer", 2023, "English", Some("Universal Pictures")),
    ("Everything Everywhere All at Once", 2022, "English", Some("A24")),
    ("The Revenant", 2015, "English", Some("20th Century Fox")),
    ("Drive My Car", 2021, "Japanese", None),
    ("All Quiet on the Western Front", 2022, "German", None),
    ("La La Land", 2016, "English", Some("Lionsgate")),
    ("The Departed", 2006, "English", Some("Warner Bros.")),
    ("Lincoln", 2012, "English", Some("DreamWorks Pictures")),
    ("There Will Be Blood", 2007, "English", Some("Paramount Pictures")),
    ("Skyfall", 2012, "English", Some("Columbia Pictures")),
    ("The Iron Lady", 2011, "English", None),
    ("Life Is Beautiful", 1997, "Italian", None),
    ("Joker", 2019, "English", Some("Warner Bros.")),
    ("Capote", 2005, "English", None),
    ("Schindler's List", 1993, "English", Some("Universal Pictures")),
    ("Saving Private Ryan", 1998, "English", Some("Paramount Pictures")),
    ("No Time to Die", 2021, "English", Some("Universal Pictures")),
    ("Barbie", 2023, "English", Some("Warner Bros.")),
    ("Amour", 2012, "French", None),
    ("Black Panther", 2018, "English", Some("Marvel Studios")),
    ("The Apartment", 1960, "English", Some("United Artists")),
    ("Sunset Boulevard", 1950, "English", Some("Paramount Pictures")),
    ("The Lost Weekend", 1945, "English", Some("Paramount Pictures")),
];

// (name, birth_country, role, is_alive)
const STAFF: &[(&str, &str, &str, bool)] = &[
    ("Bong Joon-ho", "South Korea", "director", true),
    ("Alfonso Cuarón", "Mexico", "director", true),
    ("Christopher Nolan", "United Kingdom", "director", true),
    ("Martin Scorsese", "USA", "director", true),
    ("Steven Spielberg", "USA", "director", true),
    ("Cillian Murphy", "Ireland", "actor", true),
    ("Leonardo DiCaprio", "USA", "actor", true),
    ("Joaquin Phoenix", "USA", "actor", true),
    ("Daniel Day-Lewis", "United Kingdom", "actor", true),
    ("Roberto Benigni", "Italy", "actor", true),
    ("Michelle Yeoh", "Malaysia", "actress", true),
    ("Meryl Streep", "USA", "actress", true),
    ("Emma Stone", "USA", "actress", true),
    ("Kevin Feige", "USA", "producer", true),
    ("Emma Thomas", "United Kingdom", "producer", true),
    ("Adele", "United Kingdom", "singer", true),
    ("Billie Eilish", "USA", "singer", true),
    ("Ryusuke Hamaguchi", "Japan", "director", true),
    ("Edward Berger", "Germany", "director", true),
    ("Philip Seymour Hoffman", "USA", "actor", false),
    ("Michael Haneke", "Austria", "director", true),
    ("Tom Cruise", "USA", "actor", true),
    ("Billy Wilder", "Austria", "director", false),
];

// (staff, movie, category, ceremony year, won)
const NOMINATIONS: &[(&str, &str, &str, i32, bool)] = &[
    ("Bong Joon-ho", "Parasite", "Best Director", 2020, true),
    ("Bong Joon-ho", "Parasite", "Best Picture", 2020, true),
    ("Bong Joon-ho", "Parasite", "Best Original Screenplay", 2020, true),
    ("Bong Joon-ho", "Parasite", "Best International Feature Film", 2020, true),
    ("Alfonso Cuarón", "Roma", "Best Director", 2019, true),
    ("Alfonso Cuarón", "Roma", "Best Cinematography", 2019, true),
    ("Alfonso Cuarón", "Roma", "Best International Feature Film", 2019, true),
    ("Alfonso Cuarón", "Roma", "Best Original Screenplay", 2019, false),
    ("Christopher Nolan", "Oppenheimer", "Best Director", 2024, true),
    ("Christopher Nolan", "Oppenheimer", "Best Adapted Screenplay", 2024, false),
    ("Emma Thomas", "Oppenheimer", "Best Picture", 2024, true),
    ("Cillian Murphy", "Oppenheimer", "Best Actor", 2024, true),
    ("Michelle Yeoh", "Everything Everywhere All at Once", "Best Actress", 2023, true),
    ("Leonardo DiCaprio", "The Revenant", "Best Actor", 2016, true),
    ("Martin Scorsese", "The Departed", "Best Director", 2007, true),
    ("Daniel Day-Lewis", "There Will Be Blood", "Best Actor", 2008, true),
    ("Daniel Day-Lewis", "Lincoln", "Best Actor", 2013, true),
    ("Roberto Benigni", "Life Is Beautiful", "Best Actor", 1999, true),
    ("Roberto Benigni", "Life Is Beautiful", "Best International Feature Film", 1999, true),
    ("Meryl Streep", "The Iron Lady", "Best Actress", 2012, true),
    ("Emma Stone", "La La Land", "Best Actress", 2017, true),
    ("Joaquin Phoenix", "Joker", "Best Actor", 2020, true),
    ("Adele", "Skyfall", "Best Original Song", 2013, true),
    ("Billie Eilish", "No Time to Die", "Best Original Song", 2022, true),
    ("Billie Eilish", "Barbie", "Best Original Song", 2024, true),
    ("Edward Berger", "All Quiet on the Western Front", "Best International Feature Film", 2023, true),
    ("Edward Berger", "All Quiet on the Western Front", "Best Adapted Screenplay", 2023, false),
    ("Ryusuke Hamaguchi", "Drive My Car", "Best International Feature Film", 2022, true),
    ("Ryusuke Hamaguchi", "Drive My Car", "Best Director", 2022, false),
    ("Philip Seymour Hoffman", "Capote", "Best Actor", 2006, true),
    ("Steven Spielberg", "Schindler's List", "Best Director", 1994, true),
    ("Steven Spielberg", "Schindler's List", "Best Picture", 1994, true),
    ("Steven Spielberg", "Saving Private Ryan", "Best Director", 1999, true),
    ("Michael Haneke", "Amour", "Best International Feature Film", 2013, true),
    ("Kevin Feige", "Black Panther", "Best Picture", 2019, false),
    ("Billy Wilder", "The Apartment", "Best Director", 1961, true),
    ("Billy Wilder", "The Apartment", "Best Picture", 1961, true),
    ("Billy Wilder", "The Apartment", "Best Original Screenplay", 1961, true),
    ("Billy Wilder", "Sunset Boulevard", "Best Original Screenplay", 1951, true),
    ("Billy Wilder", "The Lost Weekend", "Best Director", 1946, true),
    ("Billy Wilder", "The Lost Weekend", "Best Adapted Screenplay", 1946, true),
];

// (username, email, birth date, gender, country)
const USERS: &[(&str, &str, &str, &str, &str)] = &[
    (DEMO_USER, "demo@example.com", "1990-01-15", "F", "USA"),
    ("cinephile", "cinephile@example.com", "1985-07-04", "M", "France"),
    ("critic", "critic@example.com", "1978-11-23", "F", "United Kingdom"),
];

// (username, staff, movie, category)
const USER_NOMINATIONS: &[(&str, &str, &str, &str)] = &[
    ("cinephile", "Cillian Murphy", "Oppenheimer", "Best Actor"),
    ("cinephile", "Christopher Nolan", "Oppenheimer", "Best Director"),
    ("cinephile", "Emma Thomas", "Oppenheimer", "Best Picture"),
    ("cinephile", "Michelle Yeoh", "Everything Everywhere All at Once", "Best Actress"),
    ("critic", "Bong Joon-ho", "Parasite", "Best Director"),
    ("critic", "Bong Joon-ho", "Parasite", "Best Picture"),
    ("critic", "Cillian Murphy", "Oppenheimer", "Best Actor"),
    ("critic", "Ryusuke Hamaguchi", "Drive My Car", "Best Director"),
];

fn id_of(ids: &HashMap<&str, i64>, name: &str) -> Result<i64> {
    ids.get(name)
        .copied()
        .ok_or_else(|| OracleError::Other(format!("demo data references unknown '{name}'")))
}

/// Insert the sample catalogue, win records, users and user nominations.
/// Returns the number of staff inserted.
pub fn insert_demo_data(conn: &Connection) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;

    let mut companies = HashMap::new();
    for name in COMPANIES {
        tx.execute("INSERT INTO production_companies (name) VALUES (?1)", [name])?;
        companies.insert(*name, tx.last_insert_rowid());
    }

    let mut movies = HashMap::new();
    for (title, year, language, company) in MOVIES {
        let company_id = match company {
            Some(c) => Some(id_of(&companies, c)?),
            None => None,
        };
        tx.execute(
            "INSERT INTO movies (title, release_year, language, production_company_id) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![title, year, language, company_id],
        )?;
        movies.insert(*title, tx.last_insert_rowid());
    }

    let mut staff = HashMap::new();
    for (name, country, role, alive) in STAFF {
        tx.execute(
            "INSERT INTO staff (name, birth_country, role, is_alive) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![name, country, role, alive],
        )?;
        staff.insert(*name, tx.last_insert_rowid());
    }

    for (person, title, category, year, won) in NOMINATIONS {
        let nomination = Nomination {
            staff_id: id_of(&staff, person)?,
            movie_id: id_of(&movies, title)?,
            category: category.to_string(),
            year: *year,
        };
        record_official_nomination(&tx, &nomination, *won)?;
    }

    let today = Local::now().date_naive();
    let mut users = HashMap::new();
    for (username, email, birth, gender, country) in USERS {
        let birth_date = NaiveDate::parse_from_str(birth, "%Y-%m-%d")
            .map_err(|e| OracleError::Other(e.to_string()))?;
        let password_hash = if *username == DEMO_USER {
            Some(hash_password(DEMO_PASSWORD)?)
        } else {
            None
        };
        let user = NewUser {
            username: username.to_string(),
            email: email.to_string(),
            birth_date,
            gender: gender.to_string(),
            country: country.to_string(),
            password_hash,
        };
        users.insert(*username, register_user(&tx, &user, today)?);
    }

    for (username, person, title, category) in USER_NOMINATIONS {
        tx.execute(
            "INSERT INTO user_nominations (user_id, staff_id, movie_id, category) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                id_of(&users, username)?,
                id_of(&staff, person)?,
                id_of(&movies, title)?,
                category
            ],
        )?;
    }

    tx.commit()?;
    Ok(STAFF.len())
}

/// Seed the configured database unless it already holds a catalogue.
/// Returns `false` when seeding was skipped.
pub fn setup_demo(settings: &Settings) -> Result<bool> {
    std::fs::create_dir_all(settings.data_path())?;
    let store = Store::open(&settings.db_path(), 1)?;
    let conn = store.conn()?;
    init_db(&conn)?;

    let existing: i64 = conn.query_row("SELECT count(*) FROM staff", [], |r| r.get(0))?;
    if existing > 0 {
        log::info!("demo skipped: {existing} staff already present");
        return Ok(false);
    }
    let count = insert_demo_data(&conn)?;
    log::info!("demo catalogue inserted ({count} staff)");
    Ok(true)
}

pub fn run(settings: &Settings) -> Result<()> {
    if setup_demo(settings)? {
        println!("Demo data loaded into {}", settings.db_path().display());
        println!("Log in as '{DEMO_USER}' with password '{DEMO_PASSWORD}'.");
    } else {
        println!("Database already has data; demo skipped.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_store;

    #[test]
    fn test_demo_creates_data() {
        let (_dir, store) = test_store();
        let conn = store.conn().unwrap();
        let staff_count = insert_demo_data(&conn).unwrap();

        let count = |sql: &str| -> i64 { conn.query_row(sql, [], |r| r.get(0)).unwrap() };
        assert_eq!(count("SELECT count(*) FROM staff"), staff_count as i64);
        assert_eq!(count("SELECT count(*) FROM movies"), MOVIES.len() as i64);
        assert_eq!(count("SELECT count(*) FROM nominations"), NOMINATIONS.len() as i64);
        let wins = NOMINATIONS.iter().filter(|n| n.4).count() as i64;
        assert_eq!(count("SELECT count(*) FROM oscars"), wins);
        assert_eq!(count("SELECT count(*) FROM users"), USERS.len() as i64);
        assert_eq!(count("SELECT count(*) FROM user_nominations"), USER_NOMINATIONS.len() as i64);
    }

    #[test]
    fn test_every_win_is_also_a_nomination() {
        let (_dir, store) = test_store();
        let conn = store.conn().unwrap();
        insert_demo_data(&conn).unwrap();
        let orphans: i64 = conn
            .query_row(
                "SELECT count(*) FROM oscars o WHERE NOT EXISTS (
                    SELECT 1 FROM nominations n
                    WHERE n.staff_id = o.staff_id AND n.movie_id = o.movie_id
                      AND n.category = o.category AND n.year = o.year)",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(orphans, 0);
    }

    #[test]
    fn test_user_nominations_use_award_categories() {
        for (_, _, _, category) in USER_NOMINATIONS {
            assert!(crate::models::is_award_category(category), "{category}");
        }
    }

    #[test]
    fn test_setup_demo_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Settings::default()
        };
        assert!(setup_demo(&settings).unwrap());
        assert!(!setup_demo(&settings).unwrap());

        let store = Store::open(&settings.db_path(), 1).unwrap();
        let conn = store.conn().unwrap();
        let staff: i64 = conn.query_row("SELECT count(*) FROM staff", [], |r| r.get(0)).unwrap();
        assert_eq!(staff, STAFF.len() as i64);
    }
}
