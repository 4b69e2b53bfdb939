use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{Movie, Nomination, Staff, UserNomination, UserNominationView};

/// Record a user's nomination claim. The store rejects unknown user, staff
/// or movie ids.
pub fn add_nomination(
    conn: &Connection,
    user_id: i64,
    staff_id: i64,
    movie_id: i64,
    category: &str,
) -> Result<UserNomination> {
    conn.execute(
        "INSERT INTO user_nominations (user_id, staff_id, movie_id, category) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![user_id, staff_id, movie_id, category],
    )?;
    Ok(UserNomination {
        id: conn.last_insert_rowid(),
        user_id,
        staff_id,
        movie_id,
        category: category.to_string(),
    })
}

/// Record an official nomination, and the win when `won` is set. Returns the
/// nomination id.
pub fn record_official_nomination(
    conn: &Connection,
    nomination: &Nomination,
    won: bool,
) -> Result<i64> {
    let params = rusqlite::params![
        nomination.staff_id,
        nomination.movie_id,
        nomination.category,
        nomination.year
    ];
    conn.execute(
        "INSERT INTO nominations (staff_id, movie_id, category, year) VALUES (?1, ?2, ?3, ?4)",
        params,
    )?;
    let id = conn.last_insert_rowid();
    if won {
        conn.execute(
            "INSERT INTO oscars (staff_id, movie_id, category, year) VALUES (?1, ?2, ?3, ?4)",
            params,
        )?;
    }
    Ok(id)
}

pub fn get_user_nominations(conn: &Connection, user_id: i64) -> Result<Vec<UserNominationView>> {
    let mut stmt = conn.prepare(
        "SELECT un.id, s.name, m.title, un.category \
         FROM user_nominations un \
         JOIN staff s ON un.staff_id = s.id \
         JOIN movies m ON un.movie_id = m.id \
         WHERE un.user_id = ?1 \
         ORDER BY un.id",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok(UserNominationView {
            id: row.get(0)?,
            staff_name: row.get(1)?,
            movie_title: row.get(2)?,
            category: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

pub(crate) fn row_to_staff(row: &rusqlite::Row) -> rusqlite::Result<Staff> {
    Ok(Staff {
        id: row.get(0)?,
        name: row.get(1)?,
        birth_country: row.get(2)?,
        role: row.get(3)?,
        is_alive: row.get(4)?,
    })
}

/// Case-insensitive exact name match; the lowest id wins on duplicates.
pub fn find_staff_by_name(conn: &Connection, name: &str) -> Result<Option<Staff>> {
    Ok(conn
        .query_row(
            "SELECT id, name, birth_country, role, is_alive FROM staff \
             WHERE name = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
            [name.trim()],
            row_to_staff,
        )
        .optional()?)
}

pub fn find_movie_by_title(conn: &Connection, title: &str) -> Result<Option<Movie>> {
    Ok(conn
        .query_row(
            "SELECT id, title, release_year, language, production_company_id FROM movies \
             WHERE title = ?1 COLLATE NOCASE ORDER BY id LIMIT 1",
            [title.trim()],
            |row| {
                Ok(Movie {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    release_year: row.get(2)?,
                    language: row.get(3)?,
                    production_company_id: row.get(4)?,
                })
            },
        )
        .optional()?)
}
