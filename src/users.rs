use chrono::{Datelike, NaiveDate};
use rusqlite::{Connection, OptionalExtension};

use crate::auth::verify_password;
use crate::error::{OracleError, Result};
use crate::models::{NewUser, User};

/// Whole years between `birth` and `today`, one less if this year's birthday
/// hasn't happened yet.
pub fn compute_age(birth: NaiveDate, today: NaiveDate) -> i64 {
    let before_birthday = (today.month(), today.day()) < (birth.month(), birth.day());
    (today.year() - birth.year()) as i64 - i64::from(before_birthday)
}

/// Insert a user, deriving the stored age from `today`. Returns the new id.
pub fn register_user(conn: &Connection, user: &NewUser, today: NaiveDate) -> Result<i64> {
    if user.birth_date > today {
        return Err(OracleError::Invalid("birth date is in the future".to_string()));
    }
    let age = compute_age(user.birth_date, today);
    conn.execute(
        "INSERT INTO users (username, email, birth_date, age, gender, country, password_hash) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            user.username,
            user.email,
            user.birth_date.format("%Y-%m-%d").to_string(),
            age,
            user.gender,
            user.country,
            user.password_hash,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_user(row: &rusqlite::Row) -> rusqlite::Result<(User, Option<String>)> {
    let birth: String = row.get(3)?;
    let birth_date = NaiveDate::parse_from_str(&birth, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok((
        User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            birth_date,
            age: row.get(4)?,
            gender: row.get(5)?,
            country: row.get(6)?,
        },
        row.get(7)?,
    ))
}

const USER_COLUMNS: &str = "id, username, email, birth_date, age, gender, country, password_hash";

pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1");
    let found = conn
        .query_row(&sql, [user_id], row_to_user)
        .optional()?;
    Ok(found.map(|(user, _)| user))
}

/// Look up `username` and check `password` against its stored hash.
/// `Ok(None)` covers both an unknown user and a wrong password.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1");
    let found = conn
        .query_row(&sql, [username], row_to_user)
        .optional()?;
    let Some((user, hash)) = found else {
        return Ok(None);
    };
    let Some(hash) = hash else {
        log::info!("user {username} has no password set; refusing login");
        return Ok(None);
    };
    if verify_password(password, &hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}
