use rusqlite::{Connection, OptionalExtension};

use crate::error::Result;
use crate::models::{
    CompanyCount, CountryCount, CountryStaff, DreamTeam, DreamTeamPick, ForeignWinner,
    MovieCount, Role, Staff, StaffStats, LEAD_ACTOR_CATEGORY,
};
use crate::nominations::{find_staff_by_name, row_to_staff};

pub const TOP_MOVIES_LIMIT: i64 = 10;
pub const TOP_COUNTRIES_LIMIT: i64 = 5;
pub const TOP_COMPANIES_LIMIT: i64 = 5;

// ---------------------------------------------------------------------------
// Top nominated movies (user-submitted nominations)
// ---------------------------------------------------------------------------

/// Movies ranked by how often users nominated them. Either filter may be
/// absent; an absent filter matches everything.
pub fn top_nominated_movies(
    conn: &Connection,
    category: Option<&str>,
    year: Option<i32>,
) -> Result<Vec<MovieCount>> {
    let mut stmt = conn.prepare(
        "SELECT m.title, COUNT(*) AS nomination_count \
         FROM user_nominations un JOIN movies m ON un.movie_id = m.id \
         WHERE (?1 IS NULL OR un.category = ?1) \
           AND (?2 IS NULL OR m.release_year = ?2) \
         GROUP BY m.id, m.title \
         ORDER BY nomination_count DESC, m.title ASC \
         LIMIT ?3",
    )?;
    let rows = stmt.query_map(rusqlite::params![category, year, TOP_MOVIES_LIMIT], |row| {
        Ok(MovieCount {
            title: row.get(0)?,
            nomination_count: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Staff stats
// ---------------------------------------------------------------------------

pub fn staff_stats(conn: &Connection, staff_id: i64) -> Result<Option<StaffStats>> {
    Ok(conn
        .query_row(
            "SELECT s.name, s.role, \
                (SELECT COUNT(*) FROM nominations n WHERE n.staff_id = s.id), \
                (SELECT COUNT(*) FROM oscars o WHERE o.staff_id = s.id) \
             FROM staff s WHERE s.id = ?1",
            [staff_id],
            |row| {
                Ok(StaffStats {
                    name: row.get(0)?,
                    role: row.get(1)?,
                    nomination_count: row.get(2)?,
                    oscar_count: row.get(3)?,
                })
            },
        )
        .optional()?)
}

pub fn staff_stats_by_name(conn: &Connection, name: &str) -> Result<Option<StaffStats>> {
    match find_staff_by_name(conn, name)? {
        Some(staff) => staff_stats(conn, staff.id),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Lead-actor winners by birth country
// ---------------------------------------------------------------------------

/// Birth countries of lead-actor winners, counting each winner once.
pub fn top_actor_birth_countries(conn: &Connection) -> Result<Vec<CountryCount>> {
    let mut stmt = conn.prepare(
        "SELECT s.birth_country, COUNT(DISTINCT s.id) AS winner_count \
         FROM oscars o JOIN staff s ON o.staff_id = s.id \
         WHERE o.category = ?1 \
         GROUP BY s.birth_country \
         ORDER BY winner_count DESC, s.birth_country ASC \
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(rusqlite::params![LEAD_ACTOR_CATEGORY, TOP_COUNTRIES_LIMIT], |row| {
        Ok(CountryCount {
            birth_country: row.get(0)?,
            winner_count: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Nominated staff by country
// ---------------------------------------------------------------------------

pub fn staff_by_country(conn: &Connection, country: &str) -> Result<Vec<CountryStaff>> {
    let mut stmt = conn.prepare(
        "SELECT s.id, s.name, \
            (SELECT COUNT(*) FROM nominations n WHERE n.staff_id = s.id) AS nomination_count, \
            (SELECT COUNT(*) FROM oscars o WHERE o.staff_id = s.id) AS oscar_count \
         FROM staff s \
         WHERE s.birth_country = ?1 COLLATE NOCASE \
           AND EXISTS (SELECT 1 FROM nominations n WHERE n.staff_id = s.id) \
         ORDER BY s.name, s.id",
    )?;
    let raw: Vec<(i64, String, i64, i64)> = stmt
        .query_map([country.trim()], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut cat_stmt = conn.prepare(
        "SELECT DISTINCT category FROM nominations WHERE staff_id = ?1 ORDER BY category",
    )?;
    let mut out = Vec::with_capacity(raw.len());
    for (id, name, nomination_count, oscar_count) in raw {
        let categories: Vec<String> = cat_stmt
            .query_map([id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        out.push(CountryStaff {
            name,
            categories: categories.join(", "),
            nomination_count,
            oscar_count,
        });
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Dream team
// ---------------------------------------------------------------------------

/// The living staff member with the most wins in `role`; ties go to the
/// lowest id.
pub fn best_living_in_role(conn: &Connection, role: Role) -> Result<Option<DreamTeamPick>> {
    Ok(conn
        .query_row(
            "SELECT s.id, s.name, COUNT(o.id) AS oscar_count \
             FROM staff s LEFT JOIN oscars o ON o.staff_id = s.id \
             WHERE s.role = ?1 AND s.is_alive = 1 \
             GROUP BY s.id, s.name \
             ORDER BY oscar_count DESC, s.id ASC \
             LIMIT 1",
            [role.as_str()],
            |row| {
                Ok(DreamTeamPick {
                    role,
                    staff_id: row.get(0)?,
                    name: row.get(1)?,
                    oscar_count: row.get(2)?,
                })
            },
        )
        .optional()?)
}

pub fn dream_team(conn: &Connection) -> Result<DreamTeam> {
    let mut team = Vec::with_capacity(Role::ALL.len());
    for role in Role::ALL {
        if let Some(pick) = best_living_in_role(conn, role)? {
            team.push(pick);
        }
    }
    Ok(team)
}

// ---------------------------------------------------------------------------
// Production companies
// ---------------------------------------------------------------------------

pub fn top_production_companies(conn: &Connection) -> Result<Vec<CompanyCount>> {
    let mut stmt = conn.prepare(
        "SELECT pc.name, COUNT(*) AS oscar_count \
         FROM oscars o \
         JOIN movies m ON o.movie_id = m.id \
         JOIN production_companies pc ON m.production_company_id = pc.id \
         GROUP BY pc.id, pc.name \
         ORDER BY oscar_count DESC, pc.name ASC \
         LIMIT ?1",
    )?;
    let rows = stmt.query_map([TOP_COMPANIES_LIMIT], |row| {
        Ok(CompanyCount {
            name: row.get(0)?,
            oscar_count: row.get(1)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Non-English winners
// ---------------------------------------------------------------------------

/// Win records for movies not in `default_language`, newest release first.
pub fn non_english_oscar_winners(
    conn: &Connection,
    default_language: &str,
) -> Result<Vec<ForeignWinner>> {
    let mut stmt = conn.prepare(
        "SELECT m.title, m.language, m.release_year, o.category \
         FROM oscars o JOIN movies m ON o.movie_id = m.id \
         WHERE m.language <> ?1 COLLATE NOCASE \
         ORDER BY m.release_year DESC, m.title ASC, o.category ASC",
    )?;
    let rows = stmt.query_map([default_language], |row| {
        Ok(ForeignWinner {
            title: row.get(0)?,
            language: row.get(1)?,
            year: row.get(2)?,
            category: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

// ---------------------------------------------------------------------------
// Staff list
// ---------------------------------------------------------------------------

pub fn staff_list(conn: &Connection, limit: u32) -> Result<Vec<Staff>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, birth_country, role, is_alive FROM staff ORDER BY id LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit], row_to_staff)?;
    Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::demo::insert_demo_data;
    use crate::db::{test_store, Store};

    fn demo_store() -> (tempfile::TempDir, Store) {
        let (dir, store) = test_store();
        insert_demo_data(&store.conn().unwrap()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_top_movies_unfiltered_sorted_desc() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let movies = top_nominated_movies(&conn, None, None).unwrap();
        assert!(movies.len() <= TOP_MOVIES_LIMIT as usize);
        assert!(movies.windows(2).all(|w| w[0].nomination_count >= w[1].nomination_count));
        let titles: Vec<&str> = movies.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Oppenheimer", "Parasite", "Drive My Car", "Everything Everywhere All at Once"]
        );
        assert_eq!(movies[0].nomination_count, 4);
    }

    #[test]
    fn test_top_movies_filters_narrow() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();

        let actor = top_nominated_movies(&conn, Some("Best Actor"), None).unwrap();
        assert_eq!(actor, vec![MovieCount { title: "Oppenheimer".into(), nomination_count: 2 }]);

        let y2019 = top_nominated_movies(&conn, None, Some(2019)).unwrap();
        assert_eq!(y2019, vec![MovieCount { title: "Parasite".into(), nomination_count: 2 }]);

        let both = top_nominated_movies(&conn, Some("Best Director"), Some(2021)).unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].title, "Drive My Car");

        assert!(top_nominated_movies(&conn, Some("Best Picture"), Some(1950)).unwrap().is_empty());
    }

    #[test]
    fn test_top_movies_capped_at_ten() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let user_id: i64 = conn
            .query_row("SELECT id FROM users WHERE username = 'critic'", [], |r| r.get(0))
            .unwrap();
        let movie_ids: Vec<i64> = conn
            .prepare("SELECT id FROM movies")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert!(movie_ids.len() > 10);
        for id in movie_ids {
            crate::nominations::add_nomination(&conn, user_id, 1, id, "Best Picture").unwrap();
        }
        let movies = top_nominated_movies(&conn, None, None).unwrap();
        assert_eq!(movies.len(), 10);
    }

    #[test]
    fn test_staff_stats() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let stats = staff_stats_by_name(&conn, "Christopher Nolan").unwrap().unwrap();
        assert_eq!(stats.role, "director");
        assert_eq!(stats.nomination_count, 2);
        assert_eq!(stats.oscar_count, 1);

        let feige = staff_stats_by_name(&conn, "kevin feige").unwrap().unwrap();
        assert_eq!(feige.nomination_count, 1);
        assert_eq!(feige.oscar_count, 0);
    }

    #[test]
    fn test_staff_stats_missing_is_none() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        assert!(staff_stats(&conn, 99_999).unwrap().is_none());
        assert!(staff_stats_by_name(&conn, "Nobody").unwrap().is_none());
    }

    #[test]
    fn test_actor_birth_countries_count_winners_once() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let countries = top_actor_birth_countries(&conn).unwrap();
        assert_eq!(
            countries[0],
            CountryCount { birth_country: "USA".into(), winner_count: 3 }
        );
        // Day-Lewis won twice but counts once.
        let uk = countries.iter().find(|c| c.birth_country == "United Kingdom").unwrap();
        assert_eq!(uk.winner_count, 1);
        assert!(countries.len() <= TOP_COUNTRIES_LIMIT as usize);
        assert!(countries.iter().all(|c| c.birth_country != "South Korea"));
    }

    #[test]
    fn test_staff_by_country() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let uk = staff_by_country(&conn, "united kingdom").unwrap();
        let names: Vec<&str> = uk.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Adele", "Christopher Nolan", "Daniel Day-Lewis", "Emma Thomas"]);

        let nolan = &uk[1];
        assert_eq!(nolan.categories, "Best Adapted Screenplay, Best Director");
        assert_eq!(nolan.nomination_count, 2);
        assert_eq!(nolan.oscar_count, 1);

        // Day-Lewis has two Best Actor nominations; the category appears once.
        assert_eq!(uk[2].categories, "Best Actor");
        assert_eq!(uk[2].nomination_count, 2);
    }

    #[test]
    fn test_staff_by_country_skips_unnominated() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let usa = staff_by_country(&conn, "USA").unwrap();
        assert!(!usa.is_empty());
        assert!(usa.iter().all(|s| s.name != "Tom Cruise"));
        assert!(staff_by_country(&conn, "Atlantis").unwrap().is_empty());
    }

    #[test]
    fn test_dream_team() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let team = dream_team(&conn).unwrap();
        let picks: Vec<(Role, &str, i64)> =
            team.iter().map(|p| (p.role, p.name.as_str(), p.oscar_count)).collect();
        assert_eq!(
            picks,
            vec![
                (Role::Director, "Bong Joon-ho", 4),
                (Role::Actor, "Daniel Day-Lewis", 2),
                (Role::Actress, "Michelle Yeoh", 1),
                (Role::Producer, "Emma Thomas", 1),
                (Role::Singer, "Billie Eilish", 2),
            ]
        );
    }

    #[test]
    fn test_dream_team_skips_the_dead() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        // Billy Wilder has more wins than anyone but is not alive.
        let director = best_living_in_role(&conn, Role::Director).unwrap().unwrap();
        assert_ne!(director.name, "Billy Wilder");
    }

    #[test]
    fn test_dream_team_tie_goes_to_lowest_id() {
        let (_dir, store) = test_store();
        let conn = store.conn().unwrap();
        conn.execute_batch(
            "INSERT INTO movies (id, title, release_year, language) VALUES (1, 'A', 2000, 'English');
             INSERT INTO staff (id, name, birth_country, role, is_alive) VALUES (5, 'Later', 'USA', 'singer', 1);
             INSERT INTO staff (id, name, birth_country, role, is_alive) VALUES (3, 'Earlier', 'USA', 'singer', 1);
             INSERT INTO oscars (staff_id, movie_id, category, year) VALUES (5, 1, 'Best Original Song', 2001);
             INSERT INTO oscars (staff_id, movie_id, category, year) VALUES (3, 1, 'Best Original Song', 2002);",
        )
        .unwrap();
        let pick = best_living_in_role(&conn, Role::Singer).unwrap().unwrap();
        assert_eq!(pick.name, "Earlier");
        assert!(best_living_in_role(&conn, Role::Producer).unwrap().is_none());
        assert_eq!(dream_team(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_top_production_companies() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let companies = top_production_companies(&conn).unwrap();
        let got: Vec<(&str, i64)> =
            companies.iter().map(|c| (c.name.as_str(), c.oscar_count)).collect();
        assert_eq!(
            got,
            vec![
                ("Universal Pictures", 6),
                ("Paramount Pictures", 5),
                ("Neon", 4),
                ("United Artists", 3),
                ("Warner Bros.", 3),
            ]
        );
    }

    #[test]
    fn test_non_english_winners_newest_first() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let winners = non_english_oscar_winners(&conn, "English").unwrap();
        assert!(winners.iter().all(|w| w.language != "English"));
        assert!(winners.windows(2).all(|w| w[0].year >= w[1].year));
        assert_eq!(winners[0].title, "All Quiet on the Western Front");
        assert_eq!(winners.last().unwrap().title, "Life Is Beautiful");
        assert_eq!(winners.iter().filter(|w| w.title == "Parasite").count(), 4);
        assert_eq!(winners.len(), 12);
    }

    #[test]
    fn test_non_english_respects_default_language() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let winners = non_english_oscar_winners(&conn, "korean").unwrap();
        assert!(winners.iter().all(|w| w.title != "Parasite"));
        assert!(winners.iter().any(|w| w.language == "English"));
    }

    #[test]
    fn test_staff_list_respects_limit() {
        let (_dir, store) = demo_store();
        let conn = store.conn().unwrap();
        let staff = staff_list(&conn, 20).unwrap();
        assert_eq!(staff.len(), 20);
        assert_eq!(staff[0].name, "Bong Joon-ho");
        assert_eq!(staff_list(&conn, 3).unwrap().len(), 3);
        assert_eq!(staff_list(&conn, 100).unwrap().len(), 23);
    }
}
