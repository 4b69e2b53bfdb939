use crate::database::Database;
use crate::error::{OracleError, Result};
use crate::settings::Settings;

const COUNTED_TABLES: &[(&str, &str)] = &[
    ("Users:", "users"),
    ("Movies:", "movies"),
    ("Staff:", "staff"),
    ("Nominations:", "nominations"),
    ("Oscars:", "oscars"),
    ("Companies:", "production_companies"),
    ("User picks:", "user_nominations"),
];

pub fn run(settings: &Settings) -> Result<()> {
    let db_path = settings.db_path();

    println!("Data dir:   {}", settings.data_path().display());
    println!("Database:   {}", db_path.display());
    println!("Log file:   {}", settings.log_path().display());

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `awards-oracle init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {size} bytes");

    let counts = row_counts(settings).map_err(OracleError::redacted)?;
    println!();
    for (label, count) in counts {
        println!("{label:<14}{count}");
    }
    Ok(())
}

fn row_counts(settings: &Settings) -> Result<Vec<(&'static str, i64)>> {
    let db = Database::open(settings)?;
    let conn = db.store().conn()?;
    COUNTED_TABLES
        .iter()
        .map(|(label, table)| -> Result<(&'static str, i64)> {
            let count = conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |r| r.get(0))?;
            Ok((*label, count))
        })
        .collect()
}
