use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::app::role_label;
use crate::cli::ReportKind;
use crate::database::Database;
use crate::error::{OracleError, Result};
use crate::fmt::{cell, column_label, format_dream_team, format_staff_stats, format_top_items};
use crate::models::{to_records, Record, ToRecord, STAFF_COLUMNS};
use crate::settings::Settings;

#[derive(Debug, Default)]
pub struct ReportOptions {
    pub plain: bool,
    pub category: Option<String>,
    pub year: Option<i32>,
    pub name: Option<String>,
    pub country: Option<String>,
    pub limit: Option<u32>,
}

/// Rows plus how to show them: table columns and the keys for the plain
/// "label: count" form.
struct Rendered {
    title: String,
    columns: &'static [&'static str],
    rows: Vec<Record>,
    label_key: &'static str,
    count_key: &'static str,
    empty: String,
}

fn required<'a>(value: &'a Option<String>, flag: &str, kind: &str) -> Result<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| OracleError::Invalid(format!("{flag} is required for {kind}")))
}

fn build(db: &Database, kind: ReportKind, opts: &ReportOptions) -> Result<Rendered> {
    let rendered = match kind {
        ReportKind::TopMovies => {
            let category = opts.category.as_deref().map(str::trim).filter(|c| !c.is_empty());
            let mut title = "Top Nominated Movies".to_string();
            if let Some(c) = category {
                title.push_str(&format!(" in category '{c}'"));
            }
            if let Some(y) = opts.year {
                title.push_str(&format!(" from year {y}"));
            }
            Rendered {
                title,
                columns: &["title", "nomination_count"],
                rows: to_records(&db.top_nominated_movies(category, opts.year)?),
                label_key: "title",
                count_key: "nomination_count",
                empty: "No movies found matching your criteria.".to_string(),
            }
        }
        ReportKind::StaffStats => {
            let name = required(&opts.name, "--name", "staff-stats")?;
            let rows = db
                .staff_stats_by_name(name)?
                .map(|stats| vec![stats.to_record()])
                .unwrap_or_default();
            Rendered {
                title: format!("Statistics for {name}"),
                columns: &["name", "role", "nomination_count", "oscar_count"],
                rows,
                label_key: "name",
                count_key: "nomination_count",
                empty: format!("No information found for '{name}'."),
            }
        }
        ReportKind::ActorCountries => Rendered {
            title: "Top Best Actor Birth Countries".to_string(),
            columns: &["birth_country", "winner_count"],
            rows: to_records(&db.top_actor_birth_countries()?),
            label_key: "birth_country",
            count_key: "winner_count",
            empty: "No data available for actor birth countries.".to_string(),
        },
        ReportKind::ByCountry => {
            let country = required(&opts.country, "--country", "by-country")?;
            Rendered {
                title: format!("Nominated Staff from {country}"),
                columns: &["name", "categories", "nomination_count", "oscar_count"],
                rows: to_records(&db.staff_by_country(country)?),
                label_key: "name",
                count_key: "nomination_count",
                empty: format!("No nominated staff found from {country}."),
            }
        }
        ReportKind::DreamTeam => Rendered {
            title: "The Dream Team".to_string(),
            columns: &["role", "name", "oscar_count"],
            rows: to_records(&db.dream_team()?),
            label_key: "role",
            count_key: "oscar_count",
            empty: "Could not determine dream team.".to_string(),
        },
        ReportKind::Companies => Rendered {
            title: "Top Production Companies".to_string(),
            columns: &["name", "oscar_count"],
            rows: to_records(&db.top_production_companies()?),
            label_key: "name",
            count_key: "oscar_count",
            empty: "No data available for production companies.".to_string(),
        },
        ReportKind::NonEnglish => Rendered {
            title: "Non-English Oscar Winners".to_string(),
            columns: &["title", "language", "year", "category"],
            rows: to_records(&db.non_english_oscar_winners()?),
            label_key: "title",
            count_key: "year",
            empty: "No non-English Oscar winners found.".to_string(),
        },
        ReportKind::StaffList => Rendered {
            title: "Staff".to_string(),
            columns: STAFF_COLUMNS,
            rows: to_records(&db.staff_list(opts.limit)?),
            label_key: "name",
            count_key: "role",
            empty: "No staff members found.".to_string(),
        },
    };
    Ok(rendered)
}

pub fn run(settings: &Settings, kind: ReportKind, opts: &ReportOptions) -> Result<()> {
    let report = Database::open(settings)
        .and_then(|db| build(&db, kind, opts))
        .map_err(OracleError::redacted)?;
    if report.rows.is_empty() {
        println!("{}", report.empty);
        return Ok(());
    }

    if opts.plain {
        let lines: Vec<String> = match kind {
            ReportKind::DreamTeam => format_dream_team(&report.rows)
                .into_iter()
                .map(|(role, person)| format!("{}: {person}", role_label(&role)))
                .collect(),
            ReportKind::StaffStats => report.rows.iter().map(format_staff_stats).collect(),
            _ => format_top_items(&report.rows, report.label_key, report.count_key),
        };
        for line in lines {
            println!("{line}");
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(report.columns.iter().map(|c| column_label(c)).collect::<Vec<_>>());
    for rec in &report.rows {
        table.add_row(
            report
                .columns
                .iter()
                .map(|c| Cell::new(cell(rec, c)))
                .collect::<Vec<_>>(),
        );
    }
    println!("{}\n{table}", report.title.bold());
    Ok(())
}
