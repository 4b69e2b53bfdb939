use std::sync::LazyLock;

use regex::Regex;

use crate::models::Record;

const UNKNOWN: &str = "Unknown";

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("valid regex")
});

pub fn validate_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// At least 8 characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password_strength(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(char::is_uppercase)
        && password.chars().any(char::is_lowercase)
        && password.chars().any(|c| c.is_ascii_digit())
}

fn field<'a>(rec: &'a Record, key: &str, default: &'a str) -> &'a str {
    rec.get(key).map(String::as_str).unwrap_or(default)
}

/// Cell value for a table column; missing keys render empty.
pub fn cell<'a>(rec: &'a Record, key: &str) -> &'a str {
    field(rec, key, "")
}

/// "nomination_count" -> "Nomination Count"
pub fn column_label(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// "Staff Name - Movie Title (Category)"
pub fn format_user_nomination(rec: &Record) -> String {
    format!(
        "{} - {} ({})",
        field(rec, "staff_name", UNKNOWN),
        field(rec, "movie_title", UNKNOWN),
        field(rec, "category", UNKNOWN),
    )
}

pub fn format_staff_stats(rec: &Record) -> String {
    format!(
        "{} ({}): {} nomination(s), {} Oscar(s)",
        field(rec, "name", UNKNOWN),
        field(rec, "role", "Staff"),
        field(rec, "nomination_count", "0"),
        field(rec, "oscar_count", "0"),
    )
}

/// One `(role, "Name: N Oscar(s)")` pair per pick, in input order.
pub fn format_dream_team(team: &[Record]) -> Vec<(String, String)> {
    team.iter()
        .map(|rec| {
            (
                field(rec, "role", UNKNOWN).to_string(),
                format!(
                    "{}: {} Oscar(s)",
                    field(rec, "name", UNKNOWN),
                    field(rec, "oscar_count", "0"),
                ),
            )
        })
        .collect()
}

/// "label: count" lines for the ranked reports.
pub fn format_top_items(items: &[Record], title_key: &str, count_key: &str) -> Vec<String> {
    items
        .iter()
        .map(|rec| {
            format!(
                "{}: {}",
                field(rec, title_key, UNKNOWN),
                field(rec, count_key, "0"),
            )
        })
        .collect()
}
