pub mod dashboard;
pub mod demo;
pub mod form;
pub mod init;
pub mod report;
pub mod status;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "awards-oracle",
    about = "Film-award nominations and statistics in the terminal."
)]
pub struct Cli {
    /// Data directory (default: ~/Documents/awards-oracle). Saved by `init`,
    /// otherwise used for this run only.
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and save `--data-dir` as the default.
    Init,
    /// Load a sample catalogue and a demo login.
    Demo,
    /// Show the current database and row counts.
    Status,
    /// Print a report.
    Report {
        #[arg(value_enum)]
        kind: ReportKind,
        /// Print "label: count" lines instead of a table
        #[arg(long)]
        plain: bool,
        /// Category filter for top-movies
        #[arg(long)]
        category: Option<String>,
        /// Release-year filter for top-movies
        #[arg(long)]
        year: Option<i32>,
        /// Staff name for staff-stats
        #[arg(long)]
        name: Option<String>,
        /// Birth country for by-country
        #[arg(long)]
        country: Option<String>,
        /// Row limit for staff-list
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    /// Movies with the most user nominations
    TopMovies,
    /// Nomination and Oscar totals for one staff member
    StaffStats,
    /// Birth countries of Best Actor winners
    ActorCountries,
    /// Nominated staff born in a country
    ByCountry,
    /// Best living staff member per role
    DreamTeam,
    /// Production companies by Oscars won
    Companies,
    /// Oscar winners not in the default language
    NonEnglish,
    /// Staff members
    StaffList,
}
