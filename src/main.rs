mod app;
mod auth;
mod cli;
mod database;
mod db;
mod error;
mod fmt;
mod models;
mod nominations;
mod reports;
mod settings;
mod tui;
mod users;

use std::fs::OpenOptions;

use clap::Parser;

use cli::report::ReportOptions;
use cli::{Cli, Commands};
use settings::{resolve_settings, Settings};

/// Send log output to the data directory's log file; the dashboard owns the
/// terminal. Falls back to stderr when the file can't be opened.
fn init_logging(settings: &Settings) {
    let env = env_logger::Env::default().default_filter_or(settings.log_level.as_str());
    let mut builder = env_logger::Builder::from_env(env);

    let file = std::fs::create_dir_all(settings.data_path()).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(settings.log_path())
    });
    if let Ok(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    let _ = builder.try_init();
}

fn main() {
    let cli = Cli::parse();
    let settings = resolve_settings(cli.data_dir.as_deref());
    init_logging(&settings);

    let result = match cli.command {
        None => cli::dashboard::run(&settings),
        Some(Commands::Init) => cli::init::run(cli.data_dir.as_deref()),
        Some(Commands::Demo) => cli::demo::run(&settings),
        Some(Commands::Status) => cli::status::run(&settings),
        Some(Commands::Report {
            kind,
            plain,
            category,
            year,
            name,
            country,
            limit,
        }) => {
            let opts = ReportOptions {
                plain,
                category,
                year,
                name,
                country,
                limit,
            };
            cli::report::run(&settings, kind, &opts)
        }
    };

    if let Err(e) = result {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
