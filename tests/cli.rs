use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn oracle(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("awards-oracle").unwrap();
    cmd.env("HOME", home.path())
        .env("RUST_LOG", "off")
        .arg("--data-dir")
        .arg(home.path().join("data"));
    cmd
}

fn seeded() -> TempDir {
    let home = TempDir::new().unwrap();
    oracle(&home).arg("demo").assert().success();
    home
}

#[test]
fn init_creates_database() {
    let home = TempDir::new().unwrap();
    oracle(&home)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized awards-oracle at"));
    assert!(home.path().join("data").join("oracle.db").exists());
}

#[test]
fn status_without_database_suggests_init() {
    let home = TempDir::new().unwrap();
    oracle(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Run `awards-oracle init`"));
}

#[test]
fn demo_loads_once() {
    let home = TempDir::new().unwrap();
    oracle(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("Log in as 'demo'"));
    oracle(&home)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains("demo skipped"));
}

#[test]
fn status_counts_demo_rows() {
    let home = seeded();
    oracle(&home)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Staff:"))
        .stdout(predicate::str::contains("DB size:"));
}

#[test]
fn dream_team_plain_report() {
    let home = seeded();
    oracle(&home)
        .args(["report", "dream-team", "--plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Director: Bong Joon-ho: 4 Oscar(s)"));
}

#[test]
fn companies_report_table() {
    let home = seeded();
    oracle(&home)
        .args(["report", "companies"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Top Production Companies"))
        .stdout(predicate::str::contains("Universal Pictures"));
}

#[test]
fn by_country_requires_country() {
    let home = seeded();
    oracle(&home)
        .args(["report", "by-country"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error: Invalid input: --country is required"));
}

#[test]
fn unknown_staff_prints_empty_message() {
    let home = seeded();
    oracle(&home)
        .args(["report", "staff-stats", "--name", "Nobody Atall"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No information found for 'Nobody Atall'."));
}

#[test]
fn corrupt_database_reports_generic_error() {
    let home = TempDir::new().unwrap();
    let data = home.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(data.join("oracle.db"), vec![b'x'; 4096]).unwrap();

    for args in [&["report", "companies"][..], &["status"][..]] {
        oracle(&home)
            .args(args)
            .assert()
            .failure()
            .stderr(predicate::str::contains("Error: Database error. See the log for details."))
            .stderr(predicate::str::contains("Database error:").not())
            .stderr(predicate::str::contains("not a database").not());
    }
}
