use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use chrono::{Local, NaiveDate};
use zeroize::{Zeroize, Zeroizing};

use crate::auth::hash_password;
use crate::database::Database;
use crate::error::{FailureKind, OracleError, Result, DB_ERROR_STATUS};
use crate::fmt::{
    format_dream_team, format_staff_stats, format_user_nomination, validate_email,
    validate_password_strength,
};
use crate::models::{
    is_award_category, to_records, NewUser, Record, Role, ToRecord, User, UserNominationView,
    STAFF_COLUMNS,
};

/// A result handed back from a background unit, applied on the interaction thread.
type Completion = Box<dyn FnOnce(&mut App) + Send>;

#[derive(Debug, Clone)]
pub enum Session {
    LoggedOut,
    LoggedIn(User),
}

/// What the results area shows. Exactly one of table or text at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Empty,
    Table {
        columns: Vec<String>,
        rows: Vec<Record>,
    },
    Text(String),
}

/// A blocking message the user has to dismiss.
#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

/// Menu entries, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Login,
    Logout,
    Register,
    AddNomination,
    MyNominations,
    TopMovies,
    StaffStats,
    TopActorCountries,
    StaffByCountry,
    DreamTeam,
    TopCompanies,
    NonEnglishWinners,
    StaffList,
}

impl Action {
    pub const MENU: [Action; 12] = [
        Action::Login,
        Action::Register,
        Action::AddNomination,
        Action::MyNominations,
        Action::TopMovies,
        Action::StaffStats,
        Action::TopActorCountries,
        Action::StaffByCountry,
        Action::DreamTeam,
        Action::TopCompanies,
        Action::NonEnglishWinners,
        Action::StaffList,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Action::Login => "Log in",
            Action::Logout => "Log out",
            Action::Register => "Register",
            Action::AddNomination => "Add a nomination",
            Action::MyNominations => "View my nominations",
            Action::TopMovies => "Top nominated movies",
            Action::StaffStats => "Staff statistics",
            Action::TopActorCountries => "Top Best Actor birth countries",
            Action::StaffByCountry => "Nominated staff by country",
            Action::DreamTeam => "Dream team",
            Action::TopCompanies => "Top production companies",
            Action::NonEnglishWinners => "Non-English Oscar winners",
            Action::StaffList => "Staff list",
        }
    }
}

/// Registration form contents. Password fields are wiped on drop.
#[derive(Default)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub birth_date: String,
    pub gender: String,
    pub country: String,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.password.zeroize();
        self.confirm.zeroize();
    }
}

/// Interaction-thread state plus the channel background units report on.
pub struct App {
    db: Arc<Database>,
    session: Session,
    output: Output,
    status: String,
    notice: Option<Notice>,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    in_flight: usize,
    clock: fn() -> NaiveDate,
}

/// "director" -> "Director"; unknown roles pass through.
pub fn role_label(role: &str) -> &str {
    Role::parse(role).map(Role::label).unwrap_or(role)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl App {
    pub fn new(db: Arc<Database>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            db,
            session: Session::LoggedOut,
            output: Output::Empty,
            status: "Ready".to_string(),
            notice: None,
            tx,
            rx,
            in_flight: 0,
            clock: today,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&User> {
        match &self.session {
            Session::LoggedIn(user) => Some(user),
            Session::LoggedOut => None,
        }
    }

    pub fn session_label(&self) -> String {
        match &self.session {
            Session::LoggedIn(user) => format!("Logged in as: {}", user.username),
            Session::LoggedOut => "Not logged in".to_string(),
        }
    }

    pub fn output(&self) -> &Output {
        &self.output
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight > 0
    }

    /// Apply every completion that has arrived, in arrival order. Never blocks.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(done) = self.rx.try_recv() {
            self.finish(done);
            applied += 1;
        }
        applied
    }

    /// Block until every in-flight unit has reported back and been applied.
    pub fn wait_idle(&mut self) {
        while self.in_flight > 0 {
            match self.rx.recv() {
                Ok(done) => self.finish(done),
                Err(_) => break,
            }
        }
    }

    fn finish(&mut self, done: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);
        done(self);
    }

    fn spawn<T, W, R>(&mut self, label: &'static str, work: W, render: R)
    where
        T: Send + 'static,
        W: FnOnce(&Database) -> T + Send + 'static,
        R: FnOnce(&mut App, T) + Send + 'static,
    {
        self.in_flight += 1;
        let db = Arc::clone(&self.db);
        let tx = self.tx.clone();
        log::debug!("dispatching {label} ({} in flight)", self.in_flight);
        thread::spawn(move || {
            let done: Completion = match panic::catch_unwind(AssertUnwindSafe(|| work(&db))) {
                Ok(value) => Box::new(move |app: &mut App| render(app, value)),
                Err(_) => {
                    log::error!("{label} panicked in background");
                    Box::new(|app: &mut App| app.status = "Unexpected error.".to_string())
                }
            };
            if tx.send(done).is_err() {
                log::debug!("{label} finished after the app closed");
            }
        });
    }

    fn show_notice(&mut self, title: &str, message: impl Into<String>) {
        self.notice = Some(Notice {
            title: title.to_string(),
            message: message.into(),
        });
    }

    fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn show_table<T: ToRecord>(&mut self, columns: &[&str], rows: &[T]) {
        self.output = Output::Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: to_records(rows),
        };
    }

    fn show_text(&mut self, text: impl Into<String>) {
        self.output = Output::Text(text.into());
    }

    /// Start an action: drop the previous output and announce progress.
    fn begin(&mut self, status: impl Into<String>) {
        self.output = Output::Empty;
        self.set_status(status);
    }

    /// Render a list result: the table, or the empty-result text. Store
    /// failures fall back to the empty text with a generic status line.
    fn render_rows<T: ToRecord>(
        &mut self,
        rows: Result<Vec<T>>,
        columns: &[&str],
        empty_text: &str,
        empty_status: &str,
        found_status: impl FnOnce(usize) -> String,
    ) {
        match rows {
            Ok(rows) if !rows.is_empty() => {
                self.show_table(columns, &rows);
                self.set_status(found_status(rows.len()));
            }
            Ok(_) => {
                self.show_text(empty_text);
                self.set_status(empty_status);
            }
            Err(_) => {
                self.show_text(empty_text);
                self.set_status(DB_ERROR_STATUS);
            }
        }
    }

    fn require_login(&mut self, message: &str) -> Option<i64> {
        match self.current_user() {
            Some(user) => Some(user.id),
            None => {
                self.show_notice("Login Required", message);
                None
            }
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn login(&mut self, username: &str, password: Zeroizing<String>) {
        let username = username.trim().to_string();
        if username.is_empty() || password.is_empty() {
            self.show_notice("Error", "Please enter both username and password");
            return;
        }
        self.set_status(format!("Logging in as {username}..."));
        let name = username.clone();
        self.spawn(
            "login",
            move |db| db.authenticate(&name, &password),
            move |app, found| match found {
                Ok(Some(user)) => {
                    log::info!("user {} logged in", user.username);
                    app.set_status(format!("Logged in as: {}", user.username));
                    app.session = Session::LoggedIn(user);
                }
                Ok(None) => {
                    app.set_status("Login failed.");
                    app.show_notice("Login Failed", "Invalid username or password.");
                }
                Err(_) => {
                    app.set_status(DB_ERROR_STATUS);
                    app.show_notice("Error", "Could not log in. Please try again.");
                }
            },
        );
    }

    pub fn logout(&mut self) {
        if let Session::LoggedIn(user) = &self.session {
            log::info!("user {} logged out", user.username);
        }
        self.session = Session::LoggedOut;
        self.output = Output::Empty;
        self.set_status("Logged out.");
    }

    /// Validate the form on the interaction thread, then hash and store in
    /// the background. Returns `false` when validation rejected the form.
    pub fn register(&mut self, mut form: Registration) -> bool {
        if self.current_user().is_some() {
            self.show_notice(
                "Already Logged In",
                "You are already logged in. Log out to register a new user.",
            );
            return false;
        }
        let user = match self.validate_registration(&form) {
            Ok(user) => user,
            Err(message) => {
                self.show_notice("Error", message);
                return false;
            }
        };
        let password = Zeroizing::new(std::mem::take(&mut form.password));
        drop(form);

        let today = (self.clock)();
        self.set_status(format!("Registering {}...", user.username));
        self.spawn(
            "register",
            move |db| -> Result<i64> {
                let user = NewUser {
                    password_hash: Some(hash_password(&password)?),
                    ..user
                };
                db.register_user_on(&user, today)
            },
            |app, outcome| match outcome {
                Ok(_) => {
                    app.set_status("Registration complete.");
                    app.show_notice("Success", "User registered successfully. You can now log in.");
                }
                Err(e) => {
                    if e.kind() == FailureKind::Constraint {
                        app.set_status("Registration failed.");
                    } else {
                        app.set_status(DB_ERROR_STATUS);
                    }
                    app.show_notice("Error", "Failed to register user. Please try again.");
                }
            },
        );
        true
    }

    fn validate_registration(&self, form: &Registration) -> std::result::Result<NewUser, String> {
        let required = [
            &form.username,
            &form.email,
            &form.password,
            &form.confirm,
            &form.birth_date,
            &form.gender,
            &form.country,
        ];
        if required.iter().any(|v| v.trim().is_empty()) {
            return Err("All fields are required".to_string());
        }
        if form.password != form.confirm {
            return Err("Passwords do not match".to_string());
        }
        if !validate_email(form.email.trim()) {
            return Err("Invalid email format".to_string());
        }
        if !validate_password_strength(&form.password) {
            return Err(
                "Password must be at least 8 characters with 1 uppercase, 1 lowercase, and 1 number"
                    .to_string(),
            );
        }
        let birth_date = NaiveDate::parse_from_str(form.birth_date.trim(), "%Y-%m-%d")
            .map_err(|_| "Birth date must be in YYYY-MM-DD format".to_string())?;
        if birth_date > (self.clock)() {
            return Err("Birth date cannot be in the future".to_string());
        }
        Ok(NewUser {
            username: form.username.trim().to_string(),
            email: form.email.trim().to_string(),
            birth_date,
            gender: form.gender.trim().to_string(),
            country: form.country.trim().to_string(),
            password_hash: None,
        })
    }

    // -----------------------------------------------------------------------
    // Nominations
    // -----------------------------------------------------------------------

    /// Returns `false` when the request was refused before dispatch.
    pub fn add_nomination(&mut self, staff_name: &str, movie_title: &str, category: &str) -> bool {
        let Some(user_id) = self.require_login("Please login to add a nomination") else {
            return false;
        };
        let (staff, movie, category) = (
            staff_name.trim().to_string(),
            movie_title.trim().to_string(),
            category.trim().to_string(),
        );
        if staff.is_empty() || movie.is_empty() || category.is_empty() {
            self.show_notice("Error", "All fields are required");
            return false;
        }
        if !is_award_category(&category) {
            self.show_notice("Error", format!("'{category}' is not an award category"));
            return false;
        }

        self.set_status(format!("Submitting nomination: {staff} for {movie}..."));
        self.spawn(
            "add nomination",
            move |db| -> Result<UserNominationView> {
                let person = db
                    .find_staff_by_name(&staff)?
                    .ok_or_else(|| OracleError::NotFound(format!("No staff member named '{staff}'.")))?;
                let film = db
                    .find_movie_by_title(&movie)?
                    .ok_or_else(|| OracleError::NotFound(format!("No movie titled '{movie}'.")))?;
                let added = db.add_nomination(user_id, person.id, film.id, &category)?;
                Ok(UserNominationView {
                    id: added.id,
                    staff_name: person.name,
                    movie_title: film.title,
                    category: added.category,
                })
            },
            |app, outcome| match outcome {
                Ok(view) => {
                    app.show_notice(
                        "Success",
                        format!(
                            "Nomination recorded: {} for {} in category {}",
                            view.staff_name, view.movie_title, view.category
                        ),
                    );
                    app.set_status(format!(
                        "Nomination added: {}",
                        format_user_nomination(&view.to_record())
                    ));
                }
                Err(OracleError::NotFound(message)) => {
                    app.set_status("Nomination not recorded.");
                    app.show_notice("Not Found", message);
                }
                Err(_) => {
                    app.set_status(DB_ERROR_STATUS);
                    app.show_notice("Error", "Failed to record nomination. Please try again.");
                }
            },
        );
        true
    }

    pub fn view_my_nominations(&mut self) {
        let Some(user_id) = self.require_login("Please login to view your nominations") else {
            return;
        };
        self.begin("Fetching your nominations...");
        self.spawn(
            "user nominations",
            move |db| db.user_nominations(user_id),
            |app, rows| {
                app.render_rows(
                    rows,
                    &["id", "staff_name", "movie_title", "category"],
                    "You haven't made any nominations yet.",
                    "No nominations found.",
                    |n| format!("Found {n} nomination(s)."),
                )
            },
        );
    }

    // -----------------------------------------------------------------------
    // Reports
    // -----------------------------------------------------------------------

    /// Both filters are optional; a blank category or a non-numeric year
    /// means "any".
    pub fn view_top_movies(&mut self, category: &str, year: &str) {
        let category = Some(category.trim().to_string()).filter(|c| !c.is_empty());
        let year_text = year.trim();
        let year: Option<i32> = if !year_text.is_empty() && year_text.chars().all(|c| c.is_ascii_digit()) {
            year_text.parse().ok()
        } else {
            None
        };

        self.begin("Searching for top nominated movies...");
        let filter = category.clone();
        self.spawn(
            "top nominated movies",
            move |db| db.top_nominated_movies(filter.as_deref(), year),
            move |app, rows| {
                let mut filter_text = String::new();
                if let Some(c) = &category {
                    filter_text.push_str(&format!(" in category '{c}'"));
                }
                if let Some(y) = year {
                    filter_text.push_str(&format!(" from year {y}"));
                }
                app.render_rows(
                    rows,
                    &["title", "nomination_count"],
                    "No movies found matching your criteria.",
                    "No movies found.",
                    |n| format!("Found {n} top nominated movies{filter_text}."),
                )
            },
        );
    }

    pub fn view_staff_stats(&mut self, staff_name: &str) {
        let name = staff_name.trim().to_string();
        if name.is_empty() {
            return;
        }
        self.begin(format!("Searching for stats on {name}..."));
        let query = name.clone();
        self.spawn(
            "staff stats",
            move |db| db.staff_stats_by_name(&query),
            move |app, stats| {
                let missing = format!("No information found for '{name}'.");
                match stats {
                    Ok(Some(stats)) => {
                        app.show_text(format_staff_stats(&stats.to_record()));
                        app.set_status(format!("Displaying statistics for {name}"));
                    }
                    Ok(None) => {
                        app.show_text(missing.clone());
                        app.set_status(missing);
                    }
                    Err(_) => {
                        app.show_text(missing);
                        app.set_status(DB_ERROR_STATUS);
                    }
                }
            },
        );
    }

    pub fn view_top_actor_countries(&mut self) {
        self.begin("Fetching top actor birth countries...");
        self.spawn(
            "top actor birth countries",
            |db| db.top_actor_birth_countries(),
            |app, rows| {
                app.render_rows(
                    rows,
                    &["birth_country", "winner_count"],
                    "No data available for actor birth countries.",
                    "No data available.",
                    |_| "Displaying top actor birth countries.".to_string(),
                )
            },
        );
    }

    pub fn view_staff_by_country(&mut self, country: &str) {
        let country = country.trim().to_string();
        if country.is_empty() {
            return;
        }
        self.begin(format!("Searching for staff from {country}..."));
        let query = country.clone();
        self.spawn(
            "staff by country",
            move |db| db.staff_by_country(&query),
            move |app, rows| {
                app.render_rows(
                    rows,
                    &["name", "categories", "nomination_count", "oscar_count"],
                    &format!("No nominated staff found from {country}."),
                    &format!("No staff found from {country}."),
                    |n| format!("Found {n} staff members from {country}."),
                )
            },
        );
    }

    pub fn view_dream_team(&mut self) {
        self.begin("Calculating dream team...");
        self.spawn(
            "dream team",
            |db| db.dream_team(),
            |app, team| match team {
                Ok(team) if !team.is_empty() => {
                    let mut text = String::from("THE DREAM TEAM\n\n");
                    for (role, person) in format_dream_team(&to_records(&team)) {
                        text.push_str(&format!("{}: {person}\n", role_label(&role)));
                    }
                    app.show_text(text);
                    app.set_status("Dream team calculated successfully.");
                }
                Ok(_) => {
                    app.show_text("Could not determine dream team.");
                    app.set_status("Dream team calculation failed.");
                }
                Err(_) => {
                    app.show_text("Could not determine dream team.");
                    app.set_status(DB_ERROR_STATUS);
                }
            },
        );
    }

    pub fn view_top_companies(&mut self) {
        self.begin("Fetching top production companies...");
        self.spawn(
            "top production companies",
            |db| db.top_production_companies(),
            |app, rows| {
                app.render_rows(
                    rows,
                    &["name", "oscar_count"],
                    "No data available for production companies.",
                    "No data available.",
                    |_| "Displaying top production companies by Oscar wins.".to_string(),
                )
            },
        );
    }

    pub fn view_non_english_winners(&mut self) {
        self.begin("Fetching non-English Oscar winners...");
        self.spawn(
            "non-English winners",
            |db| db.non_english_oscar_winners(),
            |app, rows| {
                app.render_rows(
                    rows,
                    &["title", "language", "year", "category"],
                    "No non-English Oscar winners found.",
                    "No non-English winners found.",
                    |n| format!("Found {n} non-English Oscar-winning movies."),
                )
            },
        );
    }

    pub fn view_staff_list(&mut self) {
        self.begin("Fetching staff list...");
        self.spawn(
            "staff list",
            |db| db.staff_list(None),
            |app, rows| {
                app.render_rows(
                    rows,
                    STAFF_COLUMNS,
                    "No staff members found.",
                    "No staff found.",
                    |n| format!("Found {n} staff members."),
                )
            },
        );
    }
}
