use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use rand::seq::SliceRandom;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use zeroize::Zeroizing;

use crate::app::{Action, App, Output, Registration, Session};
use crate::cli::form::{Form, FormAction, FormKind};
use crate::database::Database;
use crate::error::{Result, DB_ERROR_STATUS};
use crate::fmt::{cell, column_label};
use crate::settings::Settings;
use crate::tui::{
    centered, rule, wrap_text, BORDER_STYLE, ERROR_STYLE, FOOTER_STYLE, HEADER_STYLE,
    SELECTED_STYLE, STATUS_STYLE,
};

const TITLE: &str = "Movie Awards Oracle";

const GREETINGS: &[&str] = &[
    "And the nominees are...",
    "Lights, camera, statistics.",
    "The envelope, please.",
    "Popcorn's ready.",
    "Red carpet's rolled out.",
    "Quiet on set.",
    "Who's taking home the gold this year?",
    "Roll the credits.",
];

const MENU_WIDTH: u16 = 34;
const TICK: Duration = Duration::from_millis(100);

struct Dashboard {
    app: App,
    greeting: String,
    menu_selection: usize,
    form: Option<Form>,
    scroll: usize,
}

impl Dashboard {
    fn new(app: App) -> Self {
        let mut rng = rand::thread_rng();
        let greeting = GREETINGS
            .choose(&mut rng)
            .unwrap_or(&"Welcome.")
            .to_string();
        Self {
            app,
            greeting,
            menu_selection: 0,
            form: None,
            scroll: 0,
        }
    }

    fn logged_in(&self) -> bool {
        matches!(self.app.session(), Session::LoggedIn(_))
    }

    /// The login entry doubles as log out once a session is open.
    fn menu_action(&self, idx: usize) -> Action {
        match Action::MENU[idx] {
            Action::Login if self.logged_in() => Action::Logout,
            action => action,
        }
    }

    fn select(&mut self, action: Action) {
        self.scroll = 0;
        match action {
            Action::Login => self.form = Some(Form::new(FormKind::Login)),
            Action::Logout => self.app.logout(),
            Action::Register => self.form = Some(Form::new(FormKind::Register)),
            Action::AddNomination => {
                if self.logged_in() {
                    self.form = Some(Form::new(FormKind::Nomination));
                } else {
                    // Shows the login-required notice without dispatching.
                    self.app.add_nomination("", "", "");
                }
            }
            Action::MyNominations => self.app.view_my_nominations(),
            Action::TopMovies => self.form = Some(Form::new(FormKind::TopMovies)),
            Action::StaffStats => self.form = Some(Form::new(FormKind::StaffStats)),
            Action::TopActorCountries => self.app.view_top_actor_countries(),
            Action::StaffByCountry => self.form = Some(Form::new(FormKind::StaffByCountry)),
            Action::DreamTeam => self.app.view_dream_team(),
            Action::TopCompanies => self.app.view_top_companies(),
            Action::NonEnglishWinners => self.app.view_non_english_winners(),
            Action::StaffList => self.app.view_staff_list(),
        }
    }

    /// Hand a submitted form to the controller. A refused nomination keeps
    /// its form open for correction.
    fn submit(&mut self, mut form: Form) {
        match form.kind() {
            FormKind::Login => {
                let username = form.take_value(0);
                let password = Zeroizing::new(form.take_value(1));
                self.app.login(&username, password);
            }
            FormKind::Register => {
                let registration = Registration {
                    username: form.take_value(0),
                    email: form.take_value(1),
                    password: form.take_value(2),
                    confirm: form.take_value(3),
                    birth_date: form.take_value(4),
                    gender: form.take_value(5),
                    country: form.take_value(6),
                };
                self.app.register(registration);
            }
            FormKind::Nomination => {
                let accepted = self
                    .app
                    .add_nomination(form.value(0), form.value(1), form.value(2));
                if !accepted {
                    self.form = Some(form);
                }
            }
            FormKind::TopMovies => {
                self.app.view_top_movies(form.value(0), form.value(1));
            }
            FormKind::StaffStats => {
                self.app.view_staff_stats(form.value(0));
            }
            FormKind::StaffByCountry => {
                self.app.view_staff_by_country(form.value(0));
            }
        }
    }

    /// Returns true when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.app.notice().is_some() {
            if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                self.app.dismiss_notice();
            }
            return false;
        }

        if let Some(mut form) = self.form.take() {
            match form.handle_key(code) {
                FormAction::Continue => self.form = Some(form),
                FormAction::Cancel => {}
                FormAction::Submit => {
                    self.scroll = 0;
                    self.submit(form);
                }
            }
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => self.menu_selection = self.menu_selection.saturating_sub(1),
            KeyCode::Down => {
                self.menu_selection = (self.menu_selection + 1).min(Action::MENU.len() - 1)
            }
            KeyCode::Enter => self.select(self.menu_action(self.menu_selection)),
            KeyCode::PageDown => self.scroll += 10,
            KeyCode::PageUp => self.scroll = self.scroll.saturating_sub(10),
            _ => {}
        }
        false
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let [header_area, sep1, body_area, sep2, status_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        let [title_area, session_area] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(40)]).areas(header_area);
        frame.render_widget(
            Paragraph::new(format!(" {TITLE}: {}", self.greeting)).style(HEADER_STYLE),
            title_area,
        );
        frame.render_widget(
            Paragraph::new(format!("{} ", self.app.session_label()))
                .alignment(ratatui::layout::Alignment::Right)
                .style(FOOTER_STYLE),
            session_area,
        );

        let sep = Paragraph::new(rule(area.width)).style(BORDER_STYLE);
        frame.render_widget(sep.clone(), sep1);
        frame.render_widget(sep, sep2);

        let [menu_area, results_area] =
            Layout::horizontal([Constraint::Length(MENU_WIDTH), Constraint::Fill(1)])
                .areas(body_area);
        self.draw_menu(frame, menu_area);
        self.draw_results(frame, results_area);

        let busy = if self.app.is_busy() { " ..." } else { "" };
        let status_style = if self.app.status() == DB_ERROR_STATUS {
            ERROR_STYLE
        } else {
            STATUS_STYLE
        };
        frame.render_widget(
            Paragraph::new(format!(" {}{busy}", self.app.status())).style(status_style),
            status_area,
        );
        frame.render_widget(
            Paragraph::new(" Up/Down=navigate  Enter=select  PgUp/PgDn=scroll  q=quit")
                .style(FOOTER_STYLE),
            hints_area,
        );

        if let Some(form) = &self.form {
            form.draw(frame);
        }
        if let Some(notice) = self.app.notice() {
            draw_notice(frame, &notice.title, &notice.message);
        }
    }

    fn draw_menu(&self, frame: &mut Frame, area: Rect) {
        let mut lines = vec![Line::from(Span::styled(
            " What would you like to do?",
            Style::default().add_modifier(Modifier::BOLD),
        ))];
        for idx in 0..Action::MENU.len() {
            let label = self.menu_action(idx).label();
            let line = if idx == self.menu_selection {
                Line::from(Span::styled(format!(" > {label}"), SELECTED_STYLE))
            } else {
                Line::from(format!("   {label}"))
            };
            lines.push(line);
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(Span::styled(" Results ", HEADER_STYLE))
            .borders(Borders::LEFT)
            .border_style(BORDER_STYLE);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        match self.app.output() {
            Output::Empty => {}
            Output::Text(text) => {
                let (wrapped, _) = wrap_text(text, inner.width.saturating_sub(2) as usize);
                let lines: Vec<Line> = wrapped
                    .lines()
                    .skip(self.scroll)
                    .map(|l| Line::from(format!(" {l}")))
                    .collect();
                frame.render_widget(Paragraph::new(lines), inner);
            }
            Output::Table { columns, rows } => {
                let header = Row::new(
                    columns
                        .iter()
                        .map(|c| Cell::from(column_label(c)))
                        .collect::<Vec<_>>(),
                )
                .style(HEADER_STYLE);
                let body: Vec<Row> = rows
                    .iter()
                    .skip(self.scroll)
                    .map(|rec| {
                        Row::new(
                            columns
                                .iter()
                                .map(|c| Cell::from(cell(rec, c).to_string()))
                                .collect::<Vec<_>>(),
                        )
                    })
                    .collect();
                let widths = vec![Constraint::Fill(1); columns.len()];
                frame.render_widget(Table::new(body, widths).header(header).column_spacing(2), inner);
            }
        }
    }
}

fn draw_notice(frame: &mut Frame, title: &str, message: &str) {
    let width = 56u16;
    let (wrapped, lines) = wrap_text(message, (width - 4) as usize);
    let popup = centered(frame.area(), width, lines + 4);
    frame.render_widget(Clear, popup);
    let block = Block::default()
        .title(Span::styled(format!(" {title} "), HEADER_STYLE))
        .borders(Borders::ALL)
        .border_style(BORDER_STYLE);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [text_area, hint_area] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).areas(inner);
    let text: Vec<Line> = wrapped.lines().map(|l| Line::from(format!(" {l}"))).collect();
    frame.render_widget(Paragraph::new(text), text_area);
    frame.render_widget(
        Paragraph::new(" Enter=OK").style(FOOTER_STYLE),
        hint_area,
    );
}

/// Run the interactive dashboard until the user quits.
pub fn run(settings: &Settings) -> Result<()> {
    let db = Arc::new(Database::open(settings)?);
    let mut dashboard = Dashboard::new(App::new(Arc::clone(&db)));
    log::info!("dashboard started");

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();

    let result: Result<()> = loop {
        dashboard.app.pump();

        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }

        match event::poll(TICK) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => break Err(e.into()),
        }

        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                if dashboard.handle_key(key.code) {
                    break Ok(());
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    log::info!(
        "dashboard closed ({} store connections opened)",
        db.store().connections_opened()
    );
    result
}
