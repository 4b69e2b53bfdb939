use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::models::AWARD_CATEGORIES;
use crate::tui::{centered, BORDER_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE};

const LABEL_WIDTH: u16 = 22;
const FORM_WIDTH: u16 = 64;

/// Category choices for the top-movies filter; the blank entry means "any".
const CATEGORY_FILTER: [&str; 11] = [
    "",
    AWARD_CATEGORIES[0],
    AWARD_CATEGORIES[1],
    AWARD_CATEGORIES[2],
    AWARD_CATEGORIES[3],
    AWARD_CATEGORIES[4],
    AWARD_CATEGORIES[5],
    AWARD_CATEGORIES[6],
    AWARD_CATEGORIES[7],
    AWARD_CATEGORIES[8],
    AWARD_CATEGORIES[9],
];

#[derive(Clone, Copy)]
pub enum FieldKind {
    Text,
    Masked,
    Choice(&'static [&'static str]),
}

struct Field {
    label: &'static str,
    kind: FieldKind,
    value: String,
    choice: usize,
}

impl Field {
    fn new(label: &'static str, kind: FieldKind) -> Self {
        let value = match kind {
            FieldKind::Choice(options) => options.first().copied().unwrap_or("").to_string(),
            _ => String::new(),
        };
        Self {
            label,
            kind,
            value,
            choice: 0,
        }
    }
}

/// Which dialog a form belongs to; the dashboard routes the submitted
/// values by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    Register,
    Nomination,
    TopMovies,
    StaffStats,
    StaffByCountry,
}

pub enum FormAction {
    Continue,
    Submit,
    Cancel,
}

/// A modal input dialog: text, masked and choice fields plus a submit row.
pub struct Form {
    kind: FormKind,
    title: &'static str,
    fields: Vec<Field>,
    active: usize,
    cursor_pos: usize,
}

impl Form {
    pub fn new(kind: FormKind) -> Self {
        use FieldKind::*;
        let (title, fields): (&'static str, Vec<(&'static str, FieldKind)>) = match kind {
            FormKind::Login => ("Log in", vec![("Username:", Text), ("Password:", Masked)]),
            FormKind::Register => (
                "Register",
                vec![
                    ("Username:", Text),
                    ("Email:", Text),
                    ("Password:", Masked),
                    ("Confirm Password:", Masked),
                    ("Birth date (YYYY-MM-DD):", Text),
                    ("Gender:", Text),
                    ("Country:", Text),
                ],
            ),
            FormKind::Nomination => (
                "Add Nomination",
                vec![
                    ("Staff Name:", Text),
                    ("Movie Title:", Text),
                    ("Award Category:", Choice(&AWARD_CATEGORIES)),
                ],
            ),
            FormKind::TopMovies => (
                "Top Nominated Movies",
                vec![
                    ("Category (optional):", Choice(&CATEGORY_FILTER)),
                    ("Year (optional):", Text),
                ],
            ),
            FormKind::StaffStats => ("Staff Stats", vec![("Staff member name:", Text)]),
            FormKind::StaffByCountry => ("Staff by Country", vec![("Country name:", Text)]),
        };
        Self {
            kind,
            title,
            fields: fields
                .into_iter()
                .map(|(label, kind)| Field::new(label, kind))
                .collect(),
            active: 0,
            cursor_pos: 0,
        }
    }

    pub fn kind(&self) -> FormKind {
        self.kind
    }

    pub fn value(&self, idx: usize) -> &str {
        self.fields.get(idx).map(|f| f.value.as_str()).unwrap_or("")
    }

    /// Move a value out of the form, leaving the field empty.
    pub fn take_value(&mut self, idx: usize) -> String {
        self.fields
            .get_mut(idx)
            .map(|f| std::mem::take(&mut f.value))
            .unwrap_or_default()
    }

    fn on_button(&self) -> bool {
        self.active == self.fields.len()
    }

    fn move_to(&mut self, idx: usize) {
        self.active = idx.min(self.fields.len());
        self.cursor_pos = self
            .fields
            .get(self.active)
            .map(|f| f.value.chars().count())
            .unwrap_or(0);
    }

    fn cursor_byte_pos(value: &str, cursor: usize) -> usize {
        value
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(value.len())
    }

    fn cycle_choice(&mut self, forward: bool) {
        let Some(field) = self.fields.get_mut(self.active) else {
            return;
        };
        if let FieldKind::Choice(options) = field.kind {
            if options.is_empty() {
                return;
            }
            field.choice = if forward {
                (field.choice + 1) % options.len()
            } else {
                (field.choice + options.len() - 1) % options.len()
            };
            field.value = options[field.choice].to_string();
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> FormAction {
        match code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter if self.on_button() => return FormAction::Submit,
            KeyCode::Enter | KeyCode::Down | KeyCode::Tab => self.move_to(self.active + 1),
            KeyCode::Up | KeyCode::BackTab => self.move_to(self.active.saturating_sub(1)),
            _ => {}
        }
        if self.on_button() {
            return FormAction::Continue;
        }

        let active = self.active;
        let is_choice = matches!(self.fields[active].kind, FieldKind::Choice(_));
        match code {
            KeyCode::Left if is_choice => self.cycle_choice(false),
            KeyCode::Right | KeyCode::Char(' ') if is_choice => self.cycle_choice(true),
            _ if is_choice => {}
            KeyCode::Char(c) => {
                let field = &mut self.fields[active].value;
                let pos = Self::cursor_byte_pos(field, self.cursor_pos);
                field.insert(pos, c);
                self.cursor_pos += 1;
            }
            KeyCode::Backspace => {
                if self.cursor_pos > 0 {
                    self.cursor_pos -= 1;
                    let field = &mut self.fields[active].value;
                    let pos = Self::cursor_byte_pos(field, self.cursor_pos);
                    field.remove(pos);
                }
            }
            KeyCode::Delete => {
                let field = &mut self.fields[active].value;
                if self.cursor_pos < field.chars().count() {
                    let pos = Self::cursor_byte_pos(field, self.cursor_pos);
                    field.remove(pos);
                }
            }
            KeyCode::Left => self.cursor_pos = self.cursor_pos.saturating_sub(1),
            KeyCode::Right => {
                let len = self.fields[active].value.chars().count();
                self.cursor_pos = (self.cursor_pos + 1).min(len);
            }
            KeyCode::Home => self.cursor_pos = 0,
            KeyCode::End => self.cursor_pos = self.fields[active].value.chars().count(),
            _ => {}
        }
        FormAction::Continue
    }

    pub fn draw(&self, frame: &mut Frame) {
        let height = self.fields.len() as u16 + 6;
        let popup = centered(frame.area(), FORM_WIDTH, height);
        frame.render_widget(Clear, popup);
        let block = Block::default()
            .title(Span::styled(format!(" {} ", self.title), HEADER_STYLE))
            .borders(Borders::ALL)
            .border_style(BORDER_STYLE);
        let inner = block.inner(popup);
        frame.render_widget(block, popup);

        let [fields_area, _gap, button_area, hints_area] = Layout::vertical([
            Constraint::Length(self.fields.len() as u16),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(inner);

        let rows = Layout::vertical(vec![Constraint::Length(1); self.fields.len()]).split(fields_area);
        for (idx, (field, row)) in self.fields.iter().zip(rows.iter()).enumerate() {
            self.draw_field(frame, *row, field, idx == self.active);
        }

        let btn_style = if self.on_button() {
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(
            Paragraph::new(Span::styled("[ Submit ]", btn_style))
                .alignment(ratatui::layout::Alignment::Center),
            button_area,
        );
        frame.render_widget(
            Paragraph::new(" Enter=next  Left/Right=choose  Esc=cancel").style(FOOTER_STYLE),
            hints_area,
        );
    }

    fn draw_field(&self, frame: &mut Frame, area: Rect, field: &Field, is_active: bool) {
        let [label_area, input_area] = Layout::horizontal([
            Constraint::Length(LABEL_WIDTH),
            Constraint::Fill(1),
        ])
        .areas(area);

        let label_style = if is_active {
            Style::default().add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{:<width$}", field.label, width = LABEL_WIDTH as usize),
                label_style,
            )),
            label_area,
        );

        let display = match field.kind {
            FieldKind::Choice(_) => {
                let shown = if field.value.is_empty() { "(any)" } else { field.value.as_str() };
                format!("< {shown} >")
            }
            FieldKind::Masked if is_active => insert_cursor(&field.value, self.cursor_pos, true),
            FieldKind::Masked => "\u{25cf}".repeat(field.value.chars().count()),
            FieldKind::Text if is_active => insert_cursor(&field.value, self.cursor_pos, false),
            FieldKind::Text => field.value.clone(),
        };
        let padded = format!("{:<width$}", display, width = input_area.width as usize);
        let style = if is_active {
            SELECTED_STYLE
        } else {
            Style::default().fg(Color::DarkGray)
        };
        frame.render_widget(Paragraph::new(Line::from(Span::styled(padded, style))), input_area);
    }
}

impl Drop for Form {
    fn drop(&mut self) {
        for field in &mut self.fields {
            if matches!(field.kind, FieldKind::Masked) {
                field.value.zeroize();
            }
        }
    }
}

/// Build a display string with a block cursor inserted at `cursor_pos`.
fn insert_cursor(value: &str, cursor_pos: usize, masked: bool) -> String {
    let mut display = if masked {
        "\u{25cf}".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let byte_pos = display
        .char_indices()
        .nth(cursor_pos)
        .map(|(i, _)| i)
        .unwrap_or(display.len());
    display.insert(byte_pos, '\u{2588}');
    display
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_str(form: &mut Form, s: &str) {
        for c in s.chars() {
            form.handle_key(KeyCode::Char(c));
        }
    }

    #[test]
    fn test_typing_and_navigation() {
        let mut form = Form::new(FormKind::Login);
        type_str(&mut form, "demo");
        form.handle_key(KeyCode::Backspace);
        type_str(&mut form, "o");
        form.handle_key(KeyCode::Enter);
        type_str(&mut form, "Oscars2024");
        assert_eq!(form.value(0), "demo");
        assert_eq!(form.value(1), "Oscars2024");

        assert!(matches!(form.handle_key(KeyCode::Enter), FormAction::Continue));
        assert!(matches!(form.handle_key(KeyCode::Enter), FormAction::Submit));
        assert_eq!(form.take_value(1), "Oscars2024");
        assert_eq!(form.value(1), "");
    }

    #[test]
    fn test_choice_cycles_and_ignores_typing() {
        let mut form = Form::new(FormKind::Nomination);
        form.handle_key(KeyCode::Down);
        form.handle_key(KeyCode::Down);
        assert_eq!(form.value(2), "Best Picture");
        form.handle_key(KeyCode::Right);
        assert_eq!(form.value(2), "Best Director");
        form.handle_key(KeyCode::Char('x'));
        assert_eq!(form.value(2), "Best Director");
        form.handle_key(KeyCode::Left);
        form.handle_key(KeyCode::Left);
        assert_eq!(form.value(2), "Best Original Score");
    }

    #[test]
    fn test_category_filter_starts_blank() {
        let form = Form::new(FormKind::TopMovies);
        assert_eq!(form.value(0), "");
    }

    #[test]
    fn test_escape_cancels() {
        let mut form = Form::new(FormKind::StaffStats);
        assert!(matches!(form.handle_key(KeyCode::Esc), FormAction::Cancel));
    }

    #[test]
    fn test_cursor_editing_mid_string() {
        let mut form = Form::new(FormKind::StaffByCountry);
        type_str(&mut form, "Fance");
        form.handle_key(KeyCode::Home);
        form.handle_key(KeyCode::Right);
        type_str(&mut form, "r");
        assert_eq!(form.value(0), "France");
        form.handle_key(KeyCode::End);
        form.handle_key(KeyCode::Delete);
        assert_eq!(form.value(0), "France");
    }
}
