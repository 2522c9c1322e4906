// 🖥️ Terminal UI - Side menu, stepper, progress and the active step form
// All state changes go through `RegistrationWizard::dispatch`; this module
// only owns what is being typed into the current form.

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lra_gst_wizard::{
    export_registration, Application, ApplicationStatus, ApplicationStore, FieldError, FieldKind,
    Form, InfoSection, LocalStorageStore, Outcome, RegistrationWizard, Step, View, WizardEvent,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;
use tracing::warn;

pub struct App {
    pub wizard: RegistrationWizard<LocalStorageStore>,
    pub form: Option<Form>,
    pub focus: usize,
    pub errors: Vec<FieldError>,
    pub message: Option<String>,
    pub applications_state: TableState,
    export_dir: PathBuf,
}

impl App {
    pub fn new(wizard: RegistrationWizard<LocalStorageStore>, export_dir: PathBuf) -> Self {
        let mut app = Self {
            wizard,
            form: None,
            focus: 0,
            errors: Vec::new(),
            message: None,
            applications_state: TableState::default(),
            export_dir,
        };
        app.sync_form();
        app
    }

    /// Rebuild the form when the wizard lands on a different step.
    /// Sections keep the form so typed values survive a side-menu visit.
    fn sync_form(&mut self) {
        let state = self.wizard.state();
        match &state.view {
            View::Step(step) if self.form.as_ref().map(Form::step) != Some(*step) => {
                self.form = Form::for_step(*step, &state.data);
                self.focus = 0;
                self.errors.clear();
            }
            View::Unknown(name) => {
                warn!(view = %name, "rendering placeholder for unknown view");
            }
            _ => {}
        }
    }

    pub fn dispatch(&mut self, event: WizardEvent) -> Outcome {
        let resetting = event == WizardEvent::Reset;
        let outcome = self.wizard.dispatch(event);

        self.message = match &outcome {
            Outcome::Rejected(reason) => Some(format!("✗ {}", reason)),
            Outcome::Submitted { reference } => Some(format!("✓ Application submitted: {}", reference)),
            _ => None,
        };
        if resetting {
            self.form = None;
        }
        self.sync_form();
        outcome
    }

    /// Validate the active form and hand its payload to the wizard
    pub fn submit(&mut self) {
        let Some(form) = self.form.as_ref() else {
            return;
        };
        match form.submit() {
            Ok(submission) => {
                self.errors.clear();
                self.dispatch(WizardEvent::Complete(submission));
            }
            Err(errors) => {
                self.message = Some(format!("✗ {} field(s) need attention", errors.len()));
                if let Some(first) = errors.first() {
                    if let Some(i) = form.fields().iter().position(|f| f.key == first.key) {
                        self.focus = i;
                    }
                }
                self.errors = errors;
            }
        }
    }

    fn field_count(&self) -> usize {
        self.form.as_ref().map(|f| f.fields().len()).unwrap_or(0)
    }

    pub fn focus_next(&mut self) {
        let len = self.field_count();
        if len > 0 {
            self.focus = (self.focus + 1) % len;
        }
    }

    pub fn focus_previous(&mut self) {
        let len = self.field_count();
        if len > 0 {
            self.focus = (self.focus + len - 1) % len;
        }
    }

    fn edit_focused<F: FnOnce(&mut lra_gst_wizard::Field)>(&mut self, edit: F) {
        if !self.editing() {
            return;
        }
        let focus = self.focus;
        if let Some(field) = self.form.as_mut().and_then(|f| f.fields_mut().get_mut(focus)) {
            edit(field);
        }
    }

    /// Typing only reaches the form while its step is on screen
    fn editing(&self) -> bool {
        let state = self.wizard.state();
        matches!(state.view, View::Step(step) if step.has_form()) && self.form.is_some()
    }

    pub fn error_for(&self, key: &str) -> Option<&str> {
        self.errors
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.message.as_str())
    }

    /// Stepper jump: the n-th step on the current path
    pub fn jump(&mut self, index: usize) {
        if let Some(step) = self.wizard.state().path().get(index).copied() {
            self.dispatch(WizardEvent::GoTo(step));
        }
    }

    pub fn export(&mut self) {
        match export_registration(&self.wizard.state().data, &self.export_dir) {
            Ok(path) => self.message = Some(format!("✓ Exported to {}", path.display())),
            Err(e) => self.message = Some(format!("✗ Export failed: {}", e)),
        }
    }

    fn applications(&self) -> Vec<Application> {
        self.wizard.store().list()
    }

    /// Returns false when the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('q') if ctrl => return false,
            KeyCode::Char('a') if ctrl => {
                self.dispatch(WizardEvent::OpenSection(InfoSection::Applications));
            }
            KeyCode::Char('f') if ctrl => {
                self.dispatch(WizardEvent::OpenSection(InfoSection::Fees));
            }
            KeyCode::Char('t') if ctrl => {
                self.dispatch(WizardEvent::OpenSection(InfoSection::Certificates));
            }
            KeyCode::Char('h') if ctrl => {
                self.dispatch(WizardEvent::OpenSection(InfoSection::Help));
            }
            KeyCode::Char('w') if ctrl => {
                self.dispatch(WizardEvent::ResumeWizard);
            }
            KeyCode::Char('e') if ctrl => self.export(),
            KeyCode::Char('n') if ctrl => {
                self.dispatch(WizardEvent::Reset);
            }
            KeyCode::F(n) if (1..=8).contains(&n) => self.jump(usize::from(n - 1)),
            KeyCode::Esc => {
                self.dispatch(WizardEvent::Back);
            }
            KeyCode::Enter if self.editing() => self.submit(),
            KeyCode::Tab | KeyCode::Down => self.focus_next(),
            KeyCode::BackTab | KeyCode::Up => self.focus_previous(),
            KeyCode::Left => self.edit_focused(|field| field.cycle(false)),
            KeyCode::Right => self.edit_focused(|field| field.cycle(true)),
            KeyCode::Backspace => self.edit_focused(|field| field.pop_char()),
            KeyCode::Char(c) if !ctrl => self.edit_focused(|field| field.push_char(c)),
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Progress
            Constraint::Min(0),    // Menu + content
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_progress(f, chunks[1], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(chunks[2]);

    render_side_menu(f, body[0], app);

    match app.wizard.state().view.clone() {
        View::Step(Step::Complete) => render_complete(f, body[1], app),
        View::Step(_) => render_form(f, body[1], app),
        View::Section(InfoSection::Applications) => render_applications(f, body[1], app),
        View::Section(section) => render_info(f, body[1], section),
        View::Unknown(name) => render_unknown(f, body[1], &name),
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let state = app.wizard.state();
    let position = match state.step_number() {
        Some(n) => format!("Step {} of {}", n, state.total_steps()),
        None => "Not on the current path".to_string(),
    };

    let line = Line::from(vec![
        Span::styled(
            " LRA GST Registration ",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
        Span::raw(" │ "),
        Span::styled(state.view.title(), Style::default().fg(Color::White)),
        Span::raw(" │ "),
        Span::styled(position, Style::default().fg(Color::DarkGray)),
    ]);

    let header = Paragraph::new(vec![line])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));
    f.render_widget(header, area);
}

fn render_progress(f: &mut Frame, area: Rect, app: &App) {
    let percent = app.wizard.state().progress_percent();
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Progress "))
        .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
        .percent(u16::from(percent))
        .label(format!("{}%", percent));
    f.render_widget(gauge, area);
}

fn render_side_menu(f: &mut Frame, area: Rect, app: &App) {
    let state = app.wizard.state();
    let mut lines = vec![Line::from(Span::styled(
        "Registration",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    ))];

    for (i, step) in state.path().into_iter().enumerate() {
        let (mark, style) = if state.view == View::Step(step) {
            ("▶", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        } else if step == state.current_step {
            ("▷", Style::default().fg(Color::Cyan))
        } else if state.completed_steps.contains(&step) {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("·", Style::default().fg(Color::DarkGray))
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" F{} ", i + 1), Style::default().fg(Color::DarkGray)),
            Span::styled(format!("{} {}", mark, step.title()), style),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Services",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )));
    for (section, key) in InfoSection::ALL.into_iter().zip(["^A", "^F", "^T", "^H"]) {
        let style = if state.view == View::Section(section) {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        lines.push(Line::from(vec![
            Span::styled(format!(" {} ", key), Style::default().fg(Color::DarkGray)),
            Span::styled(section.title(), style),
        ]));
    }

    let menu = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" Menu "));
    f.render_widget(menu, area);
}

fn render_form(f: &mut Frame, area: Rect, app: &App) {
    let Some(form) = app.form.as_ref() else {
        return;
    };

    let mut lines = Vec::new();
    for (i, field) in form.fields().iter().enumerate() {
        let focused = i == app.focus;
        let label_style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let marker = if field.required { " *" } else { "" };
        let value = match field.kind {
            FieldKind::Choice(_) => format!("◀ {} ▶", field.value),
            FieldKind::Date if field.value.is_empty() => "YYYY-MM-DD".to_string(),
            FieldKind::File if field.value.is_empty() => "(path to file)".to_string(),
            _ if focused => format!("{}▏", field.value),
            _ => field.value.clone(),
        };

        lines.push(Line::from(vec![
            Span::styled(if focused { "→ " } else { "  " }, label_style),
            Span::styled(format!("{}{}: ", field.label, marker), label_style),
            Span::styled(value, Style::default().fg(Color::White)),
        ]));
        if let Some(error) = app.error_for(field.key) {
            lines.push(Line::from(Span::styled(
                format!("    {}", error),
                Style::default().fg(Color::Red),
            )));
        }
    }

    let title = format!(" {} ", form.step().title());
    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_complete(f: &mut Frame, area: Rect, app: &App) {
    let data = &app.wizard.state().data;
    let reference = data.application_reference.clone().unwrap_or_default();

    let mut lines = vec![
        Line::from(Span::styled(
            "🎉 Registration submitted",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::raw("Application reference: "),
            Span::styled(reference, Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        ]),
        Line::from(format!("Applicant: {}", data.display_name())),
    ];

    if let Some(status) = data.status {
        lines.push(Line::from(format!("Status: {}", status.as_str())));
        if status == ApplicationStatus::PendingReceipt {
            let challan = data
                .payment_data
                .as_ref()
                .and_then(|p| p.challan_number.clone())
                .unwrap_or_default();
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("Pay at any bank using challan {} and attach the receipt:", challan),
                Style::default().fg(Color::Yellow),
            )));
            lines.push(Line::from("  lra-gst attach-receipt <reference> <file>"));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from("Ctrl+E  Download a copy of this application (JSON)"));
    lines.push(Line::from("Ctrl+N  Start a new application"));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Complete "))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_applications(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Reference", "Applicant", "Status", "Submitted"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let applications = app.applications();
    let rows = applications.iter().map(|application| {
        let color = match application.status {
            ApplicationStatus::Approved => Color::Green,
            ApplicationStatus::Rejected => Color::Red,
            ApplicationStatus::PendingReceipt => Color::Yellow,
            ApplicationStatus::UnderReview | ApplicationStatus::Submitted => Color::Cyan,
        };
        Row::new(vec![
            Cell::from(application.application_reference.clone()),
            Cell::from(truncate(&application.applicant_name, 28)),
            Cell::from(application.status.as_str()).style(Style::default().fg(color)),
            Cell::from(application.submitted_at.format("%Y-%m-%d").to_string()),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(30),
            Constraint::Length(16),
            Constraint::Length(12),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" My Applications ({}) ", applications.len())),
    );

    f.render_stateful_widget(table, area, &mut app.applications_state);
}

fn info_text(section: InfoSection) -> &'static [&'static str] {
    match section {
        InfoSection::Applications => &[],
        InfoSection::Fees => &[
            "Registration fees are shown on the review step before payment.",
            "",
            "Online: mobile money, card or bank transfer are confirmed immediately.",
            "Offline: a challan number is issued; pay at any commercial bank and",
            "attach the bank receipt to move the application to review.",
        ],
        InfoSection::Certificates => &[
            "GST registration certificates are issued once an application is approved.",
            "",
            "Check the status of each application under My Applications (Ctrl+A).",
        ],
        InfoSection::Help => &[
            "Enter      Continue to the next step",
            "Esc        Go back one step",
            "Tab / ↑↓   Move between fields",
            "← / →      Change a choice",
            "F1-F8      Jump to a completed step",
            "Ctrl+A/F/T/H  Open a service page, Ctrl+W to return",
            "Ctrl+E     Export the current registration as JSON",
            "Ctrl+N     Start over",
            "Ctrl+Q     Quit (progress is saved)",
        ],
    }
}

fn render_info(f: &mut Frame, area: Rect, section: InfoSection) {
    let mut lines: Vec<Line> = info_text(section).iter().map(|s| Line::from(*s)).collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Ctrl+W  Return to the registration",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(format!(" {} ", section.title())))
        .wrap(Wrap { trim: false });
    f.render_widget(paragraph, area);
}

fn render_unknown(f: &mut Frame, area: Rect, name: &str) {
    let lines = vec![
        Line::from(Span::styled(
            format!("Unknown step ({})", name),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Press Esc or Ctrl+W to return to the registration."),
    ];
    let paragraph = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    if let Some(message) = &app.message {
        let color = if message.starts_with('✗') { Color::Red } else { Color::Green };
        spans.push(Span::styled(format!(" {} ", message), Style::default().fg(color)));
        spans.push(Span::raw(" | "));
    }

    for (key, action) in [("Enter", " Next | "), ("Esc", " Back | "), ("Ctrl+H", " Help | "), ("Ctrl+Q", " Quit")] {
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(action));
    }

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let store = LocalStorageStore::in_memory().unwrap();
        App::new(RegistrationWizard::new(store), std::env::temp_dir())
    }

    fn press(app: &mut App, code: KeyCode) -> bool {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn ctrl(app: &mut App, c: char) -> bool {
        app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
    }

    #[test]
    fn test_starts_on_entry_form() {
        let app = app();
        assert_eq!(app.form.as_ref().map(Form::step), Some(Step::Entry));
    }

    #[test]
    fn test_enter_completes_entry_step() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);

        let step = app.wizard.state().current_step;
        assert_ne!(step, Step::Entry);
        assert_eq!(app.form.as_ref().map(Form::step), Some(step));
        assert!(app.wizard.state().completed_steps.contains(&Step::Entry));
    }

    #[test]
    fn test_invalid_form_reports_errors() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Enter);

        assert!(!app.errors.is_empty());
        assert!(app.message.as_deref().unwrap_or("").starts_with('✗'));
        assert!(app.wizard.state().completed_steps.len() == 1);
    }

    #[test]
    fn test_section_keeps_typed_values() {
        let mut app = app();
        press(&mut app, KeyCode::Enter);
        let before = app.form.clone();

        ctrl(&mut app, 'h');
        assert_eq!(app.wizard.state().view, View::Section(InfoSection::Help));
        press(&mut app, KeyCode::Char('x'));

        ctrl(&mut app, 'w');
        assert_eq!(app.form, before);
    }

    #[test]
    fn test_jump_to_unvisited_step_is_rejected() {
        let mut app = app();
        press(&mut app, KeyCode::F(4));
        assert_eq!(app.wizard.state().current_step, Step::Entry);
    }

    #[test]
    fn test_ctrl_q_quits() {
        let mut app = app();
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(!ctrl(&mut app, 'q'));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Kollie Trading", 20), "Kollie Trading");
        assert_eq!(truncate("Kollie Trading", 7), "Kollie…");
    }
}
