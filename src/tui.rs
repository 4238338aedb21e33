use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::api::ApiClient;
use crate::models::Lead;
use crate::store::Database;
use crate::table::{ConfidenceBucket, LeadQuery, SortKey};

/// All colors the browser uses, passed in by the caller instead of being
/// scattered through the draw code.
pub struct Theme {
    pub accent: Color,
    pub highlight: Color,
    pub dim: Color,
    pub good: Color,
    pub warn: Color,
    pub bad: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Cyan,
            highlight: Color::DarkGray,
            dim: Color::DarkGray,
            good: Color::Green,
            warn: Color::Yellow,
            bad: Color::Red,
        }
    }
}

struct AppState {
    /// Canonical list as fetched; rows are derived from it per query.
    leads: Vec<Lead>,
    rows: Vec<Lead>,
    query: LeadQuery,
    selected: usize,
    scroll_offset: u16,
    searching: bool,
    notice: Option<String>,
}

impl AppState {
    fn new(leads: Vec<Lead>, query: LeadQuery) -> Self {
        let mut state = Self {
            leads,
            rows: Vec::new(),
            query,
            selected: 0,
            scroll_offset: 0,
            searching: false,
            notice: None,
        };
        state.refresh_rows();
        state
    }

    fn refresh_rows(&mut self) {
        self.rows = self.query.apply(&self.leads);
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
    }

    fn current_lead(&self) -> Option<&Lead> {
        self.rows.get(self.selected)
    }

    fn next(&mut self) {
        if !self.rows.is_empty() && self.selected < self.rows.len() - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn toggle_sort(&mut self, key: SortKey) {
        self.query.toggle_sort(key);
        self.refresh_rows();
    }

    fn cycle_bucket(&mut self) {
        self.query.bucket = match self.query.bucket {
            None => Some(ConfidenceBucket::High),
            Some(ConfidenceBucket::High) => Some(ConfidenceBucket::Medium),
            Some(ConfidenceBucket::Medium) => Some(ConfidenceBucket::Low),
            Some(ConfidenceBucket::Low) => None,
        };
        self.refresh_rows();
    }

    fn toggle_star(&mut self, db: &Database) {
        let Some(id) = self.current_lead().and_then(|l| l.id.clone()) else {
            return;
        };
        match db.toggle_starred(&id) {
            Ok(starred) => {
                if let Some(lead) = self.leads.iter_mut().find(|l| l.id.as_deref() == Some(&id)) {
                    lead.starred = starred;
                }
                self.refresh_rows();
            }
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn push_search(&mut self, ch: char) {
        let mut text = self.query.search.take().unwrap_or_default();
        text.push(ch);
        self.query.search = Some(text);
        self.refresh_rows();
    }

    fn pop_search(&mut self) {
        if let Some(mut text) = self.query.search.take() {
            text.pop();
            if !text.is_empty() {
                self.query.search = Some(text);
            }
        }
        self.refresh_rows();
    }

    fn reload(&mut self, api: &ApiClient, db: &Database) {
        match api.list_leads() {
            Ok(mut leads) => {
                if let Err(err) = db.apply_stars(&mut leads) {
                    self.notice = Some(err.to_string());
                }
                self.leads = leads;
                self.refresh_rows();
                self.notice = Some("Refreshed.".to_string());
            }
            Err(err) => self.notice = Some(format!("Refresh failed: {err}")),
        }
    }
}

pub fn run_browse(api: &ApiClient, db: &Database, query: LeadQuery, theme: &Theme) -> Result<()> {
    let mut leads = api.list_leads()?;
    db.apply_stars(&mut leads)?;
    if leads.is_empty() {
        println!("No leads yet. Run 'prospect job create' to start a search.");
        return Ok(());
    }

    let mut state = AppState::new(leads, query);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, api, db, theme);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    api: &ApiClient,
    db: &Database,
    theme: &Theme,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        if state.rows.is_empty() {
            list_state.select(None);
        } else {
            list_state.select(Some(state.selected));
        }
        terminal.draw(|frame| draw(frame, state, &mut list_state, theme))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            state.notice = None;

            if state.searching {
                match key.code {
                    KeyCode::Enter | KeyCode::Esc => state.searching = false,
                    KeyCode::Backspace => state.pop_search(),
                    KeyCode::Char(ch) => state.push_search(ch),
                    _ => {}
                }
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::PageDown | KeyCode::Char('J') => state.scroll_down(),
                KeyCode::PageUp | KeyCode::Char('K') => state.scroll_up(),
                KeyCode::Char('/') => state.searching = true,
                KeyCode::Char('c') => state.toggle_sort(SortKey::Company),
                KeyCode::Char('n') => state.toggle_sort(SortKey::Contact),
                KeyCode::Char('e') => state.toggle_sort(SortKey::Email),
                KeyCode::Char('f') => state.toggle_sort(SortKey::Confidence),
                KeyCode::Char('t') => state.toggle_sort(SortKey::Status),
                KeyCode::Char('b') => state.cycle_bucket(),
                KeyCode::Char('S') => {
                    state.query.starred_only = !state.query.starred_only;
                    state.refresh_rows();
                }
                KeyCode::Char('*') | KeyCode::Char(' ') => state.toggle_star(db),
                KeyCode::Char('r') => state.reload(api, db),
                _ => {}
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(frame.area());

    // Left panel: lead list
    let items: Vec<ListItem> = state
        .rows
        .iter()
        .map(|lead| {
            let star = if lead.starred { "*" } else { " " };
            let company = truncate(&lead.company, 22);
            let contact = truncate(&lead.contact_name, 18);
            ListItem::new(format!(
                "{} {:<22} {:<18} {:>4.0}%",
                star,
                company,
                contact,
                lead.confidence * 100.0
            ))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(list_title(state)),
        )
        .highlight_style(
            Style::default()
                .bg(theme.highlight)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: lead detail
    let detail = build_detail(state, theme);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Lead "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer help (or the latest notice)
    let help_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let footer = if state.searching {
        format!(" search: {}_", state.query.search.as_deref().unwrap_or(""))
    } else if let Some(notice) = &state.notice {
        format!(" {notice}")
    } else {
        " j/k:move  /:search  c/n/e/f/t:sort  b:bucket  S:starred  *:star  r:refresh  q:quit"
            .to_string()
    };
    let help = Paragraph::new(footer).style(Style::default().fg(theme.dim));
    frame.render_widget(help, help_area[1]);
}

fn list_title(state: &AppState) -> String {
    let mut title = format!(" Leads ({}/{}) ", state.rows.len(), state.leads.len());
    if let Some(search) = &state.query.search {
        title.push_str(&format!("/{search} "));
    }
    if let Some(bucket) = state.query.bucket {
        title.push_str(&format!("[{}] ", bucket.label()));
    }
    if state.query.starred_only {
        title.push_str("[starred] ");
    }
    title.push_str(&format!(
        "sort:{}{} ",
        state.query.sort.label(),
        state.query.direction.arrow()
    ));
    title
}

fn build_detail(state: &AppState, theme: &Theme) -> Text<'static> {
    let Some(lead) = state.current_lead() else {
        return Text::raw("No lead selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    let header = if lead.starred {
        format!("* {}", lead.company)
    } else {
        lead.company.clone()
    };
    lines.push(Line::from(Span::styled(
        header,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(lead.contact_name.clone()));
    lines.push(Line::from(""));

    lines.push(Line::from(format!("Email:      {}", lead.email)));
    if let Some(phone) = &lead.phone {
        lines.push(Line::from(format!("Phone:      {phone}")));
    }
    if let Some(industry) = &lead.industry {
        lines.push(Line::from(format!("Industry:   {industry}")));
    }
    if let Some(location) = &lead.location {
        lines.push(Line::from(format!("Location:   {location}")));
    }
    if let Some(source) = &lead.source {
        lines.push(Line::from(format!("Source:     {source}")));
    }

    if let Some(status) = &lead.status {
        let style = match status.as_str() {
            "verified" => Style::default().fg(theme.good),
            "contacted" => Style::default().fg(theme.accent),
            "new" => Style::default().fg(theme.warn),
            _ => Style::default(),
        };
        lines.push(Line::from(Span::styled(format!("Status:     {status}"), style)));
    }

    let bucket = ConfidenceBucket::of(lead.confidence);
    let bucket_style = match bucket {
        ConfidenceBucket::High => Style::default().fg(theme.good),
        ConfidenceBucket::Medium => Style::default().fg(theme.warn),
        ConfidenceBucket::Low => Style::default().fg(theme.bad),
    };
    lines.push(Line::from(Span::styled(
        format!(
            "Confidence: {:.0}% ({})",
            lead.confidence * 100.0,
            bucket.label()
        ),
        bucket_style,
    )));

    if let Some(id) = &lead.id {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("id: {id}"),
            Style::default().fg(theme.dim),
        )));
    }

    Text::from(lines)
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}
