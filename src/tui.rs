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
use std::path::Path;
use tracing::warn;

use crate::dates::format_relative_now;
use crate::db::Database;
use crate::filter::{filter_by_recipient, FilterSummary};
use crate::models::{Locale, SearchRecord, SearchStatus};
use crate::prompt::{format_prompt_text, render_plain};
use crate::report::{candidate_count_label, t};
use crate::session::SessionState;
use crate::status::{classify, render_mode, RenderMode, SearchView};

struct AppState {
    searches: Vec<SearchRecord>,
    /// Indices into `searches` that pass the email filter.
    visible: Vec<usize>,
    selected: usize,
    scroll_offset: u16,
    email_filter: Option<String>,
    filter_input: Option<String>,
    locale: Locale,
}

impl AppState {
    fn new(searches: Vec<SearchRecord>, email_filter: Option<String>, locale: Locale) -> Self {
        let mut state = Self {
            searches,
            visible: Vec::new(),
            selected: 0,
            scroll_offset: 0,
            email_filter,
            filter_input: None,
            locale,
        };
        state.apply_filter();
        state
    }

    fn apply_filter(&mut self) {
        let keep = filter_by_recipient(&self.searches, self.email_filter.as_deref());
        self.visible = keep
            .iter()
            .filter_map(|kept| self.searches.iter().position(|s| s.id == kept.id))
            .collect();
        self.selected = 0;
        self.scroll_offset = 0;
    }

    fn current_search(&self) -> Option<&SearchRecord> {
        self.visible
            .get(self.selected)
            .and_then(|&i| self.searches.get(i))
    }

    fn select_id(&mut self, id: i64) {
        if let Some(pos) = self
            .visible
            .iter()
            .position(|&i| self.searches[i].id == id)
        {
            self.selected = pos;
        }
    }

    fn reload(&mut self, db: &Database) {
        let keep = self.current_search().map(|s| s.id);
        match db.list_searches() {
            Ok(searches) => {
                self.searches = searches;
                self.apply_filter();
                if let Some(id) = keep {
                    self.select_id(id);
                }
            }
            Err(e) => warn!("reload failed: {:#}", e),
        }
    }

    fn next(&mut self) {
        if !self.visible.is_empty() && self.selected < self.visible.len() - 1 {
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

    fn session(&self) -> SessionState {
        SessionState {
            selected_search: self.current_search().map(|s| s.id),
            email_filter: self.email_filter.clone(),
        }
    }
}

pub fn run_browse(
    db: &Database,
    email_filter: Option<String>,
    locale: Locale,
    session_path: Option<&Path>,
) -> Result<()> {
    let searches = db.list_searches()?;
    if searches.is_empty() {
        println!("No searches found.");
        return Ok(());
    }

    let session = session_path.map(SessionState::load).unwrap_or_default();
    let filter = email_filter.or(session.email_filter.clone());
    let mut state = AppState::new(searches, filter, locale);
    if let Some(id) = session.selected_search {
        state.select_id(id);
    }

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    if let Some(path) = session_path {
        if let Err(e) = state.session().save(path) {
            warn!("could not save session state: {}", e);
        }
    }

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));

    loop {
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // Typing an email filter
            if let Some(input) = state.filter_input.as_mut() {
                match key.code {
                    KeyCode::Enter => {
                        let applied = std::mem::take(input);
                        state.filter_input = None;
                        state.email_filter = (!applied.is_empty()).then_some(applied);
                        state.apply_filter();
                    }
                    KeyCode::Esc => state.filter_input = None,
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => input.push(c),
                    _ => {}
                }
                list_state.select(Some(state.selected));
                continue;
            }

            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('/') => {
                    state.filter_input = Some(state.email_filter.clone().unwrap_or_default());
                }
                KeyCode::Char('x') => {
                    state.email_filter = None;
                    state.apply_filter();
                }
                KeyCode::Char('r') => state.reload(db),
                _ => {}
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

fn status_style(status: Option<SearchStatus>) -> Style {
    match status {
        Some(SearchStatus::Pending) => Style::default().fg(Color::Yellow),
        Some(SearchStatus::Processing) => Style::default().fg(Color::Blue),
        Some(SearchStatus::Completed) => Style::default().fg(Color::Green),
        Some(SearchStatus::Failed) => Style::default().fg(Color::Red),
        None => Style::default().fg(Color::Magenta),
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[0]);

    // Left panel: search list
    let items: Vec<ListItem> = state
        .visible
        .iter()
        .filter_map(|&i| state.searches.get(i))
        .map(|search| {
            let status_icon = match render_mode(&search.status, search.results.as_ref()) {
                Ok(RenderMode::Waiting) => "~",
                Ok(RenderMode::Failed) => "x",
                Ok(RenderMode::ResultsEmpty) => "0",
                Ok(RenderMode::ResultsPresent) => "+",
                Err(_) => "?",
            };
            let name = search.display_name();
            let name = if name.chars().count() > 35 {
                format!("{}...", name.chars().take(32).collect::<String>())
            } else {
                name.to_string()
            };
            ListItem::new(format!("{} #{:<4} {}", status_icon, search.id, name))
        })
        .collect();

    let title = match FilterSummary::new(
        state.visible.len(),
        state.searches.len(),
        state.email_filter.as_deref(),
    ) {
        Some(summary) => format!(
            " Searches ({}/{}) \"{}\" ",
            summary.shown, summary.total, summary.filter
        ),
        None => format!(" Searches ({}) ", state.searches.len()),
    };

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: search detail
    let detail = build_detail(state);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer: filter prompt or help
    let footer = match &state.filter_input {
        Some(input) => Paragraph::new(format!(" Filter by email: {}_", input))
            .style(Style::default().fg(Color::Cyan)),
        None => Paragraph::new(
            " j/k:navigate  J/K:scroll  /:filter email  x:clear filter  r:reload  q:quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, rows[1]);
}

fn build_detail<'a>(state: &'a AppState) -> Text<'a> {
    let locale = state.locale;
    let Some(search) = state.current_search() else {
        return Text::raw(t(
            locale,
            "Keine Suche passt zum Filter",
            "No search matches the filter",
        ));
    };

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(Span::styled(
        search.display_name(),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if search.has_name() {
        lines.push(Line::from(search.search_keywords.as_str()));
    }

    lines.push(Line::from(format!(
        "{}: {}",
        t(locale, "Erstellt", "Created"),
        format_relative_now(&search.created_at, locale)
    )));
    if let Some(completed) = &search.completed_at {
        lines.push(Line::from(format!(
            "{}: {}",
            t(locale, "Abgeschlossen", "Completed"),
            format_relative_now(completed, locale)
        )));
    }

    let status = search.parsed_status().ok();
    let status_text = match status {
        Some(s) => s.label(locale).to_string(),
        None => format!("{} ({})", search.status, t(locale, "ungültig", "invalid")),
    };
    lines.push(Line::from(Span::styled(
        format!("Status: {}", status_text),
        status_style(status),
    )));

    if let Some(location) = &search.location {
        lines.push(Line::from(format!("{}: {}", t(locale, "Standort", "Location"), location)));
    }
    if let Some(radius) = search.max_radius {
        lines.push(Line::from(format!("Radius: {} km", radius)));
    }
    if let Some(target) = search.target_candidates {
        lines.push(Line::from(format!(
            "{}: {}",
            t(locale, "Ziel-Kandidaten", "Target candidates"),
            target
        )));
    }
    if let Some(days) = search.resume_last_updated_days {
        lines.push(Line::from(format!(
            "{}: {}",
            t(locale, "Lebenslauf aktualisiert (Tage)", "Resume updated (days)"),
            days
        )));
    }
    if let Some(email) = &search.recipient_email {
        lines.push(Line::from(format!(
            "{}: {}",
            t(locale, "Empfänger", "Recipient"),
            email
        )));
    }
    lines.push(Line::from(""));

    // Prompts
    for (title, prompt) in [
        ("System-Prompt", &search.system_prompt),
        ("User-Prompt", &search.user_prompt),
    ] {
        let blocks = format_prompt_text(prompt.as_deref());
        if blocks.is_empty() {
            continue;
        }
        lines.push(Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for line in render_plain(&blocks).lines() {
            lines.push(Line::from(format!("  {}", line)));
        }
        lines.push(Line::from(""));
    }

    // Results
    lines.push(Line::from(Span::styled(
        t(locale, "Ergebnisse", "Results"),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    match classify(search) {
        Err(e) => lines.push(Line::from(Span::styled(
            e.to_string(),
            Style::default().fg(Color::Magenta),
        ))),
        Ok(SearchView::Waiting(_)) => lines.push(Line::from(Span::styled(
            t(locale, "Suche läuft...", "Search in progress..."),
            Style::default().fg(Color::Yellow),
        ))),
        Ok(SearchView::Failed) => lines.push(Line::from(Span::styled(
            t(
                locale,
                "Suche fehlgeschlagen. Bitte versuchen Sie es erneut.",
                "Search failed. Please try again.",
            ),
            Style::default().fg(Color::Red),
        ))),
        Ok(SearchView::ResultsEmpty) => lines.push(Line::from(Span::styled(
            t(
                locale,
                "Keine Kandidaten für diese Suche gefunden.",
                "No candidates found for this search.",
            ),
            Style::default().fg(Color::DarkGray),
        ))),
        Ok(view @ SearchView::ResultsPresent(_)) => {
            if let Some(label) = candidate_count_label(&view, locale) {
                lines.push(Line::from(label));
            }
            lines.push(Line::from(""));
            if let SearchView::ResultsPresent(shape) = view {
                for candidate in shape.into_candidates() {
                    lines.push(Line::from(Span::styled(
                        candidate.name,
                        Style::default().fg(Color::Cyan),
                    )));
                    let details: Vec<String> = [candidate.position, candidate.location]
                        .into_iter()
                        .flatten()
                        .collect();
                    if !details.is_empty() {
                        lines.push(Line::from(format!("  {}", details.join(" | "))));
                    }
                    if let Some(summary) = candidate.summary {
                        for line in textwrap::fill(&summary, 70).lines() {
                            lines.push(Line::from(format!("  {}", line)));
                        }
                    }
                    if let Some(url) = candidate.profile_url {
                        lines.push(Line::from(format!("  {}", url)));
                    }
                    for (i, link) in candidate.profile_links.iter().enumerate() {
                        lines.push(Line::from(format!("  Link {}: {}", i + 1, link)));
                    }
                }
            }
        }
    }

    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(id: i64, email: Option<&str>) -> SearchRecord {
        SearchRecord {
            id,
            name: None,
            search_keywords: format!("search {}", id),
            location: None,
            resume_last_updated_days: None,
            target_candidates: None,
            max_radius: None,
            recipient_email: email.map(String::from),
            user_prompt: None,
            system_prompt: None,
            status: "pending".to_string(),
            results: None,
            created_at: chrono::Utc::now(),
            completed_at: None,
        }
    }

    fn state(filter: Option<&str>) -> AppState {
        let searches = vec![
            search(5, Some("a@example.com")),
            search(4, None),
            search(3, Some("b@example.com")),
            search(2, Some("c@other.org")),
        ];
        AppState::new(searches, filter.map(String::from), Locale::En)
    }

    #[test]
    fn test_filter_limits_visible_searches() {
        let mut app = state(Some("example"));
        assert_eq!(app.visible, vec![0, 2]);
        app.next();
        assert_eq!(app.current_search().map(|s| s.id), Some(3));
        app.next();
        assert_eq!(app.current_search().map(|s| s.id), Some(3));

        app.email_filter = None;
        app.apply_filter();
        assert_eq!(app.visible.len(), 4);
        assert_eq!(app.selected, 0);
    }

    #[test]
    fn test_no_match_has_no_current_search() {
        let app = state(Some("nobody"));
        assert!(app.visible.is_empty());
        assert!(app.current_search().is_none());
    }

    #[test]
    fn test_session_round_trip_restores_selection() {
        let mut app = state(None);
        app.select_id(3);
        let session = app.session();
        assert_eq!(session.selected_search, Some(3));
        assert_eq!(session.email_filter, None);

        let mut restored = state(session.email_filter.as_deref());
        restored.select_id(session.selected_search.unwrap());
        assert_eq!(restored.current_search().map(|s| s.id), Some(3));
    }

    fn detail_lines(app: &AppState) -> Vec<String> {
        build_detail(app)
            .lines
            .iter()
            .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_detail_follows_locale() {
        let mut app = state(None);
        app.locale = Locale::De;
        let lines = detail_lines(&app);
        assert!(lines.iter().any(|l| l.starts_with("Erstellt: Heute")));
        assert!(lines.iter().any(|l| l == "Status: ausstehend"));
        assert!(lines.iter().any(|l| l == "Ergebnisse"));
        assert!(lines.iter().any(|l| l == "Suche läuft..."));
        assert!(!lines.iter().any(|l| l.contains("Created") || l.contains("Results")));

        app.locale = Locale::En;
        let lines = detail_lines(&app);
        assert!(lines.iter().any(|l| l.starts_with("Created: Today")));
        assert!(lines.iter().any(|l| l == "Search in progress..."));
    }

    #[test]
    fn test_select_unknown_id_keeps_selection() {
        let mut app = state(None);
        app.next();
        app.select_id(99);
        assert_eq!(app.selected, 1);
    }
}
