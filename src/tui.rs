use anyhow::Result;
use chrono::Utc;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::db::Database;
use crate::detail::{self, ApplyOutcome};
use crate::filter::{FilterState, SALARY_STEP};
use crate::models::{CATEGORIES, JobListing, JobType, ViewMode};
use crate::pipeline::ListingPipeline;
use crate::render::{self, format_salary, location_label, millions, tag_line, time_ago};

const CARD_HEIGHT: u16 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Search,
    Location,
    Filters,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterEntry {
    SalaryLow,
    SalaryHigh,
    Type(JobType),
    Category(&'static str),
}

fn filter_entries() -> Vec<FilterEntry> {
    let mut entries = vec![FilterEntry::SalaryLow, FilterEntry::SalaryHigh];
    entries.extend(JobType::ALL.into_iter().map(FilterEntry::Type));
    entries.extend(CATEGORIES.into_iter().map(FilterEntry::Category));
    entries
}

struct AppState {
    pipeline: ListingPipeline,
    filters: FilterState,
    view: ViewMode,
    mode: Mode,
    input: String,
    selected: usize,
    filter_cursor: usize,
    show_detail: bool,
    scroll_offset: u16,
    user: Option<String>,
    message: Option<String>,
}

impl AppState {
    fn new(listings: Vec<JobListing>, filters: FilterState, user: Option<String>) -> Self {
        Self {
            pipeline: ListingPipeline::new(listings),
            filters,
            view: ViewMode::Grid,
            mode: Mode::Normal,
            input: String::new(),
            selected: 0,
            filter_cursor: 0,
            show_detail: false,
            scroll_offset: 0,
            user,
            message: None,
        }
    }

    fn result_count(&mut self) -> usize {
        self.pipeline.results(&self.filters).result_count()
    }

    fn current_id(&mut self) -> Option<i64> {
        let selected = self.selected;
        self.pipeline
            .results(&self.filters)
            .listings
            .get(selected)
            .map(|l| l.id)
    }

    /// Keeps the cursor on a real row after the result set shrinks.
    fn clamp_selection(&mut self) {
        let count = self.result_count();
        if self.selected >= count {
            self.selected = count.saturating_sub(1);
        }
    }

    fn next(&mut self) {
        let step = if self.view == ViewMode::Grid { 2 } else { 1 };
        if self.selected + step < self.result_count() {
            self.selected += step;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        let step = if self.view == ViewMode::Grid { 2 } else { 1 };
        if self.selected >= step {
            self.selected -= step;
            self.scroll_offset = 0;
        }
    }

    fn right(&mut self) {
        if self.view == ViewMode::Grid && self.selected % 2 == 0 && self.selected + 1 < self.result_count() {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn left(&mut self) {
        if self.view == ViewMode::Grid && self.selected % 2 == 1 {
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

    fn begin_edit(&mut self, mode: Mode) {
        self.input = match mode {
            Mode::Search => self.filters.search_text().to_string(),
            Mode::Location => self.filters.location_text().to_string(),
            _ => String::new(),
        };
        self.mode = mode;
    }

    fn push_input(&mut self) {
        match self.mode {
            Mode::Search => self.filters.set_search_text(self.input.clone()),
            Mode::Location => self.filters.set_location_text(self.input.clone()),
            _ => {}
        }
        self.clamp_selection();
    }

    fn adjust_filter(&mut self, entry: FilterEntry, delta: i64) {
        let (low, high) = self.filters.salary_range();
        match entry {
            FilterEntry::SalaryLow => self.filters.set_salary_low(low + delta * SALARY_STEP),
            FilterEntry::SalaryHigh => self.filters.set_salary_high(high + delta * SALARY_STEP),
            FilterEntry::Type(t) => self.filters.toggle_type(t),
            FilterEntry::Category(c) => self.filters.toggle_category(c),
        }
        self.clamp_selection();
    }

    fn apply_selected(&mut self, db: &Database) {
        let Some(id) = self.current_id() else { return };
        let outcome = db
            .get_detail(id)
            .and_then(|d| d.ok_or_else(|| anyhow::anyhow!("Listing #{} not found", id)))
            .and_then(|d| detail::apply(db, &d, self.user.as_deref()));
        self.message = Some(match outcome {
            Ok(ApplyOutcome::Submitted { .. }) => "Application submitted!".to_string(),
            Ok(ApplyOutcome::Mailto(link)) => format!("Apply by email: {}", link),
            Ok(ApplyOutcome::External(url)) => format!("Apply at: {}", url),
            Err(e) => e.to_string(),
        });
    }

    fn bookmark_selected(&mut self, db: &Database) {
        let Some(id) = self.current_id() else { return };
        self.message = Some(match detail::bookmark(db, id, self.user.as_deref()) {
            Ok(true) => "Job saved to your bookmarks".to_string(),
            Ok(false) => "Job removed from your bookmarks".to_string(),
            Err(e) => e.to_string(),
        });
    }
}

pub fn run_browse(db: &Database, filters: FilterState, user: Option<String>) -> Result<()> {
    let listings = db.active_listings()?;
    let mut state = AppState::new(listings, filters, user);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, db);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    db: &Database,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if handle_key(state, key, db) {
                break;
            }
        }
    }
    Ok(())
}

/// Applies one key press. Returns true when the browser should exit.
fn handle_key(state: &mut AppState, key: KeyEvent, db: &Database) -> bool {
    state.message = None;
    match state.mode {
        Mode::Search | Mode::Location => match key.code {
            KeyCode::Enter | KeyCode::Esc => state.mode = Mode::Normal,
            KeyCode::Backspace => {
                state.input.pop();
                state.push_input();
            }
            KeyCode::Char(c) => {
                state.input.push(c);
                state.push_input();
            }
            _ => {}
        },
        Mode::Filters => {
            let entries = filter_entries();
            let entry = entries[state.filter_cursor.min(entries.len() - 1)];
            match key.code {
                KeyCode::Esc | KeyCode::Char('f') => state.mode = Mode::Normal,
                KeyCode::Down | KeyCode::Char('j') => {
                    state.filter_cursor = (state.filter_cursor + 1).min(entries.len() - 1);
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    state.filter_cursor = state.filter_cursor.saturating_sub(1);
                }
                KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Right | KeyCode::Char('l') => {
                    state.adjust_filter(entry, 1)
                }
                KeyCode::Left | KeyCode::Char('h') => state.adjust_filter(entry, -1),
                KeyCode::Char('x') => {
                    state.filters.clear_filters();
                    state.clamp_selection();
                }
                _ => {}
            }
        }
        Mode::Normal => match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Esc if state.show_detail => state.show_detail = false,
            KeyCode::Esc => return true,
            KeyCode::Down | KeyCode::Char('j') => state.next(),
            KeyCode::Up | KeyCode::Char('k') => state.prev(),
            KeyCode::Right | KeyCode::Char('l') => state.right(),
            KeyCode::Left | KeyCode::Char('h') => state.left(),
            KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
            KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
            KeyCode::Char('/') => state.begin_edit(Mode::Search),
            KeyCode::Char('L') => state.begin_edit(Mode::Location),
            KeyCode::Char('f') => state.mode = Mode::Filters,
            KeyCode::Char('s') => {
                let next = state.filters.sort_key().next();
                state.filters.set_sort_key(next);
                state.selected = 0;
            }
            KeyCode::Char('v') => state.view = state.view.toggle(),
            KeyCode::Char('x') => {
                state.filters.clear_filters();
                state.clamp_selection();
            }
            KeyCode::Enter => {
                state.show_detail = !state.show_detail;
                state.scroll_offset = 0;
            }
            KeyCode::Char('a') => state.apply_selected(db),
            KeyCode::Char('b') => state.bookmark_selected(db),
            _ => {}
        },
    }
    false
}

fn draw(frame: &mut Frame, state: &mut AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(rows[1]);

    draw_sidebar(frame, state, body[0]);

    let results = state.pipeline.results(&state.filters);
    let listings = results.listings;
    let total = results.total;

    // Header: search, location, sort, count
    let editing = |mode: Mode, value: &str| {
        if state.mode == mode {
            format!("{}_", state.input)
        } else {
            value.to_string()
        }
    };
    let header = Paragraph::new(vec![Line::from(vec![
        Span::styled("Search: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(editing(Mode::Search, state.filters.search_text())),
        Span::raw("   "),
        Span::styled("Location: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(editing(Mode::Location, state.filters.location_text())),
        Span::raw("   "),
        Span::styled("Sort: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(state.filters.sort_key().label()),
        Span::raw("   "),
        Span::styled(render::summary(listings.len(), total), Style::default().fg(Color::DarkGray)),
    ])])
    .block(Block::default().borders(Borders::ALL).title(" Find Your Perfect Job "));
    frame.render_widget(header, rows[0]);

    let (results_area, detail_area) = if state.show_detail {
        let split = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(body[1]);
        (split[0], Some(split[1]))
    } else {
        (body[1], None)
    };

    if listings.is_empty() {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(render::EMPTY_TITLE, Style::default().add_modifier(Modifier::BOLD))),
            Line::from(Span::styled(render::EMPTY_HINT, Style::default().fg(Color::DarkGray))),
        ])
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title(" Jobs (0) "));
        frame.render_widget(empty, results_area);
    } else {
        match state.view {
            ViewMode::List => draw_list(frame, &listings, state.selected, results_area),
            ViewMode::Grid => draw_grid(frame, &listings, state.selected, results_area),
        }
    }

    if let Some(area) = detail_area {
        let detail = Paragraph::new(build_detail(listings.get(state.selected).copied()))
            .block(Block::default().borders(Borders::ALL).title(" Detail "))
            .wrap(Wrap { trim: false })
            .scroll((state.scroll_offset, 0));
        frame.render_widget(detail, area);
    }

    // Footer help or last action result
    let footer = match (&state.message, state.mode) {
        (Some(msg), _) => Paragraph::new(format!(" {}", msg)).style(Style::default().fg(Color::Yellow)),
        (None, Mode::Search | Mode::Location) => Paragraph::new(" type to filter  Enter/Esc:done")
            .style(Style::default().fg(Color::DarkGray)),
        (None, Mode::Filters) => Paragraph::new(
            " j/k:move  space/l:toggle or raise  h:lower  x:clear  Esc:back",
        )
        .style(Style::default().fg(Color::DarkGray)),
        (None, Mode::Normal) => Paragraph::new(
            " hjkl:navigate  /:search  L:location  f:filters  s:sort  v:grid/list  x:clear  Enter:detail  a:apply  b:bookmark  q:quit",
        )
        .style(Style::default().fg(Color::DarkGray)),
    };
    frame.render_widget(footer, rows[2]);
}

fn draw_sidebar(frame: &mut Frame, state: &AppState, area: Rect) {
    let (low, high) = state.filters.salary_range();
    let focused = state.mode == Mode::Filters;

    let items: Vec<ListItem> = filter_entries()
        .into_iter()
        .map(|entry| {
            let text = match entry {
                FilterEntry::SalaryLow => format!("Min salary  TZS {}", millions(low)),
                FilterEntry::SalaryHigh => format!("Max salary  TZS {}", millions(high)),
                FilterEntry::Type(t) => {
                    let mark = if state.filters.selected_types().contains(&t) { "x" } else { " " };
                    format!("[{}] {}", mark, t)
                }
                FilterEntry::Category(c) => {
                    let mark = if state.filters.selected_categories().contains(c) { "x" } else { " " };
                    format!("[{}] {}", mark, c)
                }
            };
            ListItem::new(text)
        })
        .collect();

    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).border_style(border).title(" Filters "))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    if focused {
        list_state.select(Some(state.filter_cursor));
    }
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_list(frame: &mut Frame, listings: &[&JobListing], selected: usize, area: Rect) {
    let items: Vec<ListItem> = listings
        .iter()
        .map(|job| {
            let urgent = if job.urgent { "!" } else { " " };
            ListItem::new(format!(
                "{} #{:<4} {} | {} | {}",
                urgent,
                job.id,
                render::truncate(&job.title, 32),
                job.company,
                format_salary(job.salary.min, job.salary.max)
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(" Jobs ({}) ", listings.len())))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    let mut list_state = ListState::default();
    list_state.select(Some(selected));
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn draw_grid(frame: &mut Frame, listings: &[&JobListing], selected: usize, area: Rect) {
    let outer = Block::default()
        .borders(Borders::ALL)
        .title(format!(" Jobs ({}) ", listings.len()));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let visible_rows = (inner.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = selected / 2;
    let first_row = selected_row.saturating_sub(visible_rows - 1);
    let now = Utc::now();

    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Length(CARD_HEIGHT); visible_rows])
        .split(inner);

    for (slot, row) in listings.chunks(2).skip(first_row).take(visible_rows).enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(row_areas[slot]);
        for (col, job) in row.iter().enumerate() {
            let index = (first_row + slot) * 2 + col;
            let border = if index == selected {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            let mut title = vec![Span::styled(
                format!(" #{} {} ", job.id, job.title),
                Style::default().add_modifier(Modifier::BOLD),
            )];
            if job.urgent {
                title.push(Span::styled("Urgent ", Style::default().fg(Color::Red)));
            }
            let card = Paragraph::new(vec![
                Line::from(job.company.clone()),
                Line::from(location_label(job)),
                Line::from(format!("{} | {}", job.job_type, format_salary(job.salary.min, job.salary.max))),
                Line::from(Span::styled(tag_line(&job.requirements), Style::default().fg(Color::Cyan))),
                Line::from(Span::styled(time_ago(job.posted_at, now), Style::default().fg(Color::DarkGray))),
            ])
            .block(Block::default().borders(Borders::ALL).border_style(border).title(Line::from(title)));
            frame.render_widget(card, cols[col]);
        }
    }
}

fn build_detail(job: Option<&JobListing>) -> Text<'_> {
    let Some(job) = job else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(Span::styled(
        &job.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", job.company)));
    if job.urgent {
        lines.push(Line::from(Span::styled("Urgent", Style::default().fg(Color::Red))));
    }
    lines.push(Line::from(format!("Location: {}", location_label(job))));
    lines.push(Line::from(format!("Type: {}   Category: {}", job.job_type, job.category)));
    lines.push(Line::from(format!("Salary: {}", format_salary(job.salary.min, job.salary.max))));
    lines.push(Line::from(format!("Posted: {}", job.posted_at.format("%Y-%m-%d"))));
    lines.push(Line::from(""));

    lines.push(Line::from(Span::styled(
        "Job Description",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for line in textwrap::fill(&job.description, 70).lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));

    if !job.requirements.is_empty() {
        lines.push(Line::from(Span::styled(
            "Requirements",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for req in &job.requirements {
            lines.push(Line::from(format!("  * {}", req)));
        }
    }

    Text::from(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortKey;
    use crossterm::event::KeyModifiers;

    fn press(state: &mut AppState, db: &Database, code: KeyCode) -> bool {
        handle_key(state, KeyEvent::new(code, KeyModifiers::NONE), db)
    }

    fn type_text(state: &mut AppState, db: &Database, text: &str) {
        for c in text.chars() {
            press(state, db, KeyCode::Char(c));
        }
    }

    fn setup() -> (Database, AppState) {
        let db = Database::open_in_memory().unwrap();
        db.init().unwrap();
        db.seed_sample().unwrap();
        let state = AppState::new(db.active_listings().unwrap(), FilterState::new(), Some("amina".to_string()));
        (db, state)
    }

    #[test]
    fn typing_search_filters_on_each_key() {
        let (db, mut state) = setup();
        press(&mut state, &db, KeyCode::Char('/'));
        type_text(&mut state, &db, "selcom");
        assert_eq!(state.filters.search_text(), "selcom");
        assert_eq!(state.result_count(), 1);

        press(&mut state, &db, KeyCode::Enter);
        assert_eq!(state.mode, Mode::Normal);
        // 'q' quits only once editing is done
        assert!(press(&mut state, &db, KeyCode::Char('q')));
    }

    #[test]
    fn location_remote_and_clear() {
        let (db, mut state) = setup();
        press(&mut state, &db, KeyCode::Char('L'));
        type_text(&mut state, &db, "remote");
        press(&mut state, &db, KeyCode::Esc);
        assert_eq!(state.result_count(), 2);

        press(&mut state, &db, KeyCode::Char('x'));
        assert_eq!(state.result_count(), 6);
    }

    #[test]
    fn sort_and_view_toggles() {
        let (db, mut state) = setup();
        press(&mut state, &db, KeyCode::Char('s'));
        assert_eq!(state.filters.sort_key(), SortKey::Oldest);
        press(&mut state, &db, KeyCode::Char('v'));
        assert_eq!(state.view, ViewMode::List);
    }

    #[test]
    fn filter_panel_toggles_contract() {
        let (db, mut state) = setup();
        press(&mut state, &db, KeyCode::Char('f'));
        // salary low, salary high, Full-time, Part-time, Contract
        for _ in 0..4 {
            press(&mut state, &db, KeyCode::Char('j'));
        }
        press(&mut state, &db, KeyCode::Char(' '));
        assert!(state.filters.selected_types().contains(&JobType::Contract));
        assert_eq!(state.result_count(), 1);
    }

    #[test]
    fn max_salary_slider_stops_at_ceiling() {
        let (db, mut state) = setup();
        press(&mut state, &db, KeyCode::Char('f'));
        press(&mut state, &db, KeyCode::Char('j'));
        press(&mut state, &db, KeyCode::Char('l'));
        press(&mut state, &db, KeyCode::Char('l'));
        assert_eq!(state.filters.salary_range().1, crate::filter::SALARY_CEILING);
        press(&mut state, &db, KeyCode::Char('h'));
        assert_eq!(
            state.filters.salary_range().1,
            crate::filter::SALARY_CEILING - SALARY_STEP
        );
    }

    #[test]
    fn selection_clamps_when_results_shrink() {
        let (db, mut state) = setup();
        state.view = ViewMode::List;
        for _ in 0..5 {
            press(&mut state, &db, KeyCode::Char('j'));
        }
        assert_eq!(state.selected, 5);
        press(&mut state, &db, KeyCode::Char('/'));
        type_text(&mut state, &db, "engineer");
        assert_eq!(state.selected, 0);
    }

    #[test]
    fn apply_from_browser_records_application() {
        let (db, mut state) = setup();
        press(&mut state, &db, KeyCode::Char('a'));
        assert_eq!(state.message.as_deref(), Some("Application submitted!"));
        assert_eq!(db.list_applications("amina").unwrap().len(), 1);
    }
}
