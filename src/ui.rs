use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use roster_ledger::{
    describe_add, format_salary, AvailableQuery, CandidatePool, LedgerEvent, PoolPlayer,
    RemoveOutcome, RosterStore,
};
use std::io;

/// Step used by the +/- budget keys
const BUDGET_STEP: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    MyTeam,
    AvailablePlayers,
    History,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::MyTeam => Page::AvailablePlayers,
            Page::AvailablePlayers => Page::History,
            Page::History => Page::MyTeam,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::MyTeam => Page::History,
            Page::AvailablePlayers => Page::MyTeam,
            Page::History => Page::AvailablePlayers,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::MyTeam => "My Team",
            Page::AvailablePlayers => "Available Players",
            Page::History => "History",
        }
    }
}

pub struct App {
    pub ledger: RosterStore,
    pub pool: CandidatePool,
    pub available: Vec<PoolPlayer>,
    pub history: Vec<LedgerEvent>,
    pub team_state: TableState,
    pub available_state: TableState,
    pub current_page: Page,
    pub status: String,
}

impl App {
    pub fn new(ledger: RosterStore, pool: CandidatePool) -> Self {
        let mut app = Self {
            ledger,
            pool,
            available: Vec::new(),
            history: Vec::new(),
            team_state: TableState::default(),
            available_state: TableState::default(),
            current_page: Page::AvailablePlayers,
            status: String::from("Pick players with Enter. Tab switches pages."),
        };

        app.refresh();
        app
    }

    /// Re-query candidates against the new remaining budget and fix selections
    pub fn refresh(&mut self) {
        let query = AvailableQuery::Budget(self.ledger.remaining());
        self.available = self.pool.query(query);
        self.history = self.ledger.history(50);

        clamp_selection(&mut self.team_state, self.ledger.roster().len());
        clamp_selection(&mut self.available_state, self.available.len());
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    fn active_list(&mut self) -> (&mut TableState, usize) {
        match self.current_page {
            Page::MyTeam => (&mut self.team_state, self.ledger.roster().len()),
            Page::AvailablePlayers | Page::History => {
                (&mut self.available_state, self.available.len())
            }
        }
    }

    pub fn next(&mut self) {
        let (state, len) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let (state, len) = self.active_list();
        if len == 0 {
            return;
        }
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    /// Add the highlighted candidate through the Mutation API
    pub fn add_selected(&mut self) {
        let Some(player) = self
            .available_state
            .selected()
            .and_then(|i| self.available.get(i))
            .cloned()
        else {
            self.status = String::from("No player selected.");
            return;
        };

        let outcome = self.ledger.add_player(player.to_candidate());
        self.status = describe_add(outcome, &player.name, self.ledger.remaining());
        self.refresh();
    }

    pub fn remove_selected(&mut self) {
        let Some(name) = self
            .team_state
            .selected()
            .and_then(|i| self.ledger.roster().entries().get(i))
            .map(|e| e.name.clone())
        else {
            self.status = String::from("No player selected.");
            return;
        };

        self.status = match self.ledger.remove_player(&name) {
            RemoveOutcome::Removed => format!(
                "Removed {}. Remaining budget: {}",
                name,
                format_salary(self.ledger.remaining())
            ),
            RemoveOutcome::NotFound => format!("{} is not on your team.", name),
        };
        self.refresh();
    }

    pub fn reset_team(&mut self) {
        self.ledger.reset_roster();
        self.status = String::from("Team cleared.");
        self.refresh();
    }

    pub fn adjust_budget(&mut self, delta: f64) {
        let change = self.ledger.set_budget(self.ledger.ceiling() + delta);
        self.status = if change.clamped {
            format!("Budget limited to {}", format_salary(change.applied))
        } else {
            format!("Budget set to {}", format_salary(change.applied))
        };
        self.refresh();
    }

    pub fn reset_budget(&mut self) {
        let change = self.ledger.reset_budget(None);
        self.status = format!("Budget reset to {}", format_salary(change.applied));
        self.refresh();
    }
}

fn clamp_selection(state: &mut TableState, len: usize) {
    match state.selected() {
        _ if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        None => state.select(Some(0)),
        _ => {}
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
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
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Enter | KeyCode::Char('a') if app.current_page == Page::AvailablePlayers => {
                    app.add_selected()
                }
                KeyCode::Delete | KeyCode::Char('d') if app.current_page == Page::MyTeam => {
                    app.remove_selected()
                }
                KeyCode::Char('R') => app.reset_team(),
                KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_budget(BUDGET_STEP),
                KeyCode::Char('-') => app.adjust_budget(-BUDGET_STEP),
                KeyCode::Char('b') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    app.reset_budget()
                }
                KeyCode::Char('r') => app.refresh(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Length(3), // Budget gauge
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_budget(f, chunks[1], app);

    match app.current_page {
        Page::MyTeam => render_team(f, chunks[2], app),
        Page::AvailablePlayers => render_available(f, chunks[2], app),
        Page::History => render_history(f, chunks[2], app),
    }

    render_status_bar(f, chunks[3], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::MyTeam, Page::AvailablePlayers, Page::History];

    let mut tab_spans = vec![];
    for (i, page) in pages.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Players: {}", app.ledger.roster().len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_budget(f: &mut Frame, area: Rect, app: &App) {
    let summary = app.ledger.summary();
    let color = if summary.is_over_budget() { Color::Red } else { Color::Green };

    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Budget "))
        .gauge_style(Style::default().fg(color))
        .ratio(summary.utilization().clamp(0.0, 1.0))
        .label(summary.describe());

    f.render_widget(gauge, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
    });

    Row::new(cells).style(Style::default().bg(Color::DarkGray)).height(1)
}

fn render_team(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .ledger
        .roster()
        .iter()
        .map(|entry| {
            Row::new(vec![
                Cell::from(truncate(&entry.name, 30)),
                Cell::from(entry.position.clone()),
                Cell::from(entry.display_salary.clone()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Length(32), Constraint::Length(10), Constraint::Length(18)],
    )
    .header(header_row(&["Player", "Position", "Salary"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" My Team "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.team_state);
}

fn render_available(f: &mut Frame, area: Rect, app: &mut App) {
    let remaining = app.ledger.remaining();

    let rows: Vec<Row> = app
        .available
        .iter()
        .map(|player| {
            let on_team = app.ledger.roster().contains(&player.name);
            let color = if on_team {
                Color::DarkGray
            } else if player.salary_amount() <= remaining {
                Color::Green
            } else {
                Color::Red
            };

            Row::new(vec![
                Cell::from(player.rank.to_string()),
                Cell::from(truncate(&player.name, 30)),
                Cell::from(player.salary.clone()).style(Style::default().fg(color)),
                Cell::from(if on_team { "on team" } else { "" }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(32),
            Constraint::Length(18),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["Rank", "Player", "Salary", ""]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Available Players "),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.available_state);
}

fn render_history(f: &mut Frame, area: Rect, app: &App) {
    let rows: Vec<Row> = app
        .history
        .iter()
        .map(|event| {
            Row::new(vec![
                Cell::from(event.timestamp.format("%H:%M:%S").to_string()),
                Cell::from(event.event_type.clone()),
                Cell::from(truncate(&event.subject, 30)),
                Cell::from(event.data.to_string()),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(32),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Time", "Event", "Subject", "Data"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" History "),
    );

    f.render_widget(table, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![Span::styled(
        format!(" {} ", app.status),
        Style::default().fg(Color::Cyan),
    )];

    if !app.ledger.is_durable() {
        status_spans.push(Span::styled(" [not saved] ", Style::default().fg(Color::Red)));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Add | "));
    status_spans.push(Span::styled("d", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Remove | "));
    status_spans.push(Span::styled("R", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Reset | "));
    status_spans.push(Span::styled("+/-", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Budget | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
