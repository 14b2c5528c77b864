use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};

use gplus_dashboard::config::{AppConfig, load_dotenv};
use gplus_dashboard::export::{ExportFormat, export_file_name};
use gplus_dashboard::grid::{self, Grid, GridRow};
use gplus_dashboard::provider;
use gplus_dashboard::state::{AppState, Delta, InputField, ProviderCommand, apply_delta};
use gplus_dashboard::views::{View, league_view_title};

const NUMBER_DECIMALS: usize = 2;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    /// First visible column after the pinned name column.
    col_offset: usize,
}

impl App {
    fn new(config: &AppConfig, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(config),
            should_quit: false,
            cmd_tx,
            col_offset: 0,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.input.is_some() {
            self.on_input_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            KeyCode::Char('1') => self.switch_view(View::Players),
            KeyCode::Char('2') => self.switch_view(View::Goalkeepers),
            KeyCode::Char('3') => self.switch_view(View::Teams),
            KeyCode::Tab | KeyCode::Char('v') => {
                self.state.cycle_view();
                self.col_offset = 0;
            }
            KeyCode::Char('l') | KeyCode::Char('L') => {
                self.state.toggle_league();
                self.col_offset = 0;
            }
            KeyCode::Char('y') => self.state.cycle_season(),
            KeyCode::Char('t') => self.state.cycle_team(true),
            KeyCode::Char('T') => self.state.cycle_team(false),
            KeyCode::Char('/') => self.state.begin_input(InputField::Search),
            KeyCode::Char('m') => self.state.begin_input(InputField::MinMinutes),
            KeyCode::Char('d') => self.state.begin_input(InputField::StartDate),
            KeyCode::Char('D') => self.state.begin_input(InputField::EndDate),
            KeyCode::Char('s') => self.state.cycle_sort_column(),
            KeyCode::Char('S') => self.state.flip_sort(),
            KeyCode::Char('n') | KeyCode::PageDown => self.state.next_page(),
            KeyCode::Char('p') | KeyCode::PageUp => self.state.prev_page(),
            KeyCode::Char('z') => self.state.cycle_page_size(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Right => {
                let max = self.state.grid().columns.len().saturating_sub(2);
                self.col_offset = (self.col_offset + 1).min(max);
            }
            KeyCode::Left => self.col_offset = self.col_offset.saturating_sub(1),
            KeyCode::Char('c') => {
                self.state.clear_filters();
                self.col_offset = 0;
                self.state.push_log("[INFO] Filters cleared");
            }
            KeyCode::Char('r') => {
                self.state.invalidate();
                self.state.push_log("[INFO] Refresh requested");
            }
            KeyCode::Char('x') => self.request_export(ExportFormat::Csv),
            KeyCode::Char('X') => self.request_export(ExportFormat::Xlsx),
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.state.commit_input(),
            KeyCode::Esc => self.state.cancel_input(),
            KeyCode::Backspace => self.state.input_pop(),
            KeyCode::Char(c) => self.state.input_push(c),
            _ => {}
        }
    }

    fn switch_view(&mut self, view: View) {
        self.state.set_view(view);
        self.col_offset = 0;
    }

    fn maybe_fetch(&mut self) {
        if !self.state.needs_fetch() {
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            return;
        };
        let league = self.state.league;
        let cmd = ProviderCommand::FetchLeague {
            league,
            query: self.state.query(),
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Fetch request failed");
            self.cmd_tx = None;
        } else {
            self.state.mark_loading();
            self.state
                .push_log(format!("[INFO] Fetching {}", league.label()));
        }
    }

    fn request_export(&mut self, format: ExportFormat) {
        if self.state.grid().rows.is_empty() {
            self.state.push_log("[INFO] Nothing to export");
            return;
        }
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Export unavailable");
            return;
        };
        let parts = self.state.export_parts();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        let path = export_file_name(&parts, format);
        let cmd = ProviderCommand::Export {
            path: path.clone(),
            format,
            title: league_view_title(self.state.league, self.state.view),
            grid: self.state.grid().clone(),
        };
        if tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Export request failed");
        } else {
            self.state.push_log(format!("[INFO] Exporting to {path}"));
        }
    }
}

fn main() -> io::Result<()> {
    load_dotenv();
    let config = AppConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    provider::spawn_provider(config.clone(), tx, cmd_rx);

    let mut app = App::new(&config, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.maybe_fetch();

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let filters = Paragraph::new(filter_text(&app.state))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(filters, chunks[1]);

    render_grid(frame, chunks[2], &app.state, app.col_offset);

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[3]);

    let footer_style = if app.state.export.failed {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let footer = Paragraph::new(footer_text(&app.state)).style(footer_style);
    frame.render_widget(footer, chunks[4]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let status = if state.is_loading() {
        "Loading...".to_string()
    } else if let Some(err) = state.view_error() {
        format!("Error: {err}")
    } else {
        format!("{} rows", state.grid().rows.len())
    };
    let tabs = View::ALL
        .iter()
        .map(|v| {
            if *v == state.view {
                format!("[{}]", v.label())
            } else {
                v.label().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ");
    let line1 = format!(
        " G+ DASHBOARD | {} | {}",
        league_view_title(state.league, state.view),
        status
    );
    let line2 = format!(" {tabs}");
    format!("{line1}\n{line2}")
}

fn filter_text(state: &AppState) -> String {
    if let Some(field) = state.input {
        return format!(" {}: {}_", field.label(), state.input_buffer);
    }
    let scope = if state.query().has_date_range() {
        format!(
            "Dates {} to {}",
            state.start_date.as_deref().unwrap_or("-"),
            state.end_date.as_deref().unwrap_or("today")
        )
    } else {
        format!("Season {}", state.season)
    };
    let mut parts = vec![scope, format!("Sort {}", state.sort_label())];
    if state.view.supports_entity_filters() {
        parts.push(state.team_filter_label());
        if let Some(min) = state.min_minutes {
            parts.push(format!("Min {min}'"));
        }
        if !state.name_query.trim().is_empty() {
            parts.push(format!("Search \"{}\"", state.name_query.trim()));
        }
    }
    format!(" {}", parts.join(" | "))
}

fn footer_text(state: &AppState) -> String {
    if state.input.is_some() {
        return "Enter Apply | Esc Cancel | Backspace Delete".to_string();
    }
    let export = state
        .export
        .message
        .as_deref()
        .map(|m| format!(" | {m}"))
        .unwrap_or_default();
    format!(
        "Page {}/{} ({} per page) | Tab View | l League | y Season | t Team | / Search | s Sort | n/p Page | x CSV | ? Help | q Quit{export}",
        state.page + 1,
        state.page_count(),
        state.page_size
    )
}

fn render_grid(frame: &mut Frame, area: Rect, state: &AppState, col_offset: usize) {
    let grid = state.grid();
    if grid.columns.is_empty() {
        let msg = if state.is_loading() {
            "Fetching goals added..."
        } else if state.view_error().is_some() {
            "No data: the last fetch failed (r to retry)"
        } else {
            "No data yet"
        };
        let empty = Paragraph::new(msg).style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let visible = visible_columns(grid, col_offset, area.width);
    let header = Row::new(
        visible
            .iter()
            .map(|&idx| Cell::from(grid.columns[idx].label.clone())),
    )
    .style(Style::default().add_modifier(Modifier::BOLD));

    let rows = state
        .page_rows()
        .iter()
        .map(|row| grid_row(grid, row, &visible));
    let widths = visible
        .iter()
        .map(|&idx| Constraint::Length(column_width(grid, idx)));

    let table = Table::new(rows, widths)
        .header(header)
        .highlight_style(Style::default().fg(Color::White).bg(Color::DarkGray));
    let mut table_state = TableState::default();
    if !state.page_rows().is_empty() {
        table_state.select(Some(state.selected));
    }
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn grid_row<'a>(grid: &Grid, row: &'a GridRow, visible: &[usize]) -> Row<'a> {
    Row::new(visible.iter().map(|&idx| {
        let cell = &row.cells[idx];
        let text = cell.display(NUMBER_DECIMALS);
        let style = match cell.as_number() {
            Some(n) if grid::is_numeric(&grid.columns[idx]) && n < 0.0 => {
                Style::default().fg(Color::Red)
            }
            _ => Style::default(),
        };
        Cell::from(text).style(style)
    }))
}

/// Column 0 stays pinned; the rest scroll horizontally from `col_offset`.
fn visible_columns(grid: &Grid, col_offset: usize, width: u16) -> Vec<usize> {
    let mut out = vec![0];
    let mut used = column_width(grid, 0) + 1;
    for idx in (1 + col_offset)..grid.columns.len() {
        let w = column_width(grid, idx) + 1;
        if used + w > width && out.len() > 1 {
            break;
        }
        used += w;
        out.push(idx);
    }
    out
}

fn column_width(grid: &Grid, idx: usize) -> u16 {
    let column = &grid.columns[idx];
    let width = if grid::is_numeric(column) {
        column.label.chars().count().clamp(8, 18)
    } else {
        column.label.chars().count().max(24)
    };
    width as u16
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No requests yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "G+ Dashboard - Help",
        "",
        "Views:",
        "  1 / 2 / 3    Players / Goalkeepers / Teams",
        "  Tab / v      Next view",
        "  l            Toggle MLS / NWSL",
        "",
        "Filters:",
        "  y            Next season",
        "  t / T        Next / previous team",
        "  /            Search by name",
        "  m            Minimum minutes",
        "  d / D        Start / end date",
        "  c            Clear filters",
        "  r            Refetch",
        "",
        "Grid:",
        "  s / S        Sort column / direction",
        "  n / p        Next / previous page",
        "  z            Page size",
        "  j/k or ↑/↓   Move",
        "  ←/→          Scroll columns",
        "  x / X        Export CSV / XLSX",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
