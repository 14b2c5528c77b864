use std::collections::{HashMap, HashSet, VecDeque};

use crate::config::AppConfig;
use crate::export::ExportFormat;
use crate::grid::{DEFAULT_PAGE_SIZE, Grid, GridRow, PAGE_SIZES, SortDirection};
use crate::model::{EntityId, League};
use crate::query::{GoalsAddedQuery, parse_date};
use crate::views::{LeagueData, View, ViewFilters, build_view_grid, team_options};

const MAX_LOGS: usize = 200;

/// Which text field the keyboard is currently typing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputField {
    Search,
    MinMinutes,
    StartDate,
    EndDate,
}

impl InputField {
    pub fn label(self) -> &'static str {
        match self {
            InputField::Search => "Search",
            InputField::MinMinutes => "Min minutes",
            InputField::StartDate => "Start date (YYYY-MM-DD)",
            InputField::EndDate => "End date (YYYY-MM-DD)",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExportStatus {
    pub message: Option<String>,
    pub failed: bool,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: View,
    pub league: League,
    pub seasons: Vec<String>,
    pub default_season: String,
    pub season: String,
    pub team_filter: Option<EntityId>,
    pub name_query: String,
    pub min_minutes: Option<u32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub input: Option<InputField>,
    pub input_buffer: String,
    pub sort_field: String,
    pub sort_dir: SortDirection,
    pub page: usize,
    pub page_size: usize,
    pub selected: usize,
    pub data: HashMap<League, LeagueData>,
    pub data_keys: HashMap<League, String>,
    pub loading: HashSet<League>,
    pub last_error: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub export: ExportStatus,
    grid: Grid,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&AppConfig::default())
    }
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let mut seasons = config.seasons.clone();
        if !seasons.iter().any(|s| *s == config.default_season) {
            seasons.insert(0, config.default_season.clone());
        }
        let view = View::Players;
        Self {
            view,
            league: League::Mls,
            seasons,
            default_season: config.default_season.clone(),
            season: config.default_season.clone(),
            team_filter: None,
            name_query: String::new(),
            min_minutes: None,
            start_date: None,
            end_date: None,
            input: None,
            input_buffer: String::new(),
            sort_field: view.default_sort_field().to_string(),
            sort_dir: SortDirection::Desc,
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            selected: 0,
            data: HashMap::new(),
            data_keys: HashMap::new(),
            loading: HashSet::new(),
            last_error: None,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
            export: ExportStatus::default(),
            grid: Grid::empty(Vec::new()),
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    /// Query the goals-added endpoints are fetched with right now.
    pub fn query(&self) -> GoalsAddedQuery {
        GoalsAddedQuery {
            season_name: Some(self.season.clone()),
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            minimum_minutes: self.min_minutes,
            ..GoalsAddedQuery::default()
        }
    }

    pub fn query_key(&self) -> String {
        self.query().cache_key(self.league.slug())
    }

    pub fn filters(&self) -> ViewFilters {
        let name = self.name_query.trim();
        ViewFilters {
            team_id: self.team_filter.clone(),
            name_query: (!name.is_empty()).then(|| name.to_string()),
        }
    }

    pub fn current_data(&self) -> Option<&LeagueData> {
        self.data.get(&self.league)
    }

    /// Why the current view has no data: a failed league fetch, or a failed
    /// endpoint the view depends on.
    pub fn view_error(&self) -> Option<String> {
        self.last_error
            .clone()
            .or_else(|| self.current_data().and_then(|data| data.view_error(self.view)))
    }

    pub fn is_loading(&self) -> bool {
        self.loading.contains(&self.league)
    }

    /// True when the current league has nothing cached for the current query
    /// and no fetch for it is in flight.
    pub fn needs_fetch(&self) -> bool {
        !self.is_loading() && self.data_keys.get(&self.league) != Some(&self.query_key())
    }

    /// Forget the cached key so the next tick refetches the current league.
    pub fn invalidate(&mut self) {
        self.data_keys.remove(&self.league);
    }

    pub fn mark_loading(&mut self) {
        self.loading.insert(self.league);
        self.last_error = None;
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn page_rows(&self) -> &[GridRow] {
        self.grid.page(self.page, self.page_size)
    }

    pub fn page_count(&self) -> usize {
        self.grid.page_count(self.page_size)
    }

    /// Rebuild the grid from cached data, filters and sort. Keeps the page in range.
    pub fn rebuild_grid(&mut self) {
        let mut grid = match self.current_data() {
            Some(data) => build_view_grid(self.view, data, &self.filters()),
            None => Grid::empty(Vec::new()),
        };
        if grid.column_index(&self.sort_field).is_none() {
            self.sort_field = self.view.default_sort_field().to_string();
            self.sort_dir = SortDirection::Desc;
        }
        grid.sort_by(&self.sort_field, self.sort_dir);
        self.grid = grid;
        self.page = self.page.min(self.page_count().saturating_sub(1));
        self.clamp_selection();
    }

    pub fn set_view(&mut self, view: View) {
        if self.view == view {
            return;
        }
        self.view = view;
        self.sort_field = view.default_sort_field().to_string();
        self.sort_dir = SortDirection::Desc;
        self.page = 0;
        self.selected = 0;
        self.rebuild_grid();
    }

    pub fn cycle_view(&mut self) {
        self.set_view(self.view.next());
    }

    /// Team ids differ per league, so the team filter does not carry over.
    pub fn toggle_league(&mut self) {
        self.league = self.league.toggle();
        self.team_filter = None;
        self.page = 0;
        self.selected = 0;
        self.last_error = None;
        self.rebuild_grid();
    }

    /// Picking a season drops any custom date range, which would override it.
    pub fn cycle_season(&mut self) {
        if self.seasons.is_empty() {
            return;
        }
        let idx = self
            .seasons
            .iter()
            .position(|s| *s == self.season)
            .map(|i| (i + 1) % self.seasons.len())
            .unwrap_or(0);
        self.season = self.seasons[idx].clone();
        self.start_date = None;
        self.end_date = None;
        self.page = 0;
        self.rebuild_grid();
    }

    pub fn team_choices(&self) -> Vec<(EntityId, String)> {
        self.current_data()
            .map(|data| team_options(self.view, data))
            .unwrap_or_default()
    }

    pub fn team_filter_label(&self) -> String {
        match &self.team_filter {
            None => "All teams".to_string(),
            Some(id) => self
                .team_choices()
                .into_iter()
                .find(|(tid, _)| tid == id)
                .map(|(_, name)| name)
                .unwrap_or_else(|| id.to_string()),
        }
    }

    /// Step through "All teams" followed by every team, sorted by name.
    pub fn cycle_team(&mut self, forward: bool) {
        if !self.view.supports_entity_filters() {
            return;
        }
        let choices = self.team_choices();
        if choices.is_empty() {
            self.team_filter = None;
            return;
        }
        let slots = choices.len() + 1;
        let current = match &self.team_filter {
            None => 0,
            Some(id) => choices
                .iter()
                .position(|(tid, _)| tid == id)
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        self.team_filter = if next == 0 {
            None
        } else {
            Some(choices[next - 1].0.clone())
        };
        self.page = 0;
        self.selected = 0;
        self.rebuild_grid();
    }

    pub fn begin_input(&mut self, field: InputField) {
        if !self.view.supports_entity_filters() {
            return;
        }
        self.input_buffer = match field {
            InputField::Search => self.name_query.clone(),
            InputField::MinMinutes => self.min_minutes.map(|m| m.to_string()).unwrap_or_default(),
            InputField::StartDate => self.start_date.clone().unwrap_or_default(),
            InputField::EndDate => self.end_date.clone().unwrap_or_default(),
        };
        self.input = Some(field);
    }

    pub fn input_push(&mut self, c: char) {
        self.input_buffer.push(c);
        if self.input == Some(InputField::Search) {
            self.set_name_query(self.input_buffer.clone());
        }
    }

    pub fn input_pop(&mut self) {
        self.input_buffer.pop();
        if self.input == Some(InputField::Search) {
            self.set_name_query(self.input_buffer.clone());
        }
    }

    pub fn cancel_input(&mut self) {
        self.input = None;
        self.input_buffer.clear();
    }

    /// Apply the typed value. Invalid numbers or dates are rejected with a log
    /// line and leave the previous value in place.
    pub fn commit_input(&mut self) {
        let Some(field) = self.input.take() else {
            return;
        };
        let raw = std::mem::take(&mut self.input_buffer);
        let raw = raw.trim();
        match field {
            InputField::Search => self.set_name_query(raw.to_string()),
            InputField::MinMinutes => {
                if raw.is_empty() {
                    self.min_minutes = None;
                } else if let Ok(value) = raw.parse::<u32>() {
                    self.min_minutes = Some(value);
                } else {
                    self.push_log(format!("[WARN] Not a number of minutes: {raw}"));
                }
            }
            InputField::StartDate | InputField::EndDate => {
                let value = if raw.is_empty() {
                    None
                } else if parse_date(raw).is_some() {
                    Some(raw.to_string())
                } else {
                    self.push_log(format!("[WARN] Not a YYYY-MM-DD date: {raw}"));
                    return;
                };
                if field == InputField::StartDate {
                    self.start_date = value;
                } else {
                    self.end_date = value;
                }
            }
        }
        self.page = 0;
        self.rebuild_grid();
    }

    pub fn set_name_query(&mut self, query: String) {
        self.name_query = query;
        self.page = 0;
        self.selected = 0;
        self.rebuild_grid();
    }

    /// Reset every filter, the sort and the paging to their defaults.
    pub fn clear_filters(&mut self) {
        self.team_filter = None;
        self.name_query.clear();
        self.min_minutes = None;
        self.start_date = None;
        self.end_date = None;
        self.season = self.default_season.clone();
        self.input = None;
        self.input_buffer.clear();
        self.sort_field = self.view.default_sort_field().to_string();
        self.sort_dir = SortDirection::Desc;
        self.page = 0;
        self.selected = 0;
        self.rebuild_grid();
    }

    /// Move the sort to the next column. New columns start descending.
    pub fn cycle_sort_column(&mut self) {
        let fields: Vec<String> = self.grid.columns.iter().map(|c| c.field.clone()).collect();
        if fields.is_empty() {
            return;
        }
        let idx = fields
            .iter()
            .position(|f| *f == self.sort_field)
            .map(|i| (i + 1) % fields.len())
            .unwrap_or(0);
        self.sort_field = fields[idx].clone();
        self.sort_dir = SortDirection::Desc;
        self.page = 0;
        self.rebuild_grid();
    }

    pub fn flip_sort(&mut self) {
        self.sort_dir = self.sort_dir.flip();
        self.rebuild_grid();
    }

    pub fn sort_label(&self) -> String {
        let label = self
            .grid
            .column_index(&self.sort_field)
            .map(|i| self.grid.columns[i].label.clone())
            .unwrap_or_else(|| self.sort_field.clone());
        let arrow = match self.sort_dir {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        };
        format!("{label} {arrow}")
    }

    pub fn next_page(&mut self) {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            self.selected = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.selected = 0;
        }
    }

    pub fn cycle_page_size(&mut self) {
        let idx = PAGE_SIZES
            .iter()
            .position(|s| *s == self.page_size)
            .map(|i| (i + 1) % PAGE_SIZES.len())
            .unwrap_or(0);
        self.page_size = PAGE_SIZES[idx];
        self.page = 0;
        self.selected = 0;
    }

    pub fn select_next(&mut self) {
        let len = self.page_rows().len();
        if len > 0 && self.selected + 1 < len {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    /// `league`, `view` and the season or date range, for titles and file names.
    pub fn export_parts(&self) -> Vec<String> {
        let scope = if self.query().has_date_range() {
            format!(
                "{}-to-{}",
                self.start_date.as_deref().unwrap_or("start"),
                self.end_date.as_deref().unwrap_or("today")
            )
        } else {
            self.season.clone()
        };
        vec![
            self.league.slug().to_string(),
            self.view.label().to_string(),
            scope,
        ]
    }

    fn clamp_selection(&mut self) {
        let len = self.page_rows().len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    LeagueLoaded {
        league: League,
        key: String,
        data: LeagueData,
    },
    FetchFailed {
        league: League,
        key: String,
        message: String,
    },
    ExportFinished {
        path: String,
        rows: usize,
    },
    ExportFailed {
        path: String,
        message: String,
    },
    Log(String),
}

#[derive(Debug, Clone)]
pub enum ProviderCommand {
    FetchLeague {
        league: League,
        query: GoalsAddedQuery,
    },
    Export {
        path: String,
        format: ExportFormat,
        title: String,
        grid: Grid,
    },
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::LeagueLoaded { league, key, data } => {
            state.loading.remove(&league);
            state.push_log(format!(
                "[INFO] {} loaded: {} players, {} goalkeepers, {} teams",
                league.label(),
                data.players_goals_added.len(),
                data.goalkeepers_goals_added.len(),
                data.teams_goals_added.len()
            ));
            for (endpoint, message) in &data.failures {
                state.push_log(format!(
                    "[WARN] {} {} failed: {message}",
                    league.label(),
                    endpoint.path()
                ));
            }
            state.data.insert(league, data);
            state.data_keys.insert(league, key);
            if league == state.league {
                state.last_error = None;
                state.rebuild_grid();
            }
        }
        Delta::FetchFailed {
            league,
            key,
            message,
        } => {
            state.loading.remove(&league);
            state.push_log(format!("[WARN] {} fetch failed: {message}", league.label()));
            // Remember the key so the same failing query is not retried every tick.
            state.data_keys.insert(league, key);
            state.data.remove(&league);
            if league == state.league {
                state.last_error = Some(message);
                state.rebuild_grid();
            }
        }
        Delta::ExportFinished { path, rows } => {
            let msg = format!("Exported {rows} rows to {path}");
            state.push_log(format!("[INFO] {msg}"));
            state.export = ExportStatus {
                message: Some(msg),
                failed: false,
            };
        }
        Delta::ExportFailed { path, message } => {
            state.push_log(format!("[WARN] Export to {path} failed: {message}"));
            state.export = ExportStatus {
                message: Some(format!("Export failed: {message}")),
                failed: true,
            };
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
