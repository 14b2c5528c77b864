use crate::grid::Grid;
use crate::model::{
    EntityId, GoalsAddedGoalkeeper, GoalsAddedPlayer, GoalsAddedTeam, League, Player, Team,
};
use crate::pivot::{
    FIELD_TOTAL, LookupTable, MetricRecord, PivotConfig, PivotFilter, goalkeeper_lookups, pivot,
};
use crate::team_pivot::{FIELD_TOTAL_DIFF, TeamPivotConfig, pivot_teams};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Players,
    Goalkeepers,
    Teams,
}

impl View {
    pub const ALL: [View; 3] = [View::Players, View::Goalkeepers, View::Teams];

    pub fn label(self) -> &'static str {
        match self {
            View::Players => "Players",
            View::Goalkeepers => "Goalkeepers",
            View::Teams => "Teams",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            View::Players => "players",
            View::Goalkeepers => "goalkeepers",
            View::Teams => "teams",
        }
    }

    pub fn from_slug(raw: &str) -> Option<Self> {
        let raw = raw.trim().to_ascii_lowercase();
        View::ALL
            .into_iter()
            .find(|v| v.slug() == raw || v.slug().trim_end_matches('s') == raw)
    }

    pub fn next(self) -> Self {
        match self {
            View::Players => View::Goalkeepers,
            View::Goalkeepers => View::Teams,
            View::Teams => View::Players,
        }
    }

    /// Column the grid is sorted by (descending) when the view opens.
    pub fn default_sort_field(self) -> &'static str {
        match self {
            View::Players | View::Goalkeepers => FIELD_TOTAL,
            View::Teams => FIELD_TOTAL_DIFF,
        }
    }

    /// Whether the team/name/minutes/date filters apply.
    pub fn supports_entity_filters(self) -> bool {
        !matches!(self, View::Teams)
    }

    /// Endpoints whose data the view cannot be built without.
    pub fn endpoints(self) -> &'static [Endpoint] {
        match self {
            View::Players => &[
                Endpoint::Teams,
                Endpoint::Players,
                Endpoint::PlayersGoalsAdded,
            ],
            View::Goalkeepers => &[Endpoint::GoalkeepersGoalsAdded],
            View::Teams => &[Endpoint::Teams, Endpoint::TeamsGoalsAdded],
        }
    }
}

/// The upstream resources one league fetch reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Teams,
    Players,
    PlayersGoalsAdded,
    GoalkeepersGoalsAdded,
    TeamsGoalsAdded,
}

impl Endpoint {
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::Teams => "teams",
            Endpoint::Players => "players",
            Endpoint::PlayersGoalsAdded => "players/goals-added",
            Endpoint::GoalkeepersGoalsAdded => "goalkeepers/goals-added",
            Endpoint::TeamsGoalsAdded => "teams/goals-added",
        }
    }
}

pub fn player_pivot_config() -> PivotConfig {
    PivotConfig {
        name_label: "Player".to_string(),
        affiliation_label: "Teams".to_string(),
        total_label: "Goals Added (Total)".to_string(),
        show_minutes: true,
        unknown_prefix: "Unknown Player".to_string(),
        total_excludes: Vec::new(),
    }
}

pub fn goalkeeper_pivot_config() -> PivotConfig {
    PivotConfig {
        name_label: "Goalkeeper".to_string(),
        affiliation_label: "Team".to_string(),
        total_label: "Goals Added (Total)".to_string(),
        show_minutes: true,
        unknown_prefix: "Unknown Goalkeeper".to_string(),
        total_excludes: Vec::new(),
    }
}

/// Everything fetched for one league and one query. An endpoint that failed
/// is left empty and listed in `failures`.
#[derive(Debug, Clone, Default)]
pub struct LeagueData {
    pub teams: Vec<Team>,
    pub players: Vec<Player>,
    pub players_goals_added: Vec<GoalsAddedPlayer>,
    pub goalkeepers_goals_added: Vec<GoalsAddedGoalkeeper>,
    pub teams_goals_added: Vec<GoalsAddedTeam>,
    pub failures: Vec<(Endpoint, String)>,
}

impl LeagueData {
    /// First failure among the endpoints `view` depends on.
    pub fn view_error(&self, view: View) -> Option<String> {
        self.failures
            .iter()
            .find(|(endpoint, _)| view.endpoints().contains(endpoint))
            .map(|(endpoint, message)| format!("{}: {message}", endpoint.path()))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewFilters {
    pub team_id: Option<EntityId>,
    pub name_query: Option<String>,
}

/// Build the grid for one view, sorted by the view's default column. A view
/// whose data failed to load gets an empty grid.
pub fn build_view_grid(view: View, data: &LeagueData, filters: &ViewFilters) -> Grid {
    if data.view_error(view).is_some() {
        return Grid::empty(Vec::new());
    }
    let mut grid = match view {
        View::Players => {
            let records: Vec<MetricRecord> = data
                .players_goals_added
                .iter()
                .map(MetricRecord::from_player)
                .collect();
            let players = LookupTable::from_players(&data.players);
            let teams = LookupTable::from_teams(&data.teams);
            pivot(
                &records,
                &players,
                &teams,
                &pivot_filter(filters),
                &player_pivot_config(),
            )
            .to_grid()
        }
        View::Goalkeepers => {
            let records: Vec<MetricRecord> = data
                .goalkeepers_goals_added
                .iter()
                .map(MetricRecord::from_goalkeeper)
                .collect();
            let (keepers, mut teams) = goalkeeper_lookups(&data.goalkeepers_goals_added);
            for team in &data.teams {
                if teams.get(&team.team_id).is_none() {
                    teams.insert(team.team_id.to_string(), team.team_name.clone());
                }
            }
            pivot(
                &records,
                &keepers,
                &teams,
                &pivot_filter(filters),
                &goalkeeper_pivot_config(),
            )
            .to_grid()
        }
        View::Teams => {
            let teams = LookupTable::from_teams(&data.teams);
            pivot_teams(&data.teams_goals_added, &teams, &TeamPivotConfig::default()).to_grid()
        }
    };
    grid.sort_by(view.default_sort_field(), crate::grid::SortDirection::Desc);
    grid
}

/// Team choices for the team filter, sorted by name.
pub fn team_options(view: View, data: &LeagueData) -> Vec<(EntityId, String)> {
    let mut options: Vec<(EntityId, String)> = match view {
        View::Goalkeepers if data.teams.is_empty() => {
            let mut seen = std::collections::HashSet::new();
            data.goalkeepers_goals_added
                .iter()
                .filter_map(|gk| match (gk.team_ids.as_slice(), &gk.team_name) {
                    ([id], Some(name)) => Some((id.clone(), name.clone())),
                    _ => None,
                })
                .filter(|(id, _)| seen.insert(id.clone()))
                .collect()
        }
        _ => data
            .teams
            .iter()
            .map(|t| (t.team_id.clone(), t.team_name.clone()))
            .collect(),
    };
    options.sort_by(|a, b| a.1.to_lowercase().cmp(&b.1.to_lowercase()));
    options
}

pub fn league_view_title(league: League, view: View) -> String {
    format!("{} {}", league.label(), view.label())
}

fn pivot_filter(filters: &ViewFilters) -> PivotFilter {
    PivotFilter {
        secondary_id: filters.team_id.clone(),
        name_query: filters.name_query.clone(),
    }
}
