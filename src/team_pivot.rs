use std::collections::{HashMap, HashSet};

use crate::model::{EntityId, GoalsAddedTeam};
use crate::pivot::{Column, LookupTable};

pub const FIELD_TEAM: &str = "team_name";
pub const FIELD_TOTAL_FOR: &str = "total_goals_added_for";
pub const FIELD_TOTAL_AGAINST: &str = "total_goals_added_against";
pub const FIELD_TOTAL_DIFF: &str = "total_goals_added_diff";

/// Action types the team totals skip unless configured otherwise.
pub const DEFAULT_TEAM_TOTAL_EXCLUDES: &[&str] = &["Interrupting", "Claiming"];

#[derive(Debug, Clone, PartialEq)]
pub struct TeamPivotConfig {
    pub unknown_prefix: String,
    pub total_excludes: Vec<String>,
}

impl Default for TeamPivotConfig {
    fn default() -> Self {
        Self {
            unknown_prefix: "Unknown Team".to_string(),
            total_excludes: DEFAULT_TEAM_TOTAL_EXCLUDES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamSplit {
    pub goals_added_for: f64,
    pub goals_added_against: f64,
}

impl TeamSplit {
    pub fn net(&self) -> f64 {
        self.goals_added_for - self.goals_added_against
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamRow {
    pub team_id: EntityId,
    pub team_name: String,
    pub total_for: f64,
    pub total_against: f64,
    pub actions: HashMap<String, TeamSplit>,
}

impl TeamRow {
    pub fn total_diff(&self) -> f64 {
        self.total_for - self.total_against
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamTable {
    pub columns: Vec<Column>,
    pub action_types: Vec<String>,
    pub rows: Vec<TeamRow>,
}

pub fn action_field_for(action_type: &str) -> String {
    format!("{action_type}_goals_added_for")
}

pub fn action_field_against(action_type: &str) -> String {
    format!("{action_type}_goals_added_against")
}

pub fn action_field_net(action_type: &str) -> String {
    format!("{action_type}_net_goals_added")
}

pub fn team_static_columns() -> Vec<Column> {
    vec![
        Column::text(FIELD_TEAM, "Team"),
        Column::number(FIELD_TOTAL_FOR, "Total G+ For"),
        Column::number(FIELD_TOTAL_AGAINST, "Total G+ Against"),
        Column::number(FIELD_TOTAL_DIFF, "Total G+ Difference"),
    ]
}

/// Pivot team goals-added for/against splits. Records sharing a team id are
/// summed into one row; every action contributes three columns.
pub fn pivot_teams(
    records: &[GoalsAddedTeam],
    team_names: &LookupTable,
    config: &TeamPivotConfig,
) -> TeamTable {
    let mut seen_actions = HashSet::new();
    let mut action_types: Vec<String> = Vec::new();
    let mut index: HashMap<&EntityId, usize> = HashMap::new();
    let mut rows: Vec<TeamRow> = Vec::new();

    for record in records {
        let slot = *index.entry(&record.team_id).or_insert_with(|| {
            let team_name = team_names
                .get(&record.team_id)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} ({})", config.unknown_prefix, record.team_id));
            rows.push(TeamRow {
                team_id: record.team_id.clone(),
                team_name,
                total_for: 0.0,
                total_against: 0.0,
                actions: HashMap::new(),
            });
            rows.len() - 1
        });
        let row = &mut rows[slot];

        for action in &record.data {
            if seen_actions.insert(action.action_type.clone()) {
                action_types.push(action.action_type.clone());
            }
            let split = row.actions.entry(action.action_type.clone()).or_default();
            split.goals_added_for += action.goals_added_for;
            split.goals_added_against += action.goals_added_against;

            if !config.total_excludes.iter().any(|x| *x == action.action_type) {
                row.total_for += action.goals_added_for;
                row.total_against += action.goals_added_against;
            }
        }
    }

    let mut columns = team_static_columns();
    for action in &action_types {
        columns.push(Column::number(
            &action_field_for(action),
            &format!("{action} G+ For"),
        ));
        columns.push(Column::number(
            &action_field_against(action),
            &format!("{action} G+ Against"),
        ));
        columns.push(Column::number(
            &action_field_net(action),
            &format!("{action} Net G+"),
        ));
    }

    TeamTable {
        columns,
        action_types,
        rows,
    }
}
