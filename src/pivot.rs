//! Pivot of flat goals-added records into one row per entity.
//!
//! Input is a list of [`MetricRecord`]s, each a (primary entity, affiliations,
//! actions) tuple. Output is a [`PivotTable`]: rows keyed by primary id with one
//! summed value per action type, plus the column schema describing them. Action
//! columns come from the data itself, in the order they are first seen.

use std::collections::{HashMap, HashSet};

use crate::model::{EntityId, GoalsAddedGoalkeeper, GoalsAddedPlayer, Player, Team};

#[derive(Debug, Clone, PartialEq)]
pub struct ActionMetric {
    pub action_type: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub primary_id: EntityId,
    pub secondary_ids: Vec<EntityId>,
    pub minutes_played: Option<f64>,
    pub actions: Vec<ActionMetric>,
}

impl MetricRecord {
    pub fn from_player(record: &GoalsAddedPlayer) -> Self {
        Self {
            primary_id: record.player_id.clone(),
            secondary_ids: record.team_ids.clone(),
            minutes_played: record.minutes_played,
            actions: record
                .data
                .iter()
                .map(|a| ActionMetric {
                    action_type: a.action_type.clone(),
                    value: a.goals_added_above_avg,
                })
                .collect(),
        }
    }

    pub fn from_goalkeeper(record: &GoalsAddedGoalkeeper) -> Self {
        Self {
            primary_id: record.player_id.clone(),
            secondary_ids: record.team_ids.clone(),
            minutes_played: record.minutes_played,
            actions: record
                .data
                .iter()
                .map(|a| ActionMetric {
                    action_type: a.action_type.clone(),
                    value: a.goals_added_above_avg,
                })
                .collect(),
        }
    }
}

/// Entity id to display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupTable {
    names: HashMap<String, String>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut table = Self::new();
        for (id, name) in pairs {
            table.insert(id, name);
        }
        table
    }

    pub fn from_players(players: &[Player]) -> Self {
        Self::from_pairs(
            players
                .iter()
                .map(|p| (p.player_id.to_string(), p.player_name.clone())),
        )
    }

    pub fn from_teams(teams: &[Team]) -> Self {
        Self::from_pairs(
            teams
                .iter()
                .map(|t| (t.team_id.to_string(), t.team_name.clone())),
        )
    }

    /// Blank names are skipped so they resolve through the fallback instead.
    pub fn insert(&mut self, id: impl Into<String>, name: impl Into<String>) {
        let name = name.into();
        if name.trim().is_empty() {
            return;
        }
        self.names.insert(id.into(), name);
    }

    pub fn get(&self, id: &EntityId) -> Option<&str> {
        self.names.get(id.as_str()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Name lookups for goalkeeper records, which carry their own names.
pub fn goalkeeper_lookups(records: &[GoalsAddedGoalkeeper]) -> (LookupTable, LookupTable) {
    let mut keepers = LookupTable::new();
    let mut teams = LookupTable::new();
    for gk in records {
        if let Some(name) = &gk.player_name {
            keepers.insert(gk.player_id.to_string(), name.clone());
        }
        // A single name only makes sense for a single team.
        if let (Some(name), [team_id]) = (&gk.team_name, gk.team_ids.as_slice()) {
            teams.insert(team_id.to_string(), name.clone());
        }
    }
    (keepers, teams)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub field: String,
    pub label: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn text(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            kind: ColumnKind::Text,
        }
    }

    pub fn number(field: &str, label: &str) -> Self {
        Self {
            field: field.to_string(),
            label: label.to_string(),
            kind: ColumnKind::Number,
        }
    }
}

pub const FIELD_NAME: &str = "name";
pub const FIELD_AFFILIATIONS: &str = "affiliations";
pub const FIELD_MINUTES: &str = "minutes_played";
pub const FIELD_TOTAL: &str = "total";

#[derive(Debug, Clone, PartialEq)]
pub struct PivotConfig {
    pub name_label: String,
    pub affiliation_label: String,
    pub total_label: String,
    pub show_minutes: bool,
    /// Prefix of the synthesized name, rendered as `"<prefix> (<id>)"`.
    pub unknown_prefix: String,
    /// Action types reported as columns but left out of the total.
    pub total_excludes: Vec<String>,
}

impl Default for PivotConfig {
    fn default() -> Self {
        Self {
            name_label: "Name".to_string(),
            affiliation_label: "Teams".to_string(),
            total_label: "Total".to_string(),
            show_minutes: false,
            unknown_prefix: "Unknown".to_string(),
            total_excludes: Vec::new(),
        }
    }
}

impl PivotConfig {
    pub fn fallback_name(&self, id: &EntityId) -> String {
        format!("{} ({id})", self.unknown_prefix)
    }

    pub fn static_columns(&self) -> Vec<Column> {
        let mut columns = vec![
            Column::text(FIELD_NAME, &self.name_label),
            Column::text(FIELD_AFFILIATIONS, &self.affiliation_label),
        ];
        if self.show_minutes {
            columns.push(Column::number(FIELD_MINUTES, "Minutes Played"));
        }
        columns.push(Column::number(FIELD_TOTAL, &self.total_label));
        columns
    }

    fn counts_toward_total(&self, action_type: &str) -> bool {
        !self.total_excludes.iter().any(|x| x == action_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PivotFilter {
    /// Keep only records affiliated with this secondary entity.
    pub secondary_id: Option<EntityId>,
    /// Case-insensitive substring of the resolved display name.
    pub name_query: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotRow {
    pub entity_id: EntityId,
    pub display_name: String,
    pub secondary_ids: Vec<EntityId>,
    pub secondary_names: String,
    pub minutes_played: f64,
    pub total: f64,
    pub actions: HashMap<String, f64>,
}

impl PivotRow {
    pub fn action(&self, action_type: &str) -> Option<f64> {
        self.actions.get(action_type).copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PivotTable {
    pub columns: Vec<Column>,
    pub action_types: Vec<String>,
    pub rows: Vec<PivotRow>,
}

struct Group<'a> {
    primary_id: &'a EntityId,
    secondary_ids: Vec<&'a EntityId>,
    minutes_played: f64,
    actions: Vec<&'a ActionMetric>,
}

pub fn pivot(
    records: &[MetricRecord],
    primary_names: &LookupTable,
    secondary_names: &LookupTable,
    filter: &PivotFilter,
    config: &PivotConfig,
) -> PivotTable {
    let filtered: Vec<&MetricRecord> = match &filter.secondary_id {
        Some(wanted) => records
            .iter()
            .filter(|r| r.secondary_ids.iter().any(|id| id == wanted))
            .collect(),
        None => records.iter().collect(),
    };

    let action_types = distinct_action_types(&filtered);
    let groups = group_by_primary(&filtered);

    let needle = filter
        .name_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(str::to_lowercase);

    let rows = groups
        .into_iter()
        .map(|group| build_row(group, primary_names, secondary_names, config))
        .filter(|row| match &needle {
            Some(needle) => row.display_name.to_lowercase().contains(needle.as_str()),
            None => true,
        })
        .collect();

    let mut columns = config.static_columns();
    columns.extend(action_types.iter().map(|a| Column::number(a, a)));

    PivotTable {
        columns,
        action_types,
        rows,
    }
}

fn distinct_action_types(records: &[&MetricRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for action in records.iter().flat_map(|r| r.actions.iter()) {
        if seen.insert(action.action_type.as_str()) {
            out.push(action.action_type.clone());
        }
    }
    out
}

fn group_by_primary<'a>(records: &[&'a MetricRecord]) -> Vec<Group<'a>> {
    let mut index: HashMap<&'a EntityId, usize> = HashMap::new();
    let mut groups: Vec<Group<'a>> = Vec::new();

    for record in records {
        let slot = *index.entry(&record.primary_id).or_insert_with(|| {
            groups.push(Group {
                primary_id: &record.primary_id,
                secondary_ids: Vec::new(),
                minutes_played: 0.0,
                actions: Vec::new(),
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        for id in &record.secondary_ids {
            if !group.secondary_ids.contains(&id) {
                group.secondary_ids.push(id);
            }
        }
        group.minutes_played += record.minutes_played.unwrap_or(0.0);
        group.actions.extend(record.actions.iter());
    }
    groups
}

fn build_row(
    group: Group<'_>,
    primary_names: &LookupTable,
    secondary_names: &LookupTable,
    config: &PivotConfig,
) -> PivotRow {
    let mut actions: HashMap<String, f64> = HashMap::new();
    let mut total = 0.0;
    for action in &group.actions {
        *actions.entry(action.action_type.clone()).or_insert(0.0) += action.value;
        if config.counts_toward_total(&action.action_type) {
            total += action.value;
        }
    }

    let display_name = primary_names
        .get(group.primary_id)
        .map(str::to_string)
        .unwrap_or_else(|| config.fallback_name(group.primary_id));

    let secondary_names = group
        .secondary_ids
        .iter()
        .map(|id| {
            secondary_names
                .get(id)
                .map(str::to_string)
                .unwrap_or_else(|| id.to_string())
        })
        .collect::<Vec<_>>()
        .join(", ");

    PivotRow {
        entity_id: group.primary_id.clone(),
        display_name,
        secondary_ids: group.secondary_ids.into_iter().cloned().collect(),
        secondary_names,
        minutes_played: group.minutes_played,
        total,
        actions,
    }
}
