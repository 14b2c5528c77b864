use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum League {
    Mls,
    Nwsl,
}

impl League {
    pub const ALL: [League; 2] = [League::Mls, League::Nwsl];

    /// Path segment used by the upstream API.
    pub fn slug(self) -> &'static str {
        match self {
            League::Mls => "mls",
            League::Nwsl => "nwsl",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            League::Mls => "MLS",
            League::Nwsl => "NWSL",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            League::Mls => League::Nwsl,
            League::Nwsl => League::Mls,
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for League {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mls" => Ok(League::Mls),
            "nwsl" => Ok(League::Nwsl),
            other => Err(format!("unknown league: {other}")),
        }
    }
}

/// Upstream entity id. The API serves opaque strings; older dumps used integers,
/// so both are accepted and normalised to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for EntityId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl From<i64> for EntityId {
    fn from(raw: i64) -> Self {
        Self(raw.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Int(i64),
            Float(f64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(s) => EntityId(s),
            Raw::Int(n) => EntityId(n.to_string()),
            Raw::Float(n) => EntityId(n.to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub player_id: EntityId,
    #[serde(default)]
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: EntityId,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub team_abbreviation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsAddedAction {
    pub action_type: String,
    #[serde(default)]
    pub goals_added_above_avg: f64,
    #[serde(default)]
    pub goals_added_raw: f64,
    #[serde(default)]
    pub count_actions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsAddedPlayer {
    pub player_id: EntityId,
    /// Unsplit queries return every team the player appeared for.
    #[serde(default, rename = "team_id", deserialize_with = "one_or_many")]
    pub team_ids: Vec<EntityId>,
    #[serde(default)]
    pub general_position: Option<String>,
    #[serde(default)]
    pub minutes_played: Option<f64>,
    #[serde(default)]
    pub data: Vec<GoalsAddedAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsAddedGoalkeeper {
    pub player_id: EntityId,
    #[serde(default)]
    pub player_name: Option<String>,
    #[serde(default, rename = "team_id", deserialize_with = "one_or_many")]
    pub team_ids: Vec<EntityId>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub minutes_played: Option<f64>,
    #[serde(default)]
    pub data: Vec<GoalsAddedAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsAddedTeamAction {
    pub action_type: String,
    #[serde(default, alias = "actions_for")]
    pub num_actions_for: f64,
    #[serde(default, alias = "actions_against")]
    pub num_actions_against: f64,
    #[serde(default)]
    pub goals_added_for: f64,
    #[serde(default)]
    pub goals_added_against: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalsAddedTeam {
    pub team_id: EntityId,
    #[serde(default)]
    pub minutes: Option<f64>,
    #[serde(default)]
    pub data: Vec<GoalsAddedTeamAction>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        Many(Vec<EntityId>),
        One(EntityId),
        Null(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::Many(ids) => ids,
        OneOrMany::One(id) => vec![id],
        OneOrMany::Null(()) => Vec::new(),
    })
}
