use chrono::{Local, NaiveDate};

/// Filters sent with the goals-added endpoints.
///
/// A date range overrides the season: when either date is set no `season_name`
/// is sent, and a start date without an end date runs until today.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalsAddedQuery {
    pub season_name: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub minimum_minutes: Option<u32>,
    pub minimum_actions: Option<u32>,
    pub team_id: Option<String>,
    pub player_id: Option<String>,
    pub general_position: Option<String>,
    pub zone: Option<String>,
    pub gamestate_trunc: Option<String>,
    pub stage_name: Option<String>,
    pub split_by_teams: Option<bool>,
    pub split_by_seasons: Option<bool>,
    pub split_by_games: Option<bool>,
}

impl GoalsAddedQuery {
    pub fn season(season: impl Into<String>) -> Self {
        Self {
            season_name: Some(season.into()),
            ..Self::default()
        }
    }

    /// The team totals endpoint is scoped by season alone. Minutes and dates
    /// are player filters and are not sent.
    pub fn team_query(&self) -> Self {
        Self {
            season_name: self.season_name.clone(),
            ..Self::default()
        }
    }

    pub fn has_date_range(&self) -> bool {
        non_empty(&self.start_date).is_some() || non_empty(&self.end_date).is_some()
    }

    /// Query pairs using today's local date for an open-ended range.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.to_pairs_on(Local::now().date_naive())
    }

    pub fn to_pairs_on(&self, today: NaiveDate) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();
        let mut push = |key: &str, value: String| pairs.push((key.to_string(), value));

        let start = non_empty(&self.start_date);
        let end = non_empty(&self.end_date);
        if start.is_some() || end.is_some() {
            if let Some(start) = start {
                push("start_date", start.to_string());
            }
            match (start, end) {
                (_, Some(end)) => push("end_date", end.to_string()),
                (Some(_), None) => push("end_date", today.format("%Y-%m-%d").to_string()),
                (None, None) => {}
            }
        } else if let Some(season) = non_empty(&self.season_name) {
            push("season_name", season.to_string());
        }

        if let Some(min) = self.minimum_minutes {
            push("minimum_minutes", min.to_string());
        }
        if let Some(min) = self.minimum_actions {
            push("minimum_actions", min.to_string());
        }
        for (key, value) in [
            ("team_id", &self.team_id),
            ("player_id", &self.player_id),
            ("general_position", &self.general_position),
            ("zone", &self.zone),
            ("gamestate_trunc", &self.gamestate_trunc),
            ("stage_name", &self.stage_name),
        ] {
            if let Some(value) = non_empty(value) {
                push(key, value.to_string());
            }
        }
        for (key, value) in [
            ("split_by_teams", self.split_by_teams),
            ("split_by_seasons", self.split_by_seasons),
            ("split_by_games", self.split_by_games),
        ] {
            if let Some(value) = value {
                push(key, value.to_string());
            }
        }
        pairs
    }

    /// Stable key for memoising a league's goals-added response.
    pub fn cache_key(&self, league: &str) -> String {
        let minutes = self.minimum_minutes.map(|m| m.to_string());
        [
            league,
            non_empty(&self.season_name).unwrap_or("no-season"),
            minutes.as_deref().unwrap_or("no-min"),
            non_empty(&self.start_date).unwrap_or("no-start"),
            non_empty(&self.end_date).unwrap_or("no-end"),
        ]
        .join("-")
    }
}

/// Accepts `YYYY-MM-DD` only.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    fn pairs(q: &GoalsAddedQuery) -> Vec<(String, String)> {
        q.to_pairs_on(today())
    }

    #[test]
    fn season_only() {
        let q = GoalsAddedQuery::season("2024");
        assert_eq!(pairs(&q), vec![("season_name".into(), "2024".into())]);
    }

    #[test]
    fn start_date_defaults_end_to_today_and_drops_season() {
        let q = GoalsAddedQuery {
            start_date: Some("2025-03-01".into()),
            ..GoalsAddedQuery::season("2025")
        };
        assert_eq!(
            pairs(&q),
            vec![
                ("start_date".into(), "2025-03-01".into()),
                ("end_date".into(), "2025-06-01".into()),
            ]
        );
    }

    #[test]
    fn end_date_alone_is_sent_as_is() {
        let q = GoalsAddedQuery {
            end_date: Some("2025-04-30".into()),
            minimum_minutes: Some(500),
            ..GoalsAddedQuery::season("2025")
        };
        assert_eq!(
            pairs(&q),
            vec![
                ("end_date".into(), "2025-04-30".into()),
                ("minimum_minutes".into(), "500".into()),
            ]
        );
    }

    #[test]
    fn cache_key_uses_placeholders() {
        let q = GoalsAddedQuery::season("2023");
        assert_eq!(q.cache_key("mls"), "mls-2023-no-min-no-start-no-end");
    }

    #[test]
    fn team_query_keeps_only_the_season() {
        let q = GoalsAddedQuery {
            start_date: Some("2025-03-01".into()),
            minimum_minutes: Some(500),
            ..GoalsAddedQuery::season("2025")
        };
        assert_eq!(pairs(&q.team_query()), vec![("season_name".into(), "2025".into())]);
    }

    #[test]
    fn blank_strings_count_as_unset() {
        let q = GoalsAddedQuery {
            start_date: Some("  ".into()),
            team_id: Some(String::new()),
            ..GoalsAddedQuery::season("2022")
        };
        assert!(!q.has_date_range());
        assert_eq!(pairs(&q), vec![("season_name".into(), "2022".into())]);
    }
}
