use std::fs;
use std::path::PathBuf;

use gplus_dashboard::api_client::parse_list_json;
use gplus_dashboard::grid::Cell;
use gplus_dashboard::model::EntityId;
use gplus_dashboard::pivot::{
    ActionMetric, FIELD_AFFILIATIONS, FIELD_MINUTES, FIELD_NAME, FIELD_TOTAL, LookupTable,
    MetricRecord, PivotConfig, PivotFilter, pivot,
};
use gplus_dashboard::team_pivot::{
    FIELD_TOTAL_AGAINST, FIELD_TOTAL_DIFF, FIELD_TOTAL_FOR, TeamPivotConfig, action_field_net,
    pivot_teams,
};
use gplus_dashboard::views::{LeagueData, View, ViewFilters, build_view_grid, team_options};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_data() -> LeagueData {
    LeagueData {
        teams: parse_list_json(&read_fixture("teams.json")).unwrap(),
        players: parse_list_json(&read_fixture("players.json")).unwrap(),
        players_goals_added: parse_list_json(&read_fixture("players_goals_added.json")).unwrap(),
        goalkeepers_goals_added: parse_list_json(&read_fixture("goalkeepers_goals_added.json"))
            .unwrap(),
        teams_goals_added: parse_list_json(&read_fixture("teams_goals_added.json")).unwrap(),
        failures: Vec::new(),
    }
}

fn record(primary: &str, secondary: &[&str], actions: &[(&str, f64)]) -> MetricRecord {
    MetricRecord {
        primary_id: EntityId::from(primary),
        secondary_ids: secondary.iter().map(|s| EntityId::from(*s)).collect(),
        minutes_played: Some(90.0),
        actions: actions
            .iter()
            .map(|(a, v)| ActionMetric {
                action_type: a.to_string(),
                value: *v,
            })
            .collect(),
    }
}

fn names() -> LookupTable {
    LookupTable::from_pairs([("p1", "Alice Ames"), ("p2", "Bea Brook")])
}

#[test]
fn total_is_sum_of_action_cells() {
    let records = vec![
        record("p1", &["t1"], &[("Passing", 0.5), ("Shooting", 0.25)]),
        record("p2", &["t1"], &[("Passing", -0.125)]),
    ];
    let table = pivot(
        &records,
        &names(),
        &LookupTable::new(),
        &PivotFilter::default(),
        &PivotConfig::default(),
    );

    assert_eq!(table.action_types, vec!["Passing", "Shooting"]);
    for row in &table.rows {
        let sum: f64 = table
            .action_types
            .iter()
            .filter_map(|a| row.action(a))
            .sum();
        assert!((sum - row.total).abs() < 1e-9, "{} total", row.display_name);
    }
    assert_eq!(table.rows[1].action("Shooting"), None);
}

#[test]
fn pivot_is_idempotent() {
    let records = vec![
        record("p2", &["t2"], &[("Dribbling", 0.5)]),
        record("p1", &["t1"], &[("Passing", 0.25)]),
        record("p2", &["t1"], &[("Passing", 1.0)]),
    ];
    let run = || {
        pivot(
            &records,
            &names(),
            &LookupTable::new(),
            &PivotFilter::default(),
            &PivotConfig::default(),
        )
    };
    assert_eq!(run(), run());
}

#[test]
fn repeated_ids_merge_into_one_row() {
    let records = vec![
        record("p1", &["t1"], &[("Passing", 0.5)]),
        record("p1", &["t2", "t1"], &[("Passing", 0.25), ("Receiving", 1.0)]),
    ];
    let teams = LookupTable::from_pairs([("t1", "Austin FC"), ("t2", "LA Galaxy")]);
    let table = pivot(
        &records,
        &names(),
        &teams,
        &PivotFilter::default(),
        &PivotConfig::default(),
    );

    assert_eq!(table.rows.len(), 1);
    let row = &table.rows[0];
    assert_eq!(row.action("Passing"), Some(0.75));
    assert_eq!(row.total, 1.75);
    assert_eq!(row.minutes_played, 180.0);
    assert_eq!(row.secondary_names, "Austin FC, LA Galaxy");
}

#[test]
fn unknown_names_fall_back_and_are_searchable() {
    let records = vec![
        record("p1", &[], &[("Passing", 0.5)]),
        record("ghost", &[], &[("Passing", 0.25)]),
    ];
    let config = PivotConfig {
        unknown_prefix: "Unknown Player".to_string(),
        ..PivotConfig::default()
    };
    let filter = PivotFilter {
        secondary_id: None,
        name_query: Some("  UNKNOWN ".to_string()),
    };
    let table = pivot(&records, &names(), &LookupTable::new(), &filter, &config);

    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0].display_name, "Unknown Player (ghost)");
}

#[test]
fn team_filter_narrows_action_columns() {
    let records = vec![
        record("p1", &["t1"], &[("Passing", 0.5)]),
        record("p2", &["t2"], &[("Claiming", 0.25)]),
    ];
    let filter = PivotFilter {
        secondary_id: Some(EntityId::from("t1")),
        name_query: None,
    };
    let table = pivot(
        &records,
        &names(),
        &LookupTable::new(),
        &filter,
        &PivotConfig::default(),
    );
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.action_types, vec!["Passing"]);
}

#[test]
fn excluded_actions_keep_their_column_but_not_the_total() {
    let records = vec![record("p1", &[], &[("Passing", 0.5), ("Interrupting", 2.0)])];
    let config = PivotConfig {
        total_excludes: vec!["Interrupting".to_string()],
        ..PivotConfig::default()
    };
    let table = pivot(
        &records,
        &names(),
        &LookupTable::new(),
        &PivotFilter::default(),
        &config,
    );
    assert_eq!(table.rows[0].total, 0.5);
    assert_eq!(table.rows[0].action("Interrupting"), Some(2.0));
    assert!(table.columns.iter().any(|c| c.field == "Interrupting"));
}

#[test]
fn empty_input_yields_only_static_columns() {
    let table = pivot(
        &[],
        &LookupTable::new(),
        &LookupTable::new(),
        &PivotFilter::default(),
        &PivotConfig::default(),
    );
    assert!(table.rows.is_empty());
    let fields: Vec<&str> = table.columns.iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, vec![FIELD_NAME, FIELD_AFFILIATIONS, FIELD_TOTAL]);
}

#[test]
fn player_view_from_fixtures() {
    let data = fixture_data();
    let grid = build_view_grid(View::Players, &data, &ViewFilters::default());

    let labels: Vec<&str> = grid.columns.iter().map(|c| c.label.as_str()).collect();
    assert_eq!(
        &labels[..4],
        &["Player", "Teams", "Minutes Played", "Goals Added (Total)"]
    );
    assert_eq!(
        &labels[4..],
        &["Dribbling", "Passing", "Shooting", "Receiving", "Interrupting"]
    );

    // Sorted by total, highest first; the player without data sinks to 0.
    assert_eq!(grid.rows[0].id, "vzqo8xZQap");
    assert_eq!(grid.cell(0, FIELD_TOTAL), Some(&Cell::Number(2.0)));
    assert_eq!(grid.cell(0, FIELD_MINUTES), Some(&Cell::Number(1510.0)));
    assert_eq!(grid.rows.last().map(|r| r.id.as_str()), Some("7vQ7nKM65d"));

    let morris = grid.rows.iter().position(|r| r.id == "0Oq6006M6D").unwrap();
    assert_eq!(
        grid.cell(morris, FIELD_AFFILIATIONS),
        Some(&Cell::Text("Seattle Sounders FC, Austin FC".to_string()))
    );

    let ghost = grid.rows.iter().position(|r| r.id == "unknownXYZ").unwrap();
    assert_eq!(
        grid.cell(ghost, FIELD_NAME),
        Some(&Cell::Text("Unknown Player (unknownXYZ)".to_string()))
    );
}

#[test]
fn player_view_team_filter_keeps_multi_team_players() {
    let data = fixture_data();
    let filters = ViewFilters {
        team_id: Some(EntityId::from("a2lqRX2Mr0")),
        name_query: None,
    };
    let grid = build_view_grid(View::Players, &data, &filters);
    let ids: Vec<&str> = grid.rows.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["vzqo8xZQap", "0Oq6006M6D"]);
    assert!(grid.column_index("Interrupting").is_none());
}

#[test]
fn goalkeeper_view_uses_embedded_names() {
    let data = LeagueData {
        teams: Vec::new(),
        ..fixture_data()
    };
    let grid = build_view_grid(View::Goalkeepers, &data, &ViewFilters::default());
    assert_eq!(grid.columns[0].label, "Goalkeeper");
    assert_eq!(grid.columns[1].label, "Team");
    assert_eq!(
        grid.cell(0, FIELD_NAME),
        Some(&Cell::Text("Brad Stuver".to_string()))
    );
    assert_eq!(
        grid.cell(1, FIELD_AFFILIATIONS),
        Some(&Cell::Text("Seattle Sounders FC".to_string()))
    );

    let options = team_options(View::Goalkeepers, &data);
    let names: Vec<&str> = options.iter().map(|(_, n)| n.as_str()).collect();
    assert_eq!(names, vec!["Austin FC", "Seattle Sounders FC"]);
}

#[test]
fn team_pivot_splits_for_and_against() {
    let data = fixture_data();
    let table = pivot_teams(
        &data.teams_goals_added,
        &LookupTable::from_teams(&data.teams),
        &TeamPivotConfig::default(),
    );

    assert_eq!(
        table.action_types,
        vec!["Passing", "Interrupting", "Shooting", "Claiming"]
    );
    assert_eq!(table.columns.len(), 4 + 3 * 4);

    let austin = &table.rows[0];
    assert_eq!(austin.team_name, "Austin FC");
    // Interrupting is reported but left out of the totals.
    assert_eq!(austin.total_for, 4.0);
    assert_eq!(austin.total_against, 3.5);
    assert_eq!(austin.total_diff(), 0.5);
    assert_eq!(austin.actions["Interrupting"].net(), 0.5);

    let seattle = &table.rows[1];
    assert_eq!(seattle.total_for, 4.0);
    assert_eq!(seattle.total_against, 1.0);
}

#[test]
fn team_view_sorts_by_difference() {
    let data = fixture_data();
    let grid = build_view_grid(View::Teams, &data, &ViewFilters::default());
    assert_eq!(grid.rows[0].id, "9Z5PpQwQ1j");
    assert_eq!(grid.cell(0, FIELD_TOTAL_DIFF), Some(&Cell::Number(3.0)));
    assert_eq!(grid.cell(0, FIELD_TOTAL_FOR), Some(&Cell::Number(4.0)));
    assert_eq!(grid.cell(0, FIELD_TOTAL_AGAINST), Some(&Cell::Number(1.0)));
    assert_eq!(
        grid.cell(0, &action_field_net("Claiming")),
        Some(&Cell::Number(-0.5))
    );
    assert_eq!(grid.cell(0, &action_field_net("Shooting")), Some(&Cell::Empty));
}

#[test]
fn disjoint_actions_across_teams_merge() {
    let records = vec![
        record("p1", &["t1"], &[("Passing", 0.5)]),
        record("p1", &["t2"], &[("Shooting", 0.25)]),
    ];
    let teams = LookupTable::from_pairs([("t1", "Austin FC")]);
    let table = pivot(
        &records,
        &names(),
        &teams,
        &PivotFilter::default(),
        &PivotConfig::default(),
    );
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.action_types, vec!["Passing", "Shooting"]);
    assert_eq!(table.rows[0].secondary_names, "Austin FC, t2");
    assert_eq!(table.rows[0].action("Shooting"), Some(0.25));
    assert_eq!(table.rows[0].total, 0.75);
}

#[test]
fn fallback_name_is_not_found_by_the_real_name() {
    let records = vec![record("p9", &[], &[("Passing", 0.5)])];
    let filter = PivotFilter {
        secondary_id: None,
        name_query: Some("Alice".to_string()),
    };
    let table = pivot(
        &records,
        &LookupTable::new(),
        &LookupTable::new(),
        &filter,
        &PivotConfig::default(),
    );
    assert!(table.rows.is_empty());

    let all = pivot(
        &records,
        &LookupTable::new(),
        &LookupTable::new(),
        &PivotFilter::default(),
        &PivotConfig::default(),
    );
    assert_eq!(all.rows[0].display_name, "Unknown (p9)");
}
