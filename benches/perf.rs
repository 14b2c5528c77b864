use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use gplus_dashboard::api_client::parse_list_json;
use gplus_dashboard::export::grid_to_csv;
use gplus_dashboard::grid::SortDirection;
use gplus_dashboard::model::{EntityId, GoalsAddedAction, GoalsAddedPlayer, Player, Team};
use gplus_dashboard::views::{LeagueData, View, ViewFilters, build_view_grid};

const ACTIONS: [&str; 7] = [
    "Dribbling",
    "Fouling",
    "Interrupting",
    "Passing",
    "Receiving",
    "Shooting",
    "Claiming",
];

/// A league-sized data set: ~900 player rows across 30 teams, with some
/// players listed once per team.
fn synthetic_league() -> LeagueData {
    let teams: Vec<Team> = (0..30)
        .map(|i| Team {
            team_id: EntityId::new(format!("t{i}")),
            team_name: format!("Team {i}"),
            team_abbreviation: None,
        })
        .collect();
    let players: Vec<Player> = (0..800)
        .map(|i| Player {
            player_id: EntityId::new(format!("p{i}")),
            player_name: format!("Player, \"{i}\""),
        })
        .collect();
    let players_goals_added = (0..900)
        .map(|i| GoalsAddedPlayer {
            player_id: EntityId::new(format!("p{}", i % 800)),
            team_ids: vec![EntityId::new(format!("t{}", i % 30))],
            general_position: None,
            minutes_played: Some(90.0 * (i % 34) as f64),
            data: ACTIONS
                .iter()
                .enumerate()
                .map(|(a, action)| GoalsAddedAction {
                    action_type: action.to_string(),
                    goals_added_above_avg: ((i * 7 + a * 13) % 100) as f64 / 100.0 - 0.5,
                    goals_added_raw: 0.0,
                    count_actions: 10.0,
                })
                .collect(),
        })
        .collect();
    LeagueData {
        teams,
        players,
        players_goals_added,
        ..LeagueData::default()
    }
}

fn bench_goals_added_parse(c: &mut Criterion) {
    c.bench_function("goals_added_parse", |b| {
        b.iter(|| {
            let rows: Vec<GoalsAddedPlayer> =
                parse_list_json(black_box(PLAYERS_GOALS_ADDED_JSON)).unwrap();
            black_box(rows.len());
        })
    });
}

fn bench_player_view(c: &mut Criterion) {
    let data = synthetic_league();
    let filters = ViewFilters::default();
    c.bench_function("player_view_build", |b| {
        b.iter(|| {
            let grid = build_view_grid(View::Players, black_box(&data), &filters);
            black_box(grid.rows.len());
        })
    });
}

fn bench_resort(c: &mut Criterion) {
    let data = synthetic_league();
    let mut grid = build_view_grid(View::Players, &data, &ViewFilters::default());
    c.bench_function("grid_resort_by_name", |b| {
        b.iter(|| {
            grid.sort_by(black_box("name"), SortDirection::Asc);
            grid.sort_by(black_box("total"), SortDirection::Desc);
        })
    });
}

fn bench_csv(c: &mut Criterion) {
    let data = synthetic_league();
    let grid = build_view_grid(View::Players, &data, &ViewFilters::default());
    c.bench_function("grid_to_csv", |b| {
        b.iter(|| {
            let csv = grid_to_csv(black_box(&grid)).unwrap();
            black_box(csv.len());
        })
    });
}

criterion_group!(
    perf,
    bench_goals_added_parse,
    bench_player_view,
    bench_resort,
    bench_csv
);
criterion_main!(perf);

static PLAYERS_GOALS_ADDED_JSON: &str = include_str!("../tests/fixtures/players_goals_added.json");
