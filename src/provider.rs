use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use crate::api_client::AsaClient;
use crate::config::AppConfig;
use crate::error::FetchResult;
use crate::export::{ExportFormat, SheetExport, write_csv_file, write_workbook};
use crate::grid::Grid;
use crate::model::League;
use crate::observe::{RequestEvent, SharedObserver};
use crate::query::GoalsAddedQuery;
use crate::state::{Delta, ProviderCommand};
use crate::views::{Endpoint, LeagueData};

/// Background worker for the dashboard. Commands are handled one at a time;
/// the endpoints of one league fetch run in parallel on the fetch pool.
pub fn spawn_provider(config: AppConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let pool = build_fetch_pool(config.fetch_parallelism);
        let observer = console_observer(tx.clone());

        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                ProviderCommand::FetchLeague { league, query } => {
                    let key = query.cache_key(league.slug());
                    let delta = match AsaClient::from_config(&config, league, observer.clone()) {
                        Ok(client) => Delta::LeagueLoaded {
                            league,
                            key,
                            data: with_fetch_pool(&pool, || fetch_league(&client, &query)),
                        },
                        Err(err) => Delta::FetchFailed {
                            league,
                            key,
                            message: format!("{err:#}"),
                        },
                    };
                    let _ = tx.send(delta);
                }
                ProviderCommand::Export {
                    path,
                    format,
                    title,
                    grid,
                } => {
                    let delta = match export_grid(Path::new(&path), format, &title, &grid) {
                        Ok(rows) => Delta::ExportFinished { path, rows },
                        Err(err) => Delta::ExportFailed {
                            path,
                            message: format!("{err:#}"),
                        },
                    };
                    let _ = tx.send(delta);
                }
            }
        }
    });
}

/// Fetch everything one league's views need. The five requests run side by
/// side. Each endpoint succeeds or fails on its own: a failed endpoint is
/// recorded in `failures` and only the views that need it go without data.
pub fn fetch_league(client: &AsaClient, query: &GoalsAddedQuery) -> LeagueData {
    let team_query = query.team_query();
    let ((teams, players), (players_goals_added, (goalkeepers_goals_added, teams_goals_added))) =
        rayon::join(
            || rayon::join(|| client.get_teams(), || client.get_players()),
            || {
                rayon::join(
                    || client.get_players_goals_added(query),
                    || {
                        rayon::join(
                            || client.get_goalkeepers_goals_added(query),
                            || client.get_teams_goals_added(&team_query),
                        )
                    },
                )
            },
        );

    let mut failures = Vec::new();
    LeagueData {
        teams: settle(Endpoint::Teams, teams, &mut failures),
        players: settle(Endpoint::Players, players, &mut failures),
        players_goals_added: settle(
            Endpoint::PlayersGoalsAdded,
            players_goals_added,
            &mut failures,
        ),
        goalkeepers_goals_added: settle(
            Endpoint::GoalkeepersGoalsAdded,
            goalkeepers_goals_added,
            &mut failures,
        ),
        teams_goals_added: settle(Endpoint::TeamsGoalsAdded, teams_goals_added, &mut failures),
        failures,
    }
}

fn settle<T>(
    endpoint: Endpoint,
    result: FetchResult<Vec<T>>,
    failures: &mut Vec<(Endpoint, String)>,
) -> Vec<T> {
    result.unwrap_or_else(|err| {
        failures.push((endpoint, err.to_string()));
        Vec::new()
    })
}

/// Fetch several leagues at once, one fetch per league.
pub fn fetch_leagues(
    config: &AppConfig,
    leagues: &[League],
    query: &GoalsAddedQuery,
    observer: SharedObserver,
) -> anyhow::Result<Vec<(League, LeagueData)>> {
    let pool = build_fetch_pool(config.fetch_parallelism.max(leagues.len()));
    let clients = leagues
        .iter()
        .map(|league| AsaClient::from_config(config, *league, observer.clone()))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let results: Vec<LeagueData> = with_fetch_pool(&pool, || {
        use rayon::prelude::*;
        clients
            .par_iter()
            .map(|client| fetch_league(client, query))
            .collect()
    });

    Ok(leagues.iter().copied().zip(results).collect())
}

fn export_grid(path: &Path, format: ExportFormat, title: &str, grid: &Grid) -> anyhow::Result<usize> {
    match format {
        ExportFormat::Csv => {
            write_csv_file(grid, path)?;
            Ok(grid.rows.len())
        }
        ExportFormat::Xlsx => write_workbook(path, &[SheetExport { name: title, grid }]),
    }
}

/// Request events rendered as console lines. Request starts are left out.
fn console_observer(tx: Sender<Delta>) -> SharedObserver {
    Arc::new(move |event: &RequestEvent| {
        let line = match event {
            RequestEvent::Started { .. } => return,
            RequestEvent::Completed {
                url,
                status,
                items,
                elapsed,
            } => format!(
                "[INFO] {status} {} ({} items, {}ms)",
                short_url(url),
                items.unwrap_or_default(),
                elapsed.as_millis()
            ),
            RequestEvent::Failed {
                url,
                status,
                message,
            } => match status {
                Some(status) => format!("[WARN] {status} {}: {message}", short_url(url)),
                None => format!("[WARN] {}: {message}", short_url(url)),
            },
            RequestEvent::PageFetched {
                path,
                offset,
                items,
            } => format!("[INFO] {path} page @{offset}: {items}"),
        };
        let _ = tx.send(Delta::Log(line));
    })
}

fn short_url(url: &str) -> &str {
    url.split_once("/api/v1/").map(|(_, rest)| rest).unwrap_or(url)
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.clamp(2, 32))
        .build()
        .ok()
}

fn with_fetch_pool<T>(pool: &Option<rayon::ThreadPool>, action: impl FnOnce() -> T + Send) -> T
where
    T: Send,
{
    if let Some(pool) = pool.as_ref() {
        pool.install(action)
    } else {
        action()
    }
}
