use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};

use gplus_dashboard::config::{AppConfig, load_dotenv};
use gplus_dashboard::export::{
    ExportFormat, SheetExport, export_file_name, grid_to_csv, write_workbook,
};
use gplus_dashboard::grid::Grid;
use gplus_dashboard::model::{EntityId, League};
use gplus_dashboard::observe::{init_tracing, tracing_observer};
use gplus_dashboard::provider;
use gplus_dashboard::query::{GoalsAddedQuery, parse_date};
use gplus_dashboard::views::{View, ViewFilters, build_view_grid, league_view_title};

/// Fetch goals added and write the pivoted grids as CSV or XLSX.
///
/// Usage: export [--league mls|nwsl|all] [--view players|goalkeepers|teams|all]
///               [--season 2025] [--start YYYY-MM-DD] [--end YYYY-MM-DD]
///               [--min-minutes N] [--team ID] [--search TEXT]
///               [--out FILE.csv | --out-dir DIR] [--xlsx FILE.xlsx]
fn main() -> Result<()> {
    load_dotenv();
    init_tracing("warn");
    let config = AppConfig::from_env();

    let leagues = match arg_value("--league").as_deref() {
        None | Some("all") => League::ALL.to_vec(),
        Some(raw) => vec![raw.parse::<League>().map_err(|err| anyhow!(err))?],
    };
    let views = match arg_value("--view").as_deref() {
        None | Some("all") => View::ALL.to_vec(),
        Some(raw) => vec![View::from_slug(raw).with_context(|| format!("unknown view: {raw}"))?],
    };

    let query = build_query(&config)?;
    let filters = ViewFilters {
        team_id: arg_value("--team").map(EntityId::new),
        name_query: arg_value("--search"),
    };

    let fetched = provider::fetch_leagues(&config, &leagues, &query, tracing_observer())?;

    let mut grids: Vec<(League, View, Grid)> = Vec::new();
    for (league, data) in &fetched {
        for view in &views {
            if let Some(err) = data.view_error(*view) {
                return Err(anyhow!(
                    "{} could not be fetched: {err}",
                    league_view_title(*league, *view)
                ));
            }
            grids.push((*league, *view, build_view_grid(*view, data, &filters)));
        }
    }

    let scope = if query.has_date_range() {
        "range".to_string()
    } else {
        query.season_name.clone().unwrap_or_default()
    };

    if let Some(path) = arg_value("--xlsx") {
        let titles: Vec<String> = grids
            .iter()
            .map(|(league, view, _)| league_view_title(*league, *view))
            .collect();
        let sheets: Vec<SheetExport<'_>> = grids
            .iter()
            .zip(&titles)
            .map(|((_, _, grid), title)| SheetExport { name: title, grid })
            .collect();
        let rows = write_workbook(&PathBuf::from(&path), &sheets)?;
        eprintln!("wrote {rows} rows across {} sheets to {path}", sheets.len());
        return Ok(());
    }

    if let Some(dir) = arg_value("--out-dir") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed creating {}", dir.display()))?;
        for (league, view, grid) in &grids {
            let name = export_file_name(&[league.slug(), view.slug(), &scope], ExportFormat::Csv);
            let path = dir.join(name);
            std::fs::write(&path, grid_to_csv(grid)?)
                .with_context(|| format!("failed writing {}", path.display()))?;
            eprintln!("wrote {} rows to {}", grid.rows.len(), path.display());
        }
        return Ok(());
    }

    let [(_, _, grid)] = grids.as_slice() else {
        return Err(anyhow!(
            "{} grids selected; pick one --league and --view, or use --out-dir / --xlsx",
            grids.len()
        ));
    };
    let csv = grid_to_csv(grid)?;
    match arg_value("--out") {
        Some(path) => std::fs::write(&path, csv).with_context(|| format!("failed writing {path}"))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{csv}").context("failed writing to stdout")?;
        }
    }
    Ok(())
}

fn build_query(config: &AppConfig) -> Result<GoalsAddedQuery> {
    let mut query =
        GoalsAddedQuery::season(arg_value("--season").unwrap_or_else(|| config.default_season.clone()));
    for (flag, slot) in [
        ("--start", &mut query.start_date),
        ("--end", &mut query.end_date),
    ] {
        if let Some(raw) = arg_value(flag) {
            parse_date(&raw).with_context(|| format!("{flag} must be YYYY-MM-DD, got {raw}"))?;
            *slot = Some(raw);
        }
    }
    if let Some(raw) = arg_value("--min-minutes") {
        let minutes = raw
            .parse::<u32>()
            .with_context(|| format!("--min-minutes must be a whole number, got {raw}"))?;
        query.minimum_minutes = Some(minutes);
    }
    Ok(query)
}

fn arg_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
