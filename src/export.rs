use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::grid::{Cell, Grid};

/// Render a grid as CSV: one header line of column labels, then one line per
/// row. Text containing a comma, quote or line break is quoted with inner
/// quotes doubled. Lines are joined by `\n` with no trailing newline.
pub fn grid_to_csv(grid: &Grid) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .flexible(true)
        .from_writer(Vec::new());

    writer
        .write_record(grid.columns.iter().map(|c| c.label.as_str()))
        .context("write csv header")?;
    for row in &grid.rows {
        writer
            .write_record(row.cells.iter().map(csv_field))
            .with_context(|| format!("write csv row {}", row.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow::anyhow!("flush csv: {}", err.error()))?;
    let mut out = String::from_utf8(bytes).context("csv output is not utf-8")?;
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(out)
}

pub fn write_csv_file(grid: &Grid, path: &Path) -> Result<()> {
    let csv = grid_to_csv(grid)?;
    fs::write(path, csv).with_context(|| format!("failed writing csv to {}", path.display()))
}

/// Plain number formatting for export: shortest round-trip form, no `-0`.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    value.to_string()
}

fn csv_field(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => s.clone(),
        Cell::Number(n) => format_number(*n),
        Cell::Empty => String::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

/// `gplus_<parts joined by _>.<ext>`, lowercased with spaces folded to `-`.
pub fn export_file_name(parts: &[&str], format: ExportFormat) -> String {
    let stem = parts
        .iter()
        .map(|p| p.trim().to_lowercase().replace(char::is_whitespace, "-"))
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    format!("gplus_{stem}.{}", format.extension())
}

pub struct SheetExport<'a> {
    pub name: &'a str,
    pub grid: &'a Grid,
}

/// Write one worksheet per grid into an xlsx workbook.
pub fn write_workbook(path: &Path, sheets: &[SheetExport<'_>]) -> Result<usize> {
    let mut workbook = Workbook::new();
    let mut rows_written = 0usize;
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name(sheet.name))
            .with_context(|| format!("invalid sheet name {}", sheet.name))?;
        write_grid(worksheet, sheet.grid)?;
        rows_written += sheet.grid.rows.len();
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(rows_written)
}

fn write_grid(worksheet: &mut Worksheet, grid: &Grid) -> Result<()> {
    for (col_idx, column) in grid.columns.iter().enumerate() {
        worksheet
            .write_string(0, col_idx as u16, &column.label)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    for (row_idx, row) in grid.rows.iter().enumerate() {
        let xl_row = row_idx as u32 + 1;
        for (col_idx, cell) in row.cells.iter().enumerate() {
            let xl_col = col_idx as u16;
            match cell {
                Cell::Text(s) => {
                    worksheet
                        .write_string(xl_row, xl_col, s)
                        .with_context(|| format!("write cell ({xl_row},{col_idx})"))?;
                }
                Cell::Number(n) => {
                    worksheet
                        .write_number(xl_row, xl_col, *n)
                        .with_context(|| format!("write cell ({xl_row},{col_idx})"))?;
                }
                Cell::Empty => {}
            }
        }
    }
    Ok(())
}

/// Excel caps sheet names at 31 chars and bans a few characters.
fn sheet_name(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(31)
        .collect();
    if cleaned.trim().is_empty() {
        "Sheet".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_zero_prints_plain() {
        assert_eq!(format_number(-0.0), "0");
        assert_eq!(format_number(0.25), "0.25");
        assert_eq!(format_number(1500.0), "1500");
    }

    #[test]
    fn file_names_are_slugged() {
        assert_eq!(
            export_file_name(&["mls", "Players", "2025"], ExportFormat::Csv),
            "gplus_mls_players_2025.csv"
        );
        assert_eq!(
            export_file_name(&["NWSL", "", "Date Range"], ExportFormat::Xlsx),
            "gplus_nwsl_date-range.xlsx"
        );
    }

    #[test]
    fn sheet_names_are_sanitised() {
        assert_eq!(sheet_name("MLS Players 2025/26"), "MLS Players 2025_26");
        assert_eq!(sheet_name(&"x".repeat(40)).len(), 31);
        assert_eq!(sheet_name("  "), "Sheet");
    }
}
