use std::cmp::Ordering;

use crate::pivot::{
    Column, ColumnKind, FIELD_AFFILIATIONS, FIELD_MINUTES, FIELD_NAME, FIELD_TOTAL, PivotTable,
};
use crate::team_pivot::TeamTable;

pub const PAGE_SIZES: [usize; 4] = [10, 25, 50, 100];
pub const DEFAULT_PAGE_SIZE: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    /// Text shown in the dashboard. Numbers get fixed decimals.
    pub fn display(&self, decimals: usize) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n + 0.0),
            Cell::Number(n) => format!("{n:.decimals$}"),
            Cell::Empty => String::new(),
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridRow {
    pub id: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    pub columns: Vec<Column>,
    pub rows: Vec<GridRow>,
}

impl Grid {
    pub fn empty(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_index(&self, field: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.field == field)
    }

    pub fn cell(&self, row: usize, field: &str) -> Option<&Cell> {
        let col = self.column_index(field)?;
        self.rows.get(row).and_then(|r| r.cells.get(col))
    }

    /// Stable sort on one column. Empty cells always sink to the bottom.
    pub fn sort_by(&mut self, field: &str, direction: SortDirection) {
        let Some(col) = self.column_index(field) else {
            return;
        };
        self.rows.sort_by(|a, b| {
            let (a, b) = (&a.cells[col], &b.cells[col]);
            match (a, b) {
                (Cell::Empty, Cell::Empty) => Ordering::Equal,
                (Cell::Empty, _) => Ordering::Greater,
                (_, Cell::Empty) => Ordering::Less,
                _ => {
                    let ord = compare_cells(a, b);
                    match direction {
                        SortDirection::Asc => ord,
                        SortDirection::Desc => ord.reverse(),
                    }
                }
            }
        });
    }

    pub fn page_count(&self, page_size: usize) -> usize {
        let page_size = page_size.max(1);
        self.rows.len().div_ceil(page_size).max(1)
    }

    pub fn page(&self, page: usize, page_size: usize) -> &[GridRow] {
        let page_size = page_size.max(1);
        let start = page.saturating_mul(page_size).min(self.rows.len());
        let end = (start + page_size).min(self.rows.len());
        &self.rows[start..end]
    }
}

fn compare_cells(a: &Cell, b: &Cell) -> Ordering {
    match (a, b) {
        (Cell::Number(x), Cell::Number(y)) => x.partial_cmp(y).unwrap_or(Ordering::Equal),
        (Cell::Text(x), Cell::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Cell::Number(_), Cell::Text(_)) => Ordering::Less,
        (Cell::Text(_), Cell::Number(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl PivotTable {
    pub fn to_grid(&self) -> Grid {
        let rows = self
            .rows
            .iter()
            .map(|row| GridRow {
                id: row.entity_id.to_string(),
                cells: self
                    .columns
                    .iter()
                    .map(|col| match col.field.as_str() {
                        FIELD_NAME => Cell::Text(row.display_name.clone()),
                        FIELD_AFFILIATIONS => Cell::Text(row.secondary_names.clone()),
                        FIELD_MINUTES => Cell::Number(row.minutes_played),
                        FIELD_TOTAL => Cell::Number(row.total),
                        action => row.action(action).map_or(Cell::Empty, Cell::Number),
                    })
                    .collect(),
            })
            .collect();
        Grid {
            columns: self.columns.clone(),
            rows,
        }
    }
}

impl TeamTable {
    pub fn to_grid(&self) -> Grid {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                let mut cells = vec![
                    Cell::Text(row.team_name.clone()),
                    Cell::Number(row.total_for),
                    Cell::Number(row.total_against),
                    Cell::Number(row.total_diff()),
                ];
                for action in &self.action_types {
                    match row.actions.get(action) {
                        Some(split) => {
                            cells.push(Cell::Number(split.goals_added_for));
                            cells.push(Cell::Number(split.goals_added_against));
                            cells.push(Cell::Number(split.net()));
                        }
                        None => cells.extend([Cell::Empty, Cell::Empty, Cell::Empty]),
                    }
                }
                GridRow {
                    id: row.team_id.to_string(),
                    cells,
                }
            })
            .collect();

        Grid {
            columns: self.columns.clone(),
            rows,
        }
    }
}

pub fn is_numeric(column: &Column) -> bool {
    column.kind == ColumnKind::Number
}
