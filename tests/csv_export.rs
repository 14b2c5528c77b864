use gplus_dashboard::export::{format_number, grid_to_csv};
use gplus_dashboard::grid::{Cell, Grid, GridRow};
use gplus_dashboard::pivot::Column;

fn grid(rows: Vec<Vec<Cell>>) -> Grid {
    Grid {
        columns: vec![
            Column::text("name", "Player"),
            Column::text("affiliations", "Teams"),
            Column::number("total", "Goals Added (Total)"),
        ],
        rows: rows
            .into_iter()
            .enumerate()
            .map(|(i, cells)| GridRow {
                id: i.to_string(),
                cells,
            })
            .collect(),
    }
}

#[test]
fn header_then_rows_without_trailing_newline() {
    let g = grid(vec![
        vec![
            Cell::Text("Alice".into()),
            Cell::Text("Austin FC".into()),
            Cell::Number(1.5),
        ],
        vec![Cell::Text("Bea".into()), Cell::Empty, Cell::Number(-0.25)],
    ]);
    let csv = grid_to_csv(&g).unwrap();
    assert_eq!(
        csv,
        "Player,Teams,Goals Added (Total)\nAlice,Austin FC,1.5\nBea,,-0.25"
    );
}

#[test]
fn commas_and_quotes_are_escaped() {
    let g = grid(vec![vec![
        Cell::Text("Team, A \"B\"".into()),
        Cell::Text("Seattle Sounders FC, Austin FC".into()),
        Cell::Number(0.0),
    ]]);
    let csv = grid_to_csv(&g).unwrap();
    let line = csv.lines().nth(1).unwrap();
    assert_eq!(line, "\"Team, A \"\"B\"\"\",\"Seattle Sounders FC, Austin FC\",0");

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let record = reader.records().next().unwrap().unwrap();
    assert_eq!(&record[0], "Team, A \"B\"");
    assert_eq!(&record[1], "Seattle Sounders FC, Austin FC");
}

#[test]
fn empty_grid_is_header_only() {
    let csv = grid_to_csv(&grid(Vec::new())).unwrap();
    assert_eq!(csv, "Player,Teams,Goals Added (Total)");
}

#[test]
fn numbers_use_shortest_form() {
    assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    assert_eq!(format_number(-0.0), "0");
    assert_eq!(format_number(42.0), "42");
}
