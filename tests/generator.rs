use calamine::{Data, Reader, open_workbook_auto};
use rust_xlsxwriter::Workbook;
use solution_dashboard::generator::generate;
use solution_dashboard::{BakedValues, LiveFormulas, ReportError};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: [&str; 7] = [
    "Division",
    "Solution Name",
    "Focus Area",
    "Stage",
    "SMV Unlock",
    "OH Reduction",
    "Other Savings",
];

type Row = (
    &'static str,
    &'static str,
    &'static str,
    &'static str,
    Option<f64>,
    Option<f64>,
    Option<f64>,
);

const ROWS: [Row; 7] = [
    ("Knit", "Auto cutter", "Automation", "Live", Some(1.25), Some(12.0), Some(3.5)),
    ("Woven", "Line balancing", "Efficiency", "Pilot", Some(0.75), None, Some(8.0)),
    ("Knit", "Sewing guide", "Quality", "Live", Some(2.0), Some(4.5), None),
    ("Denim", "Laser finish", "Automation", "Idea", None, Some(30.0), Some(1.0)),
    ("Woven", "Spreading table", "Automation", "Live", Some(3.333), Some(2.0), Some(2.0)),
    ("knit", "Case variant", "Quality", "Pilot", Some(0.5), Some(0.5), Some(0.5)),
    ("Denim", "Wash recycle", "Sustainability", "Live", Some(1.0), Some(6.1), Some(0.0)),
];

fn write_input(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("Solution List.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();

    for (col, header) in HEADER.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (i, (division, name, focus, stage, smv, oh, other)) in ROWS.iter().enumerate() {
        let row = i as u32 + 1;
        sheet.write_string(row, 0, *division).unwrap();
        sheet.write_string(row, 1, *name).unwrap();
        sheet.write_string(row, 2, *focus).unwrap();
        sheet.write_string(row, 3, *stage).unwrap();
        for (col, value) in [(4u16, smv), (5, oh), (6, other)] {
            if let Some(value) = value {
                sheet.write_number(row, col, *value).unwrap();
            }
        }
    }

    workbook.save(&path).unwrap();
    path
}

/// Every numeric cell of a sheet, in row-major order
fn numeric_cells(path: &Path, sheet: &str) -> Vec<(u32, u32, f64)> {
    let mut workbook = open_workbook_auto(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    let (row0, col0) = range.start().unwrap_or((0, 0));

    range
        .cells()
        .filter_map(|(r, c, cell)| {
            let value = match cell {
                Data::Float(f) => *f,
                Data::Int(i) => *i as f64,
                _ => return None,
            };
            Some((r as u32 + row0, c as u32 + col0, value))
        })
        .collect()
}

fn cell(path: &Path, sheet: &str, row: u32, col: u32) -> Data {
    let mut workbook = open_workbook_auto(path).unwrap();
    let range = workbook.worksheet_range(sheet).unwrap();
    range.get_value((row, col)).cloned().unwrap_or(Data::Empty)
}

#[test]
fn baked_and_live_dashboards_hold_identical_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir);
    let baked = dir.path().join("Solution_Dashboard.xlsx");
    let live = dir.path().join("Solution_Dashboard_Dynamic.xlsx");

    generate(&input, &baked, BakedValues).unwrap();
    generate(&input, &live, LiveFormulas).unwrap();

    let baked_dashboard = numeric_cells(&baked, "Dashboard");
    assert!(!baked_dashboard.is_empty());
    assert_eq!(baked_dashboard, numeric_cells(&live, "Dashboard"));
    assert_eq!(
        numeric_cells(&baked, "PivotData"),
        numeric_cells(&live, "Calculations")
    );
    assert_eq!(numeric_cells(&baked, "Data"), numeric_cells(&live, "Data"));
}

#[test]
fn sheets_are_ordered_and_named_per_variant() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir);
    let baked = dir.path().join("baked.xlsx");
    let live = dir.path().join("live.xlsx");

    generate(&input, &baked, BakedValues).unwrap();
    generate(&input, &live, LiveFormulas).unwrap();

    let names = |path: &Path| open_workbook_auto(path).unwrap().sheet_names().to_vec();
    assert_eq!(names(&baked), vec!["Dashboard", "Data", "PivotData"]);
    assert_eq!(names(&live), vec!["Dashboard", "Data", "Calculations"]);
}

#[test]
fn kpis_and_ranking_reflect_the_input() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_input(&dir);
    let output = dir.path().join("live.xlsx");

    let report = generate(&input, &output, LiveFormulas).unwrap();
    assert_eq!(report.totals.solutions, 7);
    assert_eq!(report.insights.divisions_tracked, 4);

    // Total solutions card
    assert_eq!(cell(&output, "Dashboard", 6, 1), Data::Float(7.0));
    // SMV unlock card, rounded to three places
    assert_eq!(cell(&output, "Dashboard", 6, 5), Data::Float(8.833));

    // Denim has the largest total and heads the ranking table
    assert_eq!(cell(&output, "Dashboard", 48, 1), Data::Float(1.0));
    assert_eq!(
        cell(&output, "Dashboard", 48, 2),
        Data::String("Denim".to_string())
    );
    assert_eq!(cell(&output, "Dashboard", 48, 7), Data::Float(38.1));

    // Grouping is case-sensitive, so "knit" is its own division
    assert_eq!(
        cell(&output, "Calculations", 5, 0),
        Data::String("knit".to_string())
    );
}

#[test]
fn missing_column_writes_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("partial.csv");
    std::fs::write(
        &input,
        "Division,Solution Name,Focus Area,Stage,SMV Unlock,OH Reduction\nKnit,A,Quality,Live,1,2\n",
    )
    .unwrap();
    let output = dir.path().join("out.xlsx");

    let err = generate(&input, &output, BakedValues).unwrap_err();
    assert!(matches!(err, ReportError::MissingColumn { ref column } if column == "Other Savings"));
    assert!(!output.exists());
}

#[test]
fn csv_input_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("solutions.csv");
    std::fs::write(
        &input,
        "Division,Solution Name,Focus Area,Stage,SMV Unlock,OH Reduction,Other Savings\n\
         Knit,\"Cutter, auto\",Automation,Live,\"1,000\",2,\n\
         Woven,Guide,Quality,Pilot,,,3\n",
    )
    .unwrap();
    let output = dir.path().join("out.xlsx");

    let report = generate(&input, &output, BakedValues).unwrap();
    assert_eq!(report.totals.solutions, 2);
    assert_eq!(report.totals.smv_unlock, 1000.0);
    assert_eq!(report.insights.top_division.as_deref(), Some("Knit"));
    assert!(output.exists());
}

#[test]
fn numeric_looking_division_names_cache_as_numbers_in_live_cells() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("solutions.csv");
    std::fs::write(
        &input,
        "Division,Solution Name,Focus Area,Stage,SMV Unlock,OH Reduction,Other Savings\n\
         2024,Roll-out,Quality,Live,10,10,10\n\
         Knit,Guide,Quality,Pilot,1,1,1\n",
    )
    .unwrap();
    let baked = dir.path().join("baked.xlsx");
    let live = dir.path().join("live.xlsx");

    generate(&input, &baked, BakedValues).unwrap();
    generate(&input, &live, LiveFormulas).unwrap();

    // The Data sheet keeps the name as text in both variants
    assert_eq!(cell(&baked, "Data", 1, 0), Data::String("2024".to_string()));
    assert_eq!(cell(&live, "Data", 1, 0), Data::String("2024".to_string()));

    // The ranking lookup is baked as text but cached as a number by the formula writer
    assert_eq!(
        cell(&baked, "Dashboard", 48, 2),
        Data::String("2024".to_string())
    );
    assert_eq!(cell(&live, "Dashboard", 48, 2), Data::Float(2024.0));
}
