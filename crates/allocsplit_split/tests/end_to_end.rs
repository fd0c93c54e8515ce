use std::fs;
use std::path::{Path, PathBuf};

use allocsplit_split::{
    CollectingEventSink, EnumLogLevel, EnumRunState, EnumSkipReason, EnumTableSource,
    SpecSplitOptions, SpecSplitRequest, StoreBatchProcessor, run_allocation_split,
};
use calamine::{Reader, open_workbook_auto};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use rust_xlsxwriter::Workbook;

enum Cell<'a> {
    N(f64),
    S(&'a str),
    Blank,
}

fn write_table(path: &Path, sheet_name: &str, headers: &[&str], rows: &[Vec<Cell<'_>>]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(sheet_name).expect("name");
    for (n_col, c_header) in headers.iter().enumerate() {
        sheet.write_string(0, n_col as u16, *c_header).expect("header");
    }
    for (n_row, row) in rows.iter().enumerate() {
        for (n_col, cell) in row.iter().enumerate() {
            let (r, c) = (n_row as u32 + 1, n_col as u16);
            match cell {
                Cell::N(n) => {
                    sheet.write_number(r, c, *n).expect("cell");
                }
                Cell::S(s) => {
                    sheet.write_string(r, c, *s).expect("cell");
                }
                Cell::Blank => {}
            }
        }
    }
    workbook.save(path).expect("save");
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .expect("read")
        .lines()
        .map(ToString::to_string)
        .collect()
}

fn sheet_names(path: &Path) -> Vec<String> {
    open_workbook_auto(path).expect("open").sheet_names()
}

fn request(path_stores: PathBuf, source: EnumTableSource, dir_output: PathBuf) -> SpecSplitRequest {
    SpecSplitRequest {
        path_stores,
        source,
        dir_output,
        options: SpecSplitOptions::default(),
    }
}

#[test]
fn three_stores_with_one_missing_completes() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_table = tmp.path().join("alloc.xlsx");
    write_table(
        &path_table,
        "PRE ALLOCATION",
        &["EANCode", "SEASON", "Store 1", "Store 3"],
        &[
            vec![Cell::N(1_111_111_111_111.0), Cell::S("Spring"), Cell::N(2.0), Cell::N(1.0)],
            vec![Cell::N(2_222_222_222_222.0), Cell::S("Summer"), Cell::Blank, Cell::N(3.0)],
        ],
    );
    let path_stores = tmp.path().join("stores.csv");
    fs::write(&path_stores, "Store 1\nStore 2\nStore 3\nStore 1\n").expect("write");
    let dir_output = tmp.path().join("out");

    let sink = CollectingEventSink::new();
    let report = run_allocation_split(
        &request(path_stores, EnumTableSource::File(path_table), dir_output.clone()),
        &sink,
    )
    .expect("run");

    assert_eq!(report.cnt_stores, 3);
    assert_eq!(report.cnt_written, 2);
    assert_eq!(report.skipped_for(EnumSkipReason::StoreNotFound), vec!["Store 2"]);
    assert_eq!(report.warning_count(), 1);
    assert_eq!(report.error_count(), 0);
    assert_eq!(sink.messages_at(EnumLogLevel::Warning).len(), 1);
    assert_eq!(sink.progress_values(), vec![10, 20, 43, 66, 90, 100]);
    assert!(matches!(sink.finished(), Some((true, _))));

    assert_eq!(sheet_names(&dir_output.join("Store_1.xlsx")), vec!["ALL_SEASONS", "Spring"]);
    assert_eq!(
        read_lines(&dir_output.join("Store_1-Spring.txt")),
        vec!["1111111111111", "1111111111111"]
    );
    assert_eq!(
        sheet_names(&dir_output.join("Store_3.xlsx")),
        vec!["ALL_SEASONS", "Spring", "Summer"]
    );
    assert_eq!(read_lines(&dir_output.join("Store_3-Summer.txt")).len(), 3);
    assert!(!dir_output.join("Store_2.xlsx").exists());
}

#[test]
fn store_and_season_names_are_sanitized() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let dir_source = tmp.path().join("source");
    fs::create_dir(&dir_source).expect("mkdir");
    write_table(
        &dir_source.join("allocation.xlsx"),
        "PRE_ALLOCATION",
        &["EANCode", "SEASON", "Store D/Branch 1"],
        &[vec![
            Cell::N(9_999_999_999_999.0),
            Cell::S("Fall/Winter"),
            Cell::N(3.0),
        ]],
    );
    let path_stores = tmp.path().join("stores.csv");
    fs::write(&path_stores, "Store D/Branch 1\n").expect("write");
    let dir_output = tmp.path().join("out");

    let sink = CollectingEventSink::new();
    let report = run_allocation_split(
        &request(path_stores, EnumTableSource::Directory(dir_source), dir_output.clone()),
        &sink,
    )
    .expect("run");

    assert_eq!(report.cnt_written, 1);
    // The hinted sheet was found only through the underscore fallback.
    assert_eq!(sink.messages_at(EnumLogLevel::Warning).len(), 1);
    assert_eq!(
        sheet_names(&dir_output.join("Store_D_Branch_1.xlsx")),
        vec!["ALL_SEASONS", "Fall_Winter"]
    );
    assert_eq!(
        read_lines(&dir_output.join("Store_D_Branch_1-Fall_Winter.txt")),
        vec!["9999999999999"; 3]
    );
}

#[test]
fn present_quantities_group_by_first_seen_season() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let df = DataFrame::new(vec![
        Column::from(Series::new(
            "EANCode".into(),
            vec![1_234_567_890_123.0f64, 2_222_222_222_222.0, 3_333_333_333_333.0],
        )),
        Column::from(Series::new("SEASON".into(), vec!["Spring", "Spring", "Summer"])),
        Column::from(Series::new(
            "StoreA".into(),
            vec![Some("5"), Some("0"), Some("")],
        )),
    ])
    .expect("df");

    let sink = CollectingEventSink::new();
    let mut processor = StoreBatchProcessor::new(SpecSplitOptions::default(), &sink);
    let report = processor
        .process_stores(&df, &["StoreA".to_string()], tmp.path())
        .expect("run");

    assert_eq!(processor.state(), &EnumRunState::Completed { stores_written: 1 });
    assert_eq!(report.cnt_lines, 5);
    assert_eq!(report.warning_count(), 0);

    let path_workbook = tmp.path().join("StoreA.xlsx");
    let mut workbook = open_workbook_auto(&path_workbook).expect("open");
    assert_eq!(workbook.sheet_names(), vec!["ALL_SEASONS", "Spring", "Summer"]);
    assert_eq!(workbook.worksheet_range("ALL_SEASONS").expect("range").height(), 4);
    assert_eq!(workbook.worksheet_range("Spring").expect("range").height(), 3);
    assert_eq!(workbook.worksheet_range("Summer").expect("range").height(), 2);

    assert_eq!(
        read_lines(&tmp.path().join("StoreA-Spring.txt")),
        vec!["1234567890123"; 5]
    );
    assert_eq!(
        fs::read_to_string(tmp.path().join("StoreA-Summer.txt")).expect("read"),
        ""
    );
}

#[test]
fn unparseable_quantity_warns_but_blank_does_not() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let df = DataFrame::new(vec![
        Column::from(Series::new("EANCode".into(), vec!["101", "202", "303"])),
        Column::from(Series::new("SEASON".into(), vec!["S1", "S1", "S1"])),
        Column::from(Series::new(
            "StoreA".into(),
            vec![Some("N/A"), Some("  "), Some("2")],
        )),
    ])
    .expect("df");

    let sink = CollectingEventSink::new();
    let mut processor = StoreBatchProcessor::new(SpecSplitOptions::default(), &sink);
    let report = processor
        .process_stores(&df, &["StoreA".to_string()], tmp.path())
        .expect("run");

    assert_eq!(read_lines(&tmp.path().join("StoreA-S1.txt")), vec!["303", "303"]);
    assert_eq!(report.cnt_rows_unparseable, 1);
    let l_warnings = sink.messages_at(EnumLogLevel::Warning);
    assert_eq!(l_warnings.len(), 1);
    assert!(l_warnings[0].contains("N/A"));
    assert!(l_warnings[0].contains("101"));
}

#[test]
fn empty_store_list_fails_the_run() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_stores = tmp.path().join("stores.csv");
    fs::write(&path_stores, "\n \n").expect("write");

    let sink = CollectingEventSink::new();
    let err = run_allocation_split(
        &request(
            path_stores,
            EnumTableSource::File(tmp.path().join("alloc.xlsx")),
            tmp.path().join("out"),
        ),
        &sink,
    )
    .expect_err("no stores");

    assert!(err.is_fatal());
    assert_eq!(sink.progress_values(), vec![10, 0]);
    assert!(matches!(sink.finished(), Some((false, _))));
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn missing_table_fails_the_run() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let path_stores = tmp.path().join("stores.csv");
    fs::write(&path_stores, "StoreA\n").expect("write");

    let sink = CollectingEventSink::new();
    let err = run_allocation_split(
        &request(
            path_stores,
            EnumTableSource::File(tmp.path().join("missing.xlsx")),
            tmp.path().join("out"),
        ),
        &sink,
    )
    .expect_err("no table");

    assert!(err.is_fatal());
    assert_eq!(sink.progress_values(), vec![10, 20, 0]);
    assert!(matches!(sink.finished(), Some((false, _))));
}
