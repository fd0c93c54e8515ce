//! Allocation-table loader: workbook sheet -> polars frame.
//!
//! Sheet resolution tries the hint verbatim, then the hint with spaces
//! replaced by underscores, then the first sheet. A candidate that fails to
//! read or holds no data rows falls through to the next one.

use std::io::{Read, Seek};
use std::path::Path;

use calamine::{Data, Range, Reader, Sheets, open_workbook_auto};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tracing::{debug, warn};

use crate::spec::{EnumCellValue, EnumSheetSource, SpecLoadedTable, XlsxIoError};
use crate::util::{derive_unique_column_names, format_cell_text};

/// Load the allocation table from the workbook at `path`.
pub fn load_allocation_table(
    path: impl AsRef<Path>,
    sheet_hint: &str,
) -> Result<SpecLoadedTable, XlsxIoError> {
    let path = path.as_ref();
    let mut sheets = open_workbook_auto(path).map_err(|err| XlsxIoError::Open {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    load_allocation_table_from_sheets(&mut sheets, sheet_hint)
}

/// Same as [`load_allocation_table`] over an already opened workbook.
pub fn load_allocation_table_from_sheets<RS: Read + Seek>(
    sheets: &mut Sheets<RS>,
    sheet_hint: &str,
) -> Result<SpecLoadedTable, XlsxIoError> {
    let l_sheet_names = sheets.sheet_names();
    debug!(sheets = ?l_sheet_names, "available sheets");

    for (c_sheet_name, source) in derive_sheet_candidates(sheet_hint, &l_sheet_names) {
        let range = match sheets.worksheet_range(&c_sheet_name) {
            Ok(range) => range,
            Err(err) => {
                warn!(sheet = %c_sheet_name, "failed to read sheet: {err}");
                continue;
            }
        };
        let df = derive_dataframe_from_range(&range)?;
        if df.height() == 0 {
            warn!(sheet = %c_sheet_name, "sheet is empty");
            continue;
        }

        debug!(
            sheet = %c_sheet_name,
            ?source,
            n_rows = df.height(),
            n_cols = df.width(),
            columns = ?df.get_column_names_str(),
            "allocation table loaded"
        );
        return Ok(SpecLoadedTable {
            df,
            sheet_name: c_sheet_name,
            source,
        });
    }

    Err(XlsxIoError::SheetResolution {
        hint: sheet_hint.to_string(),
        available: l_sheet_names,
    })
}

/// Ordered, deduplicated sheet candidates that exist in `sheet_names`.
pub fn derive_sheet_candidates(
    sheet_hint: &str,
    sheet_names: &[String],
) -> Vec<(String, EnumSheetSource)> {
    let c_hint_underscored = sheet_hint.replace(' ', "_");
    let l_wanted = [
        Some((sheet_hint.to_string(), EnumSheetSource::Hint)),
        Some((c_hint_underscored, EnumSheetSource::HintUnderscored)),
        sheet_names
            .first()
            .map(|name| (name.clone(), EnumSheetSource::FirstSheet)),
    ];

    let mut l_candidates: Vec<(String, EnumSheetSource)> = Vec::new();
    for (c_name, source) in l_wanted.into_iter().flatten() {
        if !sheet_names.contains(&c_name) || l_candidates.iter().any(|(c, _)| *c == c_name) {
            continue;
        }
        l_candidates.push((c_name, source));
    }
    l_candidates
}

/// Build a frame from a sheet range; the first row is the header.
///
/// Fully blank body rows are dropped. Column dtype is `Int64` when every
/// present cell is an integral number, `Float64` when every present cell is a
/// number, otherwise `String` with numbers rendered as text.
pub fn derive_dataframe_from_range(range: &Range<Data>) -> Result<DataFrame, XlsxIoError> {
    let mut rows = range.rows();
    let Some(l_header_cells) = rows.next() else {
        return Ok(DataFrame::empty());
    };

    let l_raw_headers: Vec<String> = l_header_cells
        .iter()
        .map(|cell| format_cell_text(&derive_cell_value_from_data(cell)))
        .collect();
    let l_colnames = derive_unique_column_names(&l_raw_headers);

    let mut l_cells_by_col: Vec<Vec<EnumCellValue>> = vec![Vec::new(); l_colnames.len()];
    for row in rows {
        let l_values: Vec<EnumCellValue> = row.iter().map(derive_cell_value_from_data).collect();
        if l_values.iter().all(EnumCellValue::is_none) {
            continue;
        }
        for (n_idx_col, cells) in l_cells_by_col.iter_mut().enumerate() {
            cells.push(
                l_values
                    .get(n_idx_col)
                    .cloned()
                    .unwrap_or(EnumCellValue::None),
            );
        }
    }

    let l_columns: Vec<Column> = l_colnames
        .iter()
        .zip(l_cells_by_col.iter())
        .map(|(c_name, cells)| derive_column_from_cells(c_name, cells))
        .collect();
    Ok(DataFrame::new(l_columns)?)
}

/// Map one calamine cell onto the loose cell model.
pub fn derive_cell_value_from_data(cell: &Data) -> EnumCellValue {
    match cell {
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => EnumCellValue::Number(val.as_f64()),
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        // Error cells (#N/A, #REF!, ...) and blanks read as missing.
        _ => EnumCellValue::None,
    }
}

fn derive_column_from_cells(name: &str, cells: &[EnumCellValue]) -> Column {
    let if_all_numeric = cells
        .iter()
        .all(|cell| matches!(cell, EnumCellValue::None | EnumCellValue::Number(_)));
    let if_all_integral = if_all_numeric
        && cells.iter().all(|cell| match cell {
            EnumCellValue::Number(n) => n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15,
            _ => true,
        });
    let if_any_present = cells.iter().any(|cell| !cell.is_none());

    let series = if if_all_integral && if_any_present {
        let values: Vec<Option<i64>> = cells
            .iter()
            .map(|cell| match cell {
                EnumCellValue::Number(n) => Some(*n as i64),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else if if_all_numeric {
        let values: Vec<Option<f64>> = cells
            .iter()
            .map(|cell| match cell {
                EnumCellValue::Number(n) => Some(*n),
                _ => None,
            })
            .collect();
        Series::new(name.into(), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|cell| match cell {
                EnumCellValue::None => None,
                other => Some(format_cell_text(other)),
            })
            .collect();
        Series::new(name.into(), values)
    };
    Column::from(series)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{AnyValue, DataType};
    use rust_xlsxwriter::Workbook;

    use super::*;

    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();

        let sheet_readme = workbook.add_worksheet();
        sheet_readme.set_name("README").expect("name");
        sheet_readme.write_string(0, 0, "notes").expect("write");
        sheet_readme
            .write_string(1, 0, "see PRE_ALLOCATION")
            .expect("write");

        let sheet = workbook.add_worksheet();
        sheet.set_name("PRE_ALLOCATION").expect("name");
        for (n_col, c_header) in ["EANCode", "SEASON", "Store A", "Store A", ""]
            .iter()
            .enumerate()
        {
            sheet
                .write_string(0, n_col as u16, *c_header)
                .expect("header");
        }
        sheet.write_number(1, 0, 1_234_567_890_123.0).expect("cell");
        sheet.write_string(1, 1, "Spring").expect("cell");
        sheet.write_number(1, 2, 5.0).expect("cell");
        sheet.write_string(1, 3, "N/A").expect("cell");
        // Row 2 is fully blank and must be dropped.
        sheet.write_number(3, 0, 2_222_222_222_222.0).expect("cell");
        sheet.write_number(3, 1, 2024.0).expect("cell");
        sheet.write_number(3, 3, 2.0).expect("cell");
        sheet.write_number(3, 4, 1.5).expect("cell");

        workbook.save(path).expect("save");
    }

    #[test]
    fn test_derive_sheet_candidates_order_and_dedup() {
        let l_names = vec![
            "README".to_string(),
            "PRE ALLOCATION".to_string(),
            "PRE_ALLOCATION".to_string(),
        ];
        assert_eq!(
            derive_sheet_candidates("PRE ALLOCATION", &l_names),
            vec![
                ("PRE ALLOCATION".to_string(), EnumSheetSource::Hint),
                ("PRE_ALLOCATION".to_string(), EnumSheetSource::HintUnderscored),
                ("README".to_string(), EnumSheetSource::FirstSheet),
            ]
        );

        let l_names = vec!["Data".to_string()];
        assert_eq!(
            derive_sheet_candidates("Data", &l_names),
            vec![("Data".to_string(), EnumSheetSource::Hint)]
        );
        assert!(derive_sheet_candidates("x", &[]).is_empty());
    }

    #[test]
    fn test_load_allocation_table_falls_back_to_underscored_hint() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("alloc.xlsx");
        write_fixture(&path);

        let loaded = load_allocation_table(&path, "PRE ALLOCATION").expect("load");
        assert_eq!(loaded.sheet_name, "PRE_ALLOCATION");
        assert_eq!(loaded.source, EnumSheetSource::HintUnderscored);

        let df = loaded.df;
        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            vec!["EANCode", "SEASON", "Store A", "Store A.1", "Unnamed: 4"]
        );
        assert_eq!(df.column("EANCode").expect("col").dtype(), &DataType::Int64);
        assert_eq!(df.column("SEASON").expect("col").dtype(), &DataType::String);
        assert_eq!(df.column("Unnamed: 4").expect("col").dtype(), &DataType::Float64);

        let season = df.column("SEASON").expect("col");
        assert_eq!(season.get(1).expect("cell"), AnyValue::String("2024"));
        let store_a1 = df.column("Store A.1").expect("col");
        assert_eq!(store_a1.get(0).expect("cell"), AnyValue::String("N/A"));
        assert_eq!(store_a1.get(1).expect("cell"), AnyValue::String("2"));
    }

    #[test]
    fn test_load_allocation_table_uses_first_sheet_when_hint_missing() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("alloc.xlsx");
        write_fixture(&path);

        let loaded = load_allocation_table(&path, "NOPE").expect("load");
        assert_eq!(loaded.sheet_name, "README");
        assert_eq!(loaded.source, EnumSheetSource::FirstSheet);
        assert_eq!(loaded.df.get_column_names_str(), vec!["notes"]);
    }

    #[test]
    fn test_load_allocation_table_without_usable_sheet_fails() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("empty.xlsx");
        let mut workbook = Workbook::new();
        workbook
            .add_worksheet()
            .set_name("Only Header")
            .expect("name")
            .write_string(0, 0, "EANCode")
            .expect("write");
        workbook.save(&path).expect("save");

        let err = load_allocation_table(&path, "PRE ALLOCATION").expect_err("no rows");
        assert!(matches!(err, XlsxIoError::SheetResolution { .. }));
    }

    #[test]
    fn test_load_allocation_table_missing_file_is_open_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let err = load_allocation_table(tmp.path().join("missing.xlsx"), "PRE ALLOCATION")
            .expect_err("missing");
        assert!(matches!(err, XlsxIoError::Open { .. }));
    }
}
