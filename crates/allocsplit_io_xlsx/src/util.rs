//! Stateless helpers shared by the loader and the writer.

use std::collections::BTreeSet;

use polars::prelude::AnyValue;

use crate::conf::{
    C_SHEET_NAME_FALLBACK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumCellValue, SpecSheetSlice, SpecXlsxReport};

////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Map one polars scalar onto the loose cell model.
pub fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.as_str().to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) => EnumCellValue::Number(val),
        other => EnumCellValue::String(format!("{other:?}")),
    }
}

/// String form of a cell: text verbatim, numbers via `f64` display, missing as empty.
///
/// Integral floats render without a fractional part (`2024.0` -> `"2024"`).
pub fn format_cell_text(value: &EnumCellValue) -> String {
    match value {
        EnumCellValue::None => String::new(),
        EnumCellValue::String(s) => s.clone(),
        EnumCellValue::Number(n) => n.to_string(),
    }
}

/// Cell as written: numbers outside numeric columns become text, non-finite
/// numbers become blank.
pub fn convert_cell_value(value: EnumCellValue, if_is_numeric_col: bool) -> EnumCellValue {
    match value {
        EnumCellValue::Number(n) if !if_is_numeric_col => {
            EnumCellValue::String(format_cell_text(&EnumCellValue::Number(n)))
        }
        EnumCellValue::Number(n) if !n.is_finite() => EnumCellValue::None,
        other => other,
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnNames

/// Prefix given to columns whose header cell is blank.
pub const C_UNNAMED_COLUMN_PREFIX: &str = "Unnamed: ";

/// Turn raw header cells into unique column names.
///
/// Blank headers become `Unnamed: <idx>`; repeats of a name get `.1`, `.2`, ...
pub fn derive_unique_column_names(raw_headers: &[String]) -> Vec<String> {
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    let mut l_names = Vec::with_capacity(raw_headers.len());

    for (n_idx, c_raw) in raw_headers.iter().enumerate() {
        let c_base = if c_raw.trim().is_empty() {
            format!("{C_UNNAMED_COLUMN_PREFIX}{n_idx}")
        } else {
            c_raw.clone()
        };

        let mut c_name = c_base.clone();
        let mut n_dup = 1usize;
        while set_seen.contains(&c_name) {
            c_name = format!("{c_base}.{n_dup}");
            n_dup += 1;
        }
        set_seen.insert(c_name.clone());
        l_names.push(c_name);
    }

    l_names
}

/// Names occurring more than once, in first-repeat order.
pub fn derive_duplicate_columns<S: AsRef<str>>(columns: &[S]) -> Vec<String> {
    let mut set_seen: BTreeSet<&str> = BTreeSet::new();
    let mut l_dups: Vec<String> = Vec::new();
    for c_name in columns.iter().map(AsRef::as_ref) {
        if !set_seen.insert(c_name) && !l_dups.iter().any(|d| d == c_name) {
            l_dups.push(c_name.to_string());
        }
    }
    l_dups
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNames

/// Trim to the Excel sheet-name length, then replace illegal characters.
///
/// Truncation happens first, so an illegal character past the cut is simply
/// dropped rather than replaced. Empty input yields [`C_SHEET_NAME_FALLBACK`].
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name: String = name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    if c_name.is_empty() {
        c_name = C_SHEET_NAME_FALLBACK.to_string();
    }
    c_name
}

/// Replace a leading or trailing `'`, which Excel refuses in sheet names.
pub fn replace_edge_apostrophes(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    if c_name.starts_with('\'') {
        c_name.replace_range(..1, replace_to);
    }
    if c_name.ends_with('\'') {
        let n_idx_last = c_name.len() - 1;
        c_name.replace_range(n_idx_last.., replace_to);
    }
    c_name
}

/// Split `height_df` body rows into sheets that fit under Excel's row limit
/// (one header row each). Overflow parts are named `<name>_1`, `<name>_2`, ...
/// and reported as a warning.
pub fn plan_sheet_slices(
    height_df: usize,
    sheet_name: &str,
    report: &mut SpecXlsxReport,
) -> Vec<SpecSheetSlice> {
    let n_rows_body_max = N_NROWS_EXCEL_MAX - 1;
    if height_df <= n_rows_body_max {
        return vec![SpecSheetSlice {
            sheet_name: sheet_name.to_string(),
            row_start: 0,
            row_end: height_df,
        }];
    }

    let l_slices: Vec<SpecSheetSlice> = (0..height_df)
        .step_by(n_rows_body_max)
        .enumerate()
        .map(|(n_idx, n_row_start)| SpecSheetSlice {
            sheet_name: create_sheet_identifier(sheet_name, n_idx + 1),
            row_start: n_row_start,
            row_end: usize::min(height_df, n_row_start + n_rows_body_max),
        })
        .collect();
    report.warn(format!(
        "Excel row limit exceeded: {sheet_name:?} split into {} sheets.",
        l_slices.len()
    ));
    l_slices
}

/// Suffixed sheet name (`base_1`, `base_2`, ...) within the length cap.
pub fn create_sheet_identifier(base_name: &str, part_idx_1based: usize) -> String {
    let c_suffix = format!("_{part_idx_1based}");
    let n_len_base_max = N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len());
    let c_base: String = base_name
        .chars()
        .take(usize::max(1, n_len_base_max))
        .collect();
    format!("{c_base}{c_suffix}")
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
