//! Buffered workbook writer that turns polars frames into worksheets.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame, DataType};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::debug;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, derive_default_xlsx_formats};
use crate::spec::{
    EnumCellAlign, EnumCellValue, SpecAutofitPolicy, SpecCellFormat, SpecSheetSlice,
    SpecXlsxFormats, SpecXlsxReport, SpecXlsxWriteOptions, XlsxIoError,
};
use crate::util::{
    convert_cell_value, derive_cell_value_from_any_value, derive_duplicate_columns,
    format_cell_text, plan_sheet_slices, replace_edge_apostrophes, sanitize_sheet_name,
};

/// Body format class of one column, from its dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnumColumnKind {
    Text,
    Integer,
    Decimal,
}

/// Stateful workbook writer.
///
/// Sheets accumulate in memory; nothing touches the filesystem until
/// [`Self::close`]. Dropping an unclosed writer discards the workbook.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    formats: SpecXlsxFormats,
    write_options: SpecXlsxWriteOptions,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    pub fn new(
        path_file_out: PathBuf,
        formats: SpecXlsxFormats,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            formats,
            write_options,
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Writer using [`derive_default_xlsx_formats`].
    pub fn with_default_formats(
        path_file_out: PathBuf,
        write_options: SpecXlsxWriteOptions,
    ) -> Self {
        Self::new(path_file_out, derive_default_xlsx_formats(), write_options)
    }

    /// Output file path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Snapshot of per-call write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(|err| derive_save_error(err, &self.path_file_out))?;
        self.if_closed = true;
        debug!(
            path = %self.path_file_out.display(),
            n_sheets = self.set_sheet_names_existing.len(),
            "workbook saved"
        );
        Ok(())
    }

    /// Write `df` (header row + body) as one or more sheets.
    ///
    /// The requested name is sanitized, split on the Excel row limit and made
    /// unique within the workbook; the returned report lists the final names.
    pub fn write_sheet(
        &mut self,
        df: &DataFrame,
        sheet_name: &str,
    ) -> Result<SpecXlsxReport, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }

        let l_colnames: Vec<String> = df
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        let l_dups = derive_duplicate_columns(&l_colnames);
        if !l_dups.is_empty() {
            return Err(XlsxIoError::InvalidTable(format!(
                "Duplicate column names: {l_dups:?}"
            )));
        }

        let l_kinds: Vec<EnumColumnKind> = df
            .get_columns()
            .iter()
            .map(|col| derive_column_kind(col.dtype(), self.write_options.if_integer_format))
            .collect();
        let l_fmt_body: Vec<Format> = l_kinds
            .iter()
            .map(|kind| {
                derive_rust_xlsx_format(match kind {
                    EnumColumnKind::Text => &self.formats.text,
                    EnumColumnKind::Integer => &self.formats.integer,
                    EnumColumnKind::Decimal => &self.formats.decimal,
                })
            })
            .collect();
        let fmt_header = derive_rust_xlsx_format(&self.formats.header);

        let mut report = SpecXlsxReport::default();
        let l_slices = plan_sheet_slices(df.height(), &sanitize_sheet_name(sheet_name, "_"), &mut report);

        for slice in l_slices {
            let c_requested = replace_edge_apostrophes(&slice.sheet_name, "_");
            if c_requested != slice.sheet_name {
                report.warn(format!(
                    "Sheet name {:?} cannot start or end with an apostrophe; using {:?}.",
                    slice.sheet_name, c_requested
                ));
            }
            let c_sheet_name = self.derive_unique_sheet_name(&c_requested);
            if c_sheet_name != c_requested {
                report.warn(format!(
                    "Sheet name {c_requested:?} already used; wrote {c_sheet_name:?} instead."
                ));
            }

            let worksheet = self.workbook.add_worksheet();
            worksheet.set_name(&c_sheet_name)?;
            write_sheet_body(
                worksheet,
                df.get_columns(),
                &l_colnames,
                &l_kinds,
                &l_fmt_body,
                &fmt_header,
                (slice.row_start, slice.row_end),
                &self.write_options,
            )?;

            debug!(
                sheet = %c_sheet_name,
                n_rows = slice.row_end - slice.row_start,
                "sheet written"
            );
            report.sheets.push(SpecSheetSlice {
                sheet_name: c_sheet_name,
                ..slice
            });
        }

        self.l_reports.push(report.clone());
        Ok(report)
    }

    /// Reserve a sheet name, suffixing `__2`, `__3`, ... on collision.
    ///
    /// Excel compares sheet names case-insensitively, so does this.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_lowercase()) {
            return name.to_string();
        }

        let mut n_idx = 2usize;
        loop {
            // Base shrinks as the suffix grows so every candidate stays distinct.
            let c_suffix = format!("__{n_idx}");
            let c_base: String = name
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX.saturating_sub(c_suffix.len()))
                .collect();
            let c_candidate = format!("{c_base}{c_suffix}");
            if self.set_sheet_names_existing.insert(c_candidate.to_lowercase()) {
                return c_candidate;
            }
            n_idx += 1;
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn write_sheet_body(
    worksheet: &mut Worksheet,
    columns: &[Column],
    headers: &[String],
    kinds: &[EnumColumnKind],
    fmt_body: &[Format],
    fmt_header: &Format,
    (n_row_start, n_row_end): (usize, usize),
    write_options: &SpecXlsxWriteOptions,
) -> Result<(), XlsxIoError> {
    for (n_idx_col, c_header) in headers.iter().enumerate() {
        worksheet.write_string_with_format(0, cast_col_num(n_idx_col)?, c_header, fmt_header)?;
    }
    if write_options.if_freeze_header {
        worksheet.set_freeze_panes(1, 0)?;
    }

    let mut l_widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    let n_rows_measured = match &write_options.policy_autofit {
        Some(policy) if policy.if_measure_body => policy.n_rows_measured_max,
        _ => 0,
    };

    for (n_row_out, n_row_src) in (n_row_start..n_row_end).enumerate() {
        let n_row = cast_row_num(n_row_out + 1)?;
        for (n_idx_col, col) in columns.iter().enumerate() {
            let value = convert_cell_value(
                derive_cell_value_from_any_value(col.get(n_row_src)?),
                kinds[n_idx_col] != EnumColumnKind::Text,
            );
            if n_row_out < n_rows_measured {
                l_widths[n_idx_col] =
                    usize::max(l_widths[n_idx_col], format_cell_text(&value).chars().count());
            }

            let n_col = cast_col_num(n_idx_col)?;
            let format = &fmt_body[n_idx_col];
            match &value {
                EnumCellValue::None => {
                    worksheet.write_blank(n_row, n_col, format)?;
                }
                EnumCellValue::String(val) => {
                    worksheet.write_string_with_format(n_row, n_col, val, format)?;
                }
                EnumCellValue::Number(val) => {
                    worksheet.write_number_with_format(n_row, n_col, *val, format)?;
                }
            }
        }
    }

    if let Some(policy) = &write_options.policy_autofit {
        apply_column_widths(worksheet, &l_widths, policy)?;
    }
    Ok(())
}

fn apply_column_widths(
    worksheet: &mut Worksheet,
    widths: &[usize],
    policy: &SpecAutofitPolicy,
) -> Result<(), XlsxIoError> {
    let n_min = usize::max(1, policy.width_min);
    let n_max = usize::clamp(policy.width_max, n_min, 255);
    for (n_idx_col, n_width) in widths.iter().enumerate() {
        let n_width_final = usize::clamp(n_width + policy.width_padding, n_min, n_max);
        worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width_final as f64)?;
    }
    Ok(())
}

fn derive_column_kind(dtype: &DataType, if_integer_format: bool) -> EnumColumnKind {
    if dtype.is_integer() && if_integer_format {
        EnumColumnKind::Integer
    } else if dtype.is_primitive_numeric() {
        EnumColumnKind::Decimal
    } else {
        EnumColumnKind::Text
    }
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new().set_align(match spec.align {
        EnumCellAlign::Left => FormatAlign::Left,
        EnumCellAlign::Center => FormatAlign::Center,
        EnumCellAlign::Right => FormatAlign::Right,
    });
    if spec.bold {
        format = format.set_bold();
    }
    if spec.border {
        format = format.set_border(FormatBorder::Thin);
    }
    if let Some(c_num_format) = &spec.num_format {
        format = format.set_num_format(c_num_format);
    }
    format
}

fn derive_save_error(err: XlsxError, path: &Path) -> XlsxIoError {
    match err {
        XlsxError::IoError(io_err) if io_err.kind() == ErrorKind::PermissionDenied => {
            XlsxIoError::PermissionDenied {
                path: path.to_path_buf(),
            }
        }
        other => XlsxIoError::Xlsx(other),
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value)
        .map_err(|_| XlsxIoError::InvalidTable(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::InvalidTable(format!("column index overflow: {value}")))
}
