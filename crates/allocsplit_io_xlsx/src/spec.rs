//! Cell, format, option and report models plus the workbook error type.

use std::path::PathBuf;

use polars::prelude::DataFrame;

////////////////////////////////////////////////////////////////////////////////
// #region Cells

/// Loose cell value crossing the load/write boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// Whether this cell is missing.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Horizontal cell alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumCellAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Cell format preset.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecCellFormat {
    pub bold: bool,
    pub align: EnumCellAlign,
    /// Thin border on all sides.
    pub border: bool,
    /// Excel number format code; `None` keeps `General`.
    pub num_format: Option<String>,
}

/// Format presets by column kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxFormats {
    pub header: SpecCellFormat,
    pub text: SpecCellFormat,
    pub integer: SpecCellFormat,
    pub decimal: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Column width inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitPolicy {
    /// Also measure body cells, not only the header.
    pub if_measure_body: bool,
    /// Body rows measured at most.
    pub n_rows_measured_max: usize,
    /// Final width lower bound.
    pub width_min: usize,
    /// Final width upper bound.
    pub width_max: usize,
    /// Added to the measured width.
    pub width_padding: usize,
}

impl Default for SpecAutofitPolicy {
    fn default() -> Self {
        Self {
            if_measure_body: true,
            n_rows_measured_max: 20_000,
            width_min: 8,
            width_max: 60,
            width_padding: 2,
        }
    }
}

/// Writer-wide options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxWriteOptions {
    /// Freeze the header row.
    pub if_freeze_header: bool,
    /// Integer dtype columns get the integer preset (number format `0`).
    pub if_integer_format: bool,
    /// Column autofit; `None` leaves Excel's default widths.
    pub policy_autofit: Option<SpecAutofitPolicy>,
}

impl Default for SpecXlsxWriteOptions {
    fn default() -> Self {
        Self {
            if_freeze_header: true,
            if_integer_format: true,
            policy_autofit: Some(SpecAutofitPolicy::default()),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetAndReport

/// One emitted worksheet: final name and the source rows it holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetSlice {
    /// Final, workbook-unique sheet name.
    pub sheet_name: String,
    /// Source rows `[row_start, row_end)`.
    pub row_start: usize,
    pub row_end: usize,
}

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet slices produced by the write call.
    pub sheets: Vec<SpecSheetSlice>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Sheet names in emit order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.sheet_name.as_str()).collect()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableLoad

/// Which candidate produced the loaded sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSheetSource {
    /// Sheet name hint, verbatim.
    Hint,
    /// Sheet name hint with spaces replaced by underscores.
    HintUnderscored,
    /// First sheet of the workbook.
    FirstSheet,
}

/// Allocation table loaded from one workbook sheet.
#[derive(Debug, Clone)]
pub struct SpecLoadedTable {
    /// Table contents; first sheet row is the header.
    pub df: DataFrame,
    /// Sheet actually read.
    pub sheet_name: String,
    /// Resolution step that matched.
    pub source: EnumSheetSource,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Workbook load/write failures.
#[derive(Debug, thiserror::Error)]
pub enum XlsxIoError {
    /// Workbook could not be opened.
    #[error("Failed to open workbook {}: {message}", path.display())]
    Open {
        /// Workbook path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// No candidate sheet produced a non-empty table.
    #[error("No usable sheet for hint {hint:?}; available sheets: {available:?}")]
    SheetResolution {
        /// Requested sheet hint.
        hint: String,
        /// Sheet names present in the workbook.
        available: Vec<String>,
    },
    /// Table shape or content is not acceptable.
    #[error("{0}")]
    InvalidTable(String),
    /// Output target rejected the write (typically open in another program).
    #[error("Permission denied writing {}; the file may be open in another program", path.display())]
    PermissionDenied {
        /// Output path.
        path: PathBuf,
    },
    /// Writer was used after `close()`.
    #[error("Cannot write after close().")]
    Closed,
    /// Error raised by `rust_xlsxwriter`.
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    /// Error raised by polars.
    #[error("table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
