//! `allocsplit_io_xlsx` v1:
//! Workbook kernel for allocation tables.
//!
//! Modules:
//! - `conf`   : Excel limits and default format presets
//! - `spec`   : cell/format models, write options, reports, errors
//! - `util`   : pure helper functions (cell text, sheet names, slicing)
//! - `reader` : allocation-table loader (calamine -> polars)
//! - `writer` : buffered workbook writer
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_SHEET_NAME_FALLBACK, N_LEN_EXCEL_SHEET_NAME_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_xlsx_formats, derive_default_xlsx_write_options,
};
pub use reader::{derive_sheet_candidates, load_allocation_table, load_allocation_table_from_sheets};
pub use spec::{
    EnumCellAlign, EnumCellValue, EnumSheetSource, SpecAutofitPolicy, SpecCellFormat,
    SpecLoadedTable, SpecSheetSlice, SpecXlsxFormats, SpecXlsxReport, SpecXlsxWriteOptions,
    XlsxIoError,
};
pub use util::{
    derive_cell_value_from_any_value, format_cell_text, plan_sheet_slices, sanitize_sheet_name,
};
pub use writer::XlsxWriter;
