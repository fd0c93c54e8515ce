//! Naming constants and default options.

use allocsplit_io_xlsx::conf::derive_default_xlsx_write_options;

use crate::spec::SpecSplitOptions;

/// Substring identifying the product code column.
pub const C_MARKER_CODE_COLUMN: &str = "EANCode";
/// Substring identifying the season column.
pub const C_MARKER_SEASON_COLUMN: &str = "SEASON";
/// Sheet holding every extract row of a store.
pub const C_SHEET_NAME_ALL_SEASONS: &str = "ALL_SEASONS";
/// Default allocation sheet name hint.
pub const C_SHEET_HINT_DEFAULT: &str = "PRE ALLOCATION";
/// Workbook output extension.
pub const C_EXT_WORKBOOK: &str = "xlsx";
/// Expanded-code output extension.
pub const C_EXT_TEXT: &str = "txt";
/// Glob used to discover the allocation workbook in a source directory.
pub const C_PATTERN_SOURCE_TABLE: &str = "*.xlsx";

/// Progress reported once the store list is being read.
pub const N_PCT_READING_STORES: u8 = 10;
/// Progress reported once the allocation table is being read.
pub const N_PCT_READING_TABLE: u8 = 20;
/// Start of the per-store progress sub-range.
pub const N_PCT_STORES_START: u8 = 20;
/// End of the per-store progress sub-range.
pub const N_PCT_STORES_END: u8 = 90;
/// Progress reported on completion.
pub const N_PCT_DONE: u8 = 100;

/// Build default split options.
pub fn derive_default_split_options() -> SpecSplitOptions {
    SpecSplitOptions {
        sheet_hint: C_SHEET_HINT_DEFAULT.to_string(),
        marker_code_column: C_MARKER_CODE_COLUMN.to_string(),
        marker_season_column: C_MARKER_SEASON_COLUMN.to_string(),
        sheet_name_all_rows: C_SHEET_NAME_ALL_SEASONS.to_string(),
        pct_stores_start: N_PCT_STORES_START,
        pct_stores_end: N_PCT_STORES_END,
        if_stores_have_header: false,
        write_options: derive_default_xlsx_write_options(),
    }
}
