//! Excel limits and default presets.

use crate::spec::{EnumCellAlign, SpecCellFormat, SpecXlsxFormats, SpecXlsxWriteOptions};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names, in replacement order.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = [":", "\\", "/", "?", "*", "[", "]"];
/// Sheet name used when sanitization leaves nothing.
pub const C_SHEET_NAME_FALLBACK: &str = "Sheet";

/// Format presets used by [`crate::writer::XlsxWriter::with_default_formats`].
pub fn derive_default_xlsx_formats() -> SpecXlsxFormats {
    SpecXlsxFormats {
        header: SpecCellFormat {
            bold: true,
            align: EnumCellAlign::Center,
            border: true,
            num_format: None,
        },
        text: SpecCellFormat::default(),
        // Codes are 13-digit integers; "0" keeps them out of scientific notation.
        integer: SpecCellFormat {
            align: EnumCellAlign::Right,
            num_format: Some("0".to_string()),
            ..Default::default()
        },
        decimal: SpecCellFormat {
            align: EnumCellAlign::Right,
            ..Default::default()
        },
    }
}

/// Build default write options.
pub fn derive_default_xlsx_write_options() -> SpecXlsxWriteOptions {
    SpecXlsxWriteOptions::default()
}
