//! Quantity expansion: one code line per ordered unit.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use allocsplit_io_xlsx::{EnumCellValue, derive_cell_value_from_any_value, format_cell_text};
use polars::prelude::DataFrame;
use tracing::debug;

use crate::spec::SplitError;

/// Parsed quantity cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumQuantity {
    /// Whole units to emit (negative quantities clamp to 0).
    Units(u64),
    /// Missing or whitespace-only; emits nothing, no warning.
    Blank,
    /// Not a finite number; emits nothing, with a warning.
    Unparseable(String),
}

impl EnumQuantity {
    /// Number of lines this quantity expands to.
    pub fn n_lines(&self) -> u64 {
        match self {
            Self::Units(n) => *n,
            Self::Blank | Self::Unparseable(_) => 0,
        }
    }
}

/// Outcome of expanding one season group.
#[derive(Debug, Default)]
pub struct SpecExpandReport {
    /// Lines written.
    pub n_lines: u64,
    /// Rows skipped because their quantity is not a number.
    pub l_unparseable: Vec<SplitError>,
}

/// Code string form, whitespace-trimmed, one trailing literal `.0` removed.
pub fn format_code(value: &EnumCellValue) -> String {
    let c_text = format_cell_text(value);
    let c_trimmed = c_text.trim();
    c_trimmed
        .strip_suffix(".0")
        .unwrap_or(c_trimmed)
        .to_string()
}

/// Interpret a quantity cell as `trunc(float(value))`, clamped at 0.
///
/// Boolean cells reach here as `True`/`False` text and count as 1 and 0.
pub fn parse_quantity(value: &EnumCellValue) -> EnumQuantity {
    let n_value = match value {
        EnumCellValue::None => return EnumQuantity::Blank,
        EnumCellValue::Number(n) => *n,
        EnumCellValue::String(s) => match s.trim() {
            "" => return EnumQuantity::Blank,
            "True" => 1.0,
            "False" => 0.0,
            c_trimmed => match c_trimmed.parse::<f64>() {
                Ok(n) => n,
                Err(_) => return EnumQuantity::Unparseable(s.clone()),
            },
        },
    };
    if !n_value.is_finite() {
        return EnumQuantity::Unparseable(format_cell_text(value));
    }
    let n_trunc = n_value.trunc();
    if n_trunc <= 0.0 {
        EnumQuantity::Units(0)
    } else {
        EnumQuantity::Units(n_trunc as u64)
    }
}

/// Write the expansion of `df` into `writer`, rows in order, newline-terminated.
pub fn expand_codes<W: Write>(
    writer: &mut W,
    df: &DataFrame,
    code_column: &str,
    store_column: &str,
) -> Result<SpecExpandReport, std::io::Error> {
    let col_code = df.column(code_column).map_err(std::io::Error::other)?;
    let col_qty = df.column(store_column).map_err(std::io::Error::other)?;
    let mut report = SpecExpandReport::default();

    for n_idx_row in 0..df.height() {
        let value_code =
            derive_cell_value_from_any_value(col_code.get(n_idx_row).map_err(std::io::Error::other)?);
        let value_qty =
            derive_cell_value_from_any_value(col_qty.get(n_idx_row).map_err(std::io::Error::other)?);

        let c_code = format_code(&value_code);
        match parse_quantity(&value_qty) {
            EnumQuantity::Unparseable(c_raw) => {
                report.l_unparseable.push(SplitError::RowQuantityUnparseable {
                    code: c_code,
                    value: c_raw,
                });
            }
            quantity => {
                for _ in 0..quantity.n_lines() {
                    writeln!(writer, "{c_code}")?;
                }
                report.n_lines += quantity.n_lines();
            }
        }
    }

    Ok(report)
}

/// Create `path` and write the expansion of `df` into it.
pub fn write_expanded_codes(
    path: &Path,
    df: &DataFrame,
    code_column: &str,
    store_column: &str,
) -> Result<SpecExpandReport, SplitError> {
    let derive_err = |err: std::io::Error| SplitError::ArtifactWrite {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let file = File::create(path).map_err(derive_err)?;
    let mut writer = BufWriter::new(file);
    let report = expand_codes(&mut writer, df, code_column, store_column).map_err(derive_err)?;
    writer.flush().map_err(derive_err)?;

    debug!(
        path = %path.display(),
        n_lines = report.n_lines,
        n_unparseable = report.l_unparseable.len(),
        "text file written"
    );
    Ok(report)
}
