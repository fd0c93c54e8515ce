//! Per-store workbook: the all-rows sheet followed by one sheet per season.

use std::path::{Path, PathBuf};

use allocsplit_io_xlsx::{SpecXlsxReport, SpecXlsxWriteOptions, XlsxIoError, XlsxWriter};

use crate::spec::{SpecSeasonPartition, SpecStoreExtract, SplitError};

/// Sheet names and warnings of one saved workbook.
#[derive(Debug, Clone, Default)]
pub struct SpecWorkbookReport {
    /// Saved workbook path.
    pub path: PathBuf,
    /// Per-sheet write reports in emit order.
    pub l_sheet_reports: Vec<SpecXlsxReport>,
}

impl SpecWorkbookReport {
    /// Final sheet names in emit order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.l_sheet_reports
            .iter()
            .flat_map(SpecXlsxReport::sheet_names)
            .collect()
    }

    /// Writer warnings (renamed or split sheets).
    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.l_sheet_reports
            .iter()
            .flat_map(|report| report.warnings.iter().map(String::as_str))
    }
}

/// Write `extract` to `path`: sheet `sheet_name_all_rows`, then each season
/// group in first-seen order. Any writer failure becomes
/// [`SplitError::ArtifactWrite`]; nothing is saved in that case.
pub fn write_store_workbook(
    path: &Path,
    extract: &SpecStoreExtract,
    partition: &SpecSeasonPartition,
    sheet_name_all_rows: &str,
    write_options: &SpecXlsxWriteOptions,
) -> Result<SpecWorkbookReport, SplitError> {
    let derive_err = |err: XlsxIoError| SplitError::ArtifactWrite {
        path: path.to_path_buf(),
        message: err.to_string(),
    };

    let mut writer = XlsxWriter::with_default_formats(path.to_path_buf(), write_options.clone());
    writer
        .write_sheet(&extract.df, sheet_name_all_rows)
        .map_err(derive_err)?;
    for group in &partition.groups {
        writer
            .write_sheet(&group.df, &group.sheet_name)
            .map_err(derive_err)?;
    }
    writer.close().map_err(derive_err)?;

    Ok(SpecWorkbookReport {
        path: writer.file_out().to_path_buf(),
        l_sheet_reports: writer.report(),
    })
}
