//! End-to-end run: load inputs, then hand over to the batch processor.

use std::fs;
use std::path::{Path, PathBuf};

use allocsplit_io_xlsx::{EnumSheetSource, load_allocation_table};
use globset::GlobBuilder;
use tracing::debug;

use crate::batch::StoreBatchProcessor;
use crate::conf::{C_PATTERN_SOURCE_TABLE, N_PCT_READING_STORES, N_PCT_READING_TABLE};
use crate::report::ReportSplit;
use crate::sink::{EnumLogLevel, SplitEventSink, emit_log};
use crate::spec::{SpecSplitOptions, SplitError};
use crate::stores::load_store_names;

/// Where the allocation workbook comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumTableSource {
    /// Explicit workbook path.
    File(PathBuf),
    /// First `*.xlsx` file (by name) in this directory.
    Directory(PathBuf),
}

/// Inputs of one split run.
#[derive(Debug, Clone)]
pub struct SpecSplitRequest {
    /// Store-list CSV.
    pub path_stores: PathBuf,
    /// Allocation workbook source.
    pub source: EnumTableSource,
    /// Output directory; created when absent.
    pub dir_output: PathBuf,
    /// Run options.
    pub options: SpecSplitOptions,
}

/// Run the whole split: store list, allocation table, then every store.
///
/// Input failures send a failed terminal event and return `Err`; store-level
/// problems only show up in the report and the event stream.
pub fn run_allocation_split(
    request: &SpecSplitRequest,
    sink: &dyn SplitEventSink,
) -> Result<ReportSplit, SplitError> {
    let mut processor = StoreBatchProcessor::new(request.options.clone(), sink);

    processor.begin_loading("Reading stores list", N_PCT_READING_STORES);
    let l_stores = match load_store_names(&request.path_stores, request.options.if_stores_have_header)
    {
        Ok(l_stores) => l_stores,
        Err(err) => {
            processor.fail(&err);
            return Err(err);
        }
    };
    processor.info(format!("Found {} unique stores", l_stores.len()));

    processor.begin_loading("Reading allocation table", N_PCT_READING_TABLE);
    let path_table = match &request.source {
        EnumTableSource::File(path) => Ok(path.clone()),
        EnumTableSource::Directory(dir) => discover_source_table(dir),
    };
    let loaded = match path_table.and_then(|path| {
        load_allocation_table(&path, &request.options.sheet_hint)
            .map_err(|err| SplitError::input_unavailable("Allocation table", err))
    }) {
        Ok(loaded) => loaded,
        Err(err) => {
            processor.fail(&err);
            return Err(err);
        }
    };

    if loaded.source != EnumSheetSource::Hint {
        let warning = SplitError::SheetResolution {
            hint: request.options.sheet_hint.clone(),
            used: loaded.sheet_name.clone(),
        };
        emit_log(sink, EnumLogLevel::Warning, warning.to_string());
    }
    processor.info(format!(
        "Allocation table loaded from sheet '{}' with {} rows and {} columns",
        loaded.sheet_name,
        loaded.df.height(),
        loaded.df.width()
    ));

    processor.process_stores(&loaded.df, &l_stores, &request.dir_output)
}

/// First `*.xlsx` file in `dir`, by file name. Office lock files (`~$...`)
/// are ignored.
pub fn discover_source_table(dir: &Path) -> Result<PathBuf, SplitError> {
    let matcher = GlobBuilder::new(C_PATTERN_SOURCE_TABLE)
        .case_insensitive(true)
        .build()
        .map_err(|err| SplitError::input_unavailable("Allocation table", err))?
        .compile_matcher();

    let entries = fs::read_dir(dir).map_err(|err| {
        SplitError::input_unavailable("Allocation table", format!("{}: {err}", dir.display()))
    })?;

    let mut l_candidates: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| {
            SplitError::input_unavailable("Allocation table", format!("{}: {err}", dir.display()))
        })?;
        let path = entry.path();
        let c_file_name = entry.file_name().to_string_lossy().to_string();
        if !path.is_file() || c_file_name.starts_with("~$") || !matcher.is_match(&c_file_name) {
            continue;
        }
        l_candidates.push(path);
    }
    l_candidates.sort();
    debug!(dir = %dir.display(), candidates = ?l_candidates, "source tables");

    l_candidates.into_iter().next().ok_or_else(|| {
        SplitError::input_unavailable(
            "Allocation table",
            format!("no {C_PATTERN_SOURCE_TABLE} file found in {}", dir.display()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_source_table_picks_first_by_name() {
        let tmp = tempfile::tempdir().expect("tempdir");
        for c_name in ["b.xlsx", "A.XLSX", "~$a.xlsx", "notes.txt", "c.xls"] {
            fs::write(tmp.path().join(c_name), b"").expect("write");
        }
        fs::create_dir(tmp.path().join("0.xlsx")).expect("mkdir");

        let path = discover_source_table(tmp.path()).expect("found");
        assert_eq!(path, tmp.path().join("A.XLSX"));
    }

    #[test]
    fn test_discover_source_table_none_found() {
        let tmp = tempfile::tempdir().expect("tempdir");
        fs::write(tmp.path().join("notes.txt"), b"").expect("write");
        let err = discover_source_table(tmp.path()).expect_err("none");
        assert!(err.is_fatal());

        let err = discover_source_table(&tmp.path().join("missing")).expect_err("missing dir");
        assert!(err.is_fatal());
    }
}
