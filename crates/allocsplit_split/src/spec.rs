//! Split option and outcome models, run states and error taxonomy.

use std::path::PathBuf;

use allocsplit_io_xlsx::SpecXlsxWriteOptions;
use polars::prelude::DataFrame;

use crate::conf::derive_default_split_options;

////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Options for one split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSplitOptions {
    /// Preferred allocation sheet name.
    pub sheet_hint: String,
    /// Substring marking the code column.
    pub marker_code_column: String,
    /// Substring marking the season column.
    pub marker_season_column: String,
    /// Name of the sheet holding all extract rows.
    pub sheet_name_all_rows: String,
    /// Progress value after zero stores.
    pub pct_stores_start: u8,
    /// Progress value after the last store.
    pub pct_stores_end: u8,
    /// Skip the first store-list record.
    pub if_stores_have_header: bool,
    /// Workbook writer options.
    pub write_options: SpecXlsxWriteOptions,
}

impl Default for SpecSplitOptions {
    fn default() -> Self {
        derive_default_split_options()
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Columns

/// Role of one allocation-table column. Each variant carries the column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumColumnRole {
    /// Product code identifier.
    Code(String),
    /// Season identifier.
    Season(String),
    /// Candidate store-quantity column.
    Store(String),
    /// Blank-header column; never matched.
    Unclassified(String),
}

impl EnumColumnRole {
    /// Column name regardless of role.
    pub fn column_name(&self) -> &str {
        match self {
            Self::Code(name) | Self::Season(name) | Self::Store(name) | Self::Unclassified(name) => {
                name
            }
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Extract

/// One store's rows projected to (code, season, quantity).
#[derive(Debug, Clone)]
pub struct SpecStoreExtract {
    /// Store name as requested.
    pub store_name: String,
    /// Code column name.
    pub code_column: String,
    /// Season column name.
    pub season_column: String,
    /// Resolved quantity column name.
    pub store_column: String,
    /// Rows whose quantity cell is present.
    pub df: DataFrame,
}

/// Rows of one extract sharing a season value.
#[derive(Debug, Clone)]
pub struct SpecSeasonGroup {
    /// Season string form.
    pub season: String,
    /// Sanitized sheet name (before workbook-level uniquing).
    pub sheet_name: String,
    /// File-name fragment, unique within the store.
    pub file_fragment: String,
    /// Rows of this season.
    pub df: DataFrame,
}

/// Season groups in first-seen order plus naming warnings.
#[derive(Debug, Clone, Default)]
pub struct SpecSeasonPartition {
    /// Groups in first-seen order.
    pub groups: Vec<SpecSeasonGroup>,
    /// Rows whose season is missing (present only in the all-rows sheet).
    pub n_rows_without_season: usize,
    /// Non-fatal naming warnings.
    pub warnings: Vec<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Outcomes

/// Files produced for one store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecOutputArtifacts {
    /// Workbook path, once saved.
    pub workbook: Option<PathBuf>,
    /// Text files written, in season order.
    pub text_files: Vec<PathBuf>,
    /// Total code lines written.
    pub n_lines: u64,
    /// Rows whose quantity could not be parsed.
    pub n_rows_unparseable: usize,
}

impl SpecOutputArtifacts {
    /// Whether at least one file was produced.
    pub fn is_empty(&self) -> bool {
        self.workbook.is_none() && self.text_files.is_empty()
    }
}

/// Why a store produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSkipReason {
    /// No column matched the store name.
    StoreNotFound,
    /// Code or season column absent.
    IdentifiersMissing,
    /// Store column found, zero rows with a quantity.
    EmptyExtract,
}

/// Result of processing one store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnumStoreOutcome {
    /// All artifacts written.
    Written(SpecOutputArtifacts),
    /// Recoverable skip; nothing written.
    Skipped(EnumSkipReason),
    /// Writing stopped part way; `artifacts` lists what did get written.
    Failed {
        /// Files written before the failure.
        artifacts: SpecOutputArtifacts,
        /// Failure text.
        error: String,
    },
}

impl EnumStoreOutcome {
    /// Whether the store produced at least one artifact.
    pub fn produced_artifacts(&self) -> bool {
        match self {
            Self::Written(artifacts) | Self::Failed { artifacts, .. } => !artifacts.is_empty(),
            Self::Skipped(_) => false,
        }
    }
}

/// One store-level failure kept in the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecStoreError {
    /// Store name.
    pub store: String,
    /// Failure text.
    pub exception: String,
}

/// Batch run state machine.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumRunState {
    /// Nothing started.
    #[default]
    Idle,
    /// Reading store list and allocation table.
    LoadingInputs,
    /// Processing store `index` (1-based) of `total`.
    ProcessingStores {
        /// 1-based store position.
        index: usize,
        /// Deduplicated store count.
        total: usize,
    },
    /// Run finished.
    Completed {
        /// Stores that produced at least one artifact.
        stores_written: usize,
    },
    /// Run aborted on an input error.
    Failed {
        /// Failure text.
        cause: String,
    },
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Split failures. Only [`SplitError::InputUnavailable`] ends a run.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    /// Table, store list or output directory cannot be obtained.
    #[error("{what} unavailable: {message}")]
    InputUnavailable {
        /// Which input.
        what: String,
        /// Underlying error text.
        message: String,
    },
    /// Sheet hint did not resolve; a fallback sheet was used.
    #[error("Sheet {hint:?} not found; loaded {used:?} instead")]
    SheetResolution {
        /// Requested sheet.
        hint: String,
        /// Sheet actually loaded.
        used: String,
    },
    /// Store, code or season column missing.
    #[error("{0}")]
    ColumnNotFound(String),
    /// Store column found but no row carries a quantity.
    #[error("Store {store:?} found in column {column:?}, but no data available")]
    EmptyExtract {
        /// Store name.
        store: String,
        /// Resolved column.
        column: String,
    },
    /// One quantity cell is not a number.
    #[error("Could not convert quantity {value:?} to integer for code {code}")]
    RowQuantityUnparseable {
        /// Formatted code of the row.
        code: String,
        /// Raw quantity text.
        value: String,
    },
    /// One store's output could not be written.
    #[error("Failed to write {}: {message}", path.display())]
    ArtifactWrite {
        /// Target path.
        path: PathBuf,
        /// Underlying error text.
        message: String,
    },
    /// Table operation failed.
    #[error("table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),
}

impl SplitError {
    /// Whether this error ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InputUnavailable { .. })
    }

    pub(crate) fn input_unavailable(what: &str, message: impl ToString) -> Self {
        Self::InputUnavailable {
            what: what.to_string(),
            message: message.to_string(),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
