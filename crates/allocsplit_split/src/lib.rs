//! Allocation-table splitting engine.
//!
//! Turns a wide allocation table (one row per product/season, one column per
//! store) into per-store workbooks and per-(store, season) text files that
//! repeat each product code once per ordered unit.

pub mod batch;
pub mod conf;
pub mod expand;
pub mod extract;
pub mod layout;
pub mod report;
pub mod run;
pub mod season;
pub mod sink;
pub mod spec;
pub mod stores;
pub mod util;
pub mod workbook;

pub use batch::StoreBatchProcessor;
pub use conf::{
    C_MARKER_CODE_COLUMN, C_MARKER_SEASON_COLUMN, C_SHEET_HINT_DEFAULT, C_SHEET_NAME_ALL_SEASONS,
    derive_default_split_options,
};
pub use expand::{EnumQuantity, format_code, parse_quantity, write_expanded_codes};
pub use extract::build_store_extract;
pub use layout::SpecColumnLayout;
pub use report::{ReportSplit, ReportSplitBuilder};
pub use run::{EnumTableSource, SpecSplitRequest, discover_source_table, run_allocation_split};
pub use season::{derive_season_file_fragment, derive_season_sheet_name, partition_by_season};
pub use sink::{CollectingEventSink, EnumLogLevel, SplitEvent, SplitEventSink, TracingEventSink};
pub use spec::{
    EnumColumnRole, EnumRunState, EnumSkipReason, EnumStoreOutcome, SpecOutputArtifacts,
    SpecSeasonGroup, SpecSeasonPartition, SpecSplitOptions, SpecStoreError, SpecStoreExtract,
    SplitError,
};
pub use stores::{dedup_store_names, load_store_names, read_store_names};
pub use util::sanitize_store_file_stem;
pub use workbook::write_store_workbook;
