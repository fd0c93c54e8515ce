//! Store batch processor: the per-store pipeline and run state machine.
//!
//! Store-level problems are reported through the sink and recorded in the
//! report; only input failures end a run.

use std::fs;
use std::path::Path;

use polars::prelude::DataFrame;
use tracing::debug;

use crate::conf::N_PCT_DONE;
use crate::expand::write_expanded_codes;
use crate::extract::build_store_extract;
use crate::layout::SpecColumnLayout;
use crate::report::{ReportSplit, ReportSplitBuilder};
use crate::season::partition_by_season;
use crate::sink::{EnumLogLevel, SplitEvent, SplitEventSink, emit_log, emit_progress};
use crate::spec::{
    EnumRunState, EnumSkipReason, EnumStoreOutcome, SpecOutputArtifacts, SpecSplitOptions,
    SplitError,
};
use crate::stores::dedup_store_names;
use crate::util::{derive_text_path, derive_workbook_path};
use crate::workbook::write_store_workbook;

/// Sequential processor over a deduplicated store list.
pub struct StoreBatchProcessor<'a> {
    options: SpecSplitOptions,
    sink: &'a dyn SplitEventSink,
    state: EnumRunState,
}

impl<'a> StoreBatchProcessor<'a> {
    pub fn new(options: SpecSplitOptions, sink: &'a dyn SplitEventSink) -> Self {
        Self {
            options,
            sink,
            state: EnumRunState::Idle,
        }
    }

    /// Current run state.
    pub fn state(&self) -> &EnumRunState {
        &self.state
    }

    /// Options in effect.
    pub fn options(&self) -> &SpecSplitOptions {
        &self.options
    }

    /// Enter `LoadingInputs` and report `pct`.
    pub fn begin_loading(&mut self, message: &str, pct: u8) {
        self.state = EnumRunState::LoadingInputs;
        emit_progress(self.sink, message, pct);
    }

    /// Log an informational line.
    pub fn info(&self, message: impl Into<String>) {
        emit_log(self.sink, EnumLogLevel::Info, message);
    }

    /// Enter `Failed`, reset progress to 0 and send the terminal event.
    pub fn fail(&mut self, err: &SplitError) {
        let c_cause = err.to_string();
        emit_log(self.sink, EnumLogLevel::Error, c_cause.clone());
        emit_progress(self.sink, "Processing failed", 0);
        self.sink.event(SplitEvent::Finished {
            success: false,
            summary: c_cause.clone(),
        });
        self.state = EnumRunState::Failed { cause: c_cause };
    }

    /// Process every unique store of `stores` against `df`, writing into
    /// `dir_output` (created when absent).
    ///
    /// Returns `Err` only for input failures; the processor is then `Failed`.
    pub fn process_stores(
        &mut self,
        df: &DataFrame,
        stores: &[String],
        dir_output: &Path,
    ) -> Result<ReportSplit, SplitError> {
        let l_stores = dedup_store_names(stores);
        if l_stores.is_empty() {
            let err = SplitError::input_unavailable("Store list", "no store names to process");
            self.fail(&err);
            return Err(err);
        }
        if let Err(err) = fs::create_dir_all(dir_output) {
            let err = SplitError::input_unavailable(
                "Output directory",
                format!("{}: {err}", dir_output.display()),
            );
            self.fail(&err);
            return Err(err);
        }

        let l_columns: Vec<&str> = df.get_column_names_str();
        let layout = SpecColumnLayout::classify(
            &l_columns,
            &self.options.marker_code_column,
            &self.options.marker_season_column,
        );

        let n_total = l_stores.len();
        let mut builder = ReportSplitBuilder {
            cnt_requested: stores.len() as u64,
            ..Default::default()
        };
        self.info(format!("Processing {n_total} unique stores"));

        for (n_idx, c_store) in l_stores.iter().enumerate() {
            self.state = EnumRunState::ProcessingStores {
                index: n_idx + 1,
                total: n_total,
            };
            let outcome = self.process_store(df, &layout, c_store, dir_output, &mut builder);
            debug!(store = %c_store, ?outcome, "store processed");
            builder.add_outcome(c_store, outcome);

            emit_progress(
                self.sink,
                format!("Processed store {}/{n_total}: {c_store}", n_idx + 1),
                self.derive_store_pct(n_idx + 1, n_total),
            );
        }

        let n_written = builder.stores_written();
        let report = builder.build();
        self.state = EnumRunState::Completed {
            stores_written: n_written,
        };

        for (c_store, outcome) in &report.outcomes {
            if let EnumStoreOutcome::Skipped(reason) = outcome {
                self.info(format!("Skipped store '{c_store}': {reason:?}"));
            }
        }
        emit_progress(self.sink, "Processing complete", N_PCT_DONE);
        self.sink.event(SplitEvent::Finished {
            success: true,
            summary: report.to_string(),
        });
        Ok(report)
    }

    /// `start + (end - start) * processed / total`
    fn derive_store_pct(&self, processed: usize, total: usize) -> u8 {
        let n_start = u64::from(self.options.pct_stores_start);
        let n_end = u64::from(self.options.pct_stores_end).max(n_start);
        let n_pct = n_start + (n_end - n_start) * processed as u64 / total.max(1) as u64;
        u8::try_from(n_pct.min(u64::from(N_PCT_DONE))).unwrap_or(N_PCT_DONE)
    }

    fn warn(&self, builder: &mut ReportSplitBuilder, message: String) {
        emit_log(self.sink, EnumLogLevel::Warning, message.clone());
        builder.add_warning(message);
    }

    fn process_store(
        &self,
        df: &DataFrame,
        layout: &SpecColumnLayout,
        store: &str,
        dir_output: &Path,
        builder: &mut ReportSplitBuilder,
    ) -> EnumStoreOutcome {
        let Some(c_store_col) = layout.resolve_store_column(store) else {
            self.warn(
                builder,
                format!("Store '{store}' not found in xlsx column headers"),
            );
            return EnumStoreOutcome::Skipped(EnumSkipReason::StoreNotFound);
        };
        self.info(format!("Found column matching store '{store}': '{c_store_col}'"));

        let (Some(c_code_col), Some(c_season_col)) = (layout.code_column(), layout.season_column())
        else {
            self.warn(
                builder,
                format!(
                    "Could not find {} or {} columns for store '{store}'",
                    self.options.marker_code_column, self.options.marker_season_column
                ),
            );
            return EnumStoreOutcome::Skipped(EnumSkipReason::IdentifiersMissing);
        };

        let extract = match build_store_extract(df, store, c_store_col, c_code_col, c_season_col) {
            Ok(extract) => extract,
            Err(SplitError::EmptyExtract { .. }) => {
                self.warn(builder, format!("Store '{store}' found, but no data available"));
                return EnumStoreOutcome::Skipped(EnumSkipReason::EmptyExtract);
            }
            Err(err @ SplitError::ColumnNotFound(_)) => {
                self.warn(builder, err.to_string());
                return EnumStoreOutcome::Skipped(EnumSkipReason::StoreNotFound);
            }
            Err(err) => return self.derive_failed(store, SpecOutputArtifacts::default(), err),
        };

        let partition = match partition_by_season(&extract) {
            Ok(partition) => partition,
            Err(err) => return self.derive_failed(store, SpecOutputArtifacts::default(), err),
        };
        self.info(format!(
            "Found {} unique {} values for store {store}",
            partition.groups.len(),
            self.options.marker_season_column
        ));
        if partition.n_rows_without_season > 0 {
            self.warn(
                builder,
                format!(
                    "Store '{store}': {} rows without {} appear only in {}",
                    partition.n_rows_without_season,
                    self.options.marker_season_column,
                    self.options.sheet_name_all_rows
                ),
            );
        }
        for c_warning in &partition.warnings {
            self.warn(builder, format!("Store '{store}': {c_warning}"));
        }

        let mut artifacts = SpecOutputArtifacts::default();

        let path_workbook = derive_workbook_path(dir_output, store);
        match write_store_workbook(
            &path_workbook,
            &extract,
            &partition,
            &self.options.sheet_name_all_rows,
            &self.options.write_options,
        ) {
            Ok(report_workbook) => {
                for c_warning in report_workbook.warnings() {
                    self.warn(builder, format!("Store '{store}': {c_warning}"));
                }
                self.info(format!(
                    "Saved data for store {store} to {} with {} season sheets",
                    report_workbook.path.display(),
                    partition.groups.len()
                ));
                artifacts.workbook = Some(report_workbook.path);
            }
            Err(err) => return self.derive_failed(store, artifacts, err),
        }

        for group in &partition.groups {
            let path_text = derive_text_path(dir_output, store, &group.file_fragment);
            match write_expanded_codes(&path_text, &group.df, c_code_col, c_store_col) {
                Ok(report_expand) => {
                    for err in &report_expand.l_unparseable {
                        self.warn(builder, format!("{err} in {}", path_text.display()));
                    }
                    self.info(format!(
                        "Created {} with {} lines",
                        path_text.display(),
                        report_expand.n_lines
                    ));
                    artifacts.n_lines += report_expand.n_lines;
                    artifacts.n_rows_unparseable += report_expand.l_unparseable.len();
                    artifacts.text_files.push(path_text);
                }
                Err(err) => return self.derive_failed(store, artifacts, err),
            }
        }

        EnumStoreOutcome::Written(artifacts)
    }

    fn derive_failed(
        &self,
        store: &str,
        artifacts: SpecOutputArtifacts,
        err: SplitError,
    ) -> EnumStoreOutcome {
        let c_error = format!("Error processing store {store}: {err}");
        emit_log(self.sink, EnumLogLevel::Error, c_error.clone());
        EnumStoreOutcome::Failed {
            artifacts,
            error: c_error,
        }
    }
}
