//! Split report models and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;

use crate::spec::{EnumSkipReason, EnumStoreOutcome, SpecStoreError};

/// Aggregate counters and diagnostics for one split run.
#[derive(Debug, Default, Clone)]
pub struct ReportSplit {
    /// Store records read, before deduplication.
    pub cnt_requested: u64,
    /// Unique stores processed.
    pub cnt_stores: u64,
    /// Stores that produced at least one artifact.
    pub cnt_written: u64,
    /// Stores skipped (not found, identifiers missing, empty extract).
    pub cnt_skipped: u64,
    /// Text files plus workbooks written.
    pub cnt_files: u64,
    /// Code lines written across all text files.
    pub cnt_lines: u64,
    /// Rows skipped for an unparseable quantity.
    pub cnt_rows_unparseable: u64,
    /// Outcome per store, in processing order.
    pub outcomes: Vec<(String, EnumStoreOutcome)>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
    /// Per-store failures.
    pub errors: Vec<SpecStoreError>,
}

impl ReportSplit {
    /// Number of collected store errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Stores skipped for `reason`.
    pub fn skipped_for(&self, reason: EnumSkipReason) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter_map(|(store, outcome)| match outcome {
                EnumStoreOutcome::Skipped(r) if *r == reason => Some(store.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_requested".to_string(), self.cnt_requested);
        dict_counts.insert("cnt_stores".to_string(), self.cnt_stores);
        dict_counts.insert("cnt_written".to_string(), self.cnt_written);
        dict_counts.insert("cnt_skipped".to_string(), self.cnt_skipped);
        dict_counts.insert("cnt_files".to_string(), self.cnt_files);
        dict_counts.insert("cnt_lines".to_string(), self.cnt_lines);
        dict_counts.insert("cnt_rows_unparseable".to_string(), self.cnt_rows_unparseable);
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} stores={} written={} skipped={} files={} lines={} errors={} warnings={}",
            dict_counts["cnt_stores"],
            dict_counts["cnt_written"],
            dict_counts["cnt_skipped"],
            dict_counts["cnt_files"],
            dict_counts["cnt_lines"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[SPLIT]"))
    }
}

/// Mutable accumulator for split statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportSplitBuilder {
    /// See [`ReportSplit::cnt_requested`].
    pub cnt_requested: u64,
    /// See [`ReportSplit::outcomes`].
    pub outcomes: Vec<(String, EnumStoreOutcome)>,
    /// See [`ReportSplit::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportSplit::errors`].
    pub errors: Vec<SpecStoreError>,
}

impl ReportSplitBuilder {
    /// Record the outcome of one store.
    pub fn add_outcome(&mut self, store: &str, outcome: EnumStoreOutcome) {
        if let EnumStoreOutcome::Failed { error, .. } = &outcome {
            self.add_error(store, error.clone());
        }
        self.outcomes.push((store.to_string(), outcome));
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one store-scoped error.
    pub fn add_error(&mut self, store: &str, exception: String) {
        self.errors.push(SpecStoreError {
            store: store.to_string(),
            exception,
        });
    }

    /// Stores with at least one artifact so far.
    pub fn stores_written(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.produced_artifacts())
            .count()
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportSplit {
        let mut report = ReportSplit {
            cnt_requested: self.cnt_requested,
            cnt_stores: self.outcomes.len() as u64,
            ..Default::default()
        };
        for (_, outcome) in &self.outcomes {
            if outcome.produced_artifacts() {
                report.cnt_written += 1;
            }
            match outcome {
                EnumStoreOutcome::Skipped(_) => report.cnt_skipped += 1,
                EnumStoreOutcome::Written(artifacts) | EnumStoreOutcome::Failed { artifacts, .. } => {
                    report.cnt_files +=
                        (artifacts.text_files.len() + usize::from(artifacts.workbook.is_some())) as u64;
                    report.cnt_lines += artifacts.n_lines;
                    report.cnt_rows_unparseable += artifacts.n_rows_unparseable as u64;
                }
            }
        }
        report.outcomes = self.outcomes;
        report.warnings = self.warnings;
        report.errors = self.errors;
        report
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::spec::SpecOutputArtifacts;

    #[test]
    fn test_report_split_counts_and_format() {
        let mut builder = ReportSplitBuilder {
            cnt_requested: 4,
            ..Default::default()
        };
        builder.add_outcome(
            "StoreA",
            EnumStoreOutcome::Written(SpecOutputArtifacts {
                workbook: Some(PathBuf::from("StoreA.xlsx")),
                text_files: vec![PathBuf::from("StoreA-Spring.txt")],
                n_lines: 5,
                n_rows_unparseable: 1,
            }),
        );
        builder.add_outcome("StoreB", EnumStoreOutcome::Skipped(EnumSkipReason::StoreNotFound));
        builder.add_outcome(
            "StoreC",
            EnumStoreOutcome::Failed {
                artifacts: SpecOutputArtifacts::default(),
                error: "Permission denied".to_string(),
            },
        );
        builder.add_warning("Store 'StoreB' not found in xlsx column headers".to_string());
        assert_eq!(builder.stores_written(), 1);

        let report = builder.build();
        let dict_counts = report.to_dict();
        assert_eq!(dict_counts["cnt_stores"], 3);
        assert_eq!(dict_counts["cnt_written"], 1);
        assert_eq!(dict_counts["cnt_skipped"], 1);
        assert_eq!(dict_counts["cnt_files"], 2);
        assert_eq!(dict_counts["cnt_rows_unparseable"], 1);
        assert_eq!(dict_counts["cnt_errors"], 1);
        assert_eq!(report.skipped_for(EnumSkipReason::StoreNotFound), vec!["StoreB"]);

        let txt = report.format("[SPLIT]");
        assert_eq!(
            txt,
            "[SPLIT] stores=3 written=1 skipped=1 files=2 lines=5 errors=1 warnings=1"
        );
        assert_eq!(report.to_string(), txt);
    }
}
