//! Per-store extract: (code, season, quantity) restricted to present quantities.

use polars::prelude::DataFrame;
use tracing::debug;

use crate::spec::{SplitError, SpecStoreExtract};

/// Project `df` onto (code, season, store) and keep rows whose store cell is
/// non-null. An empty string is present; only null is missing.
///
/// Zero qualifying rows yields [`SplitError::EmptyExtract`]; a store column
/// that is also the code or season column yields [`SplitError::ColumnNotFound`].
pub fn build_store_extract(
    df: &DataFrame,
    store_name: &str,
    store_column: &str,
    code_column: &str,
    season_column: &str,
) -> Result<SpecStoreExtract, SplitError> {
    if store_column == code_column || store_column == season_column {
        return Err(SplitError::ColumnNotFound(format!(
            "Store '{store_name}' matched identifier column '{store_column}', not a quantity column"
        )));
    }
    let df_projected = df.select([code_column, season_column, store_column])?;
    let mask = df_projected
        .column(store_column)?
        .as_materialized_series()
        .is_not_null();
    let df_extract = df_projected.filter(&mask)?;

    debug!(
        store = store_name,
        column = store_column,
        n_rows = df_extract.height(),
        "store extract built"
    );

    if df_extract.height() == 0 {
        return Err(SplitError::EmptyExtract {
            store: store_name.to_string(),
            column: store_column.to_string(),
        });
    }

    Ok(SpecStoreExtract {
        store_name: store_name.to_string(),
        code_column: code_column.to_string(),
        season_column: season_column.to_string(),
        store_column: store_column.to_string(),
        df: df_extract,
    })
}
