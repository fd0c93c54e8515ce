//! Season grouping and season-derived names.

use std::collections::{BTreeMap, BTreeSet};

use allocsplit_io_xlsx::{derive_cell_value_from_any_value, format_cell_text, sanitize_sheet_name};
use polars::prelude::{BooleanChunked, NewChunkedArray};
use tracing::debug;

use crate::spec::{SpecSeasonGroup, SpecSeasonPartition, SpecStoreExtract, SplitError};

/// Group extract rows by season string form, in first-seen row order.
///
/// Rows whose season is null join no group. Colliding file fragments get a
/// `__2`, `__3`, ... suffix and a warning.
pub fn partition_by_season(extract: &SpecStoreExtract) -> Result<SpecSeasonPartition, SplitError> {
    let df = &extract.df;
    let col_season = df.column(&extract.season_column)?;

    let mut l_seasons: Vec<String> = Vec::new();
    let mut dict_rows: BTreeMap<String, Vec<bool>> = BTreeMap::new();
    let mut n_rows_without_season = 0usize;
    let n_rows = df.height();

    for n_idx_row in 0..n_rows {
        let value = derive_cell_value_from_any_value(col_season.get(n_idx_row)?);
        if value.is_none() {
            n_rows_without_season += 1;
            continue;
        }
        let c_season = format_cell_text(&value);
        let l_mask = dict_rows.entry(c_season.clone()).or_insert_with(|| {
            l_seasons.push(c_season.clone());
            vec![false; n_rows]
        });
        l_mask[n_idx_row] = true;
    }

    let mut partition = SpecSeasonPartition {
        n_rows_without_season,
        ..Default::default()
    };
    let mut set_fragments_used: BTreeSet<String> = BTreeSet::new();

    for c_season in l_seasons {
        let Some(l_mask) = dict_rows.get(&c_season) else {
            continue;
        };
        let mask =
            BooleanChunked::from_slice(extract.season_column.as_str().into(), l_mask.as_slice());
        let df_group = df.filter(&mask)?;

        let c_fragment_base = derive_season_file_fragment(&c_season);
        let c_fragment = derive_unique_fragment(&c_fragment_base, &set_fragments_used);
        if c_fragment != c_fragment_base {
            partition.warnings.push(format!(
                "Season {c_season:?} file name {c_fragment_base:?} already used; writing as {c_fragment:?}"
            ));
        }
        set_fragments_used.insert(c_fragment.clone());

        debug!(season = %c_season, n_rows = df_group.height(), "season group");
        partition.groups.push(SpecSeasonGroup {
            sheet_name: derive_season_sheet_name(&c_season),
            file_fragment: c_fragment,
            season: c_season,
            df: df_group,
        });
    }

    Ok(partition)
}

/// Sheet name for a season: truncated to 31 characters, then illegal
/// characters replaced by `_`.
pub fn derive_season_sheet_name(season: &str) -> String {
    sanitize_sheet_name(season, "_")
}

/// File-name fragment for a season: spaces and `.` replaced by `_`.
///
/// Path separators are replaced as well so the fragment stays one file name.
pub fn derive_season_file_fragment(season: &str) -> String {
    season.replace([' ', '.', '/', '\\'], "_")
}

fn derive_unique_fragment(base: &str, used: &BTreeSet<String>) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    let mut n_suffix = 2usize;
    loop {
        let c_candidate = format!("{base}__{n_suffix}");
        if !used.contains(&c_candidate) {
            return c_candidate;
        }
        n_suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, DataFrame, NamedFrom, Series};

    use super::*;

    fn extract_from(seasons: Vec<Option<&str>>) -> SpecStoreExtract {
        let n_rows = seasons.len();
        let df = DataFrame::new(vec![
            Column::from(Series::new(
                "EANCode".into(),
                (0..n_rows as i64).collect::<Vec<_>>(),
            )),
            Column::from(Series::new("SEASON".into(), seasons)),
            Column::from(Series::new("StoreA".into(), vec![1i64; n_rows])),
        ])
        .expect("df");
        SpecStoreExtract {
            store_name: "StoreA".to_string(),
            code_column: "EANCode".to_string(),
            season_column: "SEASON".to_string(),
            store_column: "StoreA".to_string(),
            df,
        }
    }

    #[test]
    fn test_partition_keeps_first_seen_order() {
        let extract = extract_from(vec![
            Some("Summer"),
            Some("Spring"),
            None,
            Some("Summer"),
            Some("Autumn"),
        ]);
        let partition = partition_by_season(&extract).expect("partition");
        let l_seasons: Vec<&str> = partition.groups.iter().map(|g| g.season.as_str()).collect();
        assert_eq!(l_seasons, vec!["Summer", "Spring", "Autumn"]);
        assert_eq!(partition.groups[0].df.height(), 2);
        assert_eq!(partition.n_rows_without_season, 1);
        assert!(partition.warnings.is_empty());
    }

    #[test]
    fn test_partition_numeric_season_string_form() {
        let df = DataFrame::new(vec![
            Column::from(Series::new("EANCode".into(), vec![1i64, 2])),
            Column::from(Series::new("SEASON".into(), vec![2024.0f64, 2024.5])),
            Column::from(Series::new("StoreA".into(), vec![1i64, 1])),
        ])
        .expect("df");
        let extract = SpecStoreExtract {
            store_name: "StoreA".to_string(),
            code_column: "EANCode".to_string(),
            season_column: "SEASON".to_string(),
            store_column: "StoreA".to_string(),
            df,
        };
        let partition = partition_by_season(&extract).expect("partition");
        assert_eq!(partition.groups[0].season, "2024");
        assert_eq!(partition.groups[1].season, "2024.5");
        assert_eq!(partition.groups[1].file_fragment, "2024_5");
    }

    #[test]
    fn test_sheet_name_truncates_before_replacing() {
        assert_eq!(derive_season_sheet_name("Fall/Winter"), "Fall_Winter");
        let c_long = format!("{}[x]", "a".repeat(30));
        // Position 31 is '[' and survives as '_'; the rest is cut.
        assert_eq!(derive_season_sheet_name(&c_long), format!("{}_", "a".repeat(30)));
        assert_eq!(derive_season_sheet_name(""), "Sheet");
        assert_eq!(
            derive_season_sheet_name("Spring 2024"),
            derive_season_sheet_name("Spring 2024")
        );
    }

    #[test]
    fn test_file_fragment_rules() {
        assert_eq!(derive_season_file_fragment("Spring Summer.24"), "Spring_Summer_24");
        assert_eq!(derive_season_file_fragment("Fall/Winter"), "Fall_Winter");
        assert_eq!(derive_season_file_fragment(r"A\B:C"), "A_B:C");
        assert_eq!(derive_season_file_fragment(&"x".repeat(40)), "x".repeat(40));
    }

    #[test]
    fn test_partition_fragment_collision_gets_suffix() {
        let extract = extract_from(vec![Some("SS 24"), Some("SS.24"), Some("SS_24")]);
        let partition = partition_by_season(&extract).expect("partition");
        let l_fragments: Vec<&str> = partition
            .groups
            .iter()
            .map(|g| g.file_fragment.as_str())
            .collect();
        assert_eq!(l_fragments, vec!["SS_24", "SS_24__2", "SS_24__3"]);
        assert_eq!(partition.warnings.len(), 2);
    }
}
