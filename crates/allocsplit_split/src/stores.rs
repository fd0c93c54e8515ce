//! Store-list loader: single-column CSV, one store name per record.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use crate::spec::SplitError;

/// Read store names from the CSV file at `path`.
///
/// Blank records are dropped and exact duplicates collapse onto their first
/// occurrence. An unreadable file or a list with no names is
/// [`SplitError::InputUnavailable`].
pub fn load_store_names(path: &Path, if_has_header: bool) -> Result<Vec<String>, SplitError> {
    let file = File::open(path)
        .map_err(|err| SplitError::input_unavailable("Store list", format!("{}: {err}", path.display())))?;
    let l_names = read_store_names(file, if_has_header)
        .map_err(|err| SplitError::input_unavailable("Store list", format!("{}: {err}", path.display())))?;
    if l_names.is_empty() {
        return Err(SplitError::input_unavailable(
            "Store list",
            format!("{} contains no store names", path.display()),
        ));
    }
    debug!(path = %path.display(), n_stores = l_names.len(), "store list loaded");
    Ok(l_names)
}

/// Parse store names from CSV text; only the first field of each record counts.
pub fn read_store_names<R: Read>(reader: R, if_has_header: bool) -> Result<Vec<String>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(if_has_header)
        .flexible(true)
        .from_reader(reader);

    let mut l_raw: Vec<String> = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(c_field) = record.get(0) {
            l_raw.push(c_field.to_string());
        }
    }
    Ok(dedup_store_names(l_raw))
}

/// Drop blank names and repeated names, keeping first-occurrence order.
pub fn dedup_store_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut set_seen: BTreeSet<String> = BTreeSet::new();
    names
        .into_iter()
        .filter_map(|name| {
            let c_name = name.as_ref();
            if c_name.trim().is_empty() || !set_seen.insert(c_name.to_string()) {
                None
            } else {
                Some(c_name.to_string())
            }
        })
        .collect()
}
