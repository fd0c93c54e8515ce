//! Output path naming helpers.

use std::path::{Path, PathBuf};

use crate::conf::{C_EXT_TEXT, C_EXT_WORKBOOK};

/// File stem for a store: `/`, `\` and space replaced by `_`.
pub fn sanitize_store_file_stem(store_name: &str) -> String {
    store_name.replace(['/', '\\', ' '], "_")
}

/// `<dir>/<sanitized-store>.xlsx`
pub fn derive_workbook_path(dir_output: &Path, store_name: &str) -> PathBuf {
    dir_output.join(format!(
        "{}.{C_EXT_WORKBOOK}",
        sanitize_store_file_stem(store_name)
    ))
}

/// `<dir>/<sanitized-store>-<season-fragment>.txt`
pub fn derive_text_path(dir_output: &Path, store_name: &str, file_fragment: &str) -> PathBuf {
    dir_output.join(format!(
        "{}-{file_fragment}.{C_EXT_TEXT}",
        sanitize_store_file_stem(store_name)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_store_file_stem() {
        assert_eq!(sanitize_store_file_stem("Store D/Branch 1"), "Store_D_Branch_1");
        assert_eq!(sanitize_store_file_stem(r"A\B"), "A_B");
        assert_eq!(sanitize_store_file_stem("StoreA"), "StoreA");
    }

    #[test]
    fn test_derive_paths() {
        let dir = Path::new("out");
        assert_eq!(
            derive_workbook_path(dir, "Store D/Branch 1"),
            dir.join("Store_D_Branch_1.xlsx")
        );
        assert_eq!(
            derive_text_path(dir, "Store D/Branch 1", "Fall_Winter"),
            dir.join("Store_D_Branch_1-Fall_Winter.txt")
        );
    }
}
