//! Column classification for one allocation table.

use allocsplit_io_xlsx::util::C_UNNAMED_COLUMN_PREFIX;
use tracing::debug;

use crate::spec::EnumColumnRole;

/// Tagged role per column, computed once per table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecColumnLayout {
    l_roles: Vec<EnumColumnRole>,
}

impl SpecColumnLayout {
    /// Classify `columns` (in table order).
    ///
    /// The first column containing `marker_code` is the code column; the first
    /// remaining column containing `marker_season` is the season column.
    /// Auto-named blank headers are unclassified; everything else is a store
    /// candidate.
    pub fn classify<S: AsRef<str>>(columns: &[S], marker_code: &str, marker_season: &str) -> Self {
        let mut if_code_found = false;
        let mut if_season_found = false;

        let l_roles = columns
            .iter()
            .map(|col| {
                let c_name = col.as_ref().to_string();
                if !if_code_found && c_name.contains(marker_code) {
                    if_code_found = true;
                    EnumColumnRole::Code(c_name)
                } else if !if_season_found && c_name.contains(marker_season) {
                    if_season_found = true;
                    EnumColumnRole::Season(c_name)
                } else if is_auto_named(&c_name) {
                    EnumColumnRole::Unclassified(c_name)
                } else {
                    EnumColumnRole::Store(c_name)
                }
            })
            .collect::<Vec<_>>();

        debug!(roles = ?l_roles, "columns classified");
        Self { l_roles }
    }

    /// Roles in column order.
    pub fn roles(&self) -> &[EnumColumnRole] {
        &self.l_roles
    }

    /// Code column name, when present.
    pub fn code_column(&self) -> Option<&str> {
        self.l_roles.iter().find_map(|role| match role {
            EnumColumnRole::Code(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Season column name, when present.
    pub fn season_column(&self) -> Option<&str> {
        self.l_roles.iter().find_map(|role| match role {
            EnumColumnRole::Season(name) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Every column name in table order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.l_roles.iter().map(EnumColumnRole::column_name)
    }

    /// Resolve the quantity column of `store_name`.
    ///
    /// Exact match over all columns wins; otherwise the first column, in table
    /// order, whose name contains `store_name`. Identifier columns are not
    /// excluded. A blank store name never resolves.
    pub fn resolve_store_column(&self, store_name: &str) -> Option<&str> {
        if store_name.trim().is_empty() {
            return None;
        }
        self.columns()
            .find(|name| *name == store_name)
            .or_else(|| self.columns().find(|name| name.contains(store_name)))
    }
}

fn is_auto_named(name: &str) -> bool {
    name.strip_prefix(C_UNNAMED_COLUMN_PREFIX)
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
}
