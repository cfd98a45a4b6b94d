//! Placement rules between fixed tabs.
//!
//! Fixed tabs split the tab list into regions. The region of a position is the
//! number of fixed tabs in front of it, counted over the list with the tab
//! being placed left out.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::tab::TabRecord;

/// How far non-fixed tabs may travel relative to fixed tabs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    /// Moved tabs stay in their region; new tabs never go before the first fixed tab.
    #[default]
    Partitioned,
    /// Non-fixed tabs always follow every fixed tab.
    AfterAllFixed,
    /// Non-fixed tabs never precede the first fixed tab.
    NotBeforeFirstFixed,
}

/// Number of fixed tabs in front of `index`.
pub fn region_of(tabs: &[TabRecord], index: usize) -> usize {
    tabs[..index.min(tabs.len())]
        .iter()
        .filter(|t| t.is_fixed())
        .count()
}

fn fixed_count(tabs: &[TabRecord]) -> usize {
    tabs.iter().filter(|t| t.is_fixed()).count()
}

impl BoundaryPolicy {
    /// Whether a new tab may be inserted at `index` of `others`.
    pub fn permits_insert(&self, others: &[TabRecord], index: usize) -> bool {
        let fixed = fixed_count(others);
        let region = region_of(others, index);
        match self {
            BoundaryPolicy::Partitioned | BoundaryPolicy::NotBeforeFirstFixed => {
                fixed == 0 || region >= 1
            }
            BoundaryPolicy::AfterAllFixed => region == fixed,
        }
    }

    /// Whether a tab currently in `from_region` may be moved to `index` of `others`.
    pub fn permits_move(&self, others: &[TabRecord], from_region: usize, index: usize) -> bool {
        let region = region_of(others, index);
        match self {
            BoundaryPolicy::Partitioned => region == from_region,
            BoundaryPolicy::NotBeforeFirstFixed => fixed_count(others) == 0 || region >= 1,
            BoundaryPolicy::AfterAllFixed => region == fixed_count(others),
        }
    }

    /// Validates a complete replacement order against the stored one.
    ///
    /// Non-movable tabs must keep their relative order and ids must be unique.
    /// Movable tabs that changed region, and new tabs, must land where the
    /// policy allows.
    pub fn validate_order(&self, before: &[TabRecord], after: &[TabRecord]) -> Result<(), String> {
        let mut seen = HashSet::new();
        for tab in after {
            if !seen.insert(tab.tab_id.as_str()) {
                return Err(format!("duplicate tab id '{}'", tab.tab_id));
            }
        }

        let kept_before: Vec<&str> = before
            .iter()
            .filter(|t| !t.is_movable && seen.contains(t.tab_id.as_str()))
            .map(|t| t.tab_id.as_str())
            .collect();
        let kept_after: Vec<&str> = after
            .iter()
            .filter(|t| !t.is_movable)
            .map(|t| t.tab_id.as_str())
            .collect();
        if kept_before != kept_after {
            let moved = kept_after
                .iter()
                .zip(kept_before.iter())
                .find(|(a, b)| a != b)
                .map(|(a, _)| a.to_string())
                .or_else(|| kept_after.last().map(|s| s.to_string()))
                .unwrap_or_default();
            return Err(format!("tab '{}' cannot be reordered", moved));
        }

        let fixed = fixed_count(after);
        for (index, tab) in after.iter().enumerate() {
            if !tab.is_movable {
                continue;
            }
            let region = region_of(after, index);
            let allowed = match before.iter().position(|t| t.tab_id == tab.tab_id) {
                // A tab left in its region is accepted even if an older layout put it there.
                Some(old) if region == region_of(before, old) => true,
                Some(_) => match self {
                    BoundaryPolicy::Partitioned => false,
                    BoundaryPolicy::NotBeforeFirstFixed => fixed == 0 || region >= 1,
                    BoundaryPolicy::AfterAllFixed => region == fixed,
                },
                None => {
                    let mut others = after.to_vec();
                    others.remove(index);
                    self.permits_insert(&others, index)
                }
            };
            if !allowed {
                return Err(format!(
                    "tab '{}' may not be placed at position {}",
                    tab.tab_id, index
                ));
            }
        }
        Ok(())
    }
}
