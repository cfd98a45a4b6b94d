use serde::{Deserialize, Serialize};

use super::tab::{TabDescriptor, TabRecord};

/// An author action against the tab list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TabAction {
    /// Add a page; `at_index` of `None` appends it at the end.
    Add {
        descriptor: TabDescriptor,
        at_index: Option<usize>,
    },
    Remove {
        tab_id: String,
    },
    Move {
        tab_id: String,
        to_index: usize,
    },
    ToggleVisibility {
        tab_id: String,
    },
}

impl TabAction {
    /// The tab the action targets.
    pub fn tab_id(&self) -> &str {
        match self {
            TabAction::Add { descriptor, .. } => &descriptor.tab_id,
            TabAction::Remove { tab_id }
            | TabAction::Move { tab_id, .. }
            | TabAction::ToggleVisibility { tab_id } => tab_id,
        }
    }
}

/// What a single applied action changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TabChange {
    Created { tab_id: String, index: usize },
    Removed { tab_id: String },
    Reordered { tab_id: String, from: usize, to: usize },
    VisibilityChanged { tab_id: String, is_hidden: bool },
}

/// A change together with the full order that results from it.
///
/// The handler replaces the whole stored order with `order`; `removed` names
/// the tabs this change deleted so the handler does not keep them around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabDelta {
    pub change: TabChange,
    pub order: Vec<TabRecord>,
    pub removed: Vec<String>,
}

impl TabDelta {
    pub fn order_ids(&self) -> Vec<&str> {
        self.order.iter().map(|t| t.tab_id.as_str()).collect()
    }
}

/// One entry of a reorder request: a tab named by `tab_id` or `tab_locator`,
/// optionally with the fields needed to create it and its hidden flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TabOrderEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_locator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_movable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hideable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_hidden: Option<bool>,
}

impl TabOrderEntry {
    /// Text used in "does not exist" messages.
    pub fn describe(&self) -> String {
        match (&self.tab_id, &self.tab_locator) {
            (Some(id), _) => format!("{{\"tab_id\": \"{}\"}}", id),
            (None, Some(loc)) => format!("{{\"tab_locator\": \"{}\"}}", loc),
            (None, None) => "{}".to_string(),
        }
    }
}

impl From<&TabRecord> for TabOrderEntry {
    fn from(tab: &TabRecord) -> Self {
        Self {
            tab_id: Some(tab.tab_id.clone()),
            tab_locator: tab.locator.clone(),
            name: Some(tab.name.clone()),
            is_movable: Some(tab.is_movable),
            is_hideable: Some(tab.is_hideable),
            is_hidden: Some(tab.is_hidden),
        }
    }
}

/// Body of a persistence call: the full order plus tabs deleted by the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TabOrderRequest {
    pub tabs: Vec<TabOrderEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed: Vec<String>,
}

impl From<&TabDelta> for TabOrderRequest {
    fn from(delta: &TabDelta) -> Self {
        Self {
            tabs: delta.order.iter().map(TabOrderEntry::from).collect(),
            removed: delta.removed.clone(),
        }
    }
}
