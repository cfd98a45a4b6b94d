use serde::{Deserialize, Serialize};

/// One navigation tab of a course, as seeded by the hosting page and as
/// persisted by the handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TabRecord {
    pub tab_id: String,
    /// Opaque reference to the content object the tab exposes. Default tabs
    /// have none.
    #[serde(default)]
    pub locator: Option<String>,
    #[serde(default)]
    pub name: String,
    pub is_movable: bool,
    pub is_hideable: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

/// Wire and seed form of a tab.
pub type TabDescriptor = TabRecord;

/// Derived interaction class of a tab.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Fixed,
    Movable,
    Hideable,
}

impl Classification {
    /// Style hint used by the presenter.
    pub fn css_class(&self) -> &'static str {
        match self {
            Classification::Fixed => "is-fixed",
            Classification::Movable => "is-movable",
            Classification::Hideable => "is-hideable",
        }
    }
}

impl TabRecord {
    /// A default tab with no content object.
    pub fn fixed(tab_id: &str, name: &str) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            locator: None,
            name: name.to_string(),
            is_movable: false,
            is_hideable: false,
            is_hidden: false,
        }
    }

    /// An author-created page: movable and hideable.
    pub fn custom_page(tab_id: &str, locator: &str, name: &str) -> Self {
        Self {
            tab_id: tab_id.to_string(),
            locator: Some(locator.to_string()),
            name: name.to_string(),
            is_movable: true,
            is_hideable: true,
            is_hidden: false,
        }
    }

    pub fn classification(&self) -> Classification {
        if self.is_movable {
            Classification::Movable
        } else if self.is_hideable {
            Classification::Hideable
        } else {
            Classification::Fixed
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.classification() == Classification::Fixed
    }

    /// True if this record is identified by the given tab id or locator.
    pub fn matches(&self, tab_id: Option<&str>, locator: Option<&str>) -> bool {
        match (tab_id, locator) {
            (Some(id), _) => self.tab_id == id,
            (None, Some(loc)) => self.locator.as_deref() == Some(loc),
            (None, None) => false,
        }
    }
}

/// Immutable ordered view of a tab collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TabSnapshot {
    tabs: Vec<TabRecord>,
}

impl TabSnapshot {
    pub fn new(tabs: Vec<TabRecord>) -> Self {
        Self { tabs }
    }

    pub fn tabs(&self) -> &[TabRecord] {
        &self.tabs
    }

    /// Records paired with their zero-based ordinal position.
    pub fn ordinals(&self) -> impl Iterator<Item = (usize, &TabRecord)> {
        self.tabs.iter().enumerate()
    }

    pub fn tab_ids(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.tab_id.as_str()).collect()
    }

    pub fn get(&self, tab_id: &str) -> Option<&TabRecord> {
        self.tabs.iter().find(|t| t.tab_id == tab_id)
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn into_tabs(self) -> Vec<TabRecord> {
        self.tabs
    }
}
