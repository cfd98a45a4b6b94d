use std::collections::HashSet;

use crate::types::errors::TabError;
use crate::types::policy::{region_of, BoundaryPolicy};
use crate::types::tab::{TabDescriptor, TabRecord, TabSnapshot};

/// Trait defining the tab collection interface.
pub trait TabCollectionTrait {
    fn insert(&mut self, record: TabRecord, at_index: usize) -> Result<TabSnapshot, TabError>;
    fn remove(&mut self, tab_id: &str) -> Result<TabSnapshot, TabError>;
    fn move_tab(&mut self, tab_id: &str, to_index: usize) -> Result<TabSnapshot, TabError>;
    fn toggle_visibility(&mut self, tab_id: &str) -> Result<TabSnapshot, TabError>;
    fn snapshot(&self) -> TabSnapshot;
    fn get(&self, tab_id: &str) -> Option<&TabRecord>;
    fn position(&self, tab_id: &str) -> Option<usize>;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool;
    fn records(&self) -> &[TabRecord];
}

/// Ordered in-memory tab list for one editing session.
///
/// Every operation either succeeds completely or returns an error with the
/// list untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct TabCollection {
    tabs: Vec<TabRecord>,
    policy: BoundaryPolicy,
}

impl TabCollection {
    pub fn new(policy: BoundaryPolicy) -> Self {
        Self {
            tabs: Vec::new(),
            policy,
        }
    }

    /// Seeds a collection from the server-provided order.
    pub fn from_descriptors(
        descriptors: Vec<TabDescriptor>,
        policy: BoundaryPolicy,
    ) -> Result<Self, TabError> {
        let mut seen = HashSet::new();
        for d in &descriptors {
            if !seen.insert(d.tab_id.as_str()) {
                return Err(TabError::DuplicateId(d.tab_id.clone()));
            }
        }
        Ok(Self {
            tabs: descriptors,
            policy,
        })
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    fn find_index(&self, tab_id: &str) -> Result<usize, TabError> {
        self.tabs
            .iter()
            .position(|t| t.tab_id == tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))
    }
}

impl TabCollectionTrait for TabCollection {
    /// Insert a new movable page, shifting later tabs right.
    fn insert(&mut self, record: TabRecord, at_index: usize) -> Result<TabSnapshot, TabError> {
        if self.tabs.iter().any(|t| t.tab_id == record.tab_id) {
            return Err(TabError::DuplicateId(record.tab_id));
        }
        // The handler only creates movable pages with a locator.
        if !record.is_movable {
            return Err(TabError::NotMovable(record.tab_id));
        }
        if record.locator.is_none() {
            return Err(TabError::MissingLocator(record.tab_id));
        }
        if at_index > self.tabs.len() || !self.policy.permits_insert(&self.tabs, at_index) {
            return Err(TabError::InvalidPosition {
                tab_id: record.tab_id,
                index: at_index,
            });
        }

        self.tabs.insert(at_index, record);
        Ok(self.snapshot())
    }

    /// Remove a non-fixed tab and compact the ordinals behind it.
    fn remove(&mut self, tab_id: &str) -> Result<TabSnapshot, TabError> {
        let index = self.find_index(tab_id)?;
        if self.tabs[index].is_fixed() {
            return Err(TabError::NotRemovable(tab_id.to_string()));
        }

        self.tabs.remove(index);
        Ok(self.snapshot())
    }

    /// Move a movable tab so that it ends up at `to_index`.
    fn move_tab(&mut self, tab_id: &str, to_index: usize) -> Result<TabSnapshot, TabError> {
        let index = self.find_index(tab_id)?;
        if !self.tabs[index].is_movable {
            return Err(TabError::NotMovable(tab_id.to_string()));
        }
        let invalid = || TabError::InvalidPosition {
            tab_id: tab_id.to_string(),
            index: to_index,
        };
        if to_index >= self.tabs.len() {
            return Err(invalid());
        }

        let from_region = region_of(&self.tabs, index);
        let record = self.tabs.remove(index);
        if !self.policy.permits_move(&self.tabs, from_region, to_index) {
            self.tabs.insert(index, record);
            return Err(invalid());
        }

        self.tabs.insert(to_index, record);
        Ok(self.snapshot())
    }

    /// Flip the hidden flag of a hideable tab without moving it.
    fn toggle_visibility(&mut self, tab_id: &str) -> Result<TabSnapshot, TabError> {
        let index = self.find_index(tab_id)?;
        let tab = &mut self.tabs[index];
        if !tab.is_hideable {
            return Err(TabError::NotHideable(tab_id.to_string()));
        }

        tab.is_hidden = !tab.is_hidden;
        Ok(self.snapshot())
    }

    fn snapshot(&self) -> TabSnapshot {
        TabSnapshot::new(self.tabs.clone())
    }

    fn get(&self, tab_id: &str) -> Option<&TabRecord> {
        self.tabs.iter().find(|t| t.tab_id == tab_id)
    }

    fn position(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.tab_id == tab_id)
    }

    fn len(&self) -> usize {
        self.tabs.len()
    }

    fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn records(&self) -> &[TabRecord] {
        &self.tabs
    }
}
