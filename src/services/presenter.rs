//! View glue for the custom pages list.
//!
//! Reads snapshots only. Rows carry what the page needs to draw each tab and
//! which controls to offer; intents coming back from the page are turned into
//! controller actions here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::managers::reorder_controller::ControllerEvent;
use crate::types::delta::TabAction;
use crate::types::tab::{Classification, TabRecord, TabSnapshot};

/// Controls offered for one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affordances {
    pub drag_handle: bool,
    pub delete: bool,
    pub visibility_toggle: bool,
}

/// One rendered tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TabRow {
    pub ordinal: usize,
    pub tab_id: String,
    pub name: String,
    pub locator: Option<String>,
    pub classification: Classification,
    pub css_class: &'static str,
    pub is_hidden: bool,
    pub affordances: Affordances,
}

/// What the author did on the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserIntent {
    RequestMove { tab_id: String, to_index: usize },
    RequestRemove { tab_id: String },
    RequestAdd { descriptor: TabRecord, at_index: Option<usize> },
    RequestToggleVisibility { tab_id: String },
    /// Open the published course; nothing to edit.
    ViewLive,
}

pub struct TabListPresenter;

impl TabListPresenter {
    pub fn render(snapshot: &TabSnapshot) -> Vec<TabRow> {
        snapshot.ordinals().map(|(ordinal, tab)| Self::row(ordinal, tab)).collect()
    }

    fn row(ordinal: usize, tab: &TabRecord) -> TabRow {
        let classification = tab.classification();
        let fixed = classification == Classification::Fixed;
        TabRow {
            ordinal,
            tab_id: tab.tab_id.clone(),
            name: tab.name.clone(),
            locator: tab.locator.clone(),
            classification,
            css_class: classification.css_class(),
            is_hidden: tab.is_hidden,
            affordances: Affordances {
                drag_handle: tab.is_movable,
                delete: !fixed,
                visibility_toggle: tab.is_hideable,
            },
        }
    }

    pub fn intent_to_action(intent: UserIntent) -> Option<TabAction> {
        match intent {
            UserIntent::RequestMove { tab_id, to_index } => Some(TabAction::Move { tab_id, to_index }),
            UserIntent::RequestRemove { tab_id } => Some(TabAction::Remove { tab_id }),
            UserIntent::RequestAdd {
                descriptor,
                at_index,
            } => Some(TabAction::Add {
                descriptor,
                at_index,
            }),
            UserIntent::RequestToggleVisibility { tab_id } => {
                Some(TabAction::ToggleVisibility { tab_id })
            }
            UserIntent::ViewLive => None,
        }
    }

    /// Descriptor for the "Add New Page" button: a fresh static tab.
    pub fn new_page(locator: &str, name: &str) -> TabRecord {
        let tab_id = format!("static_tab_{}", Uuid::new_v4().simple());
        TabRecord::custom_page(&tab_id, locator, name)
    }

    /// Text to show the author for events that undid or refused a change.
    pub fn notice(event: &ControllerEvent) -> Option<String> {
        match event {
            ControllerEvent::RolledBack { error, .. } => {
                Some(format!("Your change could not be saved and was undone. {}", error))
            }
            ControllerEvent::ActionRejected { error, .. } => {
                Some(format!("That change is not allowed. {}", error))
            }
            ControllerEvent::Committed(_)
            | ControllerEvent::NextInFlight(_)
            | ControllerEvent::Discarded => None,
        }
    }
}
