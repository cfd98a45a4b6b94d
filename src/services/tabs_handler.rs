//! Authoritative course tabs handler.
//!
//! Stores each course's full tab list in SQLite and applies order updates sent
//! by editing sessions. An update replaces the whole order; applying the same
//! request twice leaves the same stored state.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::database::connection::Database;
use crate::types::course::CourseKey;
use crate::types::delta::TabOrderEntry;
use crate::types::errors::StoreError;
use crate::types::policy::BoundaryPolicy;
use crate::types::tab::TabRecord;

/// Tab type of author-created pages.
pub const STATIC_TAB_TYPE: &str = "static_tab";

const PRIMITIVE_COMMAND_USER: &str = "primitive_command";

/// A stored tab: the record plus the kind of page it is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTab {
    #[serde(flatten)]
    pub record: TabRecord,
    pub tab_type: String,
}

impl StoredTab {
    pub fn new(tab_type: &str, record: TabRecord) -> Self {
        Self {
            record,
            tab_type: tab_type.to_string(),
        }
    }

    pub fn is_static(&self) -> bool {
        self.tab_type == STATIC_TAB_TYPE
    }

    /// A static tab created from a reorder entry naming a page the store does
    /// not know yet. Needs both an id and a locator, and must be movable.
    fn from_new_entry(entry: &TabOrderEntry) -> Option<Self> {
        let tab_id = entry.tab_id.as_ref()?;
        let locator = entry.tab_locator.as_ref()?;
        if entry.is_movable == Some(false) {
            return None;
        }
        Some(Self::new(
            STATIC_TAB_TYPE,
            TabRecord {
                tab_id: tab_id.clone(),
                locator: Some(locator.clone()),
                name: entry.name.clone().unwrap_or_default(),
                is_movable: true,
                is_hideable: entry.is_hideable.unwrap_or(true),
                is_hidden: entry.is_hidden.unwrap_or(false),
            },
        ))
    }
}

/// Trait defining the tabs handler interface.
pub trait TabsHandlerTrait {
    fn create_course(&mut self, course_key: &CourseKey, tabs: &[StoredTab]) -> Result<(), StoreError>;
    fn grant_author(&mut self, course_key: &CourseKey, user: &str) -> Result<(), StoreError>;
    fn has_author_access(&self, course_key: &CourseKey, user: &str) -> Result<bool, StoreError>;
    fn load_tabs(&self, course_key: &CourseKey) -> Result<Vec<TabRecord>, StoreError>;
    fn static_tabs(&self, course_key: &CourseKey) -> Result<Vec<TabRecord>, StoreError>;
    fn update_tabs(&mut self, course_key: &CourseKey, user: &str, request: &Value) -> Result<(), StoreError>;
    fn primitive_insert(&mut self, course_key: &CourseKey, num: usize, tab_type: &str, name: &str) -> Result<(), StoreError>;
    fn primitive_delete(&mut self, course_key: &CourseKey, num: usize) -> Result<(), StoreError>;
}

/// SQLite-backed tabs handler.
pub struct TabsHandler {
    db: Database,
    policy: BoundaryPolicy,
}

impl TabsHandler {
    pub fn new(db: Database, policy: BoundaryPolicy) -> Self {
        Self { db, policy }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn policy(&self) -> BoundaryPolicy {
        self.policy
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    /// Who last changed the course's tabs.
    pub fn last_updated_by(&self, course_key: &CourseKey) -> Result<Option<String>, StoreError> {
        self.require_course(course_key)?;
        self.db
            .connection()
            .query_row(
                "SELECT updated_by FROM courses WHERE course_key = ?1",
                params![course_key.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    fn require_course(&self, course_key: &CourseKey) -> Result<(), StoreError> {
        let count: i64 = self
            .db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM courses WHERE course_key = ?1",
                params![course_key.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        if count == 0 {
            return Err(StoreError::CourseNotFound(course_key.to_string()));
        }
        Ok(())
    }

    fn load_stored(&self, course_key: &CourseKey) -> Result<Vec<StoredTab>, StoreError> {
        self.require_course(course_key)?;
        let conn = self.db.connection();
        let mut stmt = conn
            .prepare(
                "SELECT tab_id, tab_type, locator, name, is_movable, is_hideable, is_hidden
                 FROM course_tabs WHERE course_key = ?1 ORDER BY position",
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let rows = stmt
            .query_map(params![course_key.to_string()], |row| {
                Ok(StoredTab {
                    tab_type: row.get(1)?,
                    record: TabRecord {
                        tab_id: row.get(0)?,
                        locator: row.get(2)?,
                        name: row.get(3)?,
                        is_movable: row.get(4)?,
                        is_hideable: row.get(5)?,
                        is_hidden: row.get(6)?,
                    },
                })
            })
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        let mut tabs = Vec::new();
        for row in rows {
            tabs.push(row.map_err(|e| StoreError::DatabaseError(e.to_string()))?);
        }
        Ok(tabs)
    }

    /// Replace the course's stored tab list in one transaction.
    fn store(&self, course_key: &CourseKey, tabs: &[StoredTab], user: Option<&str>) -> Result<(), StoreError> {
        let key = course_key.to_string();
        let tx = self
            .db
            .connection()
            .unchecked_transaction()
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        tx.execute(
            "INSERT INTO courses (course_key, updated_at, updated_by) VALUES (?1, ?2, ?3)
             ON CONFLICT(course_key) DO UPDATE SET updated_at = excluded.updated_at, updated_by = excluded.updated_by",
            params![key, Self::now(), user],
        )
        .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        tx.execute("DELETE FROM course_tabs WHERE course_key = ?1", params![key])
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;

        for (position, tab) in tabs.iter().enumerate() {
            let r = &tab.record;
            tx.execute(
                "INSERT INTO course_tabs (course_key, position, tab_id, tab_type, locator, name, is_movable, is_hideable, is_hidden)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    key,
                    position as i64,
                    r.tab_id,
                    tab.tab_type,
                    r.locator,
                    r.name,
                    r.is_movable,
                    r.is_hideable,
                    r.is_hidden
                ],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        }

        tx.commit().map_err(|e| StoreError::DatabaseError(e.to_string()))
    }

    /// Reorder (and create, remove, hide) tabs from a `{"tabs": [...], "removed": [...]}` body.
    ///
    /// When every listed tab is a static tab, only the static tabs are
    /// permuted, within the slots static tabs already occupy; new pages follow
    /// the last of those slots. Otherwise the listed order is the order of the
    /// whole list. Tabs the request does not mention are kept, after the
    /// listed ones.
    fn reorder_tabs(&mut self, course_key: &CourseKey, user: &str, request: &Value) -> Result<(), StoreError> {
        let entries: Vec<TabOrderEntry> = serde_json::from_value(request["tabs"].clone())
            .map_err(|e| StoreError::Validation(format!("Malformed tabs list: {}", e)))?;
        let removed: Vec<String> = match request.get("removed") {
            Some(v) => serde_json::from_value(v.clone())
                .map_err(|e| StoreError::Validation(format!("Malformed removed list: {}", e)))?,
            None => Vec::new(),
        };

        let stored = self.load_stored(course_key)?;
        for id in &removed {
            if let Some(tab) = stored.iter().find(|t| &t.record.tab_id == id) {
                if tab.record.is_fixed() {
                    return Err(StoreError::Validation(format!(
                        "Tab '{}' cannot be removed.",
                        id
                    )));
                }
            }
        }
        let remaining: Vec<StoredTab> = stored
            .into_iter()
            .filter(|t| !removed.contains(&t.record.tab_id))
            .collect();

        let mut listed = Vec::with_capacity(entries.len());
        for entry in &entries {
            let known = remaining
                .iter()
                .find(|t| t.record.matches(entry.tab_id.as_deref(), entry.tab_locator.as_deref()));
            let mut tab = match known {
                Some(t) => t.clone(),
                None => StoredTab::from_new_entry(entry).ok_or_else(|| {
                    StoreError::Validation(format!(
                        "Tab with id_locator '{}' does not exist.",
                        entry.describe()
                    ))
                })?,
            };
            if let Some(hidden) = entry.is_hidden {
                if hidden != tab.record.is_hidden {
                    if !tab.record.is_hideable {
                        return Err(StoreError::Validation(format!(
                            "Tab of type {} can not be hidden",
                            tab.tab_type
                        )));
                    }
                    tab.record.is_hidden = hidden;
                }
            }
            listed.push(tab);
        }

        let static_only = listed.iter().all(StoredTab::is_static);
        let in_scope = |t: &StoredTab| !static_only || t.is_static();

        let mut reordered = listed;
        for tab in remaining.iter().filter(|t| in_scope(*t)) {
            if !reordered.iter().any(|r| r.record.tab_id == tab.record.tab_id) {
                reordered.push(tab.clone());
            }
        }

        // New tabs beyond the existing slots go right after the last slot.
        let last_slot = remaining.iter().rposition(|t| in_scope(t));
        let mut reordered = reordered.into_iter();
        let mut full: Vec<StoredTab> = Vec::with_capacity(remaining.len() + entries.len());
        for (i, tab) in remaining.iter().enumerate() {
            if in_scope(tab) {
                if let Some(next) = reordered.next() {
                    full.push(next);
                }
                if Some(i) == last_slot {
                    full.extend(reordered.by_ref());
                }
            } else {
                full.push(tab.clone());
            }
        }
        full.extend(reordered);

        let before: Vec<TabRecord> = remaining.iter().map(|t| t.record.clone()).collect();
        let after: Vec<TabRecord> = full.iter().map(|t| t.record.clone()).collect();
        self.policy.validate_order(&before, &after).map_err(|e| {
            debug!("[{}] rejected tab order: {}", course_key, e);
            StoreError::Validation(format!("New list of tabs is not valid: {}.", e))
        })?;

        self.store(course_key, &full, Some(user))?;
        info!(
            "[{}] stored {} tabs for {} ({} removed)",
            course_key,
            full.len(),
            user,
            removed.len()
        );
        Ok(())
    }

    /// Set the hidden flag of one tab from a `{"tab_id_locator": {...}, "is_hidden": bool}` body.
    fn edit_tab(&mut self, course_key: &CourseKey, user: &str, request: &Value) -> Result<(), StoreError> {
        let id_locator: TabOrderEntry = serde_json::from_value(request["tab_id_locator"].clone())
            .map_err(|e| StoreError::Validation(format!("Malformed tab_id_locator: {}", e)))?;

        let mut tabs = self.load_stored(course_key)?;
        let tab = tabs
            .iter_mut()
            .find(|t| {
                t.record
                    .matches(id_locator.tab_id.as_deref(), id_locator.tab_locator.as_deref())
            })
            .ok_or_else(|| {
                StoreError::Validation(format!(
                    "Tab with id_locator '{}' does not exist.",
                    id_locator.describe()
                ))
            })?;

        let hidden = request
            .get("is_hidden")
            .and_then(Value::as_bool)
            .ok_or_else(|| {
                StoreError::UnsupportedRequest(format!("Unsupported request to edit tab: {}", request))
            })?;
        if !tab.record.is_hideable {
            return Err(StoreError::Validation(format!(
                "Tab of type {} can not be hidden",
                tab.tab_type
            )));
        }
        tab.record.is_hidden = hidden;

        self.store(course_key, &tabs, Some(user))
    }

    /// Command-line edits never touch the first two tabs or static tabs.
    fn validate_primitive_args(num: usize, tab_type: &str) -> Result<(), StoreError> {
        if num <= 1 {
            return Err(StoreError::Validation("Tabs 1 and 2 cannot be edited".to_string()));
        }
        if tab_type == STATIC_TAB_TYPE {
            return Err(StoreError::Validation(
                "Tabs of type static_tab cannot be edited here (use Studio)".to_string(),
            ));
        }
        Ok(())
    }
}

impl TabsHandlerTrait for TabsHandler {
    /// Seed or replace a course's tab list.
    fn create_course(&mut self, course_key: &CourseKey, tabs: &[StoredTab]) -> Result<(), StoreError> {
        let records: Vec<TabRecord> = tabs.iter().map(|t| t.record.clone()).collect();
        for (i, tab) in records.iter().enumerate() {
            if records[..i].iter().any(|t| t.tab_id == tab.tab_id) {
                return Err(StoreError::Validation(format!(
                    "duplicate tab id '{}'",
                    tab.tab_id
                )));
            }
        }
        self.store(course_key, tabs, None)
    }

    fn grant_author(&mut self, course_key: &CourseKey, user: &str) -> Result<(), StoreError> {
        self.require_course(course_key)?;
        self.db
            .connection()
            .execute(
                "INSERT OR IGNORE INTO course_authors (course_key, user_id) VALUES (?1, ?2)",
                params![course_key.to_string(), user],
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    fn has_author_access(&self, course_key: &CourseKey, user: &str) -> Result<bool, StoreError> {
        let count: i64 = self
            .db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM course_authors WHERE course_key = ?1 AND user_id = ?2",
                params![course_key.to_string(), user],
                |row| row.get(0),
            )
            .map_err(|e| StoreError::DatabaseError(e.to_string()))?;
        Ok(count > 0)
    }

    /// All tabs of the course in navigation order, hidden ones included.
    fn load_tabs(&self, course_key: &CourseKey) -> Result<Vec<TabRecord>, StoreError> {
        Ok(self
            .load_stored(course_key)?
            .into_iter()
            .map(|t| t.record)
            .collect())
    }

    /// Only the author-created tabs, hidden ones included.
    fn static_tabs(&self, course_key: &CourseKey) -> Result<Vec<TabRecord>, StoreError> {
        Ok(self
            .load_stored(course_key)?
            .into_iter()
            .filter(StoredTab::is_static)
            .map(|t| t.record)
            .collect())
    }

    fn update_tabs(&mut self, course_key: &CourseKey, user: &str, request: &Value) -> Result<(), StoreError> {
        if !self.has_author_access(course_key, user)? {
            return Err(StoreError::PermissionDenied(format!(
                "user '{}' is not an author of {}",
                user, course_key
            )));
        }

        if request.get("tabs").is_some() {
            self.reorder_tabs(course_key, user, request)
        } else if request.get("tab_id_locator").is_some() {
            self.edit_tab(course_key, user, request)
        } else {
            Err(StoreError::UnsupportedRequest(
                "Creating or changing tab content is not supported.".to_string(),
            ))
        }
    }

    /// Insert a default tab at `num` (0-based); past the end appends.
    fn primitive_insert(&mut self, course_key: &CourseKey, num: usize, tab_type: &str, name: &str) -> Result<(), StoreError> {
        Self::validate_primitive_args(num, tab_type)?;
        let mut tabs = self.load_stored(course_key)?;
        if tabs.iter().any(|t| t.record.tab_id == tab_type) {
            return Err(StoreError::Validation(format!(
                "duplicate tab id '{}'",
                tab_type
            )));
        }

        let tab = StoredTab::new(
            tab_type,
            TabRecord {
                tab_id: tab_type.to_string(),
                locator: None,
                name: name.to_string(),
                is_movable: false,
                is_hideable: true,
                is_hidden: false,
            },
        );
        let at = num.min(tabs.len());
        tabs.insert(at, tab);
        self.store(course_key, &tabs, Some(PRIMITIVE_COMMAND_USER))
    }

    /// Delete the tab at `num` (0-based).
    fn primitive_delete(&mut self, course_key: &CourseKey, num: usize) -> Result<(), StoreError> {
        if num <= 1 {
            return Err(StoreError::Validation("Tabs 1 and 2 cannot be edited".to_string()));
        }
        let mut tabs = self.load_stored(course_key)?;
        let tab_type = tabs
            .get(num)
            .map(|t| t.tab_type.clone())
            .ok_or_else(|| StoreError::Validation(format!("Tab number {} is out of range", num)))?;
        Self::validate_primitive_args(num, &tab_type)?;

        tabs.remove(num);
        self.store(course_key, &tabs, Some(PRIMITIVE_COMMAND_USER))
    }
}
