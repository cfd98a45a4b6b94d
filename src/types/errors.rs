use std::fmt;

// === TabError ===

/// Local validation errors raised by tab collection operations.
///
/// These never reach the network: the action is rejected and the collection
/// is left as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabError {
    /// A tab with the given ID already exists.
    DuplicateId(String),
    /// Tab with the given ID was not found.
    NotFound(String),
    /// The tab is fixed and cannot be removed.
    NotRemovable(String),
    /// The tab cannot change position.
    NotMovable(String),
    /// The tab's visibility cannot be toggled.
    NotHideable(String),
    /// The target index is out of range or crosses a fixed-tab boundary.
    InvalidPosition { tab_id: String, index: usize },
    /// A new page carries no content locator.
    MissingLocator(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::DuplicateId(id) => write!(f, "Duplicate tab id: {}", id),
            TabError::NotFound(id) => write!(f, "Tab not found: {}", id),
            TabError::NotRemovable(id) => write!(f, "Tab cannot be removed: {}", id),
            TabError::NotMovable(id) => write!(f, "Tab cannot be moved: {}", id),
            TabError::NotHideable(id) => write!(f, "Tab cannot be hidden: {}", id),
            TabError::InvalidPosition { tab_id, index } => {
                write!(f, "Invalid position {} for tab: {}", index, tab_id)
            }
            TabError::MissingLocator(id) => write!(f, "Tab has no content locator: {}", id),
        }
    }
}

impl std::error::Error for TabError {}

// === SyncError ===

/// Errors returned when persisting a tab order to the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The request did not complete; retrying may succeed.
    TransientNetwork(String),
    /// The handler refused the order (validation, stale course key, permissions).
    Rejected(String),
}

impl SyncError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::TransientNetwork(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncError::TransientNetwork(msg) => write!(f, "Transient network error: {}", msg),
            SyncError::Rejected(msg) => write!(f, "Tab order rejected: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

// === StoreError ===

/// Errors raised by the authoritative course tabs handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The course key could not be parsed.
    InvalidCourseKey(String),
    /// No tabs are stored for the course.
    CourseNotFound(String),
    /// The user has no author access to the course.
    PermissionDenied(String),
    /// The requested change would produce an invalid tab list.
    Validation(String),
    /// The request shape is not handled.
    UnsupportedRequest(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::InvalidCourseKey(key) => write!(f, "Invalid course key: {}", key),
            StoreError::CourseNotFound(key) => write!(f, "Course not found: {}", key),
            StoreError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            StoreError::Validation(msg) => write!(f, "{}", msg),
            StoreError::UnsupportedRequest(msg) => write!(f, "Unsupported request: {}", msg),
            StoreError::DatabaseError(msg) => write!(f, "Tab store database error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
