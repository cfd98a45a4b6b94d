//! App core for the course tabs service.
//!
//! Holds the loaded settings and the shared tabs handler, and starts editing
//! sessions against it.

use std::error::Error;
use std::sync::{Arc, Mutex};

use log::info;
use tokio::task::JoinHandle;

use crate::database::connection::Database;
use crate::managers::reorder_controller::ReorderController;
use crate::managers::tab_collection::TabCollection;
use crate::services::session::{SessionHandle, TabSession};
use crate::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use crate::services::sync_client::{LocalSyncClient, RetryPolicy, Retrying};
use crate::services::tabs_handler::{TabsHandler, TabsHandlerTrait};
use crate::types::course::CourseKey;
use crate::types::settings::TabsSettings;

/// Central struct holding the settings engine and the handler.
///
/// The handler sits behind `Arc<Mutex<_>>` so in-process sessions can persist
/// through it while RPC calls use it directly.
pub struct App {
    pub settings_engine: SettingsEngine,
    pub handler: Arc<Mutex<TabsHandler>>,
}

impl App {
    /// Loads settings from `config_path` (or the default location) and opens
    /// the configured store.
    pub fn new(config_path: Option<String>) -> Result<Self, Box<dyn Error>> {
        let mut settings_engine = SettingsEngine::new(config_path);
        let settings = settings_engine.load()?;
        let db = Database::from_settings(&settings)?;
        info!(
            "course tabs store at {} (schema v{}), policy {:?}",
            settings.database_path,
            db.schema_version(),
            settings.boundary_policy
        );
        Ok(Self::from_parts(settings_engine, db))
    }

    /// Builds an app around an already loaded engine and an open store.
    pub fn from_parts(settings_engine: SettingsEngine, db: Database) -> Self {
        let policy = settings_engine.get_settings().boundary_policy;
        Self {
            settings_engine,
            handler: Arc::new(Mutex::new(TabsHandler::new(db, policy))),
        }
    }

    pub fn settings(&self) -> &TabsSettings {
        self.settings_engine.get_settings()
    }

    /// The course's stored tabs as an editable collection.
    pub fn load_collection(&self, course_key: &CourseKey) -> Result<TabCollection, Box<dyn Error>> {
        let handler = self.handler.lock().map_err(|e| e.to_string())?;
        let tabs = handler.load_tabs(course_key)?;
        Ok(TabCollection::from_descriptors(tabs, handler.policy())?)
    }

    /// Starts an editing session for `user` that persists through the
    /// in-process handler. Must be called from within a tokio runtime.
    pub fn start_session(
        &self,
        course_key: &CourseKey,
        user: &str,
    ) -> Result<(SessionHandle, JoinHandle<ReorderController>), Box<dyn Error>> {
        let collection = self.load_collection(course_key)?;
        let controller = ReorderController::new(course_key.clone(), collection);
        let client = Retrying::new(
            LocalSyncClient::new(Arc::clone(&self.handler), user),
            RetryPolicy::from_settings(&self.settings().sync),
        );
        info!("[{}] editing session started for {}", course_key, user);
        Ok(TabSession::spawn(controller, client))
    }
}
