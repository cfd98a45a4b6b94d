// Course tabs services
// Services persist tabs, drive editing sessions, render rows and load settings.

pub mod presenter;
pub mod session;
pub mod settings_engine;
pub mod sync_client;
pub mod tabs_handler;
