//! RPC method handler for the course tabs JSON-RPC protocol.
//!
//! Kept apart from `rpc_server.rs` so it can be unit-tested independently.
//! `handle_method` dispatches each call to the tabs handler or the settings
//! engine held by `App`.

use std::sync::Mutex;

use serde_json::{json, Value};

use crate::app::App;
use crate::services::settings_engine::SettingsEngineTrait;
use crate::services::tabs_handler::{StoredTab, TabsHandlerTrait};
use crate::types::course::CourseKey;

fn str_param<'a>(params: &'a Value, name: &str) -> Result<&'a str, String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| format!("missing {}", name))
}

fn index_param(params: &Value, name: &str) -> Result<usize, String> {
    params
        .get(name)
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| format!("missing {}", name))
}

fn course_param(params: &Value) -> Result<CourseKey, String> {
    CourseKey::parse(str_param(params, "course_key")?).map_err(|e| e.to_string())
}

/// Dispatch a JSON-RPC method call.
///
/// Returns `Ok(Value)` on success or `Err(String)` with an error message.
pub fn handle_method(app: &Mutex<App>, method: &str, params: &Value) -> Result<Value, String> {
    match method {
        "ping" => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),

        // ─── Tabs ───
        "tabs.create" => {
            let key = course_param(params)?;
            let tabs: Vec<StoredTab> = serde_json::from_value(params.get("tabs").cloned().unwrap_or(json!([])))
                .map_err(|e| format!("invalid tabs: {}", e))?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let mut handler = a.handler.lock().map_err(|e| e.to_string())?;
            handler.create_course(&key, &tabs).map_err(|e| e.to_string())?;
            Ok(json!({"course_key": key, "count": tabs.len()}))
        }
        "tabs.grant_author" => {
            let key = course_param(params)?;
            let user = str_param(params, "user")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let mut handler = a.handler.lock().map_err(|e| e.to_string())?;
            handler.grant_author(&key, user).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tabs.load" => {
            let key = course_param(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let handler = a.handler.lock().map_err(|e| e.to_string())?;
            let tabs = handler.load_tabs(&key).map_err(|e| e.to_string())?;
            serde_json::to_value(tabs).map_err(|e| e.to_string())
        }
        "tabs.static" => {
            let key = course_param(params)?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let handler = a.handler.lock().map_err(|e| e.to_string())?;
            let tabs = handler.static_tabs(&key).map_err(|e| e.to_string())?;
            serde_json::to_value(tabs).map_err(|e| e.to_string())
        }
        "tabs.update" => {
            let key = course_param(params)?;
            let user = str_param(params, "user")?;
            let request = params.get("request").ok_or("missing request")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let mut handler = a.handler.lock().map_err(|e| e.to_string())?;
            handler.update_tabs(&key, user, request).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tabs.primitive_insert" => {
            let key = course_param(params)?;
            let num = index_param(params, "num")?;
            let tab_type = str_param(params, "tab_type")?;
            let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
            let a = app.lock().map_err(|e| e.to_string())?;
            let mut handler = a.handler.lock().map_err(|e| e.to_string())?;
            handler
                .primitive_insert(&key, num, tab_type, name)
                .map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }
        "tabs.primitive_delete" => {
            let key = course_param(params)?;
            let num = index_param(params, "num")?;
            let a = app.lock().map_err(|e| e.to_string())?;
            let mut handler = a.handler.lock().map_err(|e| e.to_string())?;
            handler.primitive_delete(&key, num).map_err(|e| e.to_string())?;
            Ok(json!({"ok": true}))
        }

        // ─── Settings ───
        "settings.get" => {
            let a = app.lock().map_err(|e| e.to_string())?;
            serde_json::to_value(a.settings_engine.get_settings()).map_err(|e| e.to_string())
        }

        _ => Err(format!("unknown method: {}", method)),
    }
}
