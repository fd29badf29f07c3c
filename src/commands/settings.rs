use crate::commands::error::CommandError;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 1;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Typed view of `settings.json` after migration and sanitizing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub chart_window_days: u32,
    pub detail_range_days: u32,
    pub recent_clicks_limit: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self::from_value(&default_settings())
    }
}

impl ClientSettings {
    pub fn from_value(settings: &Value) -> Self {
        let u64_or = |key: &str, default: u64| settings.get(key).and_then(Value::as_u64).unwrap_or(default);
        Self {
            api_base_url: settings
                .get("apiBaseUrl")
                .and_then(Value::as_str)
                .unwrap_or(DEFAULT_API_BASE_URL)
                .to_string(),
            request_timeout: Duration::from_secs(u64_or("requestTimeoutSecs", 10)),
            chart_window_days: u64_or("chartWindowDays", 7) as u32,
            detail_range_days: u64_or("detailRangeDays", 30) as u32,
            recent_clicks_limit: u64_or("recentClicksLimit", 10) as usize,
        }
    }
}

pub async fn get_settings(data_dir: &Path) -> Result<Value, CommandError> {
    load_settings_from_disk(data_dir)
}

/// Merge a partial update into the stored settings. Takes effect the next
/// time an [`AppContext`](crate::commands::context::AppContext) is opened.
pub async fn save_settings(data_dir: &Path, settings: Value) -> Result<Value, CommandError> {
    save_settings_to_disk(data_dir, settings)
}

pub fn load_client_settings(data_dir: &Path) -> ClientSettings {
    match load_settings_from_disk(data_dir) {
        Ok(value) => ClientSettings::from_value(&value),
        Err(e) => {
            log::warn!("using default settings: {e}");
            ClientSettings::default()
        }
    }
}

pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, CommandError> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| CommandError::Storage(format!("Failed to read settings.json: {e}")))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON, resetting: {e}");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(data_dir: &Path, settings: Value) -> Result<Value, CommandError> {
    let path = settings_path(data_dir);
    ensure_data_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join("settings.json")
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), CommandError> {
    fs::create_dir_all(data_dir)
        .map_err(|e| CommandError::Storage(format!("Failed to create data directory: {e}")))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), CommandError> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| CommandError::Storage(format!("Failed to serialize settings: {e}")))?;
    fs::write(path, raw)
        .map_err(|e| CommandError::Storage(format!("Failed to write settings.json: {e}")))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "apiBaseUrl": DEFAULT_API_BASE_URL,
        "requestTimeoutSecs": 10,
        "chartWindowDays": 7,
        "detailRangeDays": 30,
        "recentClicksLimit": 10
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "requestTimeoutSecs", 1, 120, 10);
    clamp_u64(obj, "detailRangeDays", 7, 90, 30);
    clamp_u64(obj, "recentClicksLimit", 1, 50, 10);
    sanitize_choice(obj, "chartWindowDays", &[7, 30], 7);
    sanitize_base_url(obj, "apiBaseUrl");
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_choice(map: &mut Map<String, Value>, key: &str, allowed: &[u64], default: u64) {
    let valid = map
        .get(key)
        .and_then(Value::as_u64)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn sanitize_base_url(map: &mut Map<String, Value>, key: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|raw| {
            url::Url::parse(raw)
                .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
                .unwrap_or(false)
        })
        .unwrap_or(DEFAULT_API_BASE_URL)
        .trim_end_matches('/')
        .to_string();
    map.insert(key.to_string(), json!(valid));
}
