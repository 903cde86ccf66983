use std::{collections::HashMap, fs};

use addon_core::{DEFAULT_COMMAND_QUEUE_CAPACITY, RETAIL_AND_CLASSIC};
use shared::domain::WowClientType;

pub const CONFIG_FILE: &str = "addonctl.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database_url: String,
    pub default_client: WowClientType,
    pub batch_clients: Vec<WowClientType>,
    pub log_level: String,
    pub command_queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./data/addons.db".into(),
            default_client: WowClientType::Retail,
            batch_clients: RETAIL_AND_CLASSIC.to_vec(),
            log_level: "info".into(),
            command_queue_capacity: DEFAULT_COMMAND_QUEUE_CAPACITY,
        }
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();
    if let Ok(raw) = fs::read_to_string(CONFIG_FILE) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings
}

/// Overlays values from a flat `key = "value"` TOML document. Unparseable
/// documents and values are ignored.
pub(crate) fn apply_file(settings: &mut Settings, raw: &str) {
    let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(raw) else {
        return;
    };
    if let Some(v) = file_cfg.get("database_url") {
        settings.database_url = v.clone();
    }
    if let Some(client) = file_cfg.get("default_client").and_then(|v| v.parse().ok()) {
        settings.default_client = client;
    }
    if let Some(clients) = file_cfg.get("batch_clients").and_then(|v| parse_clients(v)) {
        settings.batch_clients = clients;
    }
    if let Some(v) = file_cfg.get("log_level") {
        settings.log_level = v.clone();
    }
    if let Some(capacity) = file_cfg
        .get("command_queue_capacity")
        .and_then(|v| v.parse::<usize>().ok())
    {
        settings.command_queue_capacity = capacity;
    }
}

pub(crate) fn apply_env<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("ADDONCTL_DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = lookup("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if let Some(client) = lookup("APP__DEFAULT_CLIENT").and_then(|v| v.parse().ok()) {
        settings.default_client = client;
    }

    if let Some(clients) = lookup("APP__BATCH_CLIENTS").and_then(|v| parse_clients(&v)) {
        settings.batch_clients = clients;
    }

    if let Some(v) = lookup("APP__LOG_LEVEL") {
        settings.log_level = v;
    }

    if let Some(v) = lookup("APP__COMMAND_QUEUE_CAPACITY") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.command_queue_capacity = parsed;
        }
    }
}

/// Comma separated client list; `None` if any entry is unknown or the list is
/// empty.
pub fn parse_clients(raw: &str) -> Option<Vec<WowClientType>> {
    let clients = raw
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.parse::<WowClientType>().ok())
        .collect::<Option<Vec<_>>>()?;
    (!clients.is_empty()).then_some(clients)
}

/// Normalises a database setting to a sqlx SQLite URL. Parent directories
/// are created when the storage layer opens the database.
pub fn prepare_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
