use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::warn;

use shared::domain::{AddonChannelType, AddonId, AddonRecord, WowClientType};

const ADDON_COLUMNS: &str = "id, name, author, provider_name, installed_version, latest_version, game_version, thumbnail_url, channel_type, is_ignored, auto_update_enabled, client_type, installed_at";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        // A single connection keeps `sqlite::memory:` databases shared across queries.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open database '{database_url}'"))?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn upsert_addon(&self, addon: &AddonRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO addons (id, name, author, provider_name, installed_version, latest_version, game_version, thumbnail_url, channel_type, is_ignored, auto_update_enabled, client_type, installed_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                author = excluded.author,
                provider_name = excluded.provider_name,
                installed_version = excluded.installed_version,
                latest_version = excluded.latest_version,
                game_version = excluded.game_version,
                thumbnail_url = excluded.thumbnail_url,
                channel_type = excluded.channel_type,
                is_ignored = excluded.is_ignored,
                auto_update_enabled = excluded.auto_update_enabled,
                client_type = excluded.client_type,
                installed_at = excluded.installed_at,
                updated_at = CURRENT_TIMESTAMP",
        )
        .bind(addon.id.as_str())
        .bind(&addon.name)
        .bind(&addon.author)
        .bind(&addon.provider_name)
        .bind(addon.installed_version.as_deref())
        .bind(addon.latest_version.as_deref())
        .bind(&addon.game_version)
        .bind(addon.thumbnail_url.as_deref())
        .bind(addon.channel_type.as_str())
        .bind(addon.is_ignored)
        .bind(addon.auto_update_enabled)
        .bind(addon.client_type.as_str())
        .bind(addon.installed_at)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save addon {}", addon.id))?;
        Ok(())
    }

    pub async fn get_addon(&self, addon_id: &AddonId) -> Result<Option<AddonRecord>> {
        let row = sqlx::query(&format!("SELECT {ADDON_COLUMNS} FROM addons WHERE id = ?"))
            .bind(addon_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load addon {addon_id}"))?;
        Ok(row.as_ref().map(addon_from_row))
    }

    /// Add-ons for one client, in insertion order.
    pub async fn list_addons(&self, client_type: WowClientType) -> Result<Vec<AddonRecord>> {
        let rows = sqlx::query(&format!(
            "SELECT {ADDON_COLUMNS} FROM addons WHERE client_type = ? ORDER BY rowid ASC"
        ))
        .bind(client_type.as_str())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("failed to list addons for {client_type}"))?;
        Ok(rows.iter().map(addon_from_row).collect())
    }

    pub async fn remove_addon(&self, addon_id: &AddonId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM addons WHERE id = ?")
            .bind(addon_id.as_str())
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove addon {addon_id}"))?;
        Ok(result.rows_affected() > 0)
    }

    /// Stamps `version` as installed and returns the updated record.
    pub async fn mark_installed(
        &self,
        addon_id: &AddonId,
        version: &str,
        installed_at: DateTime<Utc>,
    ) -> Result<Option<AddonRecord>> {
        let result = sqlx::query(
            "UPDATE addons SET installed_version = ?, installed_at = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(version)
        .bind(installed_at)
        .bind(addon_id.as_str())
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to mark addon {addon_id} installed"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_addon(addon_id).await
    }
}

fn addon_from_row(row: &SqliteRow) -> AddonRecord {
    let id = AddonId(row.get::<String, _>("id"));
    let channel_raw = row.get::<String, _>("channel_type");
    let channel_type = channel_raw.parse::<AddonChannelType>().unwrap_or_else(|err| {
        warn!(addon_id = %id, "storage: {err}; using stable channel");
        AddonChannelType::Stable
    });
    let client_raw = row.get::<String, _>("client_type");
    let client_type = client_raw.parse::<WowClientType>().unwrap_or_else(|err| {
        warn!(addon_id = %id, "storage: {err}");
        WowClientType::None
    });

    AddonRecord {
        name: row.get::<String, _>("name"),
        author: row.get::<String, _>("author"),
        provider_name: row.get::<String, _>("provider_name"),
        installed_version: row.get::<Option<String>, _>("installed_version"),
        latest_version: row.get::<Option<String>, _>("latest_version"),
        game_version: row.get::<String, _>("game_version"),
        thumbnail_url: row.get::<Option<String>, _>("thumbnail_url"),
        channel_type,
        is_ignored: row.get::<bool, _>("is_ignored"),
        auto_update_enabled: row.get::<bool, _>("auto_update_enabled"),
        client_type,
        installed_at: row.get::<Option<DateTime<Utc>>, _>("installed_at"),
        id,
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
