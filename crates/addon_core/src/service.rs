//! Collaborator seams consumed by the add-on list: catalog/persistence access,
//! the install pipeline, and the lifecycle event stream.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use shared::{
    domain::{AddonId, AddonInstallState, AddonRecord, WowClientType},
    error::{ServiceError, ServiceErrorKind},
    protocol::AddonLifecycleEvent,
};
use storage::Storage;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

const LIFECYCLE_EVENT_CAPACITY: usize = 1024;

pub type ProgressFn<'a> = &'a (dyn Fn(AddonInstallState, u8) + Send + Sync);

#[async_trait]
pub trait AddonService: Send + Sync {
    /// Current add-ons for one client. `rescan` asks for a fresh scan instead
    /// of cached state.
    async fn get_addons(
        &self,
        client_type: WowClientType,
        rescan: bool,
    ) -> Result<Vec<AddonRecord>, ServiceError>;
    async fn install_addon(&self, addon_id: &AddonId) -> Result<(), ServiceError>;
    async fn remove_addon(&self, addon: &AddonRecord) -> Result<(), ServiceError>;
    async fn save_addon(&self, addon: &AddonRecord) -> Result<(), ServiceError>;
    fn subscribe_events(&self) -> broadcast::Receiver<AddonLifecycleEvent>;
}

/// Download/backup/extract pipeline for a single add-on.
#[async_trait]
pub trait AddonInstaller: Send + Sync {
    async fn install(
        &self,
        addon: &AddonRecord,
        progress: ProgressFn<'_>,
    ) -> Result<(), ServiceError>;
}

pub struct MissingAddonInstaller;

#[async_trait]
impl AddonInstaller for MissingAddonInstaller {
    async fn install(
        &self,
        addon: &AddonRecord,
        _progress: ProgressFn<'_>,
    ) -> Result<(), ServiceError> {
        Err(ServiceError::new(
            ServiceErrorKind::Download,
            format!("no install pipeline configured for addon {}", addon.id),
        ))
    }
}

/// Accepts every install without touching the game folder; only the stored
/// installed version changes.
pub struct RecordOnlyInstaller;

#[async_trait]
impl AddonInstaller for RecordOnlyInstaller {
    async fn install(
        &self,
        _addon: &AddonRecord,
        progress: ProgressFn<'_>,
    ) -> Result<(), ServiceError> {
        progress(AddonInstallState::Downloading, 100);
        progress(AddonInstallState::BackingUp, 100);
        progress(AddonInstallState::Installing, 100);
        Ok(())
    }
}

/// `AddonService` over the SQLite store and a pluggable installer.
pub struct StoredAddonService {
    storage: Storage,
    installer: Arc<dyn AddonInstaller>,
    events: broadcast::Sender<AddonLifecycleEvent>,
}

impl StoredAddonService {
    pub fn new(storage: Storage, installer: Arc<dyn AddonInstaller>) -> Self {
        let (events, _) = broadcast::channel(LIFECYCLE_EVENT_CAPACITY);
        Self {
            storage,
            installer,
            events,
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    fn emit(&self, event: AddonLifecycleEvent) {
        // No subscribers is not an error: nobody is displaying the list.
        let _ = self.events.send(event);
    }

    fn emit_install(
        &self,
        addon: &AddonRecord,
        install_state: AddonInstallState,
        progress: Option<u8>,
    ) {
        self.emit(AddonLifecycleEvent::installed(
            addon.clone(),
            install_state,
            progress,
        ));
    }
}

#[async_trait]
impl AddonService for StoredAddonService {
    async fn get_addons(
        &self,
        client_type: WowClientType,
        rescan: bool,
    ) -> Result<Vec<AddonRecord>, ServiceError> {
        if rescan {
            info!(client = %client_type, "addons: rescan requested; reloading stored records");
        }
        self.storage
            .list_addons(client_type)
            .await
            .map_err(storage_error)
    }

    async fn install_addon(&self, addon_id: &AddonId) -> Result<(), ServiceError> {
        let addon = self
            .storage
            .get_addon(addon_id)
            .await
            .map_err(storage_error)?
            .ok_or_else(|| ServiceError::not_found(format!("addon {addon_id} is not stored")))?;
        let Some(version) = addon.latest_version.clone() else {
            return Err(ServiceError::new(
                ServiceErrorKind::Download,
                format!("addon {addon_id} has no latest version to install"),
            ));
        };

        self.emit_install(&addon, AddonInstallState::Pending, None);
        self.emit_install(&addon, AddonInstallState::Downloading, Some(0));

        let report = |install_state: AddonInstallState, percent: u8| {
            self.emit_install(&addon, install_state, Some(percent));
        };
        if let Err(err) = self.installer.install(&addon, &report).await {
            warn!(addon_id = %addon_id, "addons: install failed: {err}");
            self.emit_install(&addon, AddonInstallState::Error, None);
            return Err(err);
        }

        let installed = self
            .storage
            .mark_installed(addon_id, &version, Utc::now())
            .await
            .map_err(storage_error)?
            .ok_or_else(|| {
                ServiceError::not_found(format!("addon {addon_id} vanished during install"))
            })?;
        debug!(addon_id = %addon_id, version = %version, "addons: install complete");
        self.emit_install(&installed, AddonInstallState::Complete, Some(100));
        Ok(())
    }

    async fn remove_addon(&self, addon: &AddonRecord) -> Result<(), ServiceError> {
        let removed = self
            .storage
            .remove_addon(&addon.id)
            .await
            .map_err(storage_error)?;
        if removed {
            self.emit(AddonLifecycleEvent::removed(addon.id.clone()));
        }
        Ok(())
    }

    async fn save_addon(&self, addon: &AddonRecord) -> Result<(), ServiceError> {
        self.storage.upsert_addon(addon).await.map_err(storage_error)
    }

    fn subscribe_events(&self) -> broadcast::Receiver<AddonLifecycleEvent> {
        self.events.subscribe()
    }
}

fn storage_error(err: anyhow::Error) -> ServiceError {
    ServiceError::io(format!("{err:#}"))
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
