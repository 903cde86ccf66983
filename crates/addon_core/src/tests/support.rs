//! In-memory collaborators shared by the unit tests.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use shared::{
    domain::{AddonId, AddonInstallState, AddonRecord, WowClientType},
    error::ServiceError,
    protocol::AddonLifecycleEvent,
};
use tokio::sync::{broadcast, Semaphore};

use crate::service::AddonService;

pub(crate) fn addon(
    id: &str,
    name: &str,
    client_type: WowClientType,
    installed: Option<&str>,
    latest: &str,
) -> AddonRecord {
    let mut record = AddonRecord::new(AddonId::from(id), name, client_type);
    record.installed_version = installed.map(str::to_string);
    record.latest_version = Some(latest.to_string());
    record.author = format!("{name} Authors");
    record
}

pub(crate) struct FakeAddonService {
    addons: Mutex<Vec<AddonRecord>>,
    gather_calls: Mutex<Vec<(WowClientType, bool)>>,
    installs: Mutex<Vec<AddonId>>,
    saves: Mutex<Vec<AddonRecord>>,
    removals: Mutex<Vec<AddonId>>,
    install_failures: Mutex<HashMap<AddonId, ServiceError>>,
    gather_failures: Mutex<HashMap<WowClientType, ServiceError>>,
    install_gate: Mutex<Option<Arc<Semaphore>>>,
    events: broadcast::Sender<AddonLifecycleEvent>,
}

impl FakeAddonService {
    pub(crate) fn new(addons: Vec<AddonRecord>) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            addons: Mutex::new(addons),
            gather_calls: Mutex::new(Vec::new()),
            installs: Mutex::new(Vec::new()),
            saves: Mutex::new(Vec::new()),
            removals: Mutex::new(Vec::new()),
            install_failures: Mutex::new(HashMap::new()),
            gather_failures: Mutex::new(HashMap::new()),
            install_gate: Mutex::new(None),
            events,
        })
    }

    pub(crate) fn fail_install(&self, addon_id: &str, err: ServiceError) {
        self.install_failures
            .lock()
            .expect("lock")
            .insert(AddonId::from(addon_id), err);
    }

    pub(crate) fn fail_gather(&self, client_type: WowClientType, err: ServiceError) {
        self.gather_failures
            .lock()
            .expect("lock")
            .insert(client_type, err);
    }

    pub(crate) fn clear_gather_failures(&self) {
        self.gather_failures.lock().expect("lock").clear();
    }

    /// Installs wait for a permit on the returned semaphore before finishing.
    pub(crate) fn gate_installs(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.install_gate.lock().expect("lock") = Some(Arc::clone(&gate));
        gate
    }

    pub(crate) fn set_addons(&self, addons: Vec<AddonRecord>) {
        *self.addons.lock().expect("lock") = addons;
    }

    pub(crate) fn insert_addon(&self, addon: AddonRecord) {
        self.addons.lock().expect("lock").push(addon);
    }

    /// Stored rows for a client, without touching the gather call log.
    pub(crate) fn addon_count(&self, client_type: WowClientType) -> usize {
        self.addons
            .lock()
            .expect("lock")
            .iter()
            .filter(|addon| addon.client_type == client_type)
            .count()
    }

    pub(crate) fn installs(&self) -> Vec<AddonId> {
        self.installs.lock().expect("lock").clone()
    }

    pub(crate) fn gather_calls(&self) -> Vec<(WowClientType, bool)> {
        self.gather_calls.lock().expect("lock").clone()
    }

    pub(crate) fn saves(&self) -> Vec<AddonRecord> {
        self.saves.lock().expect("lock").clone()
    }

    pub(crate) fn removals(&self) -> Vec<AddonId> {
        self.removals.lock().expect("lock").clone()
    }

    pub(crate) fn emit(&self, event: AddonLifecycleEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AddonService for FakeAddonService {
    async fn get_addons(
        &self,
        client_type: WowClientType,
        rescan: bool,
    ) -> Result<Vec<AddonRecord>, ServiceError> {
        self.gather_calls
            .lock()
            .expect("lock")
            .push((client_type, rescan));
        if let Some(err) = self.gather_failures.lock().expect("lock").get(&client_type) {
            return Err(err.clone());
        }
        Ok(self
            .addons
            .lock()
            .expect("lock")
            .iter()
            .filter(|addon| addon.client_type == client_type)
            .cloned()
            .collect())
    }

    async fn install_addon(&self, addon_id: &AddonId) -> Result<(), ServiceError> {
        self.installs.lock().expect("lock").push(addon_id.clone());

        let gate = self.install_gate.lock().expect("lock").clone();
        if let Some(gate) = gate {
            gate.acquire().await.expect("gate open").forget();
        }

        if let Some(err) = self.install_failures.lock().expect("lock").get(addon_id) {
            return Err(err.clone());
        }

        let installed = {
            let mut addons = self.addons.lock().expect("lock");
            let Some(addon) = addons.iter_mut().find(|addon| &addon.id == addon_id) else {
                return Err(ServiceError::not_found(format!("unknown addon {addon_id}")));
            };
            addon.installed_version = addon.latest_version.clone();
            addon.clone()
        };
        self.emit(AddonLifecycleEvent::installed(
            installed,
            AddonInstallState::Complete,
            Some(100),
        ));
        Ok(())
    }

    async fn remove_addon(&self, addon: &AddonRecord) -> Result<(), ServiceError> {
        self.removals.lock().expect("lock").push(addon.id.clone());
        self.addons
            .lock()
            .expect("lock")
            .retain(|existing| existing.id != addon.id);
        self.emit(AddonLifecycleEvent::removed(addon.id.clone()));
        Ok(())
    }

    async fn save_addon(&self, addon: &AddonRecord) -> Result<(), ServiceError> {
        self.saves.lock().expect("lock").push(addon.clone());
        let mut addons = self.addons.lock().expect("lock");
        if let Some(existing) = addons.iter_mut().find(|existing| existing.id == addon.id) {
            *existing = addon.clone();
        }
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<AddonLifecycleEvent> {
        self.events.subscribe()
    }
}
