//! Sequential multi-client update runs.
//!
//! A run gathers every add-on of each requested client, keeps the ones that
//! need an install or update, and installs them one at a time. Installs for a
//! client share its add-on folder, so they are never run concurrently.

use std::sync::Arc;

use shared::domain::{AddonId, AddonRecord, WowClientType};
use tracing::{error, info, warn};

use crate::{error::BatchError, service::AddonService};

pub const GATHERING_MESSAGE: &str = "Gathering addons...";

pub const RETAIL_AND_CLASSIC: [WowClientType; 2] = [WowClientType::Retail, WowClientType::Classic];

pub const ALL_CLIENTS: [WowClientType; 5] = [
    WowClientType::Retail,
    WowClientType::RetailPtr,
    WowClientType::Beta,
    WowClientType::ClassicPtr,
    WowClientType::Classic,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPhase {
    #[default]
    Idle,
    Gathering,
    Updating,
    Done,
    Failed,
}

impl BatchPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchPhase::Done | BatchPhase::Failed)
    }
}

/// Progress of one batch run. Lives only for the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchJob {
    pub clients: Vec<WowClientType>,
    pub addon_ids: Vec<AddonId>,
    pub counter: usize,
    pub phase: BatchPhase,
    pub message: String,
}

impl BatchJob {
    fn new(clients: Vec<WowClientType>) -> Self {
        Self {
            clients,
            addon_ids: Vec::new(),
            counter: 0,
            phase: BatchPhase::Idle,
            message: String::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.addon_ids.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub failed: Vec<AddonId>,
}

pub fn updating_message(counter: usize, total: usize, addon: Option<&AddonRecord>) -> String {
    match addon {
        Some(addon) => format!(
            "Updating {counter}/{total}\n{}: {}",
            addon.client_type.label(),
            addon.name
        ),
        None => format!("Updating {counter}/{total}"),
    }
}

pub struct BatchUpdateOrchestrator {
    service: Arc<dyn AddonService>,
}

impl BatchUpdateOrchestrator {
    pub fn new(service: Arc<dyn AddonService>) -> Self {
        Self { service }
    }

    /// Gathers the add-ons of every client in `clients` (duplicates are
    /// gathered again) and updates the ones that need it.
    pub async fn update_clients<F>(
        &self,
        clients: &[WowClientType],
        mut on_progress: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: FnMut(&BatchJob) + Send,
    {
        let mut job = BatchJob::new(clients.to_vec());
        job.phase = BatchPhase::Gathering;
        job.message = GATHERING_MESSAGE.to_string();
        on_progress(&job);

        let mut gathered = Vec::new();
        for &client in clients {
            match self.service.get_addons(client, false).await {
                Ok(addons) => gathered.extend(addons),
                Err(source) => {
                    error!(client = %client, "batch: failed to gather addons: {source}");
                    job.phase = BatchPhase::Failed;
                    on_progress(&job);
                    return Err(BatchError::Gather { client, source });
                }
            }
        }

        self.install_sequentially(job, gathered, on_progress).await
    }

    /// Updates the given snapshot without a gather phase.
    pub async fn update_addons<F>(
        &self,
        addons: Vec<AddonRecord>,
        on_progress: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: FnMut(&BatchJob) + Send,
    {
        let mut clients: Vec<WowClientType> = Vec::new();
        for addon in &addons {
            if !clients.contains(&addon.client_type) {
                clients.push(addon.client_type);
            }
        }
        self.install_sequentially(BatchJob::new(clients), addons, on_progress)
            .await
    }

    async fn install_sequentially<F>(
        &self,
        mut job: BatchJob,
        candidates: Vec<AddonRecord>,
        mut on_progress: F,
    ) -> Result<BatchSummary, BatchError>
    where
        F: FnMut(&BatchJob) + Send,
    {
        let pending: Vec<AddonRecord> = candidates
            .into_iter()
            .filter(|addon| addon.display_state().needs_work())
            .collect();

        job.addon_ids = pending.iter().map(|addon| addon.id.clone()).collect();
        job.phase = BatchPhase::Updating;
        job.message = updating_message(0, job.total(), None);
        on_progress(&job);
        info!(total = job.total(), "batch: updating addons");

        let mut summary = BatchSummary::default();
        for addon in &pending {
            job.counter += 1;
            job.message = updating_message(job.counter, job.total(), Some(addon));
            on_progress(&job);

            match self.service.install_addon(&addon.id).await {
                Ok(()) => {}
                Err(err) if err.is_item_local() => {
                    warn!(
                        addon_id = %addon.id,
                        counter = job.counter,
                        total = job.total(),
                        "batch: install failed; continuing: {err}"
                    );
                    summary.failed.push(addon.id.clone());
                }
                Err(source) => {
                    error!(addon_id = %addon.id, "batch: install aborted the batch: {source}");
                    job.phase = BatchPhase::Failed;
                    on_progress(&job);
                    return Err(BatchError::Install {
                        addon_id: addon.id.clone(),
                        source,
                    });
                }
            }
            summary.processed += 1;
        }

        job.phase = BatchPhase::Done;
        on_progress(&job);
        info!(
            processed = summary.processed,
            failed = summary.failed.len(),
            "batch: finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "tests/batch_tests.rs"]
mod tests;
