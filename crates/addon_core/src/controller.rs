//! Single owning task for the add-on list.
//!
//! Every mutation of the list happens on the controller task. Fetches,
//! installs and saves run as spawned tasks that post their results back into
//! the controller mailbox, so the loop itself never awaits collaborator I/O.
//! `controls_enabled` is the only guard against overlapping reloads and
//! batches; it is cleared on every terminal path of the work that set it.
//! Lifecycle events dropped while that work runs are recovered by one more
//! reload before controls come back.

use std::{future::Future, sync::Arc};

use shared::{
    domain::{
        AddonChannelType, AddonId, AddonRecord, WowClientType, DEFAULT_THUMBNAIL,
        NO_INSTALLED_VERSION,
    },
    error::ServiceError,
    protocol::AddonLifecycleEvent,
};
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::{
    batch::{BatchJob, BatchPhase, BatchSummary, BatchUpdateOrchestrator},
    columns::UserSort,
    error::BatchError,
    filter::FilterEngine,
    merger::ListMerger,
    projector::DisplayListItem,
    selection::{self, Modifiers},
    service::AddonService,
    view_state::{context_text, ViewState},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerCommand {
    SelectClient(WowClientType),
    Reload,
    Rescan,
    /// Click on a row, addressed by its index in the sorted list.
    RowClicked {
        index: usize,
        modifiers: Modifiers,
    },
    SetFilter(String),
    ClearFilter,
    SetUserSort(Option<UserSort>),
    SetColumnVisible {
        name: String,
        visible: bool,
    },
    /// Updates every row of the current list that needs work.
    UpdateAll,
    /// Gathers and updates the given clients, then reloads the current one.
    UpdateAllForClients(Vec<WowClientType>),
    UpdateAddon(AddonId),
    ReinstallAddon(AddonId),
    RemoveAddon(AddonId),
    SetIgnored {
        addon_id: AddonId,
        ignored: bool,
    },
    SetAutoUpdate {
        addon_id: AddonId,
        enabled: bool,
    },
    SetChannel {
        addon_id: AddonId,
        channel: AddonChannelType,
    },
    Shutdown,
}

impl ControllerCommand {
    pub fn name(&self) -> &'static str {
        match self {
            ControllerCommand::SelectClient(_) => "select_client",
            ControllerCommand::Reload => "reload",
            ControllerCommand::Rescan => "rescan",
            ControllerCommand::RowClicked { .. } => "row_clicked",
            ControllerCommand::SetFilter(_) => "set_filter",
            ControllerCommand::ClearFilter => "clear_filter",
            ControllerCommand::SetUserSort(_) => "set_user_sort",
            ControllerCommand::SetColumnVisible { .. } => "set_column_visible",
            ControllerCommand::UpdateAll => "update_all",
            ControllerCommand::UpdateAllForClients(_) => "update_all_for_clients",
            ControllerCommand::UpdateAddon(_) => "update_addon",
            ControllerCommand::ReinstallAddon(_) => "reinstall_addon",
            ControllerCommand::RemoveAddon(_) => "remove_addon",
            ControllerCommand::SetIgnored { .. } => "set_ignored",
            ControllerCommand::SetAutoUpdate { .. } => "set_auto_update",
            ControllerCommand::SetChannel { .. } => "set_channel",
            ControllerCommand::Shutdown => "shutdown",
        }
    }
}

/// Results of spawned work, posted back to the controller task.
enum Completion {
    ReloadFinished {
        client_type: WowClientType,
        result: Result<Vec<AddonRecord>, ServiceError>,
    },
    BatchProgress(BatchJob),
    BatchFinished {
        result: Result<BatchSummary, BatchError>,
        reload_after: bool,
    },
    OperationFinished {
        addon_id: AddonId,
        operation: &'static str,
        result: Result<(), ServiceError>,
        reload_after: bool,
    },
}

pub struct AddonListController {
    service: Arc<dyn AddonService>,
    merger: ListMerger,
    filter: FilterEngine,
    view: ViewState,
    view_tx: watch::Sender<ViewState>,
    events: broadcast::Receiver<AddonLifecycleEvent>,
    events_open: bool,
    /// Lifecycle events were dropped while controls were disabled.
    reload_pending: bool,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
}

impl AddonListController {
    /// Builds the controller and subscribes to the lifecycle stream
    /// immediately, so no event emitted after this call is missed.
    pub fn new(
        service: Arc<dyn AddonService>,
        client_type: WowClientType,
    ) -> (Self, watch::Receiver<ViewState>) {
        let view = ViewState::new(client_type);
        let (view_tx, view_rx) = watch::channel(view.clone());
        let events = service.subscribe_events();
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();
        let controller = Self {
            service,
            merger: ListMerger::new(),
            filter: FilterEngine::default(),
            view,
            view_tx,
            events,
            events_open: true,
            reload_pending: false,
            completion_tx,
            completion_rx,
        };
        (controller, view_rx)
    }

    pub async fn run(mut self, mut commands: mpsc::Receiver<ControllerCommand>) {
        info!(client = %self.view.client_type, "addon list: controller started");
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(ControllerCommand::Shutdown) | None => break,
                    Some(command) => self.handle_command(command),
                },
                event = self.events.recv(), if self.events_open => match event {
                    Ok(event) => self.apply_event(event),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "addon list: lifecycle stream lagged");
                        if self.view.controls_enabled {
                            self.start_reload(false);
                        } else {
                            self.reload_pending = true;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        warn!("addon list: lifecycle stream closed");
                        self.events_open = false;
                    }
                },
                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion)
                }
            }
            self.publish();
        }
        info!("addon list: controller stopped");
    }

    fn publish(&mut self) {
        self.view.sync_list(&self.merger, &self.filter);
        self.view_tx.send_replace(self.view.clone());
    }

    fn handle_command(&mut self, command: ControllerCommand) {
        debug!(command = command.name(), "addon list: handling command");
        match command {
            ControllerCommand::SelectClient(client_type) => {
                if !self.controls_available("select_client") {
                    return;
                }
                self.view.client_type = client_type;
                self.merger.replace_all(&[]);
                self.start_reload(false);
            }
            ControllerCommand::Reload => {
                if self.controls_available("reload") {
                    self.start_reload(false);
                }
            }
            ControllerCommand::Rescan => {
                if self.controls_available("rescan") {
                    self.start_reload(true);
                }
            }
            ControllerCommand::RowClicked { index, modifiers } => {
                if !selection::click(self.merger.items_mut(), index, modifiers) {
                    debug!(index, "addon list: click outside the list ignored");
                }
            }
            ControllerCommand::SetFilter(text) => self.filter.set_text(&text),
            ControllerCommand::ClearFilter => self.filter.clear(),
            ControllerCommand::SetUserSort(user_sort) => self.merger.set_user_sort(user_sort),
            ControllerCommand::SetColumnVisible { name, visible } => {
                if !self.view.columns.set_visible(&name, visible) {
                    warn!(column = %name, "addon list: column cannot be toggled");
                }
            }
            ControllerCommand::UpdateAll => {
                if !self.controls_available("update_all") {
                    return;
                }
                let snapshot: Vec<AddonRecord> = self
                    .merger
                    .items()
                    .iter()
                    .map(persisted_record)
                    .collect();
                self.start_batch(None, snapshot);
            }
            ControllerCommand::UpdateAllForClients(clients) => {
                if self.controls_available("update_all_for_clients") {
                    self.start_batch(Some(clients), Vec::new());
                }
            }
            ControllerCommand::UpdateAddon(addon_id) => self.start_install(addon_id, "update"),
            ControllerCommand::ReinstallAddon(addon_id) => {
                self.start_install(addon_id, "reinstall")
            }
            ControllerCommand::RemoveAddon(addon_id) => self.start_remove(addon_id),
            ControllerCommand::SetIgnored { addon_id, ignored } => {
                self.edit_and_save(addon_id, false, |addon| addon.is_ignored = ignored)
            }
            ControllerCommand::SetAutoUpdate { addon_id, enabled } => {
                self.edit_and_save(addon_id, false, |addon| addon.auto_update_enabled = enabled)
            }
            ControllerCommand::SetChannel { addon_id, channel } => {
                self.edit_and_save(addon_id, true, |addon| addon.channel_type = channel)
            }
            ControllerCommand::Shutdown => {}
        }
    }

    fn controls_available(&self, command: &'static str) -> bool {
        if !self.view.controls_enabled {
            warn!(command, "addon list: command rejected while busy");
            return false;
        }
        true
    }

    fn set_busy(&mut self) {
        self.view.busy = true;
        self.view.controls_enabled = false;
    }

    fn clear_busy(&mut self) {
        self.view.busy = false;
        self.view.controls_enabled = true;
    }

    /// Ends the busy period, unless events were dropped during it: then the
    /// list is fetched again first and the current error stays visible.
    fn finish_busy(&mut self) {
        if self.reload_pending {
            info!("addon list: reloading after dropped lifecycle events");
            self.spawn_reload(false);
        } else {
            self.clear_busy();
        }
    }

    fn start_reload(&mut self, rescan: bool) {
        self.view.last_error = None;
        self.spawn_reload(rescan);
    }

    fn spawn_reload(&mut self, rescan: bool) {
        self.set_busy();
        self.reload_pending = false;
        let client_type = self.view.client_type;
        info!(client = %client_type, rescan, "addon list: loading addons");

        let service = Arc::clone(&self.service);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = service.get_addons(client_type, rescan).await;
            let _ = completion_tx.send(Completion::ReloadFinished {
                client_type,
                result,
            });
        });
    }

    /// `clients` set: gather those clients and reload afterwards. Otherwise
    /// the snapshot is updated as-is.
    fn start_batch(&mut self, clients: Option<Vec<WowClientType>>, snapshot: Vec<AddonRecord>) {
        self.set_busy();
        self.view.last_error = None;
        self.view.batch_phase = BatchPhase::Idle;

        let orchestrator = BatchUpdateOrchestrator::new(Arc::clone(&self.service));
        let completion_tx = self.completion_tx.clone();
        let progress_tx = self.completion_tx.clone();
        let on_progress = move |job: &BatchJob| {
            let _ = progress_tx.send(Completion::BatchProgress(job.clone()));
        };
        let reload_after = clients.is_some();

        tokio::spawn(async move {
            let result = match clients {
                Some(clients) => orchestrator.update_clients(&clients, on_progress).await,
                None => orchestrator.update_addons(snapshot, on_progress).await,
            };
            let _ = completion_tx.send(Completion::BatchFinished {
                result,
                reload_after,
            });
        });
    }

    fn start_install(&mut self, addon_id: AddonId, operation: &'static str) {
        if !self.merger.mark_installing(&addon_id) {
            warn!(addon_id = %addon_id, operation, "addon list: addon is not in the list");
            return;
        }
        info!(addon_id = %addon_id, operation, "addon list: installing addon");

        let service = Arc::clone(&self.service);
        let id = addon_id.clone();
        self.spawn_operation(addon_id, operation, false, async move {
            service.install_addon(&id).await
        });
    }

    fn start_remove(&mut self, addon_id: AddonId) {
        let Some(item) = self.merger.get(&addon_id) else {
            warn!(addon_id = %addon_id, "addon list: cannot remove an addon that is not listed");
            return;
        };
        let record = persisted_record(item);

        // The row goes away when the removal event arrives.
        let service = Arc::clone(&self.service);
        self.spawn_operation(addon_id, "remove", false, async move {
            service.remove_addon(&record).await
        });
    }

    fn edit_and_save<F>(&mut self, addon_id: AddonId, reload_after: bool, edit: F)
    where
        F: FnOnce(&mut AddonRecord),
    {
        let Some(item) = self.merger.get(&addon_id) else {
            warn!(addon_id = %addon_id, "addon list: cannot edit an addon that is not listed");
            return;
        };
        let mut record = persisted_record(item);
        edit(&mut record);
        self.merger.apply_edit(&record);

        let service = Arc::clone(&self.service);
        self.spawn_operation(addon_id, "save", reload_after, async move {
            service.save_addon(&record).await
        });
    }

    fn spawn_operation<Fut>(
        &mut self,
        addon_id: AddonId,
        operation: &'static str,
        reload_after: bool,
        work: Fut,
    ) where
        Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
    {
        self.view.pending_operations += 1;
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = work.await;
            let _ = completion_tx.send(Completion::OperationFinished {
                addon_id,
                operation,
                result,
                reload_after,
            });
        });
    }

    fn apply_event(&mut self, event: AddonLifecycleEvent) {
        match event {
            AddonLifecycleEvent::Installed {
                addon,
                install_state,
                progress,
            } => {
                if addon.client_type != self.view.client_type {
                    debug!(
                        addon_id = %addon.id,
                        client = %addon.client_type,
                        "addon list: ignoring event for another client"
                    );
                    return;
                }
                self.merger
                    .apply_install_event(&addon, install_state, progress);
            }
            AddonLifecycleEvent::Removed { addon_id } => {
                if self.merger.apply_removal(&addon_id).is_none() {
                    debug!(addon_id = %addon_id, "addon list: removal for unlisted addon");
                }
            }
        }
    }

    fn apply_load(
        &mut self,
        client_type: WowClientType,
        result: Result<Vec<AddonRecord>, ServiceError>,
    ) {
        match result {
            Ok(addons) => {
                self.merger.replace_all(&addons);
                self.view.suggested_sort_column = self.merger.suggested_sort_column();
                self.view.context_text = context_text(self.merger.len());
                info!(
                    client = %client_type,
                    count = self.merger.len(),
                    "addon list: addons loaded"
                );
            }
            Err(err) => {
                error!(client = %client_type, "addon list: failed to load addons: {err}");
                self.view.last_error = Some(err.to_string());
            }
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::ReloadFinished {
                client_type,
                result,
            } => {
                self.view.progress_message.clear();
                if client_type != self.view.client_type {
                    debug!(client = %client_type, "addon list: dropping stale load");
                } else {
                    self.apply_load(client_type, result);
                }
                self.finish_busy();
            }
            Completion::BatchProgress(job) => {
                self.view.batch_phase = job.phase;
                self.view.progress_message = job.message;
            }
            Completion::BatchFinished {
                result,
                reload_after,
            } => match result {
                Ok(summary) => {
                    self.view.batch_phase = BatchPhase::Done;
                    if !summary.failed.is_empty() {
                        warn!(
                            failed = summary.failed.len(),
                            "addon list: some addons failed to update"
                        );
                    }
                    if reload_after {
                        self.start_reload(false);
                    } else {
                        self.view.progress_message.clear();
                        self.finish_busy();
                    }
                }
                Err(err) => {
                    error!("addon list: batch update failed: {err}");
                    self.view.batch_phase = BatchPhase::Failed;
                    self.view.progress_message.clear();
                    self.view.last_error = Some(err.to_string());
                    self.finish_busy();
                }
            },
            Completion::OperationFinished {
                addon_id,
                operation,
                result,
                reload_after,
            } => {
                self.view.pending_operations = self.view.pending_operations.saturating_sub(1);
                match result {
                    Ok(()) => {
                        debug!(
                            addon_id = %addon_id,
                            operation,
                            "addon list: operation finished"
                        );
                        // A running batch reloads on its own when it finishes.
                        if reload_after && self.view.controls_enabled {
                            self.start_reload(false);
                        }
                    }
                    Err(err) => {
                        error!(
                            addon_id = %addon_id,
                            operation,
                            "addon list: operation failed: {err}"
                        );
                        self.view.last_error =
                            Some(format!("{operation} failed for {addon_id}: {err}"));
                    }
                }
            }
        }
    }
}

/// The record as it should be written back: display placeholders for the
/// thumbnail and installed version are not persisted.
fn persisted_record(item: &DisplayListItem) -> AddonRecord {
    let mut record = item.addon.clone();
    if record.thumbnail_url.as_deref() == Some(DEFAULT_THUMBNAIL) {
        record.thumbnail_url = None;
    }
    if record.installed_version.as_deref() == Some(NO_INSTALLED_VERSION) {
        record.installed_version = None;
    }
    record
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
