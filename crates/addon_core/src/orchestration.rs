//! Command orchestration from callers to the controller task.

use std::sync::Arc;

use shared::domain::WowClientType;
use tokio::{
    sync::{
        mpsc::{self, error::TrySendError},
        watch,
    },
    task::JoinHandle,
};

use crate::{
    controller::{AddonListController, ControllerCommand},
    error::CommandError,
    service::AddonService,
    view_state::ViewState,
};

pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 64;

/// Caller side of a running controller.
pub struct ControllerHandle {
    commands: mpsc::Sender<ControllerCommand>,
    view: watch::Receiver<ViewState>,
    task: JoinHandle<()>,
}

pub fn spawn_controller(
    service: Arc<dyn AddonService>,
    client_type: WowClientType,
    command_queue_capacity: usize,
) -> ControllerHandle {
    let (controller, view) = AddonListController::new(service, client_type);
    let (commands, command_rx) = mpsc::channel(command_queue_capacity.max(1));
    let task = tokio::spawn(controller.run(command_rx));
    ControllerHandle {
        commands,
        view,
        task,
    }
}

impl ControllerHandle {
    /// Queues a command without waiting for queue space.
    pub fn dispatch(&self, command: ControllerCommand) -> Result<(), CommandError> {
        let command_name = command.name();
        match self.commands.try_send(command) {
            Ok(()) => {
                tracing::debug!(command = command_name, "queued addon list command");
                Ok(())
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(command = command_name, "addon list command queue is full");
                Err(CommandError::QueueFull)
            }
            Err(TrySendError::Closed(_)) => Err(CommandError::Disconnected),
        }
    }

    /// Queues a command, waiting for queue space.
    pub async fn send(&self, command: ControllerCommand) -> Result<(), CommandError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| CommandError::Disconnected)
    }

    pub fn view(&self) -> watch::Receiver<ViewState> {
        self.view.clone()
    }

    pub fn snapshot(&self) -> ViewState {
        self.view.borrow().clone()
    }

    /// Waits until a published view satisfies `predicate`, checking the
    /// current one first.
    pub async fn wait_until<F>(&self, predicate: F) -> Result<ViewState, CommandError>
    where
        F: FnMut(&ViewState) -> bool,
    {
        let mut view = self.view.clone();
        let state = view
            .wait_for(predicate)
            .await
            .map_err(|_| CommandError::Disconnected)?;
        Ok(state.clone())
    }

    /// Stops the controller and waits for its task to finish.
    pub async fn shutdown(self) -> Result<(), CommandError> {
        // A closed queue means the task is already gone; join it either way.
        let _ = self.commands.send(ControllerCommand::Shutdown).await;
        self.task.await.map_err(|_| CommandError::Disconnected)
    }
}
