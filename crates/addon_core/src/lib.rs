//! Add-on list synchronization and batch update orchestration.
//!
//! [`controller::AddonListController`] owns the displayed list and applies
//! reloads, lifecycle events and user commands to it in arrival order.
//! [`orchestration::spawn_controller`] runs it on a task and hands back a
//! [`orchestration::ControllerHandle`] for queuing commands and watching the
//! published [`view_state::ViewState`].

pub mod batch;
pub mod columns;
pub mod controller;
pub mod error;
pub mod filter;
pub mod merger;
pub mod orchestration;
pub mod projector;
pub mod selection;
pub mod service;
pub mod view_state;

pub use batch::{BatchPhase, BatchUpdateOrchestrator, ALL_CLIENTS, RETAIL_AND_CLASSIC};
pub use controller::{AddonListController, ControllerCommand};
pub use error::{BatchError, CommandError};
pub use orchestration::{spawn_controller, ControllerHandle, DEFAULT_COMMAND_QUEUE_CAPACITY};
pub use service::{
    AddonInstaller, AddonService, MissingAddonInstaller, RecordOnlyInstaller, StoredAddonService,
};
pub use view_state::ViewState;

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
