use shared::{
    domain::{AddonId, WowClientType},
    error::ServiceError,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum BatchError {
    #[error("failed to gather addons for {client}: {source}")]
    Gather {
        client: WowClientType,
        #[source]
        source: ServiceError,
    },
    #[error("install of addon {addon_id} aborted the batch: {source}")]
    Install {
        addon_id: AddonId,
        #[source]
        source: ServiceError,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("addon list command queue is full; retry")]
    QueueFull,
    #[error("addon list controller is no longer running")]
    Disconnected,
}
