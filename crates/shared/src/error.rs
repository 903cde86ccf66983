use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    Transport,
    Io,
    NotFound,
    Download,
    Extraction,
    Permission,
    Internal,
}

/// Failure reported by an add-on collaborator (catalog, persistence, installer).
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{kind:?}: {message}")]
pub struct ServiceError {
    pub kind: ServiceErrorKind,
    pub message: String,
}

impl ServiceError {
    pub fn new(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Transport, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Io, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::NotFound, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ServiceErrorKind::Internal, message)
    }

    /// Install failures that only affect the add-on being installed. An
    /// add-on removed after a batch took its snapshot reports `NotFound`.
    pub fn is_item_local(&self) -> bool {
        matches!(
            self.kind,
            ServiceErrorKind::NotFound
                | ServiceErrorKind::Download
                | ServiceErrorKind::Extraction
                | ServiceErrorKind::Permission
        )
    }
}
