use serde::{Deserialize, Serialize};

use crate::domain::{AddonId, AddonInstallState, AddonRecord};

/// Event published by the install pipeline and persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum AddonLifecycleEvent {
    Installed {
        addon: AddonRecord,
        install_state: AddonInstallState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<u8>,
    },
    Removed {
        addon_id: AddonId,
    },
}

impl AddonLifecycleEvent {
    pub fn installed(
        addon: AddonRecord,
        install_state: AddonInstallState,
        progress: Option<u8>,
    ) -> Self {
        AddonLifecycleEvent::Installed {
            addon,
            install_state,
            progress: progress.map(|value| value.min(100)),
        }
    }

    pub fn removed(addon_id: AddonId) -> Self {
        AddonLifecycleEvent::Removed { addon_id }
    }

    pub fn addon_id(&self) -> &AddonId {
        match self {
            AddonLifecycleEvent::Installed { addon, .. } => &addon.id,
            AddonLifecycleEvent::Removed { addon_id } => addon_id,
        }
    }
}
