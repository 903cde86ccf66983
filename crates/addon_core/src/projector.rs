//! Projection of persisted add-on records into list rows.

use shared::domain::{
    AddonDisplayState, AddonId, AddonInstallState, AddonRecord, DEFAULT_THUMBNAIL,
    NO_INSTALLED_VERSION,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayListItem {
    pub addon: AddonRecord,
    pub display_state: AddonDisplayState,
    pub status_text: String,
    pub is_installing: bool,
    pub install_progress: Option<u8>,
    pub selected: bool,
}

impl DisplayListItem {
    pub fn id(&self) -> &AddonId {
        &self.addon.id
    }

    pub fn name(&self) -> &str {
        &self.addon.name
    }

    pub fn needs_work(&self) -> bool {
        self.display_state.needs_work()
    }

    /// Applies a transient install status on top of the projected row.
    pub fn with_install_status(
        mut self,
        install_state: AddonInstallState,
        progress: Option<u8>,
    ) -> Self {
        self.is_installing = install_state.is_in_progress();
        self.status_text = install_state.status_text().to_string();
        self.install_progress = progress.map(|value| value.min(100));
        self
    }
}

pub fn project(record: &AddonRecord) -> DisplayListItem {
    let display_state = AddonDisplayState::for_record(record);
    let mut addon = record.clone();

    if addon
        .thumbnail_url
        .as_deref()
        .map_or(true, |url| url.trim().is_empty())
    {
        addon.thumbnail_url = Some(DEFAULT_THUMBNAIL.to_string());
    }
    if addon.installed().is_none() {
        addon.installed_version = Some(NO_INSTALLED_VERSION.to_string());
    }

    DisplayListItem {
        addon,
        display_state,
        status_text: display_state.label().to_string(),
        is_installing: false,
        install_progress: None,
        selected: false,
    }
}
