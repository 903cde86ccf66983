use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sentinel shown in place of a missing installed version.
pub const NO_INSTALLED_VERSION: &str = "None";

/// Asset used for add-ons that carry no thumbnail of their own.
pub const DEFAULT_THUMBNAIL: &str = "assets/addon_placeholder_512.png";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddonId(pub String);

impl AddonId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AddonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AddonId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WowClientType {
    #[default]
    None,
    Retail,
    RetailPtr,
    Beta,
    ClassicEra,
    Classic,
    ClassicPtr,
    ClassicEraPtr,
    ClassicBeta,
}

impl WowClientType {
    pub const ALL: [WowClientType; 8] = [
        WowClientType::Retail,
        WowClientType::RetailPtr,
        WowClientType::Beta,
        WowClientType::ClassicEra,
        WowClientType::Classic,
        WowClientType::ClassicPtr,
        WowClientType::ClassicEraPtr,
        WowClientType::ClassicBeta,
    ];

    /// Label used in progress text and logs.
    pub fn label(self) -> &'static str {
        match self {
            WowClientType::None => "None",
            WowClientType::Retail => "Retail",
            WowClientType::RetailPtr => "RetailPtr",
            WowClientType::Beta => "Beta",
            WowClientType::ClassicEra => "ClassicEra",
            WowClientType::Classic => "Classic",
            WowClientType::ClassicPtr => "ClassicPtr",
            WowClientType::ClassicEraPtr => "ClassicEraPtr",
            WowClientType::ClassicBeta => "ClassicBeta",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WowClientType::None => "none",
            WowClientType::Retail => "retail",
            WowClientType::RetailPtr => "retail_ptr",
            WowClientType::Beta => "beta",
            WowClientType::ClassicEra => "classic_era",
            WowClientType::Classic => "classic",
            WowClientType::ClassicPtr => "classic_ptr",
            WowClientType::ClassicEraPtr => "classic_era_ptr",
            WowClientType::ClassicBeta => "classic_beta",
        }
    }
}

impl fmt::Display for WowClientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WowClientType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        if normalized == "none" {
            return Ok(WowClientType::None);
        }
        WowClientType::ALL
            .into_iter()
            .find(|client| client.as_str() == normalized)
            .ok_or_else(|| format!("unknown client type '{raw}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddonChannelType {
    #[default]
    Stable,
    Beta,
    Alpha,
}

impl AddonChannelType {
    pub fn as_str(self) -> &'static str {
        match self {
            AddonChannelType::Stable => "stable",
            AddonChannelType::Beta => "beta",
            AddonChannelType::Alpha => "alpha",
        }
    }
}

impl FromStr for AddonChannelType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "stable" => Ok(AddonChannelType::Stable),
            "beta" => Ok(AddonChannelType::Beta),
            "alpha" => Ok(AddonChannelType::Alpha),
            _ => Err(format!("unknown channel type '{raw}'")),
        }
    }
}

/// Summary of whether an add-on needs attention.
///
/// Variant order is the default sort order of the add-on list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddonDisplayState {
    UpToDate,
    Install,
    Update,
    Ignored,
    Unknown,
}

impl AddonDisplayState {
    pub fn for_record(record: &AddonRecord) -> Self {
        if record.is_ignored {
            return AddonDisplayState::Ignored;
        }
        let Some(installed) = record.installed() else {
            return AddonDisplayState::Install;
        };
        match record.latest_version.as_deref().map(str::trim) {
            None | Some("") => AddonDisplayState::Unknown,
            Some(latest) if latest != installed => AddonDisplayState::Update,
            Some(_) => AddonDisplayState::UpToDate,
        }
    }

    pub fn needs_work(self) -> bool {
        matches!(self, AddonDisplayState::Install | AddonDisplayState::Update)
    }

    pub fn label(self) -> &'static str {
        match self {
            AddonDisplayState::UpToDate => "Up to Date",
            AddonDisplayState::Install => "Install",
            AddonDisplayState::Update => "Update",
            AddonDisplayState::Ignored => "Ignored",
            AddonDisplayState::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AddonInstallState {
    #[default]
    Unknown,
    Pending,
    Downloading,
    BackingUp,
    Installing,
    Complete,
    Error,
}

impl AddonInstallState {
    pub fn is_in_progress(self) -> bool {
        matches!(
            self,
            AddonInstallState::Installing | AddonInstallState::Downloading
        )
    }

    pub fn status_text(self) -> &'static str {
        match self {
            AddonInstallState::Pending => "Pending",
            AddonInstallState::Downloading => "Downloading",
            AddonInstallState::BackingUp => "BackingUp",
            AddonInstallState::Installing => "Installing",
            AddonInstallState::Complete => "Complete",
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonRecord {
    pub id: AddonId,
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub provider_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_version: Option<String>,
    #[serde(default)]
    pub game_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub channel_type: AddonChannelType,
    #[serde(default)]
    pub is_ignored: bool,
    #[serde(default)]
    pub auto_update_enabled: bool,
    pub client_type: WowClientType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installed_at: Option<DateTime<Utc>>,
}

impl AddonRecord {
    pub fn new(id: AddonId, name: impl Into<String>, client_type: WowClientType) -> Self {
        Self {
            id,
            name: name.into(),
            author: String::new(),
            provider_name: String::new(),
            installed_version: None,
            latest_version: None,
            game_version: String::new(),
            thumbnail_url: None,
            channel_type: AddonChannelType::default(),
            is_ignored: false,
            auto_update_enabled: false,
            client_type,
            installed_at: None,
        }
    }

    /// Installed version, treating blanks and the display sentinel as absent.
    pub fn installed(&self) -> Option<&str> {
        self.installed_version
            .as_deref()
            .map(str::trim)
            .filter(|version| !version.is_empty() && *version != NO_INSTALLED_VERSION)
    }

    pub fn display_state(&self) -> AddonDisplayState {
        AddonDisplayState::for_record(self)
    }
}
