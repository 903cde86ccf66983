//! Locates World of Warcraft installations managed through Lutris on Linux.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared::domain::WowClientType;
use tracing::{debug, info, warn};

pub const WOW_RETAIL_NAME: &str = "Wow.exe";
pub const WOW_RETAIL_PTR_NAME: &str = "WowT.exe";
pub const WOW_RETAIL_BETA_NAME: &str = "WowB.exe";
pub const WOW_CLASSIC_NAME: &str = "WowClassic.exe";
pub const WOW_CLASSIC_PTR_NAME: &str = "WowClassicT.exe";
pub const WOW_CLASSIC_BETA_NAME: &str = "WowClassicB.exe";

const WOW_APP_NAMES: [&str; 6] = [
    WOW_RETAIL_NAME,
    WOW_RETAIL_PTR_NAME,
    WOW_RETAIL_BETA_NAME,
    WOW_CLASSIC_NAME,
    WOW_CLASSIC_PTR_NAME,
    WOW_CLASSIC_BETA_NAME,
];

const WOW_CLASSIC_ERA_FOLDER: &str = "_classic_era_";
const WOW_CLASSIC_ERA_PTR_FOLDER: &str = "_classic_era_ptr_";

const LUTRIS_DEFAULT_LIBRARY_DIR: &str = "Games";
const LUTRIS_CONFIG_DIR: &str = ".config/lutris";
const LUTRIS_CONFIG_FILE: &str = "system.yml";
const LUTRIS_GAME_PATH_KEY: &str = "game_path:";

/// Wine prefixes probed in order; any of them may host every WoW product.
const LUTRIS_WOW_DIRS: [&str; 3] = [
    "battlenet/drive_c",
    "world-of-warcraft/drive_c",
    "world-of-warcraft-classic/drive_c",
];

const BLIZZARD_AGENT_DIR: &str = "ProgramData/Battle.net/Agent";
const BLIZZARD_PRODUCT_DB_NAME: &str = "product.db";

#[async_trait]
pub trait InstallationLocator: Send + Sync {
    /// Root of the prefix holding Blizzard products, if any strategy finds one.
    async fn product_root(&self) -> Option<PathBuf>;
    /// Battle.net agent product database inside the product root.
    async fn blizzard_agent_path(&self) -> Option<PathBuf>;
    fn executable_name(&self, client_type: WowClientType) -> Option<&'static str>;
    fn client_type_for_binary(&self, binary_path: &Path) -> WowClientType;
}

pub fn is_wow_application(app_name: &str) -> bool {
    WOW_APP_NAMES.contains(&app_name)
}

pub fn executable_name(client_type: WowClientType) -> Option<&'static str> {
    match client_type {
        WowClientType::Retail => Some(WOW_RETAIL_NAME),
        WowClientType::ClassicEra | WowClientType::Classic => Some(WOW_CLASSIC_NAME),
        WowClientType::RetailPtr => Some(WOW_RETAIL_PTR_NAME),
        WowClientType::ClassicPtr | WowClientType::ClassicEraPtr => Some(WOW_CLASSIC_PTR_NAME),
        WowClientType::Beta => Some(WOW_RETAIL_BETA_NAME),
        WowClientType::ClassicBeta => Some(WOW_CLASSIC_BETA_NAME),
        WowClientType::None => None,
    }
}

pub fn client_type_for_binary(binary_path: &Path) -> WowClientType {
    let Some(binary_name) = binary_path.file_name().and_then(|name| name.to_str()) else {
        return WowClientType::None;
    };
    let lowered = binary_path.to_string_lossy().to_ascii_lowercase();

    match binary_name {
        WOW_RETAIL_NAME => WowClientType::Retail,
        WOW_CLASSIC_NAME if lowered.contains(WOW_CLASSIC_ERA_FOLDER) => WowClientType::ClassicEra,
        WOW_CLASSIC_NAME => WowClientType::Classic,
        WOW_RETAIL_PTR_NAME => WowClientType::RetailPtr,
        WOW_CLASSIC_PTR_NAME if lowered.contains(WOW_CLASSIC_ERA_PTR_FOLDER) => {
            WowClientType::ClassicEraPtr
        }
        WOW_CLASSIC_PTR_NAME => WowClientType::ClassicPtr,
        WOW_RETAIL_BETA_NAME => WowClientType::Beta,
        WOW_CLASSIC_BETA_NAME => WowClientType::ClassicBeta,
        _ => WowClientType::None,
    }
}

/// Extracts the library directory from a Lutris `system.yml`.
pub fn parse_lutris_game_path(config: &str) -> Option<PathBuf> {
    config.lines().find_map(|line| {
        let (_, value) = line.split_once(LUTRIS_GAME_PATH_KEY)?;
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then(|| PathBuf::from(value))
    })
}

pub struct LutrisLocator {
    home: PathBuf,
}

impl LutrisLocator {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn from_home_dir() -> Option<Self> {
        dirs::home_dir().map(Self::new)
    }

    /// Library from the Lutris config when it points at an existing directory,
    /// otherwise the default `~/Games` library.
    async fn library_path(&self) -> Option<PathBuf> {
        let config_dir = self.home.join(LUTRIS_CONFIG_DIR);
        if !path_exists(&config_dir).await {
            debug!(path = %config_dir.display(), "locator: lutris config dir missing");
            return None;
        }

        let config_file = config_dir.join(LUTRIS_CONFIG_FILE);
        if path_exists(&config_file).await {
            match tokio::fs::read_to_string(&config_file).await {
                Ok(raw) => {
                    if let Some(candidate) = parse_lutris_game_path(&raw) {
                        if path_exists(&candidate).await {
                            return Some(candidate);
                        }
                        debug!(
                            path = %candidate.display(),
                            "locator: configured lutris library missing"
                        );
                    }
                }
                Err(err) => {
                    warn!(
                        path = %config_file.display(),
                        "locator: failed to read lutris config: {err}"
                    );
                }
            }
        }

        let fallback = self.home.join(LUTRIS_DEFAULT_LIBRARY_DIR);
        path_exists(&fallback).await.then_some(fallback)
    }
}

#[async_trait]
impl InstallationLocator for LutrisLocator {
    async fn product_root(&self) -> Option<PathBuf> {
        let library = self.library_path().await?;
        for wow_dir in LUTRIS_WOW_DIRS {
            let product_path = library.join(wow_dir);
            if path_exists(&product_path).await {
                info!(
                    path = %product_path.display(),
                    "locator: found WoW product in lutris library"
                );
                return Some(product_path);
            }
        }
        warn!(library = %library.display(), "locator: no WoW product in lutris library");
        None
    }

    async fn blizzard_agent_path(&self) -> Option<PathBuf> {
        let product_root = self.product_root().await?;
        let agent_path = product_root
            .join(BLIZZARD_AGENT_DIR)
            .join(BLIZZARD_PRODUCT_DB_NAME);
        if path_exists(&agent_path).await {
            info!(path = %agent_path.display(), "locator: found blizzard products");
            Some(agent_path)
        } else {
            debug!(path = %agent_path.display(), "locator: blizzard agent database missing");
            None
        }
    }

    fn executable_name(&self, client_type: WowClientType) -> Option<&'static str> {
        executable_name(client_type)
    }

    fn client_type_for_binary(&self, binary_path: &Path) -> WowClientType {
        client_type_for_binary(binary_path)
    }
}

async fn path_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
