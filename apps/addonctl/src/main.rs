use std::{path::PathBuf, sync::Arc};

use addon_core::{
    projector::DisplayListItem, spawn_controller, ControllerCommand, ControllerHandle,
    RecordOnlyInstaller, StoredAddonService, ViewState,
};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use game_locator::{InstallationLocator, LutrisLocator};
use shared::domain::{AddonId, AddonRecord, WowClientType};
use storage::Storage;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, prepare_database_url, Settings};

#[derive(Parser, Debug)]
#[command(name = "addonctl", about = "Inspect and update World of Warcraft add-ons")]
struct Cli {
    /// Overrides the configured database url.
    #[arg(long)]
    database_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lists the add-ons of one client.
    List {
        #[arg(long)]
        client: Option<WowClientType>,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long)]
        rescan: bool,
    },
    /// Registers an add-on record.
    Add {
        name: String,
        #[arg(long)]
        latest: String,
        #[arg(long)]
        installed: Option<String>,
        #[arg(long)]
        client: Option<WowClientType>,
        #[arg(long, default_value = "")]
        author: String,
        #[arg(long, default_value = "local")]
        provider: String,
        #[arg(long, default_value = "")]
        game_version: String,
        #[arg(long)]
        id: Option<String>,
    },
    /// Installs or updates every add-on that needs it across clients.
    UpdateAll {
        #[arg(long, value_delimiter = ',')]
        clients: Vec<WowClientType>,
    },
    /// Looks for a WoW installation in the Lutris library.
    Locate {
        #[arg(long)]
        home: Option<PathBuf>,
    },
    Remove {
        id: String,
        #[arg(long)]
        client: Option<WowClientType>,
    },
    /// Ignores an add-on in batch updates (`--off` to stop ignoring it).
    Ignore {
        id: String,
        #[arg(long)]
        off: bool,
        #[arg(long)]
        client: Option<WowClientType>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(database_url) = cli.database_url {
        settings.database_url = database_url;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Command::List {
            client,
            filter,
            rescan,
        } => {
            let client = client.unwrap_or(settings.default_client);
            let handle = open_controller(&settings, client).await?;
            if let Some(filter) = filter {
                handle.send(ControllerCommand::SetFilter(filter)).await?;
            }
            let view = load(&handle, rescan).await?;
            for item in &view.visible_items {
                println!("{}", format_row(item));
            }
            println!("{} ({})", view.context_text, view.client_type);
            handle.shutdown().await?;
        }
        Command::Add {
            name,
            latest,
            installed,
            client,
            author,
            provider,
            game_version,
            id,
        } => {
            let storage = open_storage(&settings).await?;
            let id = id.map(AddonId::new).unwrap_or_else(AddonId::generate);
            let mut record =
                AddonRecord::new(id, name, client.unwrap_or(settings.default_client));
            record.latest_version = Some(latest);
            record.installed_version = installed;
            record.author = author;
            record.provider_name = provider;
            record.game_version = game_version;
            storage.upsert_addon(&record).await?;
            println!(
                "added addon_id={} state={}",
                record.id,
                record.display_state().label()
            );
        }
        Command::UpdateAll { clients } => {
            let clients = if clients.is_empty() {
                settings.batch_clients.clone()
            } else {
                clients
            };
            update_all(&settings, clients).await?;
        }
        Command::Locate { home } => {
            let locator = match home {
                Some(home) => LutrisLocator::new(home),
                None => LutrisLocator::from_home_dir().context("no home directory")?,
            };
            match locator.product_root().await {
                Some(root) => println!("product root: {}", root.display()),
                None => println!("product root: not found"),
            }
            match locator.blizzard_agent_path().await {
                Some(path) => println!("blizzard agent: {}", path.display()),
                None => println!("blizzard agent: not found"),
            }
            for client in WowClientType::ALL {
                if let Some(exe) = locator.executable_name(client) {
                    println!("{:<14} {exe}", client.label());
                }
            }
        }
        Command::Remove { id, client } => {
            let addon_id = AddonId::new(id);
            let client = client.unwrap_or(settings.default_client);
            let handle = open_controller(&settings, client).await?;
            load(&handle, false).await?;
            ensure_listed(&handle, &addon_id)?;
            handle
                .send(ControllerCommand::RemoveAddon(addon_id.clone()))
                .await?;
            let view = handle
                .wait_until(|view| {
                    view.pending_operations == 0
                        && (view.item(&addon_id).is_none() || view.last_error.is_some())
                })
                .await?;
            if let Some(err) = view.last_error {
                bail!(err);
            }
            println!("removed addon_id={addon_id}");
            handle.shutdown().await?;
        }
        Command::Ignore { id, off, client } => {
            let addon_id = AddonId::new(id);
            let ignored = !off;
            let client = client.unwrap_or(settings.default_client);
            let handle = open_controller(&settings, client).await?;
            load(&handle, false).await?;
            ensure_listed(&handle, &addon_id)?;
            handle
                .send(ControllerCommand::SetIgnored {
                    addon_id: addon_id.clone(),
                    ignored,
                })
                .await?;
            let view = handle
                .wait_until(|view| {
                    view.pending_operations == 0
                        && view
                            .item(&addon_id)
                            .is_some_and(|item| item.addon.is_ignored == ignored)
                })
                .await?;
            if let Some(err) = view.last_error {
                bail!(err);
            }
            println!("addon_id={addon_id} ignored={ignored}");
            handle.shutdown().await?;
        }
    }

    Ok(())
}

async fn open_storage(settings: &Settings) -> Result<Storage> {
    let database_url = prepare_database_url(&settings.database_url);
    Storage::new(&database_url).await.map_err(|err| {
        error!(%database_url, "failed to open addon database: {err:#}");
        err
    })
}

async fn open_controller(settings: &Settings, client: WowClientType) -> Result<ControllerHandle> {
    let storage = open_storage(settings).await?;
    let service = Arc::new(StoredAddonService::new(storage, Arc::new(RecordOnlyInstaller)));
    Ok(spawn_controller(
        service,
        client,
        settings.command_queue_capacity,
    ))
}

/// Reloads the current client and waits for the result.
async fn load(handle: &ControllerHandle, rescan: bool) -> Result<ViewState> {
    let command = if rescan {
        ControllerCommand::Rescan
    } else {
        ControllerCommand::Reload
    };
    handle.send(command).await?;
    let view = handle
        .wait_until(|view| {
            view.controls_enabled && (!view.context_text.is_empty() || view.last_error.is_some())
        })
        .await?;
    if let Some(err) = &view.last_error {
        bail!("failed to load addons for {}: {err}", view.client_type);
    }
    Ok(view)
}

fn ensure_listed(handle: &ControllerHandle, addon_id: &AddonId) -> Result<()> {
    let view = handle.snapshot();
    if view.item(addon_id).is_none() {
        bail!("addon {addon_id} is not installed for {}", view.client_type);
    }
    Ok(())
}

async fn update_all(settings: &Settings, clients: Vec<WowClientType>) -> Result<()> {
    let handle = open_controller(settings, settings.default_client).await?;
    load(&handle, false).await?;

    info!(clients = ?clients, "starting batch update");
    handle
        .send(ControllerCommand::UpdateAllForClients(clients))
        .await?;

    let mut view_rx = handle.view();
    let mut last_message = String::new();
    let view = loop {
        view_rx
            .changed()
            .await
            .context("addon list controller stopped during the batch")?;
        let view = view_rx.borrow_and_update().clone();
        if !view.progress_message.is_empty() && view.progress_message != last_message {
            println!("{}", view.progress_message.replace('\n', " - "));
            last_message = view.progress_message.clone();
        }
        if view.batch_phase.is_terminal() && view.controls_enabled {
            break view;
        }
    };

    handle.shutdown().await?;
    if let Some(err) = view.last_error {
        bail!(err);
    }
    let pending = view.items.iter().filter(|item| item.needs_work()).count();
    println!("batch finished; {pending} addons still need work for {}", view.client_type);
    Ok(())
}

fn format_row(item: &DisplayListItem) -> String {
    let installed = item.addon.installed_version.as_deref().unwrap_or_default();
    let latest = item.addon.latest_version.as_deref().unwrap_or_default();
    let status = match item.install_progress {
        Some(progress) if item.is_installing => format!("{} {progress}%", item.status_text),
        _ => item.status_text.clone(),
    };
    format!(
        "{:<14} {:<32} {:<12} {:<12} {}",
        status, item.addon.name, installed, latest, item.addon.id
    )
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
