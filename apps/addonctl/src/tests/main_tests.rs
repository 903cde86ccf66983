use super::*;
use addon_core::projector::project;
use shared::domain::AddonInstallState;

fn record() -> AddonRecord {
    let mut record =
        AddonRecord::new(AddonId::from("dbm"), "Deadly Boss Mods", WowClientType::Retail);
    record.latest_version = Some("11.0.5".to_string());
    record
}

#[test]
fn row_shows_status_versions_and_id() {
    let row = format_row(&project(&record()));
    assert!(row.starts_with("Install "));
    assert!(row.contains("Deadly Boss Mods"));
    assert!(row.contains("None"));
    assert!(row.contains("11.0.5"));
    assert!(row.ends_with("dbm"));
}

#[test]
fn row_shows_progress_while_installing() {
    let item = project(&record()).with_install_status(AddonInstallState::Downloading, Some(40));
    assert!(format_row(&item).starts_with("Downloading 40%"));
}

#[test]
fn cli_parses_client_lists() {
    let cli = Cli::try_parse_from(["addonctl", "update-all", "--clients", "retail,classic_era"])
        .expect("parse");
    match cli.command {
        Command::UpdateAll { clients } => assert_eq!(
            clients,
            vec![WowClientType::Retail, WowClientType::ClassicEra]
        ),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_rejects_unknown_client() {
    assert!(Cli::try_parse_from(["addonctl", "list", "--client", "mists"]).is_err());
}
