use super::*;

fn addon(id: &str, name: &str, client_type: WowClientType) -> AddonRecord {
    let mut record = AddonRecord::new(AddonId::from(id), name, client_type);
    record.author = "someone".to_string();
    record.latest_version = Some("2.0.0".to_string());
    record
}

#[tokio::test]
async fn stores_and_lists_addons_per_client() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    storage
        .upsert_addon(&addon("a", "Bagnon", WowClientType::Retail))
        .await
        .expect("save a");
    storage
        .upsert_addon(&addon("b", "Questie", WowClientType::Classic))
        .await
        .expect("save b");
    storage
        .upsert_addon(&addon("c", "Details", WowClientType::Retail))
        .await
        .expect("save c");

    let retail = storage
        .list_addons(WowClientType::Retail)
        .await
        .expect("list retail");
    let names: Vec<&str> = retail.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["Bagnon", "Details"]);

    let classic = storage
        .list_addons(WowClientType::Classic)
        .await
        .expect("list classic");
    assert_eq!(classic.len(), 1);
    assert_eq!(classic[0].latest_version.as_deref(), Some("2.0.0"));
}

#[tokio::test]
async fn upsert_overwrites_existing_record() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let mut record = addon("a", "Bagnon", WowClientType::Retail);
    storage.upsert_addon(&record).await.expect("insert");

    record.is_ignored = true;
    record.channel_type = AddonChannelType::Beta;
    storage.upsert_addon(&record).await.expect("update");

    let loaded = storage
        .get_addon(&record.id)
        .await
        .expect("load")
        .expect("present");
    assert!(loaded.is_ignored);
    assert_eq!(loaded.channel_type, AddonChannelType::Beta);
    assert_eq!(
        storage
            .list_addons(WowClientType::Retail)
            .await
            .expect("list")
            .len(),
        1
    );
}

#[tokio::test]
async fn mark_installed_stamps_version() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let record = addon("a", "Bagnon", WowClientType::Retail);
    storage.upsert_addon(&record).await.expect("insert");

    let updated = storage
        .mark_installed(&record.id, "2.0.0", Utc::now())
        .await
        .expect("mark")
        .expect("present");
    assert_eq!(updated.installed_version.as_deref(), Some("2.0.0"));
    assert!(updated.installed_at.is_some());

    let missing = storage
        .mark_installed(&AddonId::from("nope"), "1.0", Utc::now())
        .await
        .expect("mark missing");
    assert!(missing.is_none());
}

#[tokio::test]
async fn remove_reports_whether_a_row_existed() {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let record = addon("a", "Bagnon", WowClientType::Retail);
    storage.upsert_addon(&record).await.expect("insert");

    assert!(storage.remove_addon(&record.id).await.expect("remove"));
    assert!(!storage.remove_addon(&record.id).await.expect("remove again"));
    assert!(storage.get_addon(&record.id).await.expect("load").is_none());
}

#[tokio::test]
async fn creates_database_file_when_missing() {
    let temp_root = tempfile::tempdir().expect("temp dir");
    let db_path = temp_root.path().join("nested").join("addons.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let storage = Storage::new(&database_url).await.expect("db");
    drop(storage);

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );
}
