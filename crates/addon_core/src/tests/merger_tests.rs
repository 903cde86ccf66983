use super::*;
use crate::columns::SortDirection;
use shared::domain::{AddonDisplayState, WowClientType};
use std::collections::HashSet;

fn record(id: &str, name: &str, installed: Option<&str>, latest: &str) -> AddonRecord {
    let mut record = AddonRecord::new(AddonId::from(id), name, WowClientType::Retail);
    record.installed_version = installed.map(str::to_string);
    record.latest_version = Some(latest.to_string());
    record
}

fn names(merger: &ListMerger) -> Vec<&str> {
    merger.items().iter().map(|item| item.name()).collect()
}

fn assert_default_sorted(merger: &ListMerger) {
    for pair in merger.items().windows(2) {
        let key_a = (pair[0].display_state, pair[0].name());
        let key_b = (pair[1].display_state, pair[1].name());
        assert!(key_a <= key_b, "{key_a:?} sorted after {key_b:?}");
    }
}

fn sample() -> Vec<AddonRecord> {
    vec![
        record("wa", "WeakAuras", Some("5.0"), "5.1"),
        record("bag", "Bagnon", Some("9.0"), "9.0"),
        record("dbm", "DBM", None, "10.0"),
        record("det", "Details", Some("1.0"), "1.0"),
    ]
}

#[test]
fn replace_all_sorts_by_state_then_name() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());
    assert_eq!(names(&merger), vec!["Bagnon", "Details", "DBM", "WeakAuras"]);
    assert_default_sorted(&merger);
}

#[test]
fn name_ordering_is_case_sensitive() {
    let mut merger = ListMerger::new();
    merger.replace_all(&[
        record("a", "alpha", Some("1"), "1"),
        record("b", "Beta", Some("1"), "1"),
    ]);
    assert_eq!(names(&merger), vec!["Beta", "alpha"]);
}

#[test]
fn install_event_for_unknown_id_inserts_one_item() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());

    let x = record("x", "Xperl", None, "3.0");
    let outcome = merger.apply_install_event(&x, AddonInstallState::Downloading, Some(40));

    assert_eq!(outcome, MergeOutcome::Inserted);
    assert_eq!(merger.len(), 5);
    let item = merger.get(&AddonId::from("x")).expect("inserted");
    assert!(item.is_installing);
    assert_eq!(item.status_text, "Downloading");
    assert_eq!(item.install_progress, Some(40));
    assert_default_sorted(&merger);
}

#[test]
fn install_event_for_known_id_updates_in_place() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());

    let mut updated = record("wa", "WeakAuras", Some("5.1"), "5.1");
    updated.author = "WeakAuras Team".to_string();
    let outcome = merger.apply_install_event(&updated, AddonInstallState::Complete, Some(100));

    assert_eq!(outcome, MergeOutcome::Updated);
    assert_eq!(merger.len(), 4);
    let item = merger.get(&AddonId::from("wa")).expect("present");
    assert_eq!(item.display_state, AddonDisplayState::UpToDate);
    assert_eq!(item.status_text, "Complete");
    assert!(!item.is_installing);
    assert_eq!(item.addon.author, "WeakAuras Team");
    assert_default_sorted(&merger);
}

#[test]
fn out_of_order_events_leave_last_applied_state() {
    let mut merger = ListMerger::new();
    let addon = record("x", "Xperl", Some("2.0"), "3.0");

    merger.apply_install_event(&addon, AddonInstallState::Complete, Some(100));
    merger.apply_install_event(&addon, AddonInstallState::Installing, Some(80));

    let item = merger.get(&AddonId::from("x")).expect("present");
    assert_eq!(merger.len(), 1);
    assert!(item.is_installing);
    assert_eq!(item.status_text, "Installing");
    assert_eq!(item.install_progress, Some(80));
}

#[test]
fn removal_of_unknown_id_is_a_noop() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());
    let before = names(&merger).into_iter().map(str::to_string).collect::<Vec<_>>();

    assert!(merger.apply_removal(&AddonId::from("ghost")).is_none());

    assert_eq!(merger.len(), 4);
    assert_eq!(names(&merger), before);
}

#[test]
fn duplicate_removal_events_are_tolerated() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());

    assert!(merger.apply_removal(&AddonId::from("dbm")).is_some());
    assert!(merger.apply_removal(&AddonId::from("dbm")).is_none());
    assert_eq!(names(&merger), vec!["Bagnon", "Details", "WeakAuras"]);
}

#[test]
fn mixed_event_sequences_never_duplicate_ids() {
    let mut merger = ListMerger::new();
    let records = sample();
    let states = [
        AddonInstallState::Pending,
        AddonInstallState::Downloading,
        AddonInstallState::BackingUp,
        AddonInstallState::Installing,
        AddonInstallState::Complete,
    ];

    for round in 0..25usize {
        let target = &records[round % records.len()];
        match round % 4 {
            0 | 1 => {
                merger.apply_install_event(target, states[round % states.len()], Some(round as u8));
            }
            2 => {
                merger.apply_removal(&target.id);
            }
            _ => {
                merger.apply_edit(target);
            }
        }
        if round % 10 == 9 {
            merger.replace_all(&records);
        }

        let unique: HashSet<&AddonId> = merger.items().iter().map(|item| item.id()).collect();
        assert_eq!(unique.len(), merger.len(), "duplicate row after round {round}");
        assert_default_sorted(&merger);
    }
}

#[test]
fn replace_all_collapses_duplicate_records() {
    let mut merger = ListMerger::new();
    let mut records = sample();
    records.push(record("bag", "Bagnon", Some("8.0"), "9.0"));
    merger.replace_all(&records);

    assert_eq!(merger.len(), 4);
    assert_eq!(
        merger.get(&AddonId::from("bag")).expect("bag").display_state,
        AddonDisplayState::Update
    );
}

#[test]
fn incremental_merge_keeps_selection_but_reload_clears_it() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());
    for item in merger.items_mut() {
        item.selected = true;
    }

    let wa = record("wa", "WeakAuras", Some("5.0"), "5.1");
    merger.apply_install_event(&wa, AddonInstallState::Downloading, Some(10));
    assert!(merger.items().iter().all(|item| item.selected));

    merger.replace_all(&sample());
    assert!(merger.items().iter().all(|item| !item.selected));
    assert!(merger.items().iter().all(|item| !item.is_installing));
}

#[test]
fn edit_keeps_install_progress() {
    let mut merger = ListMerger::new();
    let mut wa = record("wa", "WeakAuras", Some("5.0"), "5.1");
    merger.apply_install_event(&wa, AddonInstallState::Downloading, Some(55));

    wa.is_ignored = true;
    merger.apply_edit(&wa);

    let item = merger.get(&wa.id).expect("present");
    assert_eq!(item.display_state, AddonDisplayState::Ignored);
    assert_eq!(item.status_text, "Ignored");
    assert!(item.is_installing);
    assert_eq!(item.install_progress, Some(55));
}

#[test]
fn user_sort_overrides_default_until_cleared() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());

    merger.set_user_sort(Some(UserSort::new(SortColumn::Name, SortDirection::Descending)));
    assert_eq!(names(&merger), vec!["WeakAuras", "Details", "DBM", "Bagnon"]);

    merger.apply_install_event(
        &record("aaa", "Angrier", None, "1.0"),
        AddonInstallState::Pending,
        None,
    );
    assert_eq!(names(&merger).last(), Some(&"Angrier"));

    merger.set_user_sort(None);
    assert_default_sorted(&merger);
}

#[test]
fn suggested_sort_column_depends_on_pending_updates() {
    let mut merger = ListMerger::new();
    merger.replace_all(&[record("bag", "Bagnon", Some("9.0"), "9.0")]);
    assert_eq!(merger.suggested_sort_column(), SortColumn::Name);

    merger.replace_all(&sample());
    assert_eq!(merger.suggested_sort_column(), SortColumn::DisplayState);
}

#[test]
fn rows_awaiting_first_install_keep_name_as_suggested_column() {
    let mut merger = ListMerger::new();
    merger.replace_all(&[
        record("dbm", "DBM", None, "10.0"),
        record("bag", "Bagnon", Some("9.0"), "9.0"),
    ]);
    assert_eq!(
        merger.get(&AddonId::from("dbm")).map(|item| item.display_state),
        Some(AddonDisplayState::Install)
    );
    assert_eq!(merger.suggested_sort_column(), SortColumn::Name);
}

#[test]
fn mark_installing_only_touches_known_rows() {
    let mut merger = ListMerger::new();
    merger.replace_all(&sample());
    assert!(merger.mark_installing(&AddonId::from("wa")));
    assert!(!merger.mark_installing(&AddonId::from("ghost")));
    assert!(merger.get(&AddonId::from("wa")).expect("wa").is_installing);
}
