//! Authoritative, always-sorted list of add-on rows.
//!
//! Rows are keyed by add-on id: every mutation looks the row up by id, never
//! by position, so duplicate or late events cannot create a second row for
//! the same add-on. The list is re-sorted after each mutation, by the active
//! user sort if there is one, otherwise by `(display_state, name)`.

use std::cmp::Ordering;

use shared::domain::{AddonDisplayState, AddonId, AddonInstallState, AddonRecord};

use crate::{
    columns::{SortColumn, UserSort},
    projector::{project, DisplayListItem},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Inserted,
    Updated,
}

#[derive(Debug, Default, Clone)]
pub struct ListMerger {
    items: Vec<DisplayListItem>,
    user_sort: Option<UserSort>,
}

impl ListMerger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[DisplayListItem] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut [DisplayListItem] {
        &mut self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, addon_id: &AddonId) -> Option<&DisplayListItem> {
        self.items.iter().find(|item| item.id() == addon_id)
    }

    pub fn position(&self, addon_id: &AddonId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == addon_id)
    }

    pub fn user_sort(&self) -> Option<UserSort> {
        self.user_sort
    }

    pub fn set_user_sort(&mut self, user_sort: Option<UserSort>) {
        self.user_sort = user_sort;
        self.sort();
    }

    /// Merges an install lifecycle event. Unknown ids are inserted rather than
    /// rejected: the event source may race with a full reload.
    pub fn apply_install_event(
        &mut self,
        record: &AddonRecord,
        install_state: AddonInstallState,
        progress: Option<u8>,
    ) -> MergeOutcome {
        let item = project(record).with_install_status(install_state, progress);
        let outcome = self.upsert(item);
        self.sort();
        outcome
    }

    /// Merges a user edit of the record. Transient install fields survive.
    pub fn apply_edit(&mut self, record: &AddonRecord) -> MergeOutcome {
        let mut item = project(record);
        if let Some(existing) = self.get(&record.id) {
            item.is_installing = existing.is_installing;
            item.install_progress = existing.install_progress;
        }
        let outcome = self.upsert(item);
        self.sort();
        outcome
    }

    /// Removes the row for `addon_id`; absent ids are ignored.
    pub fn apply_removal(&mut self, addon_id: &AddonId) -> Option<DisplayListItem> {
        let index = self.position(addon_id)?;
        Some(self.items.remove(index))
    }

    /// Replaces the whole list. Selection and install progress are discarded.
    pub fn replace_all(&mut self, records: &[AddonRecord]) {
        self.items.clear();
        for record in records {
            self.upsert(project(record));
        }
        self.sort();
    }

    /// Flags a row as installing ahead of its first lifecycle event.
    pub fn mark_installing(&mut self, addon_id: &AddonId) -> bool {
        match self.items.iter_mut().find(|item| item.id() == addon_id) {
            Some(item) => {
                item.is_installing = true;
                true
            }
            None => false,
        }
    }

    /// Column a fresh load should present first: by name when nothing needs
    /// an update, by status otherwise. Rows waiting for a first install do
    /// not count.
    pub fn suggested_sort_column(&self) -> SortColumn {
        if self
            .items
            .iter()
            .any(|item| item.display_state == AddonDisplayState::Update)
        {
            SortColumn::DisplayState
        } else {
            SortColumn::Name
        }
    }

    fn upsert(&mut self, mut item: DisplayListItem) -> MergeOutcome {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(existing) => {
                item.selected = existing.selected;
                *existing = item;
                MergeOutcome::Updated
            }
            None => {
                self.items.push(item);
                MergeOutcome::Inserted
            }
        }
    }

    fn sort(&mut self) {
        match self.user_sort {
            Some(user_sort) => self
                .items
                .sort_by(|a, b| user_sort.compare(a, b).then_with(|| default_order(a, b))),
            None => self.items.sort_by(default_order),
        }
    }
}

fn default_order(a: &DisplayListItem, b: &DisplayListItem) -> Ordering {
    a.display_state
        .cmp(&b.display_state)
        .then_with(|| a.addon.name.cmp(&b.addon.name))
}

#[cfg(test)]
#[path = "tests/merger_tests.rs"]
mod tests;
