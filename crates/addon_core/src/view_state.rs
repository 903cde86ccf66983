//! Snapshot of the add-on list published to the presentation layer.

use std::collections::BTreeSet;

use shared::domain::{AddonId, WowClientType};

use crate::{
    batch::BatchPhase,
    columns::{Columns, SortColumn, UserSort},
    filter::FilterEngine,
    merger::ListMerger,
    projector::DisplayListItem,
    selection,
};

#[derive(Debug, Clone)]
pub struct ViewState {
    pub client_type: WowClientType,
    /// Authoritative sorted list.
    pub items: Vec<DisplayListItem>,
    /// `items` narrowed by the active filter, same order.
    pub visible_items: Vec<DisplayListItem>,
    pub selection: BTreeSet<AddonId>,
    pub filter_text: String,
    pub busy: bool,
    pub controls_enabled: bool,
    pub progress_message: String,
    pub context_text: String,
    pub columns: Columns,
    pub suggested_sort_column: SortColumn,
    pub user_sort: Option<UserSort>,
    pub batch_phase: BatchPhase,
    /// Single-item installs, removals and saves still in flight.
    pub pending_operations: usize,
    pub last_error: Option<String>,
}

impl ViewState {
    pub fn new(client_type: WowClientType) -> Self {
        Self {
            client_type,
            items: Vec::new(),
            visible_items: Vec::new(),
            selection: BTreeSet::new(),
            filter_text: String::new(),
            busy: false,
            controls_enabled: true,
            progress_message: String::new(),
            context_text: String::new(),
            columns: Columns::default(),
            suggested_sort_column: SortColumn::Name,
            user_sort: None,
            batch_phase: BatchPhase::Idle,
            pending_operations: 0,
            last_error: None,
        }
    }

    pub fn item(&self, addon_id: &AddonId) -> Option<&DisplayListItem> {
        self.items.iter().find(|item| item.id() == addon_id)
    }

    /// Refreshes the list-derived fields from the merger and filter.
    pub(crate) fn sync_list(&mut self, merger: &ListMerger, filter: &FilterEngine) {
        self.items = merger.items().to_vec();
        self.visible_items = filter.visible(&self.items);
        self.selection = selection::selected_ids(&self.items);
        self.filter_text = filter.text().to_string();
        self.user_sort = merger.user_sort();
    }
}

pub fn context_text(count: usize) -> String {
    format!("{count} addons")
}
