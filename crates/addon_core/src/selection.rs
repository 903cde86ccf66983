//! Row selection over the current list ordering.
//!
//! Selection is positional: a click addresses the row at its index in the list
//! as it is ordered at click time.

use std::collections::BTreeSet;

use shared::domain::AddonId;

use crate::projector::DisplayListItem;

/// Modifier keys held during a row click.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Ctrl (multi-select) held.
    pub ctrl: bool,
    /// Shift (range select) held.
    pub shift: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        shift: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        ctrl: true,
        shift: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        ctrl: false,
        shift: true,
    };
}

/// Applies a click on `index`. Returns false when the index is out of range.
///
/// Ctrl toggles the clicked row only. Shift selects from the first selected
/// row (or the clicked row when nothing is selected) up to the clicked row and
/// deselects everything else. A plain click toggles the clicked row and
/// deselects all others.
pub fn click(items: &mut [DisplayListItem], index: usize, modifiers: Modifiers) -> bool {
    if index >= items.len() {
        return false;
    }

    if modifiers.ctrl {
        items[index].selected = !items[index].selected;
        return true;
    }

    if modifiers.shift {
        let start = first_selected(items).unwrap_or(index).min(index);
        for (i, item) in items.iter_mut().enumerate() {
            item.selected = (start..=index).contains(&i);
        }
        return true;
    }

    for (i, item) in items.iter_mut().enumerate() {
        item.selected = if i == index { !item.selected } else { false };
    }
    true
}

pub fn first_selected(items: &[DisplayListItem]) -> Option<usize> {
    items.iter().position(|item| item.selected)
}

pub fn clear(items: &mut [DisplayListItem]) {
    for item in items {
        item.selected = false;
    }
}

pub fn selected_ids(items: &[DisplayListItem]) -> BTreeSet<AddonId> {
    items
        .iter()
        .filter(|item| item.selected)
        .map(|item| item.id().clone())
        .collect()
}
