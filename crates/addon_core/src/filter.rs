use crate::projector::DisplayListItem;

/// Free-text filter over list rows. Never mutates the list it filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterEngine {
    raw: String,
    needle: String,
}

impl FilterEngine {
    pub fn new(text: &str) -> Self {
        let mut engine = Self::default();
        engine.set_text(text);
        engine
    }

    pub fn set_text(&mut self, text: &str) {
        self.raw = text.to_string();
        self.needle = normalize(text);
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.needle.clear();
    }

    pub fn text(&self) -> &str {
        &self.raw
    }

    pub fn is_active(&self) -> bool {
        !self.needle.is_empty()
    }

    pub fn visible(&self, items: &[DisplayListItem]) -> Vec<DisplayListItem> {
        items
            .iter()
            .filter(|item| contains_normalized(item, &self.needle))
            .cloned()
            .collect()
    }
}

/// True when `filter` is blank or found, case-insensitively, in the add-on's
/// name, latest version or author (checked in that order).
pub fn matches(item: &DisplayListItem, filter: &str) -> bool {
    contains_normalized(item, &normalize(filter))
}

fn normalize(filter: &str) -> String {
    filter.trim().to_lowercase()
}

fn contains_normalized(item: &DisplayListItem, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    let addon = &item.addon;
    includes(&addon.name, needle)
        || addon
            .latest_version
            .as_deref()
            .is_some_and(|version| includes(version, needle))
        || includes(&addon.author, needle)
}

fn includes(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}
