use std::cmp::Ordering;

use crate::projector::DisplayListItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortColumn {
    Name,
    DisplayState,
    LatestVersion,
    GameVersion,
    ProviderName,
    Author,
}

impl SortColumn {
    pub const ALL: [SortColumn; 6] = [
        SortColumn::Name,
        SortColumn::DisplayState,
        SortColumn::LatestVersion,
        SortColumn::GameVersion,
        SortColumn::ProviderName,
        SortColumn::Author,
    ];

    /// Accessor path of the column on a list row.
    pub fn path(self) -> &'static str {
        match self {
            SortColumn::Name => "addon.name",
            SortColumn::DisplayState => "displayState",
            SortColumn::LatestVersion => "addon.latestVersion",
            SortColumn::GameVersion => "addon.gameVersion",
            SortColumn::ProviderName => "addon.providerName",
            SortColumn::Author => "addon.author",
        }
    }

    pub fn from_path(path: &str) -> Option<Self> {
        SortColumn::ALL.into_iter().find(|column| column.path() == path)
    }

    pub fn compare(self, a: &DisplayListItem, b: &DisplayListItem) -> Ordering {
        match self {
            SortColumn::Name => a.addon.name.cmp(&b.addon.name),
            SortColumn::DisplayState => a.display_state.cmp(&b.display_state),
            SortColumn::LatestVersion => a.addon.latest_version.cmp(&b.addon.latest_version),
            SortColumn::GameVersion => a.addon.game_version.cmp(&b.addon.game_version),
            SortColumn::ProviderName => a.addon.provider_name.cmp(&b.addon.provider_name),
            SortColumn::Author => a.addon.author.cmp(&b.addon.author),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Column sort picked by the user in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserSort {
    pub column: SortColumn,
    pub direction: SortDirection,
}

impl UserSort {
    pub fn new(column: SortColumn, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    pub fn compare(&self, a: &DisplayListItem, b: &DisplayListItem) -> Ordering {
        let ordering = self.column.compare(a, b);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnState {
    pub name: &'static str,
    pub display: &'static str,
    pub visible: bool,
    pub allow_toggle: bool,
}

impl ColumnState {
    fn fixed(column: SortColumn, display: &'static str) -> Self {
        Self {
            name: column.path(),
            display,
            visible: true,
            allow_toggle: false,
        }
    }

    fn toggleable(column: SortColumn, display: &'static str) -> Self {
        Self {
            allow_toggle: true,
            ..Self::fixed(column, display)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Columns {
    columns: Vec<ColumnState>,
}

impl Default for Columns {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnState::fixed(SortColumn::Name, "Addon"),
                ColumnState::fixed(SortColumn::DisplayState, "Status"),
                ColumnState::toggleable(SortColumn::LatestVersion, "Latest Version"),
                ColumnState::toggleable(SortColumn::GameVersion, "Game Version"),
                ColumnState::toggleable(SortColumn::ProviderName, "Provider"),
                ColumnState::toggleable(SortColumn::Author, "Author"),
            ],
        }
    }
}

impl Columns {
    pub fn all(&self) -> &[ColumnState] {
        &self.columns
    }

    /// Columns offered in the header context menu.
    pub fn toggleable(&self) -> impl Iterator<Item = &ColumnState> {
        self.columns.iter().filter(|column| column.allow_toggle)
    }

    pub fn displayed_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|column| column.visible)
            .map(|column| column.name)
            .collect()
    }

    /// Returns false when the column is unknown or not user-toggleable.
    pub fn set_visible(&mut self, name: &str, visible: bool) -> bool {
        match self
            .columns
            .iter_mut()
            .find(|column| column.name == name && column.allow_toggle)
        {
            Some(column) => {
                column.visible = visible;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_toggleable_columns_change_visibility() {
        let mut columns = Columns::default();
        assert!(columns.set_visible("addon.author", false));
        assert!(!columns.set_visible("addon.name", false));
        assert!(!columns.set_visible("addon.nope", false));

        assert_eq!(
            columns.displayed_columns(),
            vec![
                "addon.name",
                "displayState",
                "addon.latestVersion",
                "addon.gameVersion",
                "addon.providerName"
            ]
        );
        assert_eq!(columns.toggleable().count(), 4);
    }

    #[test]
    fn column_paths_round_trip() {
        for column in SortColumn::ALL {
            assert_eq!(SortColumn::from_path(column.path()), Some(column));
        }
        assert_eq!(SortColumn::from_path("addon.thumbnailUrl"), None);
    }
}
