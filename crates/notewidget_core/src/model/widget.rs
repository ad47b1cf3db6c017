//! Widget instance configuration.
//!
//! # Responsibility
//! - Model the per-widget list selection and sort settings.
//! - Encode/decode the settings as the string values kept in the prefs store.
//!
//! # Invariants
//! - Each key decodes independently; one corrupt value does not reset the
//!   others.
//! - Defaults are "all lists", sort by due date, ascending.

use crate::model::note::ListId;
use serde::{Deserialize, Serialize};

/// Platform-assigned widget instance identifier.
pub type WidgetId = i32;

/// Reserved id the host uses for "no widget".
pub const INVALID_WIDGET_ID: WidgetId = 0;

/// Prefs key holding the selected list id.
pub const KEY_LIST: &str = "widget_list";
/// Prefs key holding the sort field.
pub const KEY_SORT_TYPE: &str = "widget_sort_type";
/// Prefs key holding the sort direction.
pub const KEY_SORT_ORDER: &str = "widget_sort_order";

/// Stored list id meaning "all lists".
pub const ALL_LISTS_ID: ListId = -1;

/// Which lists a widget shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListSelection {
    #[default]
    All,
    List(ListId),
}

impl ListSelection {
    /// Maps a stored list id; any negative id selects all lists.
    pub fn from_list_id(list_id: ListId) -> Self {
        if list_id < 0 {
            Self::All
        } else {
            Self::List(list_id)
        }
    }

    pub fn to_pref_value(self) -> String {
        match self {
            Self::All => ALL_LISTS_ID.to_string(),
            Self::List(list_id) => list_id.to_string(),
        }
    }

    pub fn parse_pref(value: &str) -> Option<Self> {
        value.trim().parse::<ListId>().ok().map(Self::from_list_id)
    }
}

/// Column a widget sorts its rows by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    DueDate,
    Title,
}

impl SortField {
    pub fn as_pref_str(self) -> &'static str {
        match self {
            Self::DueDate => "duedate",
            Self::Title => "alphabetic",
        }
    }

    pub fn parse_pref(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "duedate" => Some(Self::DueDate),
            "alphabetic" | "title" => Some(Self::Title),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_pref_str(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    pub fn parse_pref(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Ascending),
            "DESC" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Effective settings for one widget instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub list: ListSelection,
    pub sort: SortField,
    pub direction: SortDirection,
}

impl WidgetConfig {
    /// Decodes raw prefs values, applying the default for every key that is
    /// missing or unparsable.
    pub fn from_prefs(list: Option<&str>, sort: Option<&str>, direction: Option<&str>) -> Self {
        Self {
            list: list.and_then(ListSelection::parse_pref).unwrap_or_default(),
            sort: sort.and_then(SortField::parse_pref).unwrap_or_default(),
            direction: direction
                .and_then(SortDirection::parse_pref)
                .unwrap_or_default(),
        }
    }
}
