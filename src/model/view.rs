use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::action::ActionId;

/// Ids whose descendants are hidden from the flattened view.
/// Owned by the caller; never stored on the actions themselves.
pub type CollapsedSet = HashSet<ActionId>;

/// How sibling groups are ordered before flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortMode {
    /// Position order
    #[default]
    Manual,
    DueDate,
    Name,
    Flagged,
    /// Newest first, using position as the creation-order proxy
    Created,
}

impl std::str::FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(SortMode::Manual),
            "due-date" | "due" => Ok(SortMode::DueDate),
            "name" => Ok(SortMode::Name),
            "flagged" => Ok(SortMode::Flagged),
            "created" => Ok(SortMode::Created),
            other => Err(format!(
                "invalid sort mode '{}' (expected manual, due-date, name, flagged, created)",
                other
            )),
        }
    }
}

/// Preset "smart list" predicates evaluated against the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuickFilter {
    Overdue,
    DueToday,
    Flagged,
    Upcoming,
}

impl std::str::FromStr for QuickFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overdue" => Ok(QuickFilter::Overdue),
            "due-today" | "today" => Ok(QuickFilter::DueToday),
            "flagged" => Ok(QuickFilter::Flagged),
            "upcoming" => Ok(QuickFilter::Upcoming),
            other => Err(format!(
                "invalid quick filter '{}' (expected overdue, due-today, flagged, upcoming)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_mode_round_trips_through_serde() {
        let json = serde_json::to_string(&SortMode::DueDate).unwrap();
        assert_eq!(json, "\"due-date\"");
        let back: SortMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, SortMode::DueDate);
    }

    #[test]
    fn test_parse_quick_filter_aliases() {
        assert_eq!("today".parse::<QuickFilter>(), Ok(QuickFilter::DueToday));
        assert!("soon".parse::<QuickFilter>().is_err());
    }
}
