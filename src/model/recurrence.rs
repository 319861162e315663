use std::collections::BTreeSet;
use std::num::NonZeroU32;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

/// How often a recurring action repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// A repeat rule attached to an action.
///
/// Rules are only ever read by the engine; completing a recurring action
/// copies the rule forward to the next instance unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    #[serde(default = "default_interval")]
    pub interval: NonZeroU32,
    /// Day indices, 0 = Sunday .. 6 = Saturday. Only meaningful for weekly rules.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub days_of_week: BTreeSet<u8>,
}

fn default_interval() -> NonZeroU32 {
    NonZeroU32::MIN
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency, interval: NonZeroU32) -> Self {
        RecurrenceRule {
            frequency,
            interval,
            days_of_week: BTreeSet::new(),
        }
    }

    /// Weekly rule restricted to the given day indices
    pub fn weekly_on(interval: NonZeroU32, days: impl IntoIterator<Item = u8>) -> Self {
        RecurrenceRule {
            frequency: Frequency::Weekly,
            interval,
            days_of_week: days.into_iter().collect(),
        }
    }

    /// The valid weekdays of this rule. Out-of-range indices are dropped.
    pub fn weekdays(&self) -> Vec<Weekday> {
        self.days_of_week
            .iter()
            .filter_map(|&d| weekday_from_index(d))
            .collect()
    }
}

/// Map a 0..6 day index (0 = Sunday) to a chrono weekday
pub fn weekday_from_index(index: u8) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_defaults_interval() {
        let rule: RecurrenceRule = serde_json::from_str(r#"{"frequency":"daily"}"#).unwrap();
        assert_eq!(rule.frequency, Frequency::Daily);
        assert_eq!(rule.interval.get(), 1);
        assert!(rule.days_of_week.is_empty());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let result = serde_json::from_str::<RecurrenceRule>(r#"{"frequency":"weekly","interval":0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_weekdays_ignores_out_of_range() {
        let rule = RecurrenceRule::weekly_on(NonZeroU32::MIN, [1, 3, 9]);
        assert_eq!(rule.weekdays(), vec![Weekday::Mon, Weekday::Wed]);
    }
}
