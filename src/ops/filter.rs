use std::collections::BTreeSet;

use chrono::{DateTime, Days, FixedOffset, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::model::action::{Action, ActionStatus};
use crate::model::view::QuickFilter;

/// Declarative predicate over the action collection.
///
/// The default spec passes every action through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Keep only these statuses (`None` = all)
    pub include_statuses: Option<BTreeSet<ActionStatus>>,
    /// Drop these statuses (applied after `include_statuses`)
    pub exclude_statuses: BTreeSet<ActionStatus>,
    /// When false, actions deferred past `now` are hidden
    pub show_deferred: bool,
    pub quick: Option<QuickFilter>,
    /// Actions without an estimate never fit a time budget
    pub max_estimated_minutes: Option<u32>,
    pub tag: Option<String>,
    /// Case-insensitive regex on the title; invalid patterns match literally
    pub title_pattern: Option<String>,
    /// Horizon of the `upcoming` quick filter, in days after today
    pub upcoming_days: u32,
}

impl Default for FilterSpec {
    fn default() -> Self {
        FilterSpec {
            include_statuses: None,
            exclude_statuses: BTreeSet::new(),
            show_deferred: true,
            quick: None,
            max_estimated_minutes: None,
            tag: None,
            title_pattern: None,
            upcoming_days: 7,
        }
    }
}

/// Apply `spec` to `actions`, keeping input order.
///
/// `now` is supplied by the caller and its offset decides which calendar
/// day counts as "today" for the date-based quick filters.
pub fn filter_actions<'a>(
    actions: &'a [Action],
    spec: &FilterSpec,
    now: DateTime<FixedOffset>,
) -> Vec<&'a Action> {
    let title_re = spec.title_pattern.as_deref().and_then(compile_title_pattern);
    let now_utc = now.with_timezone(&Utc);
    let today = now.date_naive();

    actions
        .iter()
        .filter(|action| {
            if let Some(include) = &spec.include_statuses
                && !include.contains(&action.status)
            {
                return false;
            }
            if spec.exclude_statuses.contains(&action.status) {
                return false;
            }
            if !spec.show_deferred && action.is_deferred_at(now_utc) {
                return false;
            }
            if let Some(max) = spec.max_estimated_minutes
                && action.estimated_minutes.is_none_or(|m| m > max)
            {
                return false;
            }
            if let Some(tag) = &spec.tag
                && !action.has_tag(tag)
            {
                return false;
            }
            if let Some(re) = &title_re
                && !re.is_match(&action.title)
            {
                return false;
            }
            match spec.quick {
                Some(quick) => matches_quick(action, quick, now, today, spec.upcoming_days),
                None => true,
            }
        })
        .collect()
}

fn matches_quick(
    action: &Action,
    quick: QuickFilter,
    now: DateTime<FixedOffset>,
    today: NaiveDate,
    upcoming_days: u32,
) -> bool {
    if !action.status.is_remaining() {
        return false;
    }
    let due_day = action
        .due_date
        .map(|due| due.with_timezone(&now.timezone()).date_naive());
    match (quick, due_day) {
        (QuickFilter::Flagged, _) => action.flagged,
        (_, None) => false,
        (QuickFilter::Overdue, Some(day)) => day < today,
        (QuickFilter::DueToday, Some(day)) => day == today,
        (QuickFilter::Upcoming, Some(day)) => {
            let horizon = today
                .checked_add_days(Days::new(u64::from(upcoming_days)))
                .unwrap_or(NaiveDate::MAX);
            day > today && day <= horizon
        }
    }
}

fn compile_title_pattern(pattern: &str) -> Option<Regex> {
    Regex::new(&format!("(?i){}", pattern))
        .or_else(|_| Regex::new(&format!("(?i){}", regex::escape(pattern))))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn now_utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        let utc = FixedOffset::east_opt(0).unwrap();
        at(y, m, d, h).with_timezone(&utc)
    }

    fn ids(actions: &[&Action]) -> Vec<String> {
        actions.iter().map(|a| a.id.clone()).collect()
    }

    fn with_due(id: &str, due: DateTime<Utc>) -> Action {
        let mut a = Action::new(id, id, 0);
        a.due_date = Some(due);
        a
    }

    #[test]
    fn test_default_spec_keeps_everything_in_order() {
        let mut deferred = Action::new("b", "later", 2);
        deferred.defer_date = Some(at(2030, 1, 1, 0));
        let actions = vec![Action::new("a", "a", 1), deferred, Action::new("c", "c", 3)];
        let kept = filter_actions(&actions, &FilterSpec::default(), now_utc(2025, 6, 10, 8));
        assert_eq!(ids(&kept), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_overdue_skips_completed() {
        let active = with_due("active", at(2025, 6, 1, 0));
        let mut done = with_due("done", at(2025, 6, 1, 0));
        done.status = ActionStatus::Completed;
        done.completed_at = Some(at(2025, 6, 2, 0));
        let actions = vec![active, done];

        let spec = FilterSpec {
            quick: Some(QuickFilter::Overdue),
            ..FilterSpec::default()
        };
        let kept = filter_actions(&actions, &spec, now_utc(2025, 6, 10, 0));
        assert_eq!(ids(&kept), vec!["active"]);
    }

    #[test]
    fn test_due_today_uses_caller_offset() {
        // 2025-06-10 23:30 UTC is already June 11 in UTC+2
        let actions = vec![with_due("late-night", at(2025, 6, 10, 23))];
        let spec = FilterSpec {
            quick: Some(QuickFilter::DueToday),
            ..FilterSpec::default()
        };

        let utc_now = now_utc(2025, 6, 10, 9);
        assert_eq!(filter_actions(&actions, &spec, utc_now).len(), 1);

        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let local_now = plus_two.with_ymd_and_hms(2025, 6, 10, 11, 0, 0).unwrap();
        assert!(filter_actions(&actions, &spec, local_now).is_empty());
    }

    #[test]
    fn test_overdue_and_today_are_disjoint() {
        let actions = vec![
            with_due("yesterday", at(2025, 6, 9, 18)),
            with_due("this-morning", at(2025, 6, 10, 6)),
        ];
        let now = now_utc(2025, 6, 10, 12);
        let overdue = FilterSpec {
            quick: Some(QuickFilter::Overdue),
            ..FilterSpec::default()
        };
        let today = FilterSpec {
            quick: Some(QuickFilter::DueToday),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_actions(&actions, &overdue, now)), vec!["yesterday"]);
        assert_eq!(ids(&filter_actions(&actions, &today, now)), vec!["this-morning"]);
    }

    #[test]
    fn test_upcoming_window() {
        let actions = vec![
            with_due("today", at(2025, 6, 10, 12)),
            with_due("tomorrow", at(2025, 6, 11, 12)),
            with_due("edge", at(2025, 6, 17, 12)),
            with_due("too-far", at(2025, 6, 18, 12)),
        ];
        let spec = FilterSpec {
            quick: Some(QuickFilter::Upcoming),
            ..FilterSpec::default()
        };
        let kept = filter_actions(&actions, &spec, now_utc(2025, 6, 10, 8));
        assert_eq!(ids(&kept), vec!["tomorrow", "edge"]);
    }

    #[test]
    fn test_flagged_quick_filter() {
        let mut flagged = Action::new("f", "f", 1);
        flagged.flagged = true;
        let mut dated = with_due("dated", at(2025, 6, 1, 12));
        dated.flagged = true;
        let mut dropped = Action::new("d", "d", 2);
        dropped.flagged = true;
        dropped.status = ActionStatus::Dropped;
        let actions = vec![flagged, dated, dropped, Action::new("plain", "plain", 3)];
        let spec = FilterSpec {
            quick: Some(QuickFilter::Flagged),
            ..FilterSpec::default()
        };
        let kept = filter_actions(&actions, &spec, now_utc(2025, 6, 10, 8));
        // due dates play no part in the flagged filter
        assert_eq!(ids(&kept), vec!["f", "dated"]);
    }

    #[test]
    fn test_hide_deferred() {
        let mut future = Action::new("future", "future", 1);
        future.defer_date = Some(at(2025, 6, 12, 0));
        let mut past = Action::new("past", "past", 2);
        past.defer_date = Some(at(2025, 6, 1, 0));
        let actions = vec![future, past];
        let spec = FilterSpec {
            show_deferred: false,
            ..FilterSpec::default()
        };
        let kept = filter_actions(&actions, &spec, now_utc(2025, 6, 10, 8));
        assert_eq!(ids(&kept), vec!["past"]);
    }

    #[test]
    fn test_status_include_and_exclude() {
        let mut hold = Action::new("hold", "hold", 1);
        hold.status = ActionStatus::OnHold;
        let mut dropped = Action::new("dropped", "dropped", 2);
        dropped.status = ActionStatus::Dropped;
        let actions = vec![Action::new("active", "active", 0), hold, dropped];
        let now = now_utc(2025, 6, 10, 8);

        let include = FilterSpec {
            include_statuses: Some([ActionStatus::Active, ActionStatus::Dropped].into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_actions(&actions, &include, now)), vec!["active", "dropped"]);

        let exclude = FilterSpec {
            exclude_statuses: [ActionStatus::Dropped].into(),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_actions(&actions, &exclude, now)), vec!["active", "hold"]);
    }

    #[test]
    fn test_max_estimate_drops_unestimated() {
        let mut quick = Action::new("quick", "quick", 1);
        quick.estimated_minutes = Some(10);
        let mut long = Action::new("long", "long", 2);
        long.estimated_minutes = Some(90);
        let actions = vec![quick, long, Action::new("unknown", "unknown", 3)];
        let spec = FilterSpec {
            max_estimated_minutes: Some(30),
            ..FilterSpec::default()
        };
        let kept = filter_actions(&actions, &spec, now_utc(2025, 6, 10, 8));
        assert_eq!(ids(&kept), vec!["quick"]);
    }

    #[test]
    fn test_tag_and_title_pattern() {
        let mut call = Action::new("call", "Call the Dentist", 1);
        call.tags = vec!["phone".into()];
        let actions = vec![call, Action::new("email", "Email dentist (re: bill)", 2)];
        let now = now_utc(2025, 6, 10, 8);

        let by_tag = FilterSpec {
            tag: Some("#phone".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_actions(&actions, &by_tag, now)), vec!["call"]);

        let by_title = FilterSpec {
            title_pattern: Some("dentist".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_actions(&actions, &by_title, now)), vec!["call", "email"]);

        // Unbalanced paren is not a valid regex; falls back to a literal match
        let literal = FilterSpec {
            title_pattern: Some("(re:".into()),
            ..FilterSpec::default()
        };
        assert_eq!(ids(&filter_actions(&actions, &literal, now)), vec!["email"]);
    }
}
