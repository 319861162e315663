use std::cmp::Ordering;

use crate::model::action::Action;
use crate::model::view::SortMode;

/// Default sibling order: ascending position, id as the tiebreak.
pub fn manual_order(a: &Action, b: &Action) -> Ordering {
    a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id))
}

/// Reorder one sibling group in place.
///
/// The sort is stable, so the incoming (manual) order decides between
/// actions that rank equal under `mode`. Never call this on a list mixing
/// actions from different sibling groups.
pub fn sort_siblings(siblings: &mut [&Action], mode: SortMode) {
    match mode {
        SortMode::Manual => {}
        SortMode::DueDate => siblings.sort_by(|a, b| due_order(a, b)),
        SortMode::Name => siblings.sort_by(|a, b| collate(&a.title, &b.title)),
        // true sorts after false, so compare reversed
        SortMode::Flagged => siblings.sort_by(|a, b| b.flagged.cmp(&a.flagged)),
        SortMode::Created => siblings.sort_by(|a, b| b.position.cmp(&a.position)),
    }
}

/// Owned-value variant of [`sort_siblings`].
pub fn sorted_siblings<'a>(siblings: &[&'a Action], mode: SortMode) -> Vec<&'a Action> {
    let mut out = siblings.to_vec();
    sort_siblings(&mut out, mode);
    out
}

/// Dated actions first, earliest due first
fn due_order(a: &Action, b: &Action) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Case-insensitive title comparison; raw comparison only breaks exact
/// case-folded ties so "apple" and "Apple" still order deterministically.
fn collate(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn ids(actions: &[&Action]) -> Vec<String> {
        actions.iter().map(|a| a.id.clone()).collect()
    }

    fn due(mut action: Action, day: u32) -> Action {
        action.due_date = Some(Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap());
        action
    }

    #[test]
    fn test_manual_is_identity() {
        let a = Action::new("a", "Zeta", 2);
        let b = Action::new("b", "Alpha", 1);
        let mut group = vec![&a, &b];
        sort_siblings(&mut group, SortMode::Manual);
        assert_eq!(ids(&group), vec!["a", "b"]);
    }

    #[test]
    fn test_due_date_undated_last_and_stable() {
        let a = Action::new("a", "undated one", 1);
        let b = due(Action::new("b", "late", 2), 20);
        let c = Action::new("c", "undated two", 3);
        let d = due(Action::new("d", "early", 4), 3);
        let e = due(Action::new("e", "early twin", 5), 3);
        let mut group = vec![&a, &b, &c, &d, &e];
        sort_siblings(&mut group, SortMode::DueDate);
        assert_eq!(ids(&group), vec!["d", "e", "b", "a", "c"]);
    }

    #[test]
    fn test_name_is_case_insensitive() {
        let a = Action::new("a", "banana", 1);
        let b = Action::new("b", "Apple", 2);
        let c = Action::new("c", "cherry", 3);
        let d = Action::new("d", "apple", 4);
        let mut group = vec![&a, &b, &c, &d];
        sort_siblings(&mut group, SortMode::Name);
        assert_eq!(ids(&group), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_flagged_first_keeps_relative_order() {
        let a = Action::new("a", "a", 1);
        let mut b = Action::new("b", "b", 2);
        let mut c = Action::new("c", "c", 3);
        let d = Action::new("d", "d", 4);
        b.flagged = true;
        c.flagged = true;
        let mut group = vec![&a, &b, &c, &d];
        sort_siblings(&mut group, SortMode::Flagged);
        assert_eq!(ids(&group), vec!["b", "c", "a", "d"]);

        let again = sorted_siblings(&group, SortMode::Flagged);
        assert_eq!(ids(&again), ids(&group));
    }

    #[test]
    fn test_created_is_descending_position() {
        let a = Action::new("a", "a", 1024);
        let b = Action::new("b", "b", 3072);
        let c = Action::new("c", "c", 2048);
        let mut group = vec![&a, &b, &c];
        sort_siblings(&mut group, SortMode::Created);
        assert_eq!(ids(&group), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_manual_order_ties_break_on_id() {
        let a = Action::new("b", "x", 5);
        let b = Action::new("a", "y", 5);
        assert_eq!(manual_order(&a, &b), Ordering::Greater);
    }
}
