use chrono::{DateTime, Utc};

use crate::model::action::{Action, ActionId, ActionStatus};
use crate::model::config::AnchorPolicy;
use crate::model::patch::Patch;
use crate::ops::position::slot_in;
use crate::ops::recurrence::next_due;
use crate::ops::tree::{ChildrenIndex, TreeError};

/// Error type for completing an action
#[derive(Debug, thiserror::Error)]
pub enum CompleteError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("next instance needs an id")]
    MissingNextId,

    #[error("next instance id is already taken: {0}")]
    NextIdTaken(ActionId),
}

// ---------------------------------------------------------------------------
// Status transitions
// ---------------------------------------------------------------------------

/// Direct status set, keeping `completed_at` in step: stamped on entering
/// completed, cleared on leaving it. Returns false if nothing changed.
pub fn set_status(action: &mut Action, status: ActionStatus, now: DateTime<Utc>) -> bool {
    if action.status == status {
        return false;
    }
    action.status = status;
    action.completed_at = match status {
        ActionStatus::Completed => Some(now),
        _ => None,
    };
    true
}

/// [`set_status`] as a patch instead of an in-place edit
pub fn status_patch(action: &Action, status: ActionStatus, now: DateTime<Utc>) -> Patch {
    let mut patch = Patch::new();
    if action.status == status {
        return patch;
    }
    patch.set_status(&action.id, status);
    let completed_at = (status == ActionStatus::Completed).then_some(now);
    if completed_at != action.completed_at {
        patch.set_completed_at(&action.id, completed_at);
    }
    patch
}

// ---------------------------------------------------------------------------
// Completion and recurrence roll-forward
// ---------------------------------------------------------------------------

/// Result of completing an action
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Status change for the completed action, plus any sibling renumbering
    /// needed to slot the next instance in after it
    pub patch: Patch,
    /// The next instance of a recurring action
    pub next: Option<Action>,
}

/// Parameters for [`complete_action`]
#[derive(Debug, Clone)]
pub struct CompleteOptions {
    pub now: DateTime<Utc>,
    /// Id for the spawned instance, if the action recurs
    pub next_id: ActionId,
    pub anchor: AnchorPolicy,
    pub stride: i64,
}

/// Mark `id` completed and, if it carries a recurrence rule, build its
/// next instance.
///
/// The next instance copies the rule forward unchanged, starts active,
/// gets its due date from the rule and the anchor policy, keeps the same
/// defer-to-due lead time, and sits directly after the completed action
/// among its siblings. Unknown or already completed ids yield `None`.
/// A recurring action needs a `next_id` that is non-empty and unused.
pub fn complete_action(
    actions: &[Action],
    id: &str,
    opts: &CompleteOptions,
) -> Result<Option<Completion>, CompleteError> {
    let index = ChildrenIndex::build(actions)?;
    let Some(action) = index.get(id) else {
        tracing::debug!(id, "complete: unknown id");
        return Ok(None);
    };
    if action.is_completed() {
        tracing::debug!(id, "complete: already completed");
        return Ok(None);
    }

    let mut patch = status_patch(action, ActionStatus::Completed, opts.now);
    let Some(rule) = &action.recurrence else {
        return Ok(Some(Completion { patch, next: None }));
    };
    if opts.next_id.is_empty() {
        return Err(CompleteError::MissingNextId);
    }
    if index.get(&opts.next_id).is_some() {
        return Err(CompleteError::NextIdTaken(opts.next_id.clone()));
    }

    let anchor = match opts.anchor {
        AnchorPolicy::DueDate => action.due_date.unwrap_or(opts.now),
        AnchorPolicy::Completion => opts.now,
    };
    let Some(due) = next_due(rule, anchor) else {
        tracing::warn!(id, %anchor, "recurrence ran past the representable date range");
        return Ok(Some(Completion { patch, next: None }));
    };
    let defer = match (action.defer_date, action.due_date) {
        (Some(defer), Some(old_due)) => due.checked_sub_signed(old_due - defer),
        (Some(defer), None) => next_due(rule, defer),
        (None, _) => None,
    };

    let group = index.siblings_of(action);
    let after = group
        .iter()
        .position(|a| a.id == action.id)
        .map_or(group.len(), |i| i + 1);
    let slot = slot_in(group, after, opts.stride);
    for (sibling, position) in slot.renumbered {
        patch.set_position(&sibling.id, position);
    }

    let next = Action {
        id: opts.next_id.clone(),
        position: slot.position,
        status: ActionStatus::Active,
        completed_at: None,
        due_date: Some(due),
        defer_date: defer,
        ..action.clone()
    };
    tracing::debug!(id, next = %next.id, due = %due, "spawned next recurring instance");
    Ok(Some(Completion {
        patch,
        next: Some(next),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::recurrence::{Frequency, RecurrenceRule};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use std::num::NonZeroU32;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    fn opts(now: DateTime<Utc>, anchor: AnchorPolicy) -> CompleteOptions {
        CompleteOptions {
            now,
            next_id: "next".into(),
            anchor,
            stride: 1024,
        }
    }

    fn weekly_review() -> Action {
        let mut a = Action::new("review", "Weekly review", 1024);
        a.recurrence = Some(RecurrenceRule::new(Frequency::Weekly, NonZeroU32::MIN));
        a.due_date = Some(at(2025, 6, 6, 17));
        a.defer_date = Some(at(2025, 6, 5, 17));
        a.flagged = true;
        a
    }

    #[test]
    fn test_set_status_tracks_completed_at() {
        let mut a = Action::new("a", "A", 1);
        let now = at(2025, 6, 10, 9);
        assert!(set_status(&mut a, ActionStatus::Completed, now));
        assert_eq!(a.completed_at, Some(now));
        assert!(!set_status(&mut a, ActionStatus::Completed, at(2025, 6, 11, 9)));
        assert_eq!(a.completed_at, Some(now));
        assert!(set_status(&mut a, ActionStatus::Active, now));
        assert_eq!(a.completed_at, None);
    }

    #[test]
    fn test_status_patch_noop_for_same_status() {
        let a = Action::new("a", "A", 1);
        assert!(status_patch(&a, ActionStatus::Active, at(2025, 6, 10, 9)).is_empty());
    }

    #[test]
    fn test_complete_non_recurring() {
        let actions = vec![Action::new("a", "A", 1)];
        let now = at(2025, 6, 10, 9);
        let done = complete_action(&actions, "a", &opts(now, AnchorPolicy::DueDate))
            .unwrap()
            .unwrap();
        assert!(done.next.is_none());
        let change = done.patch.get("a").unwrap();
        assert_eq!(change.status, Some(ActionStatus::Completed));
        assert_eq!(change.completed_at, Some(Some(now)));
    }

    #[test]
    fn test_complete_recurring_from_due_date() {
        let actions = vec![weekly_review(), Action::new("other", "Other", 2048)];
        let now = at(2025, 6, 10, 9);
        let done = complete_action(&actions, "review", &opts(now, AnchorPolicy::DueDate))
            .unwrap()
            .unwrap();
        let next = done.next.unwrap();
        assert_eq!(next.id, "next");
        assert_eq!(next.status, ActionStatus::Active);
        assert_eq!(next.completed_at, None);
        assert_eq!(next.due_date, Some(at(2025, 6, 13, 17)));
        assert_eq!(next.defer_date, Some(at(2025, 6, 12, 17)));
        assert_eq!(next.recurrence, actions[0].recurrence);
        assert!(next.flagged);
        // between the completed action and its next sibling
        assert_eq!(next.position, 1536);
    }

    #[test]
    fn test_complete_recurring_from_completion() {
        let actions = vec![weekly_review()];
        let now = at(2025, 6, 10, 9);
        let done = complete_action(&actions, "review", &opts(now, AnchorPolicy::Completion))
            .unwrap()
            .unwrap();
        let next = done.next.unwrap();
        assert_eq!(next.due_date, Some(at(2025, 6, 17, 9)));
        assert_eq!(next.position, 2048);
    }

    #[test]
    fn test_complete_renumbers_dense_siblings() {
        let mut first = weekly_review();
        first.position = 1;
        let actions = vec![first, Action::new("b", "B", 2)];
        let done = complete_action(&actions, "review", &opts(at(2025, 6, 10, 9), AnchorPolicy::DueDate))
            .unwrap()
            .unwrap();
        let next = done.next.unwrap();
        let review_pos = done.patch.get("review").and_then(|p| p.position).unwrap_or(1);
        let b_pos = done.patch.get("b").and_then(|p| p.position).unwrap_or(2);
        assert!(review_pos < next.position && next.position < b_pos);
    }

    #[test]
    fn test_complete_rejects_taken_next_id() {
        let actions = vec![weekly_review(), Action::new("other", "Other", 2048)];
        let mut o = opts(at(2025, 6, 10, 9), AnchorPolicy::DueDate);
        o.next_id = "other".into();
        let err = complete_action(&actions, "review", &o).unwrap_err();
        assert!(matches!(err, CompleteError::NextIdTaken(ref id) if id == "other"), "{err}");

        // the completed action's own id is taken too
        o.next_id = "review".into();
        assert!(matches!(
            complete_action(&actions, "review", &o),
            Err(CompleteError::NextIdTaken(_))
        ));
    }

    #[test]
    fn test_complete_rejects_empty_next_id() {
        let actions = vec![weekly_review()];
        let mut o = opts(at(2025, 6, 10, 9), AnchorPolicy::DueDate);
        o.next_id = String::new();
        assert!(matches!(
            complete_action(&actions, "review", &o),
            Err(CompleteError::MissingNextId)
        ));
    }

    #[test]
    fn test_next_id_is_ignored_without_recurrence() {
        let actions = vec![Action::new("a", "A", 1)];
        let mut o = opts(at(2025, 6, 10, 9), AnchorPolicy::DueDate);
        o.next_id = "a".into();
        let done = complete_action(&actions, "a", &o).unwrap().unwrap();
        assert!(done.next.is_none());
    }

    #[test]
    fn test_complete_unknown_or_done_is_none() {
        let mut done = Action::new("done", "Done", 1);
        set_status(&mut done, ActionStatus::Completed, at(2025, 6, 1, 0));
        let actions = vec![done];
        let o = opts(at(2025, 6, 10, 9), AnchorPolicy::DueDate);
        assert!(complete_action(&actions, "done", &o).unwrap().is_none());
        assert!(complete_action(&actions, "missing", &o).unwrap().is_none());
    }
}
