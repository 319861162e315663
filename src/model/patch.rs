use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;

use super::action::{Action, ActionId, ActionStatus};

/// Field updates for one action. `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPatch {
    /// `Some(None)` moves the action to the top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<Option<ActionId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ActionStatus>,
    /// `Some(None)` clears the completion timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<Option<DateTime<Utc>>>,
}

impl ActionPatch {
    pub fn is_empty(&self) -> bool {
        self.parent_id.is_none()
            && self.position.is_none()
            && self.status.is_none()
            && self.completed_at.is_none()
    }

    /// Write the set fields onto `action`
    pub fn apply(&self, action: &mut Action) {
        if let Some(parent) = &self.parent_id {
            action.parent_id = parent.clone();
        }
        if let Some(position) = self.position {
            action.position = position;
        }
        if let Some(status) = self.status {
            action.status = status;
        }
        if let Some(completed_at) = self.completed_at {
            action.completed_at = completed_at;
        }
    }
}

/// The minimal set of per-action changes produced by one engine operation.
///
/// An empty patch means the operation was a no-op; callers should skip
/// persistence in that case. Entries keep insertion order so output is
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Patch {
    changes: IndexMap<ActionId, ActionPatch>,
}

impl Patch {
    pub fn new() -> Self {
        Patch::default()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.values().all(ActionPatch::is_empty)
    }

    pub fn len(&self) -> usize {
        self.changes.values().filter(|p| !p.is_empty()).count()
    }

    pub fn get(&self, id: &str) -> Option<&ActionPatch> {
        self.changes.get(id).filter(|p| !p.is_empty())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ActionId, &ActionPatch)> {
        self.changes.iter().filter(|(_, p)| !p.is_empty())
    }

    fn entry(&mut self, id: &str) -> &mut ActionPatch {
        self.changes.entry(id.to_string()).or_default()
    }

    pub fn set_parent(&mut self, id: &str, parent_id: Option<ActionId>) {
        self.entry(id).parent_id = Some(parent_id);
    }

    pub fn set_position(&mut self, id: &str, position: i64) {
        self.entry(id).position = Some(position);
    }

    pub fn set_status(&mut self, id: &str, status: ActionStatus) {
        self.entry(id).status = Some(status);
    }

    pub fn set_completed_at(&mut self, id: &str, completed_at: Option<DateTime<Utc>>) {
        self.entry(id).completed_at = Some(completed_at);
    }

    /// Apply every entry to the matching action in `actions`.
    /// Returns how many actions were touched.
    pub fn apply_to(&self, actions: &mut [Action]) -> usize {
        let mut touched = 0;
        for action in actions.iter_mut() {
            if let Some(change) = self.get(&action.id) {
                change.apply(action);
                touched += 1;
            }
        }
        touched
    }
}
