use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::recurrence::RecurrenceRule;

/// Opaque action identifier
pub type ActionId = String;

/// Lifecycle status of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    Active,
    Completed,
    OnHold,
    Dropped,
}

impl ActionStatus {
    /// The character used inside the checkbox `[ ]` in text output
    pub fn checkbox_char(self) -> char {
        match self {
            ActionStatus::Active => ' ',
            ActionStatus::Completed => 'x',
            ActionStatus::OnHold => '~',
            ActionStatus::Dropped => '-',
        }
    }

    /// Active and on-hold actions still need doing; completed and dropped don't.
    pub fn is_remaining(self) -> bool {
        matches!(self, ActionStatus::Active | ActionStatus::OnHold)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionStatus::Active => "active",
            ActionStatus::Completed => "completed",
            ActionStatus::OnHold => "on_hold",
            ActionStatus::Dropped => "dropped",
        }
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ActionStatus::Active),
            "completed" | "done" => Ok(ActionStatus::Completed),
            "on_hold" | "on-hold" | "hold" => Ok(ActionStatus::OnHold),
            "dropped" => Ok(ActionStatus::Dropped),
            other => Err(format!(
                "invalid status '{}' (expected active, completed, on_hold, dropped)",
                other
            )),
        }
    }
}

/// A single node in the action hierarchy.
///
/// Parent links form a forest; `position` orders an action among the
/// siblings that share its `parent_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub id: ActionId,
    /// `None` means top-level
    #[serde(default)]
    pub parent_id: Option<ActionId>,
    /// Manual order key, unique within a sibling group
    #[serde(default)]
    pub position: i64,
    pub title: String,
    #[serde(default = "default_status")]
    pub status: ActionStatus,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defer_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_minutes: Option<u32>,
    /// Present iff `status == Completed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Tags (without the `#` prefix)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
}

fn default_status() -> ActionStatus {
    ActionStatus::Active
}

impl Action {
    /// Create an active, unflagged, top-level action with no dates
    pub fn new(id: impl Into<ActionId>, title: impl Into<String>, position: i64) -> Self {
        Action {
            id: id.into(),
            parent_id: None,
            position,
            title: title.into(),
            status: ActionStatus::Active,
            flagged: false,
            due_date: None,
            defer_date: None,
            estimated_minutes: None,
            completed_at: None,
            tags: Vec::new(),
            recurrence: None,
        }
    }

    /// Builder-style helper: attach to a parent
    pub fn with_parent(mut self, parent_id: impl Into<ActionId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn is_completed(&self) -> bool {
        self.status == ActionStatus::Completed
    }

    /// Deferred actions are not available until their defer date has passed.
    pub fn is_deferred_at(&self, now: DateTime<Utc>) -> bool {
        self.defer_date.is_some_and(|d| d > now)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.trim_start_matches('#');
        self.tags.iter().any(|t| t == tag)
    }
}
