use chrono::NaiveDate;
use serde::Serialize;

use crate::model::action::{Action, ActionStatus};
use crate::model::patch::{ActionPatch, Patch};
use crate::ops::check::{CheckError, CheckWarning};
use crate::ops::tree::FlatNode;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct OutlineRowJson {
    pub id: String,
    pub title: String,
    pub status: ActionStatus,
    pub depth: usize,
    pub has_children: bool,
    pub is_collapsed: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub flagged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

#[derive(Serialize)]
pub struct CompletionJson<'a> {
    pub patch: &'a Patch,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<&'a Action>,
}

#[derive(Serialize)]
pub struct OccurrencesJson {
    pub id: String,
    pub occurrences: Vec<NaiveDate>,
}

pub fn row_to_json(node: &FlatNode) -> OutlineRowJson {
    let action = node.action;
    OutlineRowJson {
        id: action.id.clone(),
        title: action.title.clone(),
        status: action.status,
        depth: node.depth,
        has_children: node.has_children,
        is_collapsed: node.is_collapsed,
        flagged: action.flagged,
        due: action.due_date.map(|d| d.to_rfc3339()),
        tags: action.tags.clone(),
    }
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// Format a single action as a one-line summary
pub fn format_action_line(action: &Action) -> String {
    let flag = if action.flagged { " !" } else { "" };
    let due = action
        .due_date
        .map(|d| format!(" due:{}", d.format("%Y-%m-%d")))
        .unwrap_or_default();
    let tags_str = if action.tags.is_empty() {
        String::new()
    } else {
        format!(
            " {}",
            action
                .tags
                .iter()
                .map(|t| format!("#{}", t))
                .collect::<Vec<_>>()
                .join(" ")
        )
    };
    format!(
        "[{}] {} {}{}{}{}",
        action.status.checkbox_char(),
        action.id,
        action.title,
        flag,
        due,
        tags_str
    )
}

/// Format the flattened outline, two spaces of indent per level.
/// Collapsed rows end with ` [+]`.
pub fn format_outline(rows: &[FlatNode]) -> Vec<String> {
    rows.iter()
        .map(|node| {
            let marker = if node.is_collapsed { " [+]" } else { "" };
            format!(
                "{}{}{}",
                "  ".repeat(node.depth),
                format_action_line(node.action),
                marker
            )
        })
        .collect()
}

fn format_change(change: &ActionPatch) -> String {
    let mut parts = Vec::new();
    if let Some(parent) = &change.parent_id {
        parts.push(format!("parent -> {}", parent.as_deref().unwrap_or("(top level)")));
    }
    if let Some(position) = change.position {
        parts.push(format!("position -> {}", position));
    }
    if let Some(status) = change.status {
        parts.push(format!("status -> {}", status));
    }
    if let Some(completed_at) = &change.completed_at {
        match completed_at {
            Some(at) => parts.push(format!("completed -> {}", at.to_rfc3339())),
            None => parts.push("completed -> (cleared)".to_string()),
        }
    }
    parts.join(", ")
}

/// One line per changed action; a single line for an empty patch
pub fn format_patch(patch: &Patch) -> Vec<String> {
    if patch.is_empty() {
        return vec!["no changes".to_string()];
    }
    patch
        .iter()
        .map(|(id, change)| format!("{}: {}", id, format_change(change)))
        .collect()
}

pub fn format_check_error(err: &CheckError) -> String {
    match err {
        CheckError::DuplicateId { action_id, count } => {
            format!("{} appears {} times", action_id, count)
        }
        CheckError::SelfParent { action_id } => format!("{} is its own parent", action_id),
        CheckError::ParentCycle { action_ids } => {
            format!("parent cycle: {}", action_ids.join(" -> "))
        }
        CheckError::CompletedAtMismatch { action_id, status } => match status {
            ActionStatus::Completed => format!("{} is completed but has no completion date", action_id),
            _ => format!("{} is {} but has a completion date", action_id, status),
        },
        CheckError::EmptyTitle { action_id } => format!("{} has an empty title", action_id),
    }
}

pub fn format_check_warning(warn: &CheckWarning) -> String {
    match warn {
        CheckWarning::DanglingParent {
            action_id,
            parent_id,
        } => format!(
            "{} has unknown parent {} (shown at top level)",
            action_id, parent_id
        ),
        CheckWarning::DuplicatePosition {
            parent_id,
            position,
            action_ids,
        } => format!(
            "[{}] position {} shared by {}",
            parent_id.as_deref().unwrap_or("top level"),
            position,
            action_ids.join(", ")
        ),
        CheckWarning::DeferAfterDue { action_id } => {
            format!("{} is deferred past its due date", action_id)
        }
    }
}
