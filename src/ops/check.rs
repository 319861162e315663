use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::model::action::{Action, ActionStatus};

/// Structured result from `gtd check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (the engine's invariants don't hold).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// More than one action carries the same id
    #[serde(rename = "duplicate_id")]
    DuplicateId { action_id: String, count: usize },
    /// Action names itself as parent
    #[serde(rename = "self_parent")]
    SelfParent { action_id: String },
    /// Parent links loop back on themselves; the members are never displayed
    #[serde(rename = "parent_cycle")]
    ParentCycle { action_ids: Vec<String> },
    /// `completed_at` is set without completed status, or missing with it
    #[serde(rename = "completed_at_mismatch")]
    CompletedAtMismatch { action_id: String, status: ActionStatus },
    #[serde(rename = "empty_title")]
    EmptyTitle { action_id: String },
}

/// A validation warning (rendered, but probably not what was meant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// Parent id doesn't resolve; the action is shown at the top level
    #[serde(rename = "dangling_parent")]
    DanglingParent { action_id: String, parent_id: String },
    /// Siblings sharing a position key fall back to id order
    #[serde(rename = "duplicate_position")]
    DuplicatePosition {
        parent_id: Option<String>,
        position: i64,
        action_ids: Vec<String>,
    },
    /// Defer date falls after the due date
    #[serde(rename = "defer_after_due")]
    DeferAfterDue { action_id: String },
}

// ---------------------------------------------------------------------------
// Main check entry point
// ---------------------------------------------------------------------------

/// Validate an action collection and return structured results.
///
/// Read-only. Unlike the engine operations, which tolerate bad input by
/// treating it as roots or skipping it, this reports every problem.
pub fn check_actions(actions: &[Action]) -> CheckResult {
    let mut result = CheckResult::default();

    let mut by_id: HashMap<&str, &Action> = HashMap::new();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for action in actions {
        by_id.entry(action.id.as_str()).or_insert(action);
        *counts.entry(action.id.as_str()).or_default() += 1;
    }
    for (id, count) in counts {
        if count > 1 {
            result.errors.push(CheckError::DuplicateId {
                action_id: id.to_string(),
                count,
            });
        }
    }

    for action in actions {
        check_action(action, &by_id, &mut result);
    }
    check_cycles(actions, &by_id, &mut result);
    check_positions(actions, &by_id, &mut result);

    result.valid = result.errors.is_empty();
    result
}

// ---------------------------------------------------------------------------
// Per-action validation
// ---------------------------------------------------------------------------

fn check_action(action: &Action, by_id: &HashMap<&str, &Action>, result: &mut CheckResult) {
    let action_id = action.id.clone();

    if action.title.trim().is_empty() {
        result.errors.push(CheckError::EmptyTitle {
            action_id: action_id.clone(),
        });
    }

    let completed = action.status == ActionStatus::Completed;
    if completed != action.completed_at.is_some() {
        result.errors.push(CheckError::CompletedAtMismatch {
            action_id: action_id.clone(),
            status: action.status,
        });
    }

    if let Some(pid) = action.parent() {
        if pid == action.id {
            result.errors.push(CheckError::SelfParent {
                action_id: action_id.clone(),
            });
        } else if !by_id.contains_key(pid) {
            result.warnings.push(CheckWarning::DanglingParent {
                action_id: action_id.clone(),
                parent_id: pid.to_string(),
            });
        }
    }

    if let (Some(defer), Some(due)) = (action.defer_date, action.due_date)
        && defer > due
    {
        result.warnings.push(CheckWarning::DeferAfterDue { action_id });
    }
}

// ---------------------------------------------------------------------------
// Structural checks
// ---------------------------------------------------------------------------

/// Report each parent cycle once, members sorted by id
fn check_cycles(actions: &[Action], by_id: &HashMap<&str, &Action>, result: &mut CheckResult) {
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();
    for start in actions {
        let mut members = vec![start.id.clone()];
        let mut cursor = next_parent(start, by_id);
        let mut on_cycle = false;
        for _ in 0..by_id.len() {
            match cursor {
                None => break,
                Some(a) if a.id == start.id => {
                    on_cycle = true;
                    break;
                }
                Some(a) => {
                    members.push(a.id.clone());
                    cursor = next_parent(a, by_id);
                }
            }
        }
        if on_cycle {
            members.sort();
            if seen.insert(members.clone()) {
                result.errors.push(CheckError::ParentCycle { action_ids: members });
            }
        }
    }
}

/// Parent lookup that ignores self links (reported separately)
fn next_parent<'a>(action: &Action, by_id: &HashMap<&str, &'a Action>) -> Option<&'a Action> {
    let pid = action.parent()?;
    if pid == action.id {
        return None;
    }
    by_id.get(pid).copied()
}

fn check_positions(actions: &[Action], by_id: &HashMap<&str, &Action>, result: &mut CheckResult) {
    let mut groups: BTreeMap<(Option<&str>, i64), Vec<String>> = BTreeMap::new();
    for action in actions {
        let parent = next_parent(action, by_id).map(|p| p.id.as_str());
        groups
            .entry((parent, action.position))
            .or_default()
            .push(action.id.clone());
    }
    for ((parent, position), mut ids) in groups {
        if ids.len() > 1 {
            ids.sort();
            ids.dedup();
            if ids.len() > 1 {
                result.warnings.push(CheckWarning::DuplicatePosition {
                    parent_id: parent.map(str::to_string),
                    position,
                    action_ids: ids,
                });
            }
        }
    }
}
