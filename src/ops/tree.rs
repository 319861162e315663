use std::collections::{HashMap, HashSet};

use crate::model::action::{Action, ActionId};
use crate::model::view::SortMode;
use crate::ops::sort::{manual_order, sort_siblings};

/// Error type for building a children index
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("duplicate action id: {0}")]
    DuplicateId(ActionId),
}

/// One row of the flattened, depth-annotated display sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatNode<'a> {
    pub action: &'a Action,
    /// 0 for roots
    pub depth: usize,
    /// True if any action in the index names this one as parent,
    /// whether or not those children are currently emitted
    pub has_children: bool,
    /// True if this node is in the collapsed set and has children to hide
    pub is_collapsed: bool,
}

impl FlatNode<'_> {
    pub fn id(&self) -> &str {
        &self.action.id
    }
}

/// Parent -> ordered children map over a set of actions.
///
/// A parent reference that points outside the set (or at the action
/// itself) makes the action a root.
#[derive(Debug, Clone)]
pub struct ChildrenIndex<'a> {
    by_id: HashMap<&'a str, &'a Action>,
    roots: Vec<&'a Action>,
    children: HashMap<&'a str, Vec<&'a Action>>,
}

impl<'a> ChildrenIndex<'a> {
    /// Group actions by effective parent, each group in manual order.
    ///
    /// Duplicate ids are a caller-side integrity bug and are rejected.
    pub fn build<I>(actions: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = &'a Action>,
    {
        let mut by_id: HashMap<&'a str, &'a Action> = HashMap::new();
        let mut ordered = Vec::new();
        for action in actions {
            if by_id.insert(action.id.as_str(), action).is_some() {
                return Err(TreeError::DuplicateId(action.id.clone()));
            }
            ordered.push(action);
        }

        let mut roots = Vec::new();
        let mut children: HashMap<&'a str, Vec<&'a Action>> = HashMap::new();
        for action in ordered {
            match effective_parent_id(action, &by_id) {
                Some(pid) => children.entry(pid).or_default().push(action),
                None => {
                    if let Some(pid) = action.parent() {
                        tracing::debug!(id = %action.id, parent = pid, "dangling parent, treating as root");
                    }
                    roots.push(action);
                }
            }
        }

        roots.sort_by(|a, b| manual_order(a, b));
        for group in children.values_mut() {
            group.sort_by(|a, b| manual_order(a, b));
        }

        let index = ChildrenIndex {
            by_id,
            roots,
            children,
        };
        let reachable = index.reachable_count();
        if reachable < index.len() {
            tracing::warn!(
                unreachable = index.len() - reachable,
                "actions on a parent cycle are unreachable from any root"
            );
        }
        Ok(index)
    }

    /// Reorder every sibling group by `mode` (stable over manual order).
    pub fn sort_groups(&mut self, mode: SortMode) {
        if mode == SortMode::Manual {
            return;
        }
        sort_siblings(&mut self.roots, mode);
        for group in self.children.values_mut() {
            sort_siblings(group, mode);
        }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&'a Action> {
        self.by_id.get(id).copied()
    }

    /// The parent this index actually nests `action` under
    pub fn parent_of(&self, action: &Action) -> Option<&'a Action> {
        effective_parent_id(action, &self.by_id).and_then(|pid| self.get(pid))
    }

    /// Ordered children of `parent` (`None` = roots)
    pub fn children(&self, parent: Option<&str>) -> &[&'a Action] {
        match parent {
            None => &self.roots,
            Some(pid) => self.children.get(pid).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// The sibling group `action` belongs to, including itself
    pub fn siblings_of(&self, action: &Action) -> &[&'a Action] {
        let parent = self.parent_of(action).map(|p| p.id.as_str());
        self.children(parent)
    }

    pub fn has_children(&self, id: &str) -> bool {
        self.children.get(id).is_some_and(|c| !c.is_empty())
    }

    /// True if `node` sits somewhere below `ancestor`
    pub fn is_descendant(&self, ancestor: &str, node: &str) -> bool {
        let mut cursor = self.get(node).and_then(|a| self.parent_of(a));
        // bounded walk, in case the input has a cycle
        for _ in 0..self.len() {
            match cursor {
                None => return false,
                Some(a) if a.id == ancestor => return true,
                Some(a) => cursor = self.parent_of(a),
            }
        }
        false
    }

    /// `id` and all of its descendants, pre-order
    pub fn subtree_ids(&self, id: &str) -> Vec<&'a str> {
        let Some(root) = self.get(id) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(action) = stack.pop() {
            out.push(action.id.as_str());
            stack.extend(self.children(Some(&action.id)).iter().rev());
        }
        out
    }

    fn reachable_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&Action> = self.roots.iter().rev().copied().collect();
        while let Some(action) = stack.pop() {
            count += 1;
            stack.extend(self.children(Some(&action.id)).iter().rev());
        }
        count
    }
}

fn effective_parent_id<'a>(action: &Action, by_id: &HashMap<&'a str, &'a Action>) -> Option<&'a str> {
    let pid = action.parent()?;
    if pid == action.id {
        return None;
    }
    by_id.get_key_value(pid).map(|(k, _)| *k)
}

/// Pre-order walk of `index` from its roots.
///
/// Children of a collapsed node are skipped but stay in the index, so
/// `has_children` is unaffected and re-expanding restores them in place.
pub fn flatten<'a>(index: &ChildrenIndex<'a>, collapsed: &HashSet<ActionId>) -> Vec<FlatNode<'a>> {
    let mut out = Vec::with_capacity(index.len());
    let mut stack: Vec<(&'a Action, usize)> =
        index.children(None).iter().rev().map(|a| (*a, 0)).collect();

    while let Some((action, depth)) = stack.pop() {
        let has_children = index.has_children(&action.id);
        let is_collapsed = has_children && collapsed.contains(&action.id);
        out.push(FlatNode {
            action,
            depth,
            has_children,
            is_collapsed,
        });
        if has_children && !is_collapsed {
            stack.extend(
                index
                    .children(Some(&action.id))
                    .iter()
                    .rev()
                    .map(|c| (*c, depth + 1)),
            );
        }
    }
    out
}

/// Index, sort, and flatten in one step.
pub fn build_outline<'a, I>(
    actions: I,
    mode: SortMode,
    collapsed: &HashSet<ActionId>,
) -> Result<Vec<FlatNode<'a>>, TreeError>
where
    I: IntoIterator<Item = &'a Action>,
{
    let mut index = ChildrenIndex::build(actions)?;
    index.sort_groups(mode);
    Ok(flatten(&index, collapsed))
}
