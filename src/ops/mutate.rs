use crate::model::action::{Action, ActionId};
use crate::model::config::DEFAULT_POSITION_STRIDE;
use crate::model::patch::Patch;
use crate::ops::position::slot_in;
use crate::ops::tree::{ChildrenIndex, FlatNode, TreeError};

/// Where a moved action goes within its new sibling group
#[derive(Debug, Clone, Copy)]
enum Anchor<'s> {
    Before(&'s str),
    After(&'s str),
    End,
}

/// Computes reorder/indent/outdent patches.
///
/// The flattened sequence decides visual relations (which sibling is
/// "above", which way a drag went). The full action collection is the
/// universe for sibling groups and position keys, so siblings hidden by
/// a collapse or a filter are still accounted for.
#[derive(Debug)]
pub struct Mutator<'f, 'a> {
    flat: &'f [FlatNode<'a>],
    index: ChildrenIndex<'a>,
    stride: i64,
}

impl<'f, 'a> Mutator<'f, 'a> {
    pub fn new(flat: &'f [FlatNode<'a>], actions: &'a [Action]) -> Result<Self, TreeError> {
        Ok(Mutator {
            flat,
            index: ChildrenIndex::build(actions)?,
            stride: DEFAULT_POSITION_STRIDE,
        })
    }

    pub fn with_stride(mut self, stride: i64) -> Self {
        self.stride = stride;
        self
    }

    /// Move `dragged` (with its subtree) into `target`'s slot in
    /// `target`'s sibling group. Dragging down lands just after the
    /// target; dragging up lands just before it.
    pub fn reorder(&self, dragged: &str, target: &str) -> Patch {
        if dragged == target {
            tracing::debug!(dragged, "reorder onto itself, nothing to do");
            return Patch::new();
        }
        let (Some(from), Some(to)) = (self.flat_index(dragged), self.flat_index(target)) else {
            tracing::debug!(dragged, target, "reorder of an id not in the outline");
            return Patch::new();
        };
        let (Some(moving), Some(target_action)) = (self.index.get(dragged), self.index.get(target))
        else {
            return Patch::new();
        };
        if self.index.is_descendant(dragged, target) {
            tracing::debug!(dragged, target, "reorder rejected: target is inside the dragged subtree");
            return Patch::new();
        }

        let parent = self.index.parent_of(target_action).map(|p| p.id.as_str());
        let anchor = if from < to {
            Anchor::After(target)
        } else {
            Anchor::Before(target)
        };
        self.place(moving, parent, anchor)
    }

    /// Make `id` the last child of the sibling directly above it.
    pub fn indent(&self, id: &str) -> Patch {
        let Some(at) = self.flat_index(id) else {
            tracing::debug!(id, "indent of an id not in the outline");
            return Patch::new();
        };
        let Some(moving) = self.index.get(id) else {
            return Patch::new();
        };
        let Some(above) = self.sibling_above(at) else {
            tracing::debug!(id, "indent: no preceding sibling");
            return Patch::new();
        };
        self.place(moving, Some(above.id.as_str()), Anchor::End)
    }

    /// Move `id` up one level, directly after its former parent.
    pub fn outdent(&self, id: &str) -> Patch {
        if self.flat_index(id).is_none() {
            tracing::debug!(id, "outdent of an id not in the outline");
            return Patch::new();
        }
        let Some(moving) = self.index.get(id) else {
            return Patch::new();
        };
        let Some(parent) = self.index.parent_of(moving) else {
            tracing::debug!(id, "outdent: already top-level");
            return Patch::new();
        };
        let grandparent = self.index.parent_of(parent).map(|g| g.id.as_str());
        self.place(moving, grandparent, Anchor::After(parent.id.as_str()))
    }

    fn flat_index(&self, id: &str) -> Option<usize> {
        self.flat.iter().position(|n| n.action.id == id)
    }

    /// Nearest earlier row at the same depth, provided no shallower row
    /// intervenes and it really is a sibling in the underlying data.
    fn sibling_above(&self, at: usize) -> Option<&'a Action> {
        let node = self.flat[at];
        let candidate = self.flat[..at]
            .iter()
            .rev()
            .find(|n| n.depth <= node.depth)
            .filter(|n| n.depth == node.depth)?
            .action;
        let own_parent = self.index.parent_of(node.action).map(|p| &p.id);
        let their_parent = self.index.parent_of(candidate).map(|p| &p.id);
        (own_parent == their_parent).then_some(candidate)
    }

    fn place(&self, moving: &Action, parent: Option<&str>, anchor: Anchor<'_>) -> Patch {
        let group: Vec<&'a Action> = self
            .index
            .children(parent)
            .iter()
            .copied()
            .filter(|a| a.id != moving.id)
            .collect();
        let find = |id: &str| group.iter().position(|a| a.id == id);
        let insert_at = match anchor {
            Anchor::Before(id) => find(id),
            Anchor::After(id) => find(id).map(|i| i + 1),
            Anchor::End => Some(group.len()),
        };
        let Some(insert_at) = insert_at else {
            return Patch::new();
        };

        let slot = slot_in(&group, insert_at, self.stride);
        let mut patch = Patch::new();
        let new_parent: Option<ActionId> = parent.map(str::to_string);
        if moving.parent_id != new_parent {
            patch.set_parent(&moving.id, new_parent);
        }
        if moving.position != slot.position {
            patch.set_position(&moving.id, slot.position);
        }
        for (sibling, position) in slot.renumbered {
            patch.set_position(&sibling.id, position);
        }
        patch
    }
}
