use crate::model::action::Action;

/// Outcome of inserting one key into an ordered run of keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// Key for the inserted item
    pub key: i64,
    /// `(index into the original keys, new key)` for every existing key
    /// that had to move to make room
    pub renumbered: Vec<(usize, i64)>,
}

/// Pick a key for an item inserted before `keys[index]` (or at the end when
/// `index == keys.len()`).
///
/// `keys` must be ascending. Uses the midpoint of the neighbors when there
/// is room; otherwise widens a window around the insertion point one key
/// at a time in each direction until the window's keys can be re-spread
/// strictly between its outer neighbors, and renumbers only that window.
/// Tied keys are pulled into the starting window, so the group comes out
/// strictly increasing.
pub fn allocate(keys: &[i64], index: usize, stride: i64) -> Allocation {
    let index = index.min(keys.len());
    let stride = i128::from(stride.max(1));
    let (mut lo, mut hi) = tie_span(keys).map_or((index, index), |(first, last)| {
        (first.min(index), (last + 1).max(index))
    });

    loop {
        let lower = lo.checked_sub(1).map(|i| i128::from(keys[i]));
        let upper = keys.get(hi).map(|&k| i128::from(k));
        let slots = hi - lo + 1;

        if let Some(fresh) = spread(lower, upper, slots, stride) {
            let key = fresh[index - lo];
            let renumbered = (lo..hi)
                .map(|j| {
                    let slot = if j < index { j - lo } else { j - lo + 1 };
                    (j, fresh[slot])
                })
                .filter(|&(j, k)| keys[j] != k)
                .collect();
            return Allocation { key, renumbered };
        }

        if lo == 0 && hi == keys.len() {
            // Whole group is in the window and still doesn't fit at this
            // stride; fall back to the tightest stride that does.
            let fallback = (i128::from(i64::MAX) / (slots as i128 + 1)).max(1);
            let fresh: Vec<i64> = (1..=slots as i128)
                .map(|i| to_key(fallback * i).unwrap_or(i64::MAX))
                .collect();
            let key = fresh[index];
            let renumbered = (0..keys.len())
                .map(|j| (j, if j < index { fresh[j] } else { fresh[j + 1] }))
                .filter(|&(j, k)| keys[j] != k)
                .collect();
            return Allocation { key, renumbered };
        }

        lo = lo.saturating_sub(1);
        hi = (hi + 1).min(keys.len());
    }
}

/// Indices of the first and last key that share a value with a neighbor
fn tie_span(keys: &[i64]) -> Option<(usize, usize)> {
    let tied = |w: &[i64]| w[0] >= w[1];
    let first = keys.windows(2).position(tied)?;
    let last = keys.windows(2).rposition(tied)? + 1;
    Some((first, last))
}

/// `slots` strictly increasing keys strictly between `lower` and `upper`
/// (either bound may be open), or `None` if they don't fit in i64.
fn spread(lower: Option<i128>, upper: Option<i128>, slots: usize, stride: i128) -> Option<Vec<i64>> {
    let n = slots as i128;
    let raw: Vec<i128> = match (lower, upper) {
        (Some(l), Some(u)) => {
            let gap = u - l;
            if gap <= n {
                return None;
            }
            let step = gap / (n + 1);
            (1..=n).map(|i| l + step * i).collect()
        }
        (Some(l), None) => (1..=n).map(|i| l + stride * i).collect(),
        (None, Some(u)) => (0..n).map(|i| u - stride * (n - i)).collect(),
        (None, None) => (1..=n).map(|i| stride * i).collect(),
    };
    raw.into_iter().map(to_key).collect()
}

fn to_key(value: i128) -> Option<i64> {
    i64::try_from(value).ok()
}

/// Where an action lands when inserted into a sibling group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<'a> {
    pub position: i64,
    pub renumbered: Vec<(&'a Action, i64)>,
}

/// Insert into `group` (manual order, without the action being placed)
/// before `group[index]`.
pub fn slot_in<'a>(group: &[&'a Action], index: usize, stride: i64) -> Slot<'a> {
    let keys: Vec<i64> = group.iter().map(|a| a.position).collect();
    let alloc = allocate(&keys, index, stride);
    Slot {
        position: alloc.key,
        renumbered: alloc
            .renumbered
            .into_iter()
            .map(|(j, k)| (group[j], k))
            .collect(),
    }
}
