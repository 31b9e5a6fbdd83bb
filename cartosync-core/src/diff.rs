//! Generic list diff driven by an identity predicate and a change extractor.
//!
//! [`diff`] partitions two lists into additions, updates and removals without
//! assuming identifiers are unique. Each new record is paired with the first
//! old record that the strategy deems the same and that has not already been
//! paired, so duplicate identities match in order of appearance.

/// Decides which records represent the same overlay and what differs
/// between them.
///
/// A blanket implementation covers `(is_same, changes)` closure pairs.
///
/// # Examples
/// ```
/// use cartosync_core::{DiffStrategy, diff};
///
/// let strategy = (
///     |a: &(u32, &str), b: &(u32, &str)| a.0 == b.0,
///     |a: &(u32, &str), b: &(u32, &str)| {
///         if a.1 == b.1 { Vec::new() } else { vec![b.1.to_owned()] }
///     },
/// );
/// let old = [(1, "a"), (2, "b")];
/// let new = [(2, "c"), (3, "d")];
/// let result = diff(&old, &new, &strategy);
/// assert_eq!(result.to_add, vec![&(3, "d")]);
/// assert_eq!(result.to_remove, vec![&(1, "a")]);
/// assert_eq!(result.to_update[0].changes, vec!["c".to_owned()]);
/// ```
pub trait DiffStrategy<T> {
    /// Description of one difference between paired records.
    type Change;

    /// Whether `old` and `new` describe the same overlay.
    fn is_same(&self, old: &T, new: &T) -> bool;

    /// Differences between two records already judged the same. An empty
    /// list means the pair needs no update.
    fn changes(&self, old: &T, new: &T) -> Vec<Self::Change>;
}

impl<T, C, S, F> DiffStrategy<T> for (S, F)
where
    S: Fn(&T, &T) -> bool,
    F: Fn(&T, &T) -> Vec<C>,
{
    type Change = C;

    fn is_same(&self, old: &T, new: &T) -> bool {
        (self.0)(old, new)
    }

    fn changes(&self, old: &T, new: &T) -> Vec<C> {
        (self.1)(old, new)
    }
}

/// A matched pair whose change list is non-empty.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Update<'a, T, C> {
    /// Previously applied record.
    pub old: &'a T,
    /// Incoming record.
    pub new: &'a T,
    /// What differs, in the order the strategy reported it.
    pub changes: Vec<C>,
}

/// Partition produced by [`diff`].
///
/// Every new record appears exactly once across `to_add` and the matched
/// pairs; every old record appears exactly once across `to_remove` and the
/// matched pairs. Matched pairs without changes are omitted.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DiffResult<'a, T, C> {
    /// New records with no counterpart, in new-list order.
    pub to_add: Vec<&'a T>,
    /// Matched records that changed, in new-list order.
    pub to_update: Vec<Update<'a, T, C>>,
    /// Old records with no counterpart, in old-list order.
    pub to_remove: Vec<&'a T>,
}

impl<T, C> DiffResult<'_, T, C> {
    /// Whether applying the result would do nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_remove.is_empty()
    }
}

/// Diff `old_items` against `new_items`.
///
/// Runs in `O(old * new)` predicate calls, which suits the tens to low
/// thousands of overlays a map shows.
#[must_use]
pub fn diff<'a, T, S>(
    old_items: &'a [T],
    new_items: &'a [T],
    strategy: &S,
) -> DiffResult<'a, T, S::Change>
where
    S: DiffStrategy<T> + ?Sized,
{
    let mut consumed = vec![false; old_items.len()];
    let mut to_add = Vec::new();
    let mut to_update = Vec::new();

    for new_item in new_items {
        let matched = old_items
            .iter()
            .zip(consumed.iter_mut())
            .find(|(old_item, taken)| !**taken && strategy.is_same(old_item, new_item));
        match matched {
            Some((old_item, taken)) => {
                *taken = true;
                let changes = strategy.changes(old_item, new_item);
                if !changes.is_empty() {
                    to_update.push(Update {
                        old: old_item,
                        new: new_item,
                        changes,
                    });
                }
            }
            None => to_add.push(new_item),
        }
    }

    let to_remove = old_items
        .iter()
        .zip(consumed)
        .filter_map(|(old_item, taken)| (!taken).then_some(old_item))
        .collect();

    DiffResult {
        to_add,
        to_update,
        to_remove,
    }
}
