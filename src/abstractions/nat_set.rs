/*!

A set of (small) natural numbers, backed by [`bit_set::BitSet`]. Used wherever the engine needs a
set of node/rule indices rather than a set of arbitrary values — most prominently the Hasse
diagram's iteration frontier, whose members are always small dense indices assigned at policy load
time.

*/

use std::fmt::{Debug, Formatter};
use bit_set::BitSet;

#[derive(Clone, Default, PartialEq, Eq)]
pub(crate) struct NatSet(BitSet);

impl NatSet {
  pub(crate) fn new() -> Self {
    NatSet(BitSet::new())
  }

  pub(crate) fn with_capacity(capacity: usize) -> Self {
    NatSet(BitSet::with_capacity(capacity))
  }

  pub(crate) fn insert(&mut self, value: usize) -> bool {
    self.0.insert(value)
  }

  pub(crate) fn remove(&mut self, value: usize) -> bool {
    self.0.remove(value)
  }

  pub(crate) fn contains(&self, value: usize) -> bool {
    self.0.contains(value)
  }

  pub(crate) fn len(&self) -> usize {
    self.0.len()
  }

  pub(crate) fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
    self.0.iter()
  }

  /// Removes every member also present in `other`, returning the count removed. Used by the
  /// Hasse diagram's pruning step: `frontier.remove_all(&supersignatures_of_failed_node)`.
  pub(crate) fn remove_all(&mut self, other: &NatSet) -> usize {
    let mut removed = 0;
    for value in other.iter() {
      if self.0.remove(value) {
        removed += 1;
      }
    }
    removed
  }

  pub(crate) fn union_with(&mut self, other: &NatSet) {
    self.0.union_with(&other.0);
  }
}

impl FromIterator<usize> for NatSet {
  fn from_iter<T: IntoIterator<Item = usize>>(iter: T) -> Self {
    let mut set = NatSet::new();
    for value in iter {
      set.insert(value);
    }
    set
  }
}

impl Debug for NatSet {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_set().entries(self.iter()).finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_contains_remove() {
    let mut set = NatSet::new();
    assert!(set.is_empty());
    assert!(set.insert(3));
    assert!(set.contains(3));
    assert!(!set.insert(3));
    assert!(set.remove(3));
    assert!(!set.contains(3));
  }

  #[test]
  fn remove_all_prunes_supersignature_family() {
    let mut frontier: NatSet = [1, 2, 3, 4, 5].into_iter().collect();
    let supersignatures: NatSet = [2, 4].into_iter().collect();
    let removed = frontier.remove_all(&supersignatures);
    assert_eq!(removed, 2);
    assert_eq!(frontier.iter().collect::<Vec<_>>(), vec![1, 3, 5]);
  }
}
