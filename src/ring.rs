//! Sorted, circular collection of virtual points.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// The ring itself: positions sorted ascending, each owned by a node id,
/// with wrap-around successor lookup.
///
/// An auxiliary id -> positions index keeps node removal at O(R log n)
/// instead of scanning every stored point.
#[derive(Debug, Clone, Default)]
pub(crate) struct Ring {
    points: BTreeMap<u64, Arc<str>>,
    index: HashMap<Arc<str>, Vec<u64>>,
}

impl Ring {
    pub fn new() -> Self {
        Ring::default()
    }

    // === Getters ===

    /// Number of virtual points on the ring.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns `true` if a virtual point is stored at `position`.
    pub fn contains(&self, position: u64) -> bool {
        self.points.contains_key(&position)
    }

    // === Public Methods ===

    /// Insert a virtual point, keeping the sort invariant.
    ///
    /// Returns `false` (and leaves the ring untouched) if the position is
    /// already taken; occupied positions are never overwritten.
    pub fn insert(&mut self, position: u64, owner: Arc<str>) -> bool {
        if self.points.contains_key(&position) {
            return false;
        }

        self.index.entry(owner.clone()).or_default().push(position);
        self.points.insert(position, owner);

        true
    }

    /// Remove every virtual point owned by `id`, returning their positions,
    /// or `None` if the node had none.
    pub fn remove_node(&mut self, id: &str) -> Option<Vec<u64>> {
        let positions = self.index.remove(id)?;

        for position in &positions {
            self.points.remove(position);
        }

        Some(positions)
    }

    /// The owner of the smallest stored position at or after `position`,
    /// wrapping around to the overall smallest (ring topology).
    ///
    /// `None` only on an empty ring.
    pub fn successor(&self, position: u64) -> Option<&str> {
        self.points
            .range(position..)
            .next()
            .or_else(|| self.points.iter().next())
            .map(|(_, owner)| owner.as_ref())
    }

    /// Walk clockwise from `position`, yielding each point's owner once,
    /// wrap included.
    pub fn successors(&self, position: u64) -> impl Iterator<Item = &str> + '_ {
        self.points
            .range(position..)
            .chain(self.points.range(..position))
            .map(|(_, owner)| owner.as_ref())
    }

    #[cfg(test)]
    pub fn points(&self) -> impl Iterator<Item = (u64, &str)> + '_ {
        self.points
            .iter()
            .map(|(position, owner)| (*position, owner.as_ref()))
    }
}
