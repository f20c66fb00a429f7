//! Tower bookkeeping for the authoritative world.

use std::collections::BTreeMap;

use rampart_core::{CellClassification, CellCoord};

/// Registry that remembers the classification each standing tower displaced.
///
/// Removal restores the displaced classification, so a cell that was rough
/// ground before construction becomes rough ground again afterwards.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    displaced: BTreeMap<CellCoord, CellClassification>,
}

impl TowerRegistry {
    /// Creates an empty registry.
    pub(crate) fn new() -> Self {
        Self {
            displaced: BTreeMap::new(),
        }
    }

    /// Forgets every recorded tower.
    pub(crate) fn clear(&mut self) {
        self.displaced.clear();
    }

    /// Records the classification displaced by a tower at the provided cell.
    pub(crate) fn record(&mut self, cell: CellCoord, displaced: CellClassification) {
        let _ = self.displaced.insert(cell, displaced);
    }

    /// Removes the record for the provided cell, yielding the displaced
    /// classification when one was stored.
    pub(crate) fn withdraw(&mut self, cell: CellCoord) -> Option<CellClassification> {
        self.displaced.remove(&cell)
    }

    /// Number of towers currently recorded.
    pub(crate) fn len(&self) -> usize {
        self.displaced.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty() {
        let registry = TowerRegistry::new();
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn withdraw_returns_recorded_classification_once() {
        let mut registry = TowerRegistry::new();
        let cell = CellCoord::new(3, 4);
        registry.record(cell, CellClassification::Rough);

        assert_eq!(registry.withdraw(cell), Some(CellClassification::Rough));
        assert_eq!(registry.withdraw(cell), None);
    }

    #[test]
    fn clear_forgets_every_record() {
        let mut registry = TowerRegistry::new();
        registry.record(CellCoord::new(1, 1), CellClassification::Empty);
        registry.record(CellCoord::new(2, 2), CellClassification::Rough);
        registry.clear();
        assert_eq!(registry.len(), 0);
    }
}
