//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use bastion_core::{TowerId, TowerKind, TowerState};

/// Mutable state of a tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    /// Kind of tower that was constructed.
    pub(crate) kind: TowerKind,
    /// Targeting state after the latest update.
    pub(crate) state: TowerState,
    /// Bearing the head currently points at.
    pub(crate) heading: f32,
    /// Bearing toward the chosen target.
    pub(crate) target_angle: f32,
    /// World clock reading of the latest shot, or of construction.
    pub(crate) last_shot: Duration,
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Reserves the identifier the next inserted tower will receive.
    pub(crate) fn next_id(&self) -> TowerId {
        self.next_tower_id
    }

    /// Stores a freshly built tower under the reserved identifier.
    pub(crate) fn insert(&mut self, kind: TowerKind, now: Duration) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            Tower {
                kind,
                state: TowerState::Idle,
                heading: 0.0,
                target_angle: 0.0,
                last_shot: now,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    /// Identifiers of every tower, captured so the caller may mutate while iterating.
    pub(crate) fn ids(&self) -> Vec<TowerId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (TowerId, &Tower)> {
        self.entries.iter().map(|(id, tower)| (*id, tower))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = TowerRegistry::new();
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.next_id().get(), 0);
    }

    #[test]
    fn identifiers_are_never_reused() {
        let mut registry = TowerRegistry::new();
        let first = registry.insert(TowerKind::Common, Duration::ZERO);
        let _ = registry.remove(first);
        let second = registry.insert(TowerKind::Hard, Duration::from_secs(2));

        assert_ne!(first, second);
        let tower = registry.get(second).expect("inserted");
        assert_eq!(tower.kind, TowerKind::Hard);
        assert_eq!(tower.state, TowerState::Idle);
        assert_eq!(tower.last_shot, Duration::from_secs(2));
        assert_eq!(registry.ids(), vec![second]);
    }
}
