//! Authoritative enemy state management utilities.

use std::collections::BTreeMap;

use bastion_core::{Direction, EnemyId, EnemyKind};

/// Mutable state of an enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) kind: EnemyKind,
    pub(crate) lives: u32,
    /// Direction of the last completed step.
    pub(crate) direction: Direction,
    /// Direction of the planned step; `None` while the enemy has no path.
    pub(crate) next_direction: Option<Direction>,
}

impl Enemy {
    /// Removes up to `damage` lives, reporting whether the enemy is now dead.
    pub(crate) fn hurt(&mut self, damage: u32) -> bool {
        self.lives = self.lives.saturating_sub(damage);
        self.lives == 0
    }
}

/// Registry that stores enemies and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn next_id(&self) -> EnemyId {
        self.next_enemy_id
    }

    /// Stores a freshly spawned enemy facing south with full lives.
    pub(crate) fn insert(&mut self, kind: EnemyKind) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(
            id,
            Enemy {
                kind,
                lives: kind.spec().initial_lives,
                direction: Direction::South,
                next_direction: None,
            },
        );
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (EnemyId, &Enemy)> {
        self.entries.iter().map(|(id, enemy)| (*id, enemy))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enemy_dies_on_last_life_only() {
        let mut registry = EnemyRegistry::new();
        let id = registry.insert(EnemyKind::Fast);
        let enemy = registry.get_mut(id).expect("inserted");

        assert!(!enemy.hurt(1));
        assert!(enemy.hurt(1));
        assert_eq!(enemy.lives, 0);
        assert!(enemy.hurt(1), "lives never go below zero");
    }

    #[test]
    fn spawned_enemy_starts_with_kind_lives() {
        let mut registry = EnemyRegistry::new();
        let id = registry.insert(EnemyKind::Boss);
        assert_eq!(registry.get(id).map(|enemy| enemy.lives), Some(20));
        assert_eq!(registry.next_id(), EnemyId::new(1));
        assert_eq!(registry.len(), 1);
    }
}
