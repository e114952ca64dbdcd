#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic movement pacing that decides when enemies take their next
//! step.
//!
//! The world only moves an enemy when asked to. This system turns elapsed
//! time and per-kind speeds into those requests, one cell at a time.

use std::{collections::BTreeMap, time::Duration};

use bastion_core::{EnemyId, EnemyView};

/// Pure system that accumulates travel progress and emits step requests.
#[derive(Debug, Default)]
pub struct Movement {
    progress: BTreeMap<EnemyId, f32>,
}

impl Movement {
    /// Creates a system with no accumulated progress.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances every enemy with a planned step by `dt` and pushes the ids of
    /// those that covered a full cell, in id order.
    ///
    /// An enemy steps at most once per call. Enemies missing from the view
    /// lose their progress.
    pub fn handle(&mut self, dt: Duration, enemies: &EnemyView, out: &mut Vec<EnemyId>) {
        self.progress
            .retain(|id, _| enemies.iter().any(|enemy| enemy.id == *id));

        let seconds = dt.as_secs_f32();
        for enemy in enemies.iter() {
            if enemy.next_direction.is_none() {
                continue;
            }

            let progress = self.progress.entry(enemy.id).or_insert(0.0);
            *progress += enemy.kind.spec().speed * seconds;
            if *progress >= 1.0 {
                *progress = (*progress - 1.0).min(1.0);
                out.push(enemy.id);
            }
        }
    }

    /// Accumulated fraction of a cell for `enemy`.
    #[must_use]
    pub fn progress_of(&self, enemy: EnemyId) -> f32 {
        self.progress.get(&enemy).copied().unwrap_or(0.0)
    }
}
