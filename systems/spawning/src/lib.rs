#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wave scheduling and spawn placement for Bastion levels.

use std::{collections::VecDeque, time::Duration};

use bastion_core::EnemyKind;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// A number of enemies of one kind inside a wave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveGroup {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// How many of them.
    pub count: u32,
}

impl WaveGroup {
    /// Creates a group of `count` enemies of `kind`.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: u32) -> Self {
        Self { kind, count }
    }
}

/// Enemies released together before the next wave begins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    /// Composition of the wave.
    pub groups: Vec<WaveGroup>,
}

impl Wave {
    /// Creates a wave from its groups.
    #[must_use]
    pub fn new(groups: Vec<WaveGroup>) -> Self {
        Self { groups }
    }

    /// Total number of enemies in the wave.
    #[must_use]
    pub fn size(&self) -> usize {
        self.groups
            .iter()
            .map(|group| usize::try_from(group.count).unwrap_or(usize::MAX))
            .fold(0, usize::saturating_add)
    }
}

/// One pending enemy in the spawn queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpawnUnit {
    /// Index of the wave the unit belongs to.
    pub wave: usize,
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
}

/// Ordered enemies still to be spawned.
///
/// Each wave is flattened into individual units and shuffled on its own;
/// waves keep their configured order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SpawnQueue {
    units: VecDeque<SpawnUnit>,
}

impl SpawnQueue {
    /// Builds the queue for `waves`, shuffling each wave with `rng`.
    pub fn new<R: Rng + ?Sized>(waves: &[Wave], rng: &mut R) -> Self {
        let mut units = VecDeque::new();
        for (wave, composition) in waves.iter().enumerate() {
            let mut flattened: Vec<SpawnUnit> = composition
                .groups
                .iter()
                .flat_map(|group| {
                    std::iter::repeat(SpawnUnit {
                        wave,
                        kind: group.kind,
                    })
                    .take(usize::try_from(group.count).unwrap_or(0))
                })
                .collect();
            flattened.shuffle(rng);
            units.extend(flattened);
        }
        Self { units }
    }

    /// Next unit to spawn without consuming it.
    #[must_use]
    pub fn front(&self) -> Option<SpawnUnit> {
        self.units.front().copied()
    }

    /// Consumes the next unit.
    pub fn pop(&mut self) -> Option<SpawnUnit> {
        self.units.pop_front()
    }

    /// True once every unit has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Number of units still waiting.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.units.len()
    }
}

/// Fixed-cadence timer telling the driver how many spawns are due.
#[derive(Debug)]
pub struct SpawnTimer {
    interval: Duration,
    accumulator: Duration,
}

impl SpawnTimer {
    /// Creates a timer firing every `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
        }
    }

    /// Interval between two spawns.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Accumulates `dt` and returns how many intervals elapsed.
    pub fn advance(&mut self, dt: Duration) -> usize {
        if self.interval.is_zero() {
            return 0;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        let mut attempts = 0;
        while self.accumulator >= self.interval {
            self.accumulator -= self.interval;
            attempts += 1;
        }
        attempts
    }
}

/// Picks the spawn column on row 0: the horizontal center of the grid
/// shifted by a random offset within `spread`, clamped so a footprint of
/// `enemy_width` stays inside the grid.
pub fn spawn_column<R: Rng + ?Sized>(
    rng: &mut R,
    grid_width: u32,
    enemy_width: u32,
    spread: u32,
) -> i32 {
    let center = i64::from(grid_width / 2);
    let spread = i64::from(spread);
    let offset = if spread == 0 {
        0
    } else {
        rng.gen_range(-spread..=spread)
    };
    clamp_column(center + offset, grid_width, enemy_width)
}

/// Closest column to `preferred` for which `is_free` holds, trying the left
/// side first on equal distance.
pub fn nearest_free_column<F>(
    preferred: i32,
    grid_width: u32,
    enemy_width: u32,
    mut is_free: F,
) -> Option<i32>
where
    F: FnMut(i32) -> bool,
{
    let last = clamp_column(i64::from(u32::MAX), grid_width, enemy_width);
    let preferred = preferred.clamp(0, last);
    for distance in 0..=last {
        let left = preferred - distance;
        if left >= 0 && is_free(left) {
            return Some(left);
        }
        let right = preferred + distance;
        if distance > 0 && right <= last && is_free(right) {
            return Some(right);
        }
    }
    None
}

fn clamp_column(column: i64, grid_width: u32, enemy_width: u32) -> i32 {
    let last = i64::from(grid_width.saturating_sub(enemy_width));
    i32::try_from(column.clamp(0, last)).unwrap_or(0)
}
