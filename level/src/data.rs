//! Level configuration and the built-in level table.

use std::time::Duration;

use bastion_core::{CellSize, EnemyKind, GridCell, TowerKind};
use bastion_system_spawning::{Wave, WaveGroup};
use serde::{Deserialize, Serialize};

use crate::error::{LevelError, Result};

/// Number of levels returned by [`LevelData::builtin`].
pub const BUILTIN_LEVEL_COUNT: usize = 2;

const DEFAULT_SPAWN_INTERVAL_MS: u64 = 1_000;
const DEFAULT_SPAWN_SPREAD: u32 = 8;

fn default_spawn_interval_ms() -> u64 {
    DEFAULT_SPAWN_INTERVAL_MS
}

fn default_spawn_spread() -> u32 {
    DEFAULT_SPAWN_SPREAD
}

/// A tower present when the level starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TowerPlacement {
    /// Kind of tower.
    pub kind: TowerKind,
    /// Top-left cell of the tower.
    pub cell: GridCell,
}

/// Everything needed to construct a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelData {
    /// Display name.
    pub name: String,
    /// Grid width in cells.
    pub width: u32,
    /// Grid height in cells.
    pub height: u32,
    /// Cell of the headquarters.
    pub headquarters: GridCell,
    /// Towers placed for free at start.
    #[serde(default)]
    pub towers: Vec<TowerPlacement>,
    /// Solid cells placed at start.
    #[serde(default)]
    pub obstacles: Vec<GridCell>,
    /// Enemy waves in spawn order.
    pub waves: Vec<Wave>,
    /// Starting balance.
    pub initial_resources: i64,
    /// Milliseconds between two spawns.
    #[serde(default = "default_spawn_interval_ms")]
    pub spawn_interval_ms: u64,
    /// Maximum horizontal offset of a spawn from the grid center.
    #[serde(default = "default_spawn_spread")]
    pub spawn_spread: u32,
    /// Seed for wave shuffling and spawn offsets.
    #[serde(default)]
    pub seed: u64,
}

impl LevelData {
    /// Parses level data from TOML and validates it.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let data: Self = toml::from_str(contents)?;
        data.validate()?;
        Ok(data)
    }

    /// Returns built-in level `number`, counting from 1.
    #[must_use]
    pub fn builtin(number: usize) -> Option<Self> {
        let (name, groups, towers) = match number {
            1 => (
                "Level 1",
                vec![WaveGroup::new(EnemyKind::Common, 12)],
                vec![
                    (TowerKind::Common, GridCell::new(10, 2)),
                    (TowerKind::Common, GridCell::new(10, 6)),
                ],
            ),
            2 => (
                "Level 2",
                vec![
                    WaveGroup::new(EnemyKind::Common, 20),
                    WaveGroup::new(EnemyKind::Fast, 10),
                ],
                vec![
                    (TowerKind::Common, GridCell::new(10, 2)),
                    (TowerKind::Common, GridCell::new(10, 6)),
                    (TowerKind::Hard, GridCell::new(10, 10)),
                ],
            ),
            _ => return None,
        };

        Some(Self {
            name: name.to_owned(),
            width: 21,
            height: 16,
            headquarters: GridCell::new(10, 14),
            towers: towers
                .into_iter()
                .map(|(kind, cell)| TowerPlacement { kind, cell })
                .collect(),
            obstacles: Vec::new(),
            waves: vec![Wave::new(groups)],
            initial_resources: 1_000,
            spawn_interval_ms: DEFAULT_SPAWN_INTERVAL_MS,
            spawn_spread: DEFAULT_SPAWN_SPREAD,
            seed: 0,
        })
    }

    /// Grid bounds.
    #[must_use]
    pub const fn grid_size(&self) -> CellSize {
        CellSize::new(self.width, self.height)
    }

    /// Time between two spawns.
    #[must_use]
    pub const fn spawn_interval(&self) -> Duration {
        Duration::from_millis(self.spawn_interval_ms)
    }

    /// Total number of enemies across every wave.
    #[must_use]
    pub fn enemy_total(&self) -> usize {
        self.waves
            .iter()
            .map(Wave::size)
            .fold(0, usize::saturating_add)
    }

    /// Rejects data no level could be built from.
    ///
    /// Placement conflicts between towers and obstacles, and layouts that
    /// seal off the headquarters, are left to the world, which reports them
    /// when the level starts.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid("grid must have at least one cell"));
        }
        if i32::try_from(self.width).is_err() || i32::try_from(self.height).is_err() {
            return Err(invalid("grid is too large"));
        }
        let inside = |cell: GridCell| {
            u32::try_from(cell.x()).is_ok_and(|x| x < self.width)
                && u32::try_from(cell.y()).is_ok_and(|y| y < self.height)
        };
        if !inside(self.headquarters) {
            return Err(invalid("headquarters lies outside the grid"));
        }
        if self.initial_resources < 0 {
            return Err(invalid("initial resources must not be negative"));
        }
        if self.spawn_interval_ms == 0 {
            return Err(invalid("spawn interval must be positive"));
        }
        Ok(())
    }
}

fn invalid(reason: &str) -> LevelError {
    LevelError::InvalidLevelData(reason.to_owned())
}
