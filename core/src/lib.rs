#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bastion tower-defense engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the orchestration layer, and any presentation adapter. The world mutates
//! itself through explicit operations, records every observable change as an
//! [`Event`], and the [`Notifier`] delivers those events to registered
//! [`Listener`] implementations. Nothing in here depends on rendering.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod notify;

pub use notify::{Listener, NotifyError, Notifier};

/// Location of a single grid cell expressed as `x` (column) and `y` (row).
///
/// Coordinates are signed so that direction arithmetic may step outside the
/// grid; bounds are enforced by the grid, never by the coordinate itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    x: i32,
    y: i32,
}

impl GridCell {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Returns the neighbouring cell one step away in `direction`.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x + dx, self.y + dy)
    }

    /// Returns the cell from which a single step in `direction` lands on `self`.
    #[must_use]
    pub const fn step_back(self, direction: Direction) -> Self {
        let (dx, dy) = direction.offset();
        Self::new(self.x - dx, self.y - dy)
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

/// Size of a rectangular footprint or of the whole grid, measured in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSize {
    width: u32,
    height: u32,
}

impl CellSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Enumerates the cells covered by a footprint of this size anchored at
    /// `origin` (its top-left corner), column by column.
    pub fn cells_from(self, origin: GridCell) -> impl Iterator<Item = GridCell> {
        let width = i32::try_from(self.width).unwrap_or(i32::MAX);
        let height = i32::try_from(self.height).unwrap_or(i32::MAX);
        (0..width).flat_map(move |dx| {
            (0..height).map(move |dy| GridCell::new(origin.x() + dx, origin.y() + dy))
        })
    }
}

/// Footprint of a world object: how many cells it covers and whether those
/// cells block pathfinding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Footprint {
    /// Width and height of the object in cells.
    pub size: CellSize,
    /// Solid occupants block pathfinding and further solid placement.
    pub solid: bool,
}

impl Footprint {
    /// Creates a footprint descriptor.
    #[must_use]
    pub const fn new(size: CellSize, solid: bool) -> Self {
        Self { size, solid }
    }
}

/// Axis directions a unit may step in.
///
/// The declaration order is the fixed expansion order used by pathfinding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing `x`.
    West,
    /// Movement toward decreasing `y`.
    North,
    /// Movement toward increasing `x`.
    East,
    /// Movement toward increasing `y`.
    South,
}

impl Direction {
    /// All directions in pathfinding expansion order.
    pub const ALL: [Direction; 4] = [
        Direction::West,
        Direction::North,
        Direction::East,
        Direction::South,
    ];

    /// Unit `(dx, dy)` offset represented by the direction.
    #[must_use]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            Self::West => (-1, 0),
            Self::North => (0, -1),
            Self::East => (1, 0),
            Self::South => (0, 1),
        }
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an obstacle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identity of any object that can be placed on the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectId {
    /// A defensive tower.
    Tower(TowerId),
    /// A hostile unit.
    Enemy(EnemyId),
    /// The defended objective. A world holds at most one.
    HeadQuarters,
    /// A static blocking cell.
    Obstacle(ObstacleId),
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap, fast-reloading tower with a short sight.
    Common,
    /// Expensive tower that sees further but reloads slower.
    Hard,
}

/// Immutable configuration record attached to a [`TowerKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSpec {
    /// Footprint size in cells.
    pub size: CellSize,
    /// Minimum simulated time between two shots.
    pub reload: Duration,
    /// Speed of a shot in cells per second. Presentation only.
    pub shot_speed: f32,
    /// Radius, in cells, within which enemies are seen.
    pub sight_radius: f32,
    /// Rate at which the tower head turns, in degrees per second.
    pub turn_rate: f32,
    /// Economy delta charged when the tower is built.
    pub resources_to_add: i64,
    /// Economy delta charged when the tower is sold; negative means a rebate.
    pub resources_to_remove: i64,
}

impl TowerKind {
    /// Every tower kind, in declaration order.
    pub const ALL: [TowerKind; 2] = [TowerKind::Common, TowerKind::Hard];

    /// Configuration record for the kind.
    #[must_use]
    pub const fn spec(self) -> TowerSpec {
        match self {
            Self::Common => TowerSpec {
                size: CellSize::new(2, 2),
                reload: Duration::from_millis(800),
                shot_speed: 8.0,
                sight_radius: 3.0,
                turn_rate: 720.0,
                resources_to_add: 50,
                resources_to_remove: -30,
            },
            Self::Hard => TowerSpec {
                size: CellSize::new(2, 2),
                reload: Duration::from_millis(1200),
                shot_speed: 8.0,
                sight_radius: 5.0,
                turn_rate: 720.0,
                resources_to_add: 80,
                resources_to_remove: -50,
            },
        }
    }

    /// Grid footprint of the kind. Towers are always solid.
    #[must_use]
    pub const fn footprint(self) -> Footprint {
        Footprint::new(self.spec().size, true)
    }
}

/// Types of enemies that can be spawned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline enemy.
    Common,
    /// Fragile but quick enemy.
    Fast,
    /// Heavily armoured enemy.
    Boss,
}

/// Immutable configuration record attached to an [`EnemyKind`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySpec {
    /// Footprint size in cells.
    pub size: CellSize,
    /// Lives the enemy spawns with.
    pub initial_lives: u32,
    /// Movement speed in cells per second.
    pub speed: f32,
    /// Economy delta applied when the enemy is killed; negative means a reward.
    pub resources_to_kill: i64,
}

impl EnemyKind {
    /// Every enemy kind, in declaration order.
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Common, EnemyKind::Fast, EnemyKind::Boss];

    /// Configuration record for the kind.
    #[must_use]
    pub const fn spec(self) -> EnemySpec {
        match self {
            Self::Common => EnemySpec {
                size: CellSize::new(1, 1),
                initial_lives: 4,
                speed: 1.2,
                resources_to_kill: -5,
            },
            Self::Fast => EnemySpec {
                size: CellSize::new(1, 1),
                initial_lives: 2,
                speed: 1.8,
                resources_to_kill: -3,
            },
            Self::Boss => EnemySpec {
                size: CellSize::new(1, 1),
                initial_lives: 20,
                speed: 5.0,
                resources_to_kill: -50,
            },
        }
    }

    /// Grid footprint of the kind. Enemies never block pathfinding.
    #[must_use]
    pub const fn footprint(self) -> Footprint {
        Footprint::new(self.spec().size, false)
    }
}

/// Footprint of the headquarters.
pub const HEADQUARTERS_FOOTPRINT: Footprint = Footprint::new(CellSize::new(1, 1), false);
/// Energy the headquarters starts with.
pub const HEADQUARTERS_INITIAL_ENERGY: i32 = 100;
/// Energy the headquarters loses whenever an enemy reaches it.
pub const HEADQUARTERS_ENERGY_PER_ARRIVAL: u32 = 10;
/// Footprint of an obstacle.
pub const OBSTACLE_FOOTPRINT: Footprint = Footprint::new(CellSize::new(1, 1), true);
/// Damage dealt by a single tower shot.
pub const SHOT_DAMAGE: u32 = 1;
/// A tower only fires when its heading is closer than this to the target bearing.
pub const FIRING_ANGLE_THRESHOLD: f32 = 10.0;

/// Economy operations priced by the cost table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    /// Building a tower of the given kind.
    AddTower(TowerKind),
    /// Selling a tower of the given kind.
    RemoveTower(TowerKind),
    /// Killing an enemy of the given kind.
    KillEnemy(EnemyKind),
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AddTower(kind) => write!(f, "add {kind:?} tower"),
            Self::RemoveTower(kind) => write!(f, "remove {kind:?} tower"),
            Self::KillEnemy(kind) => write!(f, "kill {kind:?} enemy"),
        }
    }
}

/// Targeting state of a tower after its latest update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TowerState {
    /// No enemy within sight.
    Idle,
    /// An enemy is in sight but the head is not yet aligned with it.
    Aiming,
    /// The head is aligned and the tower fires whenever reloaded.
    Shooting,
}

/// Originator of an event; listeners subscribe per subject.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Subject {
    /// A placed world object.
    Object(ObjectId),
    /// The resource manager.
    Resources,
    /// The level orchestrator.
    Level,
}

/// Observable changes broadcast after the operation that caused them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    /// An object was placed in the world with its top-left corner at `cell`.
    Added {
        /// Object that entered the world.
        object: ObjectId,
        /// Top-left cell of its footprint.
        cell: GridCell,
    },
    /// An object left the world.
    Removed {
        /// Object that left the world.
        object: ObjectId,
    },
    /// A tower finished its per-tick update.
    TowerUpdated {
        /// Tower that was updated.
        tower: TowerId,
        /// Targeting state after the update.
        state: TowerState,
    },
    /// A tower became the selected tower.
    TowerActivated {
        /// Tower that was selected.
        tower: TowerId,
    },
    /// A tower stopped being the selected tower.
    TowerDeactivated {
        /// Tower that was deselected.
        tower: TowerId,
    },
    /// A tower fired at an enemy.
    TowerShot {
        /// Tower that fired.
        tower: TowerId,
        /// Enemy that was hit.
        target: EnemyId,
    },
    /// An enemy planned its next step.
    EnemyStartedMove {
        /// Enemy about to move.
        enemy: EnemyId,
        /// Direction of the upcoming step.
        direction: Direction,
    },
    /// An enemy lost lives.
    EnemyHurt {
        /// Enemy that was hurt.
        enemy: EnemyId,
        /// Lives removed.
        damage: u32,
    },
    /// An enemy ran out of lives.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Kind of the dead enemy.
        kind: EnemyKind,
    },
    /// An enemy reached the headquarters.
    EnemySucceeded {
        /// Enemy that arrived.
        enemy: EnemyId,
        /// Kind of the arriving enemy.
        kind: EnemyKind,
    },
    /// The headquarters lost energy.
    EnergyLost {
        /// Energy removed.
        damage: u32,
        /// Energy remaining afterwards, possibly negative.
        energy: i32,
    },
    /// The resource manager applied an operation.
    ResourcesOperated {
        /// Operation that was applied.
        operation: Operation,
        /// Balance after the operation.
        balance: i64,
    },
    /// No further spawn ticks are needed.
    SpawningStopped,
    /// The level reached a terminal state.
    LevelDone {
        /// `true` when the player defended the headquarters.
        user_success: bool,
    },
}

impl Event {
    /// Subject that emitted the event.
    #[must_use]
    pub const fn subject(&self) -> Subject {
        match *self {
            Self::Added { object, .. } | Self::Removed { object } => Subject::Object(object),
            Self::TowerUpdated { tower, .. }
            | Self::TowerActivated { tower }
            | Self::TowerDeactivated { tower }
            | Self::TowerShot { tower, .. } => Subject::Object(ObjectId::Tower(tower)),
            Self::EnemyStartedMove { enemy, .. }
            | Self::EnemyHurt { enemy, .. }
            | Self::EnemyDied { enemy, .. }
            | Self::EnemySucceeded { enemy, .. } => Subject::Object(ObjectId::Enemy(enemy)),
            Self::EnergyLost { .. } => Subject::Object(ObjectId::HeadQuarters),
            Self::ResourcesOperated { .. } => Subject::Resources,
            Self::SpawningStopped | Self::LevelDone { .. } => Subject::Level,
        }
    }
}

/// Continuous position measured in cells, used for sight and bearing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellPoint {
    x: f32,
    y: f32,
}

impl CellPoint {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Center of a footprint of `size` anchored at `origin`.
    #[must_use]
    pub fn center_of(origin: GridCell, size: CellSize) -> Self {
        Self::new(
            origin.x() as f32 + size.width() as f32 / 2.0,
            origin.y() as f32 + size.height() as f32 / 2.0,
        )
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance to `other`, in cells.
    #[must_use]
    pub fn distance(self, other: CellPoint) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Bearing from `self` toward `other` in degrees within `[0, 360)`.
    ///
    /// Zero points along increasing `y`; ninety along increasing `x`.
    #[must_use]
    pub fn bearing(self, other: CellPoint) -> f32 {
        (other.x - self.x)
            .atan2(other.y - self.y)
            .to_degrees()
            .rem_euclid(360.0)
    }
}

/// Minimum circular distance between two bearings, always within `[0, 180]`.
#[must_use]
pub fn angle_difference(alpha: f32, beta: f32) -> f32 {
    let difference = (alpha - beta).rem_euclid(360.0);
    difference.min(360.0 - difference)
}

/// Rotates `heading` toward `target` along the shorter arc by at most
/// `max_step` degrees, returning the new heading within `[0, 360)`.
#[must_use]
pub fn turn_towards(heading: f32, target: f32, max_step: f32) -> f32 {
    let signed = (target - heading + 540.0).rem_euclid(360.0) - 180.0;
    if signed.abs() <= max_step {
        return target.rem_euclid(360.0);
    }
    (heading + max_step.copysign(signed)).rem_euclid(360.0)
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Top-left cell of the tower footprint.
    pub origin: GridCell,
    /// Targeting state after the latest update.
    pub state: TowerState,
    /// Current head bearing in degrees.
    pub heading: f32,
    /// Bearing toward the current target in degrees.
    pub target_angle: f32,
    /// Whether the tower is the selected tower.
    pub active: bool,
}

/// Read-only snapshot describing all towers placed within the world.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EnemySnapshot {
    /// Identifier allocated to the enemy by the world.
    pub id: EnemyId,
    /// Kind of enemy.
    pub kind: EnemyKind,
    /// Top-left cell occupied by the enemy.
    pub cell: GridCell,
    /// Lives left.
    pub lives: u32,
    /// Direction of the last completed step.
    pub direction: Direction,
    /// Direction of the planned step, if the enemy has a path.
    pub next_direction: Option<Direction>,
}

/// Read-only snapshot describing all enemies inside the world.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemy snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}
