//! Error types raised by world and grid operations.

use bastion_core::{EnemyId, GridCell, ObjectId};
use thiserror::Error;

/// Convenience alias for results produced by the world crate.
pub type Result<T> = std::result::Result<T, WorldError>;

/// Failures surfaced by world operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WorldError {
    /// A grid precondition was violated. This is a caller bug and must halt
    /// the simulation rather than be corrected.
    #[error("invariant violated: {0}")]
    InvariantViolation(#[from] Violation),
    /// The object is not currently in the world.
    #[error("{0:?} is not in the world")]
    NotFound(ObjectId),
    /// The enemy stands on a cell that has no direction toward the headquarters.
    #[error("{enemy:?} at {cell:?} has no path to the headquarters")]
    NoPath {
        /// Enemy that asked for a direction.
        enemy: EnemyId,
        /// Cell the enemy occupies.
        cell: GridCell,
    },
    /// A tower at `cell` would cover the headquarters or cut it off from the
    /// spawn row or from an enemy.
    #[error("a tower at {cell:?} would seal off the headquarters")]
    SealsHeadQuarters {
        /// Requested top-left cell.
        cell: GridCell,
    },
    /// Pathfinding was requested before the headquarters was placed.
    #[error("the world has no headquarters")]
    MissingHeadQuarters,
}

impl WorldError {
    /// Reports whether the error indicates a programming-contract failure.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}

/// Grid preconditions that callers are expected to check before mutating.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// The object already occupies the grid.
    #[error("{object:?} is already placed")]
    AlreadyPlaced {
        /// Object that was added twice.
        object: ObjectId,
    },
    /// The footprint overlaps a solid cell.
    #[error("footprint of {object:?} at {cell:?} overlaps a solid cell")]
    Blocked {
        /// Object being placed.
        object: ObjectId,
        /// Requested top-left cell.
        cell: GridCell,
    },
    /// The footprint leaves the grid.
    #[error("footprint of {object:?} at {cell:?} leaves the grid")]
    OutOfBounds {
        /// Object being placed.
        object: ObjectId,
        /// Requested top-left cell.
        cell: GridCell,
    },
}
