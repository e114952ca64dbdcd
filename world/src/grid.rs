//! Sparse occupancy map recording which objects cover which cells.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use bastion_core::{CellSize, Footprint, GridCell, ObjectId};

use crate::error::{Result, Violation, WorldError};

/// Where an object sits on the grid and how much room it takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Placement {
    /// Top-left cell of the footprint.
    pub origin: GridCell,
    /// Size and solidity of the footprint.
    pub footprint: Footprint,
}

impl Placement {
    /// Cells covered by the placement.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> {
        self.footprint.size.cells_from(self.origin)
    }

    /// Reports whether `cell` lies inside the placement.
    #[must_use]
    pub fn covers(&self, cell: GridCell) -> bool {
        let size = self.footprint.size;
        let dx = i64::from(cell.x()) - i64::from(self.origin.x());
        let dy = i64::from(cell.y()) - i64::from(self.origin.y());
        (0..i64::from(size.width())).contains(&dx) && (0..i64::from(size.height())).contains(&dy)
    }
}

/// The world's occupancy grid.
///
/// A cell is present in the occupancy map iff at least one object covers it,
/// and present in the solid map iff a solid object covers it. Several
/// non-solid objects may share a cell; solid objects never overlap.
#[derive(Clone, Debug)]
pub struct Grid {
    size: CellSize,
    occupancy: HashMap<GridCell, BTreeSet<ObjectId>>,
    solids: HashMap<GridCell, ObjectId>,
    placements: BTreeMap<ObjectId, Placement>,
}

impl Grid {
    /// Creates an empty grid spanning `size` cells.
    #[must_use]
    pub fn new(size: CellSize) -> Self {
        Self {
            size,
            occupancy: HashMap::new(),
            solids: HashMap::new(),
            placements: BTreeMap::new(),
        }
    }

    /// Bounds of the playable grid.
    #[must_use]
    pub const fn size(&self) -> CellSize {
        self.size
    }

    /// Reports whether `cell` lies inside the grid bounds.
    #[must_use]
    pub fn contains(&self, cell: GridCell) -> bool {
        u32::try_from(cell.x()).is_ok_and(|x| x < self.size.width())
            && u32::try_from(cell.y()).is_ok_and(|y| y < self.size.height())
    }

    /// True iff no object occupies the cell.
    #[must_use]
    pub fn is_empty_at(&self, cell: GridCell) -> bool {
        !self.occupancy.contains_key(&cell)
    }

    /// True iff a solid object occupies the cell.
    #[must_use]
    pub fn is_solid_at(&self, cell: GridCell) -> bool {
        self.solids.contains_key(&cell)
    }

    /// Objects occupying the cell in identifier order; empty when the cell is free.
    #[must_use]
    pub fn get_at(&self, cell: GridCell) -> Vec<ObjectId> {
        self.occupancy
            .get(&cell)
            .map(|objects| objects.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Solid object covering the cell, if any.
    #[must_use]
    pub fn solid_at(&self, cell: GridCell) -> Option<ObjectId> {
        self.solids.get(&cell).copied()
    }

    /// Every cell covered by at least one object, in no particular order.
    pub fn filled_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.occupancy.keys().copied()
    }

    /// Every solid cell, in no particular order.
    pub fn solid_cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        self.solids.keys().copied()
    }

    /// True if a footprint of `size` at `cell` would exceed the grid on its
    /// right or bottom edge. Negative origins are not considered here.
    #[must_use]
    pub fn is_out_at(&self, size: CellSize, cell: GridCell) -> bool {
        i64::from(cell.x()) + i64::from(size.width()) > i64::from(self.size.width())
            || i64::from(cell.y()) + i64::from(size.height()) > i64::from(self.size.height())
    }

    /// True iff no cell of a footprint of `size` at `cell` is solid.
    ///
    /// Non-solid occupants never block a fit.
    #[must_use]
    pub fn can_fit_at(&self, size: CellSize, cell: GridCell) -> bool {
        size.cells_from(cell).all(|covered| !self.is_solid_at(covered))
    }

    /// Current placement of `object`, if it is on the grid.
    #[must_use]
    pub fn placement_of(&self, object: ObjectId) -> Option<Placement> {
        self.placements.get(&object).copied()
    }

    /// Top-left cell of `object`, if it is on the grid.
    #[must_use]
    pub fn position_of(&self, object: ObjectId) -> Option<GridCell> {
        self.placements.get(&object).map(|placement| placement.origin)
    }

    /// Places `object` with its top-left corner at `cell`.
    ///
    /// The caller must have checked [`Grid::can_fit_at`] and the bounds; a
    /// violation is reported as [`WorldError::InvariantViolation`] and leaves
    /// the grid untouched.
    pub fn add(&mut self, object: ObjectId, footprint: Footprint, cell: GridCell) -> Result<()> {
        if self.placements.contains_key(&object) {
            return Err(Violation::AlreadyPlaced { object }.into());
        }
        if !self.contains(cell) || self.is_out_at(footprint.size, cell) {
            return Err(Violation::OutOfBounds { object, cell }.into());
        }
        if !self.can_fit_at(footprint.size, cell) {
            return Err(Violation::Blocked { object, cell }.into());
        }

        for covered in footprint.size.cells_from(cell) {
            let _ = self.occupancy.entry(covered).or_default().insert(object);
            if footprint.solid {
                let _ = self.solids.insert(covered, object);
            }
        }

        let _ = self.placements.insert(
            object,
            Placement {
                origin: cell,
                footprint,
            },
        );
        Ok(())
    }

    /// Removes `object` from every cell it covers, returning its old placement.
    pub fn remove(&mut self, object: ObjectId) -> Result<Placement> {
        let placement = self
            .placements
            .remove(&object)
            .ok_or(WorldError::NotFound(object))?;

        for covered in placement.cells() {
            if let Some(objects) = self.occupancy.get_mut(&covered) {
                let _ = objects.remove(&object);
                if objects.is_empty() {
                    let _ = self.occupancy.remove(&covered);
                }
            }
            if self.solids.get(&covered) == Some(&object) {
                let _ = self.solids.remove(&covered);
            }
        }

        Ok(placement)
    }

    /// Moves `object` so its top-left corner lands on `cell`.
    ///
    /// This is a remove followed by an add. If the add half fails its
    /// precondition the object stays off the grid; callers wanting a
    /// transactional move check [`Grid::can_fit_at`] first.
    pub fn move_to(&mut self, object: ObjectId, cell: GridCell) -> Result<()> {
        let placement = self.remove(object)?;
        self.add(object, placement.footprint, cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{EnemyId, TowerId, TowerKind};

    fn tower(id: u32) -> ObjectId {
        ObjectId::Tower(TowerId::new(id))
    }

    fn enemy(id: u32) -> ObjectId {
        ObjectId::Enemy(EnemyId::new(id))
    }

    fn walker() -> Footprint {
        Footprint::new(CellSize::new(1, 1), false)
    }

    #[test]
    fn tower_blocks_overlapping_tower() {
        let mut grid = Grid::new(CellSize::new(30, 30));
        let footprint = TowerKind::Common.footprint();
        let origin = GridCell::new(5, 5);

        assert!(grid.is_empty_at(GridCell::new(6, 6)));
        assert!(grid.can_fit_at(footprint.size, origin));
        grid.add(tower(0), footprint, origin).expect("fits");

        assert!(!grid.is_empty_at(GridCell::new(6, 6)));
        assert!(grid.is_solid_at(GridCell::new(6, 6)));
        assert!(!grid.can_fit_at(footprint.size, origin));
        assert!(!grid.can_fit_at(footprint.size, GridCell::new(6, 4)));
        assert_eq!(
            grid.add(tower(1), footprint, origin),
            Err(WorldError::InvariantViolation(Violation::Blocked {
                object: tower(1),
                cell: origin,
            }))
        );
        assert_eq!(grid.position_of(tower(1)), None);
    }

    #[test]
    fn non_solid_occupants_share_cells() {
        let mut grid = Grid::new(CellSize::new(4, 4));
        let cell = GridCell::new(1, 1);
        grid.add(enemy(2), walker(), cell).expect("fits");
        grid.add(enemy(1), walker(), cell).expect("fits");

        assert_eq!(grid.get_at(cell), vec![enemy(1), enemy(2)]);
        assert!(!grid.is_solid_at(cell));
        assert!(grid.can_fit_at(CellSize::new(2, 2), GridCell::new(0, 0)));
        assert!(grid.get_at(GridCell::new(3, 3)).is_empty());
    }

    #[test]
    fn tower_may_cover_walkers() {
        let mut grid = Grid::new(CellSize::new(4, 4));
        grid.add(enemy(0), walker(), GridCell::new(1, 1))
            .expect("fits");
        grid.add(tower(0), TowerKind::Hard.footprint(), GridCell::new(0, 0))
            .expect("walkers do not block");

        assert_eq!(grid.get_at(GridCell::new(1, 1)), vec![tower(0), enemy(0)]);
        assert_eq!(grid.solid_at(GridCell::new(1, 1)), Some(tower(0)));
    }

    #[test]
    fn remove_restores_empty_cells() {
        let mut grid = Grid::new(CellSize::new(30, 30));
        let footprint = TowerKind::Common.footprint();
        grid.add(tower(0), footprint, GridCell::new(5, 5))
            .expect("fits");

        let placement = grid.remove(tower(0)).expect("placed");

        assert_eq!(placement.origin, GridCell::new(5, 5));
        for cell in footprint.size.cells_from(GridCell::new(5, 5)) {
            assert!(grid.is_empty_at(cell));
            assert!(!grid.is_solid_at(cell));
        }
        assert_eq!(grid.filled_cells().count(), 0);
        assert_eq!(grid.remove(tower(0)), Err(WorldError::NotFound(tower(0))));
    }

    #[test]
    fn remove_keeps_other_occupants() {
        let mut grid = Grid::new(CellSize::new(4, 4));
        let cell = GridCell::new(2, 2);
        grid.add(enemy(0), walker(), cell).expect("fits");
        grid.add(enemy(1), walker(), cell).expect("fits");

        let _ = grid.remove(enemy(0)).expect("placed");

        assert_eq!(grid.get_at(cell), vec![enemy(1)]);
    }

    #[test]
    fn is_out_at_checks_high_side_only() {
        let grid = Grid::new(CellSize::new(10, 8));
        let size = CellSize::new(2, 2);
        assert!(!grid.is_out_at(size, GridCell::new(8, 6)));
        assert!(grid.is_out_at(size, GridCell::new(9, 6)));
        assert!(grid.is_out_at(size, GridCell::new(8, 7)));
        assert!(!grid.is_out_at(size, GridCell::new(-1, -1)));
    }

    #[test]
    fn add_rejects_out_of_bounds_footprints() {
        let mut grid = Grid::new(CellSize::new(10, 8));
        let footprint = TowerKind::Common.footprint();
        for cell in [GridCell::new(9, 0), GridCell::new(-1, 0)] {
            assert_eq!(
                grid.add(tower(0), footprint, cell),
                Err(WorldError::InvariantViolation(Violation::OutOfBounds {
                    object: tower(0),
                    cell,
                }))
            );
        }
        assert_eq!(grid.filled_cells().count(), 0);
    }

    #[test]
    fn double_add_is_an_invariant_violation() {
        let mut grid = Grid::new(CellSize::new(4, 4));
        grid.add(enemy(0), walker(), GridCell::new(0, 0))
            .expect("fits");
        let error = grid
            .add(enemy(0), walker(), GridCell::new(1, 1))
            .expect_err("already placed");
        assert!(error.is_fatal());
    }

    #[test]
    fn move_leaves_object_unplaced_when_target_is_solid() {
        let mut grid = Grid::new(CellSize::new(6, 6));
        grid.add(tower(0), TowerKind::Common.footprint(), GridCell::new(2, 2))
            .expect("fits");
        grid.add(enemy(0), walker(), GridCell::new(1, 2))
            .expect("fits");

        grid.move_to(enemy(0), GridCell::new(1, 1)).expect("free");
        assert_eq!(grid.position_of(enemy(0)), Some(GridCell::new(1, 1)));
        assert!(grid.is_empty_at(GridCell::new(1, 2)));

        assert!(grid.move_to(enemy(0), GridCell::new(2, 2)).is_err());
        assert_eq!(grid.position_of(enemy(0)), None);
        assert!(grid.is_empty_at(GridCell::new(1, 1)));
    }

    #[test]
    fn placement_covers_its_footprint() {
        let placement = Placement {
            origin: GridCell::new(3, 4),
            footprint: TowerKind::Common.footprint(),
        };
        assert!(placement.covers(GridCell::new(4, 5)));
        assert!(!placement.covers(GridCell::new(5, 5)));
        assert!(!placement.covers(GridCell::new(2, 4)));
    }
}
