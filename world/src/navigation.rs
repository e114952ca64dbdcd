//! Direction field guiding enemies toward the headquarters.

use std::collections::VecDeque;

use bastion_core::{Direction, GridCell};

/// Dense direction grid produced by a reverse breadth-first search seeded at
/// the headquarters.
///
/// Each entry holds the step an occupant of that cell should take to get one
/// cell closer to the headquarters. Cells that cannot reach it hold `None`,
/// as does the headquarters cell itself. Solid cells bordering the reachable
/// region receive a direction so a unit standing on one can step off it, but
/// they never propagate the search.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NavigationField {
    width: u32,
    height: u32,
    directions: Vec<Option<Direction>>,
}

impl NavigationField {
    /// Rebuilds the field from `target` using a reverse breadth-first search.
    ///
    /// Directions are tried in [`Direction::ALL`] order and the first one to
    /// reach a cell wins, which keeps the field deterministic.
    pub(crate) fn rebuild_with<F>(&mut self, width: u32, height: u32, target: GridCell, mut is_solid: F)
    where
        F: FnMut(GridCell) -> bool,
    {
        let width_usize = usize::try_from(width).unwrap_or(0);
        let height_usize = usize::try_from(height).unwrap_or(0);
        let cell_count = width_usize.checked_mul(height_usize).unwrap_or(0);

        self.width = width;
        self.height = height;
        self.directions.clear();
        self.directions.resize(cell_count, None);

        let Some(target_index) = self.index(target) else {
            return;
        };

        let mut visited = vec![false; cell_count];
        visited[target_index] = true;
        let mut queue = VecDeque::from([target]);

        while let Some(cell) = queue.pop_front() {
            if is_solid(cell) {
                continue;
            }

            for direction in Direction::ALL {
                let predecessor = cell.step_back(direction);
                let Some(index) = self.index(predecessor) else {
                    continue;
                };

                if visited[index] {
                    continue;
                }

                visited[index] = true;
                self.directions[index] = Some(direction);
                queue.push_back(predecessor);
            }
        }
    }

    /// Width of the field in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height of the field in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Direction recorded for `cell`, if it can reach the headquarters.
    #[must_use]
    pub fn direction(&self, cell: GridCell) -> Option<Direction> {
        self.index(cell)
            .and_then(|index| self.directions.get(index).copied().flatten())
    }

    /// Every cell holding a direction, in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCell, Direction)> + '_ {
        let width = usize::try_from(self.width).unwrap_or(1).max(1);
        self.directions
            .iter()
            .enumerate()
            .filter_map(move |(index, direction)| {
                let x = i32::try_from(index % width).ok()?;
                let y = i32::try_from(index / width).ok()?;
                direction.map(|direction| (GridCell::new(x, y), direction))
            })
    }

    fn index(&self, cell: GridCell) -> Option<usize> {
        let column = u32::try_from(cell.x()).ok()?;
        let row = u32::try_from(cell.y()).ok()?;
        if column >= self.width || row >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        usize::try_from(row)
            .ok()?
            .checked_mul(width)?
            .checked_add(usize::try_from(column).ok()?)
    }
}
