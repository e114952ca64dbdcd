#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Bastion.
//!
//! The [`World`] owns the occupancy [`Grid`], the direction field and every
//! live entity. Each mutating operation appends the [`Event`] values it caused
//! to a caller-supplied buffer, in the order they happened, so the caller can
//! broadcast them once the mutation has completed.

use std::{cmp::Ordering, collections::BTreeSet, time::Duration};

use bastion_core::{
    angle_difference, turn_towards, CellPoint, CellSize, Direction, EnemyId, EnemyKind, Event,
    GridCell, ObjectId, ObstacleId, TowerId, TowerKind, TowerState, FIRING_ANGLE_THRESHOLD,
    HEADQUARTERS_ENERGY_PER_ARRIVAL, HEADQUARTERS_FOOTPRINT, HEADQUARTERS_INITIAL_ENERGY,
    OBSTACLE_FOOTPRINT, SHOT_DAMAGE,
};
use tracing::{debug, trace};

mod enemies;
mod error;
mod grid;
mod navigation;
mod towers;

pub use error::{Result, Violation, WorldError};
pub use grid::{Grid, Placement};
pub use navigation::NavigationField;

use enemies::EnemyRegistry;
use towers::TowerRegistry;

/// Result of a single enemy step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// The enemy moved to `cell` and planned its `next` step.
    Moved {
        /// Cell the enemy occupies after the step.
        cell: GridCell,
        /// Direction of the following step.
        next: Direction,
    },
    /// The enemy reached the headquarters and left the world.
    Arrived,
}

#[derive(Debug)]
struct HeadQuarters {
    energy: i32,
}

/// Represents the authoritative Bastion world state.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    navigation: NavigationField,
    towers: TowerRegistry,
    enemies: EnemyRegistry,
    obstacles: BTreeSet<ObstacleId>,
    next_obstacle_id: ObstacleId,
    headquarters: Option<HeadQuarters>,
    active_tower: Option<TowerId>,
    clock: Duration,
}

impl World {
    /// Creates an empty world whose grid spans `size` cells.
    #[must_use]
    pub fn new(size: CellSize) -> Self {
        Self {
            grid: Grid::new(size),
            navigation: NavigationField::default(),
            towers: TowerRegistry::new(),
            enemies: EnemyRegistry::new(),
            obstacles: BTreeSet::new(),
            next_obstacle_id: ObstacleId::new(0),
            headquarters: None,
            active_tower: None,
            clock: Duration::ZERO,
        }
    }

    /// Builds a tower of `kind` with its top-left corner at `cell`.
    ///
    /// Paths are not recalculated; callers follow up with
    /// [`World::calculate_paths`].
    pub fn add_tower(&mut self, kind: TowerKind, cell: GridCell, out: &mut Vec<Event>) -> Result<TowerId> {
        let id = self.towers.next_id();
        let object = ObjectId::Tower(id);
        self.grid.add(object, kind.footprint(), cell)?;
        let _ = self.towers.insert(kind, self.clock);
        debug!(tower = id.get(), ?kind, ?cell, "tower added");
        out.push(Event::Added { object, cell });
        Ok(id)
    }

    /// Checks that a tower of `kind` could be built at `cell`, reporting the
    /// violation [`World::add_tower`] would raise.
    ///
    /// Once the headquarters is placed the tower must also leave it exposed:
    /// it may not cover it, and a free spawn-row cell as well as every enemy
    /// must keep a path to it. Otherwise [`WorldError::SealsHeadQuarters`] is
    /// returned.
    pub fn check_tower_placement(&self, kind: TowerKind, cell: GridCell) -> Result<()> {
        let object = ObjectId::Tower(self.towers.next_id());
        let size = kind.spec().size;
        if !self.grid.contains(cell) || self.grid.is_out_at(size, cell) {
            return Err(Violation::OutOfBounds { object, cell }.into());
        }
        if !self.grid.can_fit_at(size, cell) {
            return Err(Violation::Blocked { object, cell }.into());
        }
        let Some(target) = self.grid.position_of(ObjectId::HeadQuarters) else {
            return Ok(());
        };
        let covered: BTreeSet<GridCell> = size.cells_from(cell).collect();
        if covered.contains(&target)
            || !self.keeps_headquarters_reachable(target, |c| covered.contains(&c))
        {
            return Err(WorldError::SealsHeadQuarters { cell });
        }
        Ok(())
    }

    /// True iff a free cell of row 0 has a path to the headquarters.
    #[must_use]
    pub fn spawn_row_reaches_headquarters(&self) -> bool {
        self.grid
            .position_of(ObjectId::HeadQuarters)
            .is_some_and(|target| self.keeps_headquarters_reachable(target, |_| false))
    }

    /// Rebuilds a scratch direction field with `blocked` cells treated as
    /// solid and reports whether a free spawn-row cell and every enemy can
    /// still reach `target`.
    fn keeps_headquarters_reachable<F>(&self, target: GridCell, blocked: F) -> bool
    where
        F: Fn(GridCell) -> bool,
    {
        let size = self.grid.size();
        let is_solid = |cell: GridCell| self.grid.is_solid_at(cell) || blocked(cell);
        let mut field = NavigationField::default();
        field.rebuild_with(size.width(), size.height(), target, &is_solid);

        let reaches = |cell: GridCell| cell == target || field.direction(cell).is_some();
        let mut spawn_row = (0..size.width())
            .filter_map(|x| i32::try_from(x).ok())
            .map(|x| GridCell::new(x, 0))
            .filter(|cell| !is_solid(*cell));
        spawn_row.any(reaches)
            && self
                .enemies
                .iter()
                .filter_map(|(enemy, _)| self.grid.position_of(ObjectId::Enemy(enemy)))
                .all(reaches)
    }

    /// Places an enemy of `kind` at `cell`. The enemy has no planned step
    /// until [`World::start_move`] is called.
    pub fn add_enemy(&mut self, kind: EnemyKind, cell: GridCell, out: &mut Vec<Event>) -> Result<EnemyId> {
        let id = self.enemies.next_id();
        let object = ObjectId::Enemy(id);
        self.grid.add(object, kind.footprint(), cell)?;
        let _ = self.enemies.insert(kind);
        debug!(enemy = id.get(), ?kind, ?cell, "enemy added");
        out.push(Event::Added { object, cell });
        Ok(id)
    }

    /// Places a solid obstacle at `cell`.
    pub fn add_obstacle(&mut self, cell: GridCell, out: &mut Vec<Event>) -> Result<ObstacleId> {
        let id = self.next_obstacle_id;
        let object = ObjectId::Obstacle(id);
        self.grid.add(object, OBSTACLE_FOOTPRINT, cell)?;
        self.next_obstacle_id = ObstacleId::new(id.get().saturating_add(1));
        let _ = self.obstacles.insert(id);
        out.push(Event::Added { object, cell });
        Ok(id)
    }

    /// Places the headquarters at `cell` with full energy.
    pub fn place_headquarters(&mut self, cell: GridCell, out: &mut Vec<Event>) -> Result<()> {
        let object = ObjectId::HeadQuarters;
        self.grid.add(object, HEADQUARTERS_FOOTPRINT, cell)?;
        self.headquarters = Some(HeadQuarters {
            energy: HEADQUARTERS_INITIAL_ENERGY,
        });
        debug!(?cell, "headquarters placed");
        out.push(Event::Added { object, cell });
        Ok(())
    }

    /// Removes any placed object from the world.
    ///
    /// Removing the selected tower deselects it first.
    pub fn remove(&mut self, object: ObjectId, out: &mut Vec<Event>) -> Result<()> {
        let _ = self.grid.remove(object)?;

        match object {
            ObjectId::Tower(tower) => {
                if self.active_tower == Some(tower) {
                    self.deactivate_tower(out);
                }
                let _ = self.towers.remove(tower);
            }
            ObjectId::Enemy(enemy) => {
                let _ = self.enemies.remove(enemy);
            }
            ObjectId::HeadQuarters => self.headquarters = None,
            ObjectId::Obstacle(obstacle) => {
                let _ = self.obstacles.remove(&obstacle);
            }
        }

        debug!(?object, "object removed");
        out.push(Event::Removed { object });
        Ok(())
    }

    /// Recomputes the direction field toward the headquarters.
    ///
    /// Must be called whenever the set of solid cells changes.
    pub fn calculate_paths(&mut self) -> Result<()> {
        let target = self
            .grid
            .position_of(ObjectId::HeadQuarters)
            .ok_or(WorldError::MissingHeadQuarters)?;
        let size = self.grid.size();
        let grid = &self.grid;
        self.navigation
            .rebuild_with(size.width(), size.height(), target, |cell| grid.is_solid_at(cell));
        debug!(reachable = self.navigation.iter().count(), "paths recalculated");
        Ok(())
    }

    /// Plans the next step of `enemy` from its current cell.
    ///
    /// Fails with [`WorldError::NoPath`] when the cell cannot reach the
    /// headquarters; the enemy is then left without a planned step.
    pub fn start_move(&mut self, enemy: EnemyId, out: &mut Vec<Event>) -> Result<Direction> {
        let object = ObjectId::Enemy(enemy);
        let cell = self
            .grid
            .position_of(object)
            .ok_or(WorldError::NotFound(object))?;
        let direction = self.navigation.direction(cell);
        let state = self
            .enemies
            .get_mut(enemy)
            .ok_or(WorldError::NotFound(object))?;
        state.next_direction = direction;

        let direction = direction.ok_or(WorldError::NoPath { enemy, cell })?;
        out.push(Event::EnemyStartedMove { enemy, direction });
        Ok(direction)
    }

    /// Moves `enemy` one cell along its planned step, then plans the next one.
    ///
    /// If the planned cell turned solid since planning, the enemy re-plans
    /// from where it stands before moving. Reaching the headquarters removes
    /// the enemy and drains headquarters energy. A [`WorldError::NoPath`]
    /// raised while planning the following step is returned after the move
    /// has been committed.
    pub fn step_enemy(&mut self, enemy: EnemyId, out: &mut Vec<Event>) -> Result<StepOutcome> {
        let object = ObjectId::Enemy(enemy);
        let placement = self
            .grid
            .placement_of(object)
            .ok_or(WorldError::NotFound(object))?;
        let planned = self
            .enemies
            .get(enemy)
            .ok_or(WorldError::NotFound(object))?
            .next_direction;
        let no_path = WorldError::NoPath {
            enemy,
            cell: placement.origin,
        };

        let mut direction = planned.ok_or(no_path)?;
        if !self.can_enter(placement, direction) {
            direction = self.start_move(enemy, out)?;
            if !self.can_enter(placement, direction) {
                return Err(no_path);
            }
        }

        let target = placement.origin.step(direction);
        self.grid.move_to(object, target)?;
        if let Some(state) = self.enemies.get_mut(enemy) {
            state.direction = direction;
            state.next_direction = None;
        }

        let arrived = self
            .grid
            .placement_of(ObjectId::HeadQuarters)
            .is_some_and(|headquarters| headquarters.covers(target));
        if arrived {
            self.arrive(enemy, out)?;
            return Ok(StepOutcome::Arrived);
        }

        let next = self.start_move(enemy, out)?;
        Ok(StepOutcome::Moved { cell: target, next })
    }

    /// Applies `damage` to `enemy`, removing it from the world when its lives
    /// run out.
    pub fn damage_enemy(&mut self, enemy: EnemyId, damage: u32, out: &mut Vec<Event>) -> Result<()> {
        let object = ObjectId::Enemy(enemy);
        let state = self
            .enemies
            .get_mut(enemy)
            .ok_or(WorldError::NotFound(object))?;
        let dead = state.hurt(damage);
        let kind = state.kind;

        out.push(Event::EnemyHurt { enemy, damage });
        if dead {
            out.push(Event::EnemyDied { enemy, kind });
            self.remove(object, out)?;
        }
        Ok(())
    }

    /// Advances the world clock by `dt` and updates every tower: target
    /// acquisition, aiming and firing.
    pub fn update(&mut self, dt: Duration, out: &mut Vec<Event>) -> Result<()> {
        self.clock = self.clock.saturating_add(dt);
        for tower in self.towers.ids() {
            self.update_tower(tower, dt, out)?;
        }
        Ok(())
    }

    /// Selects `tower`, deselecting the previously selected one.
    pub fn activate_tower(&mut self, tower: TowerId, out: &mut Vec<Event>) -> Result<()> {
        if self.towers.get(tower).is_none() {
            return Err(WorldError::NotFound(ObjectId::Tower(tower)));
        }
        self.deactivate_tower(out);
        self.active_tower = Some(tower);
        out.push(Event::TowerActivated { tower });
        Ok(())
    }

    /// Clears the tower selection, if any.
    pub fn deactivate_tower(&mut self, out: &mut Vec<Event>) {
        if let Some(tower) = self.active_tower.take() {
            out.push(Event::TowerDeactivated { tower });
        }
    }

    fn can_enter(&self, placement: Placement, direction: Direction) -> bool {
        let target = placement.origin.step(direction);
        let size = placement.footprint.size;
        self.grid.contains(target)
            && !self.grid.is_out_at(size, target)
            && self.grid.can_fit_at(size, target)
    }

    fn arrive(&mut self, enemy: EnemyId, out: &mut Vec<Event>) -> Result<()> {
        let object = ObjectId::Enemy(enemy);
        let kind = self
            .enemies
            .get(enemy)
            .ok_or(WorldError::NotFound(object))?
            .kind;
        out.push(Event::EnemySucceeded { enemy, kind });
        self.remove(object, out)?;

        if let Some(headquarters) = self.headquarters.as_mut() {
            let damage = HEADQUARTERS_ENERGY_PER_ARRIVAL;
            headquarters.energy = headquarters
                .energy
                .saturating_sub(i32::try_from(damage).unwrap_or(i32::MAX));
            out.push(Event::EnergyLost {
                damage,
                energy: headquarters.energy,
            });
        }
        Ok(())
    }

    fn update_tower(&mut self, id: TowerId, dt: Duration, out: &mut Vec<Event>) -> Result<()> {
        let object = ObjectId::Tower(id);
        let origin = self
            .grid
            .position_of(object)
            .ok_or(WorldError::NotFound(object))?;
        let spec = self
            .towers
            .get(id)
            .ok_or(WorldError::NotFound(object))?
            .kind
            .spec();
        let center = CellPoint::center_of(origin, spec.size);
        let target = self.choose_target(center, spec.sight_radius);
        let now = self.clock;

        let tower = self
            .towers
            .get_mut(id)
            .ok_or(WorldError::NotFound(object))?;
        let mut fire_at = None;
        match target {
            None => tower.state = TowerState::Idle,
            Some(candidate) => {
                tower.target_angle = center.bearing(candidate.center);
                if angle_difference(tower.target_angle, tower.heading) < FIRING_ANGLE_THRESHOLD {
                    tower.state = TowerState::Shooting;
                    if now.saturating_sub(tower.last_shot) >= spec.reload {
                        tower.last_shot = now;
                        fire_at = Some(candidate.enemy);
                    }
                } else {
                    tower.state = TowerState::Aiming;
                }
                tower.heading = turn_towards(
                    tower.heading,
                    tower.target_angle,
                    spec.turn_rate * dt.as_secs_f32(),
                );
            }
        }
        let state = tower.state;

        if let Some(enemy) = fire_at {
            out.push(Event::TowerShot { tower: id, target: enemy });
            self.damage_enemy(enemy, SHOT_DAMAGE, out)?;
        }

        trace!(tower = id.get(), ?state, "tower updated");
        out.push(Event::TowerUpdated { tower: id, state });
        Ok(())
    }

    /// Picks the enemy in sight that is closest to the headquarters.
    fn choose_target(&self, center: CellPoint, sight_radius: f32) -> Option<Candidate> {
        let goal = self.headquarters_center().unwrap_or(center);
        let mut best: Option<Candidate> = None;

        for (enemy, state) in self.enemies.iter() {
            let Some(origin) = self.grid.position_of(ObjectId::Enemy(enemy)) else {
                continue;
            };
            let enemy_center = CellPoint::center_of(origin, state.kind.spec().size);
            if center.distance(enemy_center) > sight_radius {
                continue;
            }

            let current = Candidate {
                enemy,
                center: enemy_center,
                distance_to_goal: enemy_center.distance(goal),
            };
            match &mut best {
                Some(existing) => {
                    if current.precedes(existing) {
                        *existing = current;
                    }
                }
                None => best = Some(current),
            }
        }

        best
    }

    fn headquarters_center(&self) -> Option<CellPoint> {
        self.grid
            .placement_of(ObjectId::HeadQuarters)
            .map(|placement| CellPoint::center_of(placement.origin, placement.footprint.size))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Candidate {
    enemy: EnemyId,
    center: CellPoint,
    distance_to_goal: f32,
}

impl Candidate {
    fn precedes(&self, other: &Self) -> bool {
        match self.distance_to_goal.total_cmp(&other.distance_to_goal) {
            Ordering::Equal => self.enemy < other.enemy,
            ordering => ordering == Ordering::Less,
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use bastion_core::{
        EnemySnapshot, EnemyView, GridCell, ObjectId, TowerId, TowerKind, TowerSnapshot,
        TowerView,
    };

    use super::{Grid, NavigationField, World};

    /// Provides read-only access to the occupancy grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Provides read-only access to the latest direction field.
    #[must_use]
    pub fn paths(world: &World) -> &NavigationField {
        &world.navigation
    }

    /// Total simulated time accumulated through updates.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Top-left cell of the headquarters, if placed.
    #[must_use]
    pub fn headquarters_cell(world: &World) -> Option<GridCell> {
        world.grid.position_of(ObjectId::HeadQuarters)
    }

    /// Remaining headquarters energy, if placed.
    #[must_use]
    pub fn headquarters_energy(world: &World) -> Option<i32> {
        world.headquarters.as_ref().map(|headquarters| headquarters.energy)
    }

    /// Currently selected tower.
    #[must_use]
    pub fn active_tower(world: &World) -> Option<TowerId> {
        world.active_tower
    }

    /// Number of towers in the world.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.len()
    }

    /// Number of enemies in the world.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Kind of the given tower, if it exists.
    #[must_use]
    pub fn tower_kind(world: &World, tower: TowerId) -> Option<TowerKind> {
        world.towers.get(tower).map(|state| state.kind)
    }

    /// Tower whose footprint covers `cell`, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: GridCell) -> Option<TowerId> {
        match world.grid.solid_at(cell)? {
            ObjectId::Tower(tower) => Some(tower),
            _ => None,
        }
    }

    /// Captures a read-only view of the towers placed in the world.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let snapshots = world
            .towers
            .iter()
            .filter_map(|(id, tower)| {
                let origin = world.grid.position_of(ObjectId::Tower(id))?;
                Some(TowerSnapshot {
                    id,
                    kind: tower.kind,
                    origin,
                    state: tower.state,
                    heading: tower.heading,
                    target_angle: tower.target_angle,
                    active: world.active_tower == Some(id),
                })
            })
            .collect();
        TowerView::from_snapshots(snapshots)
    }

    /// Captures a read-only view of the enemies inside the world.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        let snapshots = world
            .enemies
            .iter()
            .filter_map(|(id, enemy)| {
                let cell = world.grid.position_of(ObjectId::Enemy(id))?;
                Some(EnemySnapshot {
                    id,
                    kind: enemy.kind,
                    cell,
                    lives: enemy.lives,
                    direction: enemy.direction,
                    next_direction: enemy.next_direction,
                })
            })
            .collect();
        EnemyView::from_snapshots(snapshots)
    }
}
