#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level orchestration for Bastion.
//!
//! A [`Level`] ties the [`World`], the [`ResourceManager`] and the wave
//! schedule together. It reacts to the events its own operations cause
//! (crediting kill rewards, discarding stranded enemies, detecting the end of
//! the level) and then broadcasts every event to the registered listeners.
//!
//! The level never drives time itself. An external loop calls
//! [`Level::update`] every tick, [`Level::spawn_enemy`] on the spawn cadence
//! and [`Level::move_enemy`] whenever an enemy is due to take a step.

use std::{rc::Rc, time::Duration};

use bastion_core::{
    EnemyId, Event, GridCell, Listener, Notifier, ObjectId, Operation, Subject, TowerId, TowerKind,
};
use bastion_system_economy::{CostTable, ResourceManager};
use bastion_system_spawning::{nearest_free_column, spawn_column, SpawnQueue};
use bastion_world::{query, World, WorldError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

mod data;
mod error;

pub use data::{LevelData, TowerPlacement, BUILTIN_LEVEL_COUNT};
pub use error::{LevelError, Result};

/// How a finished level ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Every enemy was dealt with before the headquarters ran out of energy.
    Won,
    /// The headquarters energy dropped below zero.
    Lost,
}

impl Outcome {
    /// True for [`Outcome::Won`].
    #[must_use]
    pub const fn user_success(self) -> bool {
        matches!(self, Self::Won)
    }
}

/// A running level.
#[derive(Debug)]
pub struct Level {
    data: LevelData,
    world: World,
    resources: ResourceManager,
    queue: SpawnQueue,
    notifier: Notifier,
    rng: ChaCha8Rng,
    started: bool,
    spawning: bool,
    outcome: Option<Outcome>,
}

impl Level {
    /// Creates a level from validated data. Nothing is placed until
    /// [`Level::start`] runs.
    pub fn new(data: LevelData) -> Result<Self> {
        data.validate()?;
        Ok(Self {
            world: World::new(data.grid_size()),
            resources: ResourceManager::new(data.initial_resources, CostTable::standard()),
            queue: SpawnQueue::default(),
            notifier: Notifier::new(),
            rng: ChaCha8Rng::seed_from_u64(data.seed),
            started: false,
            spawning: false,
            outcome: None,
            data,
        })
    }

    /// Places obstacles, the headquarters and the initial towers, builds the
    /// spawn queue and computes the first paths.
    ///
    /// Initial towers are free. A layout in which no free cell of the spawn
    /// row reaches the headquarters is rejected and leaves the level unstarted.
    pub fn start(&mut self) -> Result<()> {
        if self.started {
            return Err(LevelError::AlreadyStarted);
        }

        let mut world = World::new(self.data.grid_size());
        let mut events = Vec::new();
        for cell in &self.data.obstacles {
            let _ = world.add_obstacle(*cell, &mut events)?;
        }
        world.place_headquarters(self.data.headquarters, &mut events)?;
        for placement in &self.data.towers {
            let _ = world.add_tower(placement.kind, placement.cell, &mut events)?;
        }
        world.calculate_paths()?;
        if !world.spawn_row_reaches_headquarters() {
            return Err(LevelError::InvalidLevelData(
                "headquarters is unreachable from the spawn row".to_owned(),
            ));
        }

        self.world = world;
        self.started = true;
        self.queue = SpawnQueue::new(&self.data.waves, &mut self.rng);
        self.spawning = true;
        info!(
            level = %self.data.name,
            enemies = self.queue.remaining(),
            balance = self.resources.balance(),
            "level started"
        );
        if self.queue.is_empty() {
            self.stop_spawning(&mut events);
        }

        self.settle(events)
    }

    /// Advances towers by `dt`.
    pub fn update(&mut self, dt: Duration) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        let mut events = Vec::new();
        self.world.update(dt, &mut events)?;
        self.settle(events)
    }

    /// Spawns the next queued enemy on row 0.
    ///
    /// Returns `None` when nothing was spawned: spawning has stopped, or the
    /// whole spawn row is blocked, in which case the unit stays queued. An
    /// enemy spawned onto a cell without a path is discarded right away.
    pub fn spawn_enemy(&mut self, _dt: Duration) -> Result<Option<EnemyId>> {
        if !self.spawning || !self.is_running() {
            return Ok(None);
        }
        let mut events = Vec::new();
        let Some(unit) = self.queue.front() else {
            self.stop_spawning(&mut events);
            self.settle(events)?;
            return Ok(None);
        };

        let size = unit.kind.spec().size;
        let preferred = spawn_column(
            &mut self.rng,
            self.data.width,
            size.width(),
            self.data.spawn_spread,
        );
        let grid = query::grid(&self.world);
        let column = nearest_free_column(preferred, self.data.width, size.width(), |column| {
            grid.can_fit_at(size, GridCell::new(column, 0))
        });
        let Some(column) = column else {
            warn!(kind = ?unit.kind, "spawn row is blocked; spawn postponed");
            return Ok(None);
        };

        let _ = self.queue.pop();
        let enemy = self
            .world
            .add_enemy(unit.kind, GridCell::new(column, 0), &mut events)?;
        debug!(enemy = enemy.get(), kind = ?unit.kind, column, wave = unit.wave, "enemy spawned");
        match self.world.start_move(enemy, &mut events) {
            Ok(_) => {}
            Err(WorldError::NoPath { .. }) => self.discard(enemy, &mut events)?,
            Err(error) => return Err(error.into()),
        }

        if self.queue.is_empty() {
            self.stop_spawning(&mut events);
        }
        self.settle(events)?;
        Ok(Some(enemy))
    }

    /// Moves `enemy` one cell toward the headquarters.
    ///
    /// An enemy left without a path is removed without reward.
    pub fn move_enemy(&mut self, enemy: EnemyId) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        let mut events = Vec::new();
        match self.world.step_enemy(enemy, &mut events) {
            Ok(_) => {}
            Err(WorldError::NoPath { .. }) => self.discard(enemy, &mut events)?,
            Err(error) => return Err(error.into()),
        }
        self.settle(events)
    }

    /// Buys and places a tower, then recomputes paths.
    ///
    /// Fails before touching the balance or the world when the level is not
    /// running, or when the tower would not fit, would seal off the
    /// headquarters or is unaffordable.
    pub fn add_tower(&mut self, kind: TowerKind, cell: GridCell) -> Result<TowerId> {
        self.ensure_running()?;
        self.world.check_tower_placement(kind, cell)?;

        let mut events = Vec::new();
        self.resources
            .operate(Operation::AddTower(kind), &mut events)?;
        let tower = self.world.add_tower(kind, cell, &mut events)?;
        self.world.calculate_paths()?;
        self.settle(events)?;
        Ok(tower)
    }

    /// Sells a tower, crediting its rebate, then recomputes paths.
    pub fn remove_tower(&mut self, tower: TowerId) -> Result<()> {
        self.ensure_running()?;
        let kind = query::tower_kind(&self.world, tower)
            .ok_or(WorldError::NotFound(ObjectId::Tower(tower)))?;

        let mut events = Vec::new();
        self.resources
            .operate(Operation::RemoveTower(kind), &mut events)?;
        self.world.remove(ObjectId::Tower(tower), &mut events)?;
        self.world.calculate_paths()?;
        self.settle(events)
    }

    /// Tower covering `cell`, if any.
    #[must_use]
    pub fn tower_at(&self, cell: GridCell) -> Option<TowerId> {
        query::tower_at(&self.world, cell)
    }

    /// Selects `tower`.
    pub fn activate_tower(&mut self, tower: TowerId) -> Result<()> {
        self.ensure_running()?;
        let mut events = Vec::new();
        self.world.activate_tower(tower, &mut events)?;
        self.settle(events)
    }

    /// Clears the tower selection.
    pub fn deactivate_tower(&mut self) -> Result<()> {
        self.ensure_running()?;
        let mut events = Vec::new();
        self.world.deactivate_tower(&mut events);
        self.settle(events)
    }

    /// Registers `listener` for events about `subject`.
    pub fn add_listener(&mut self, subject: Subject, listener: Rc<dyn Listener>) {
        self.notifier.add_listener(subject, listener);
    }

    /// Unregisters `listener` from `subject`.
    pub fn remove_listener(&mut self, subject: Subject, listener: &Rc<dyn Listener>) -> Result<()> {
        self.notifier.remove_listener(subject, listener)?;
        Ok(())
    }

    /// Registers `listener` for every event.
    pub fn add_global_listener(&mut self, listener: Rc<dyn Listener>) {
        self.notifier.add_global_listener(listener);
    }

    /// Unregisters a global listener.
    pub fn remove_global_listener(&mut self, listener: &Rc<dyn Listener>) -> Result<()> {
        self.notifier.remove_global_listener(listener)?;
        Ok(())
    }

    /// Level configuration.
    #[must_use]
    pub fn data(&self) -> &LevelData {
        &self.data
    }

    /// Read-only world access.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read-only economy access.
    #[must_use]
    pub fn resources(&self) -> &ResourceManager {
        &self.resources
    }

    /// True while spawn ticks are still wanted.
    #[must_use]
    pub fn is_spawning(&self) -> bool {
        self.spawning
    }

    /// Enemies still waiting to spawn.
    #[must_use]
    pub fn remaining_to_spawn(&self) -> usize {
        self.queue.remaining()
    }

    /// How the level ended, once it has.
    #[must_use]
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    fn is_running(&self) -> bool {
        self.started && self.outcome.is_none()
    }

    fn ensure_running(&self) -> Result<()> {
        if !self.started {
            return Err(LevelError::NotStarted);
        }
        if self.outcome.is_some() {
            return Err(LevelError::Finished);
        }
        Ok(())
    }

    fn stop_spawning(&mut self, events: &mut Vec<Event>) {
        if !self.spawning {
            return;
        }
        self.spawning = false;
        info!("spawning stopped");
        events.push(Event::SpawningStopped);
    }

    fn discard(&mut self, enemy: EnemyId, events: &mut Vec<Event>) -> Result<()> {
        let cell = query::grid(&self.world).position_of(ObjectId::Enemy(enemy));
        warn!(enemy = enemy.get(), ?cell, "enemy has no path to the headquarters; discarding");
        self.world.remove(ObjectId::Enemy(enemy), events)?;
        Ok(())
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<Event>) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(outcome);
        self.spawning = false;
        info!(?outcome, balance = self.resources.balance(), "level done");
        events.push(Event::LevelDone {
            user_success: outcome.user_success(),
        });
    }

    /// Applies level rules to `events`, including the ones they trigger, and
    /// broadcasts the whole batch.
    ///
    /// The level is won once nothing is left to spawn and no enemy remains;
    /// an arrival that drains the headquarters below zero loses it first.
    fn settle(&mut self, mut events: Vec<Event>) -> Result<()> {
        let mut index = 0;
        while let Some(event) = events.get(index).copied() {
            index += 1;
            match event {
                Event::EnemyDied { kind, .. } => {
                    self.resources
                        .operate(Operation::KillEnemy(kind), &mut events)?;
                }
                Event::EnergyLost { energy, .. } if energy < 0 => {
                    self.finish(Outcome::Lost, &mut events);
                }
                _ => {}
            }
        }

        if self.started && self.queue.is_empty() && query::enemy_count(&self.world) == 0 {
            self.finish(Outcome::Won, &mut events);
        }

        self.notifier.broadcast(&events);
        Ok(())
    }
}
