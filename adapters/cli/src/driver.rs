//! Fixed-step loop driving a level to completion.

use std::{
    cell::{Cell, RefCell},
    collections::BTreeMap,
    rc::Rc,
    time::Duration,
};

use anyhow::Result;
use bastion_core::{EnemyId, EnemyKind, Listener, TowerId};
use bastion_level::{Level, LevelData, Outcome};
use bastion_system_movement::Movement;
use bastion_system_spawning::SpawnTimer;
use bastion_world::query;

/// Counters collected from the event stream.
#[derive(Debug, Default)]
struct Tally {
    shots: Cell<usize>,
    killed: Cell<usize>,
    arrived: Cell<usize>,
    spawning_stopped: Cell<bool>,
    done: Cell<Option<bool>>,
    kills_by_kind: RefCell<BTreeMap<EnemyKind, usize>>,
}

impl Listener for Tally {
    fn on_shoot(&self, _tower: TowerId, _target: EnemyId) {
        self.shots.set(self.shots.get() + 1);
    }

    fn on_die(&self, _enemy: EnemyId, kind: EnemyKind) {
        self.killed.set(self.killed.get() + 1);
        *self.kills_by_kind.borrow_mut().entry(kind).or_default() += 1;
    }

    fn on_success(&self, _enemy: EnemyId, _kind: EnemyKind) {
        self.arrived.set(self.arrived.get() + 1);
    }

    fn on_stop_spawning(&self) {
        self.spawning_stopped.set(true);
    }

    fn on_done(&self, user_success: bool) {
        self.done.set(Some(user_success));
    }
}

/// What a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) outcome: Option<Outcome>,
    pub(crate) elapsed: Duration,
    pub(crate) spawned: usize,
    pub(crate) killed: usize,
    pub(crate) kills_by_kind: BTreeMap<EnemyKind, usize>,
    pub(crate) arrived: usize,
    pub(crate) shots: usize,
    pub(crate) balance: i64,
    pub(crate) energy: Option<i32>,
}

/// Owns a level together with the timers that feed it.
#[derive(Debug)]
pub(crate) struct Driver {
    level: Level,
    timer: SpawnTimer,
    movement: Movement,
    tally: Rc<Tally>,
}

impl Driver {
    pub(crate) fn new(data: LevelData) -> Result<Self> {
        let timer = SpawnTimer::new(data.spawn_interval());
        let mut level = Level::new(data)?;
        let tally = Rc::new(Tally::default());
        level.add_global_listener(tally.clone());
        level.start()?;
        Ok(Self {
            level,
            timer,
            movement: Movement::new(),
            tally,
        })
    }

    /// Ticks until the level ends or `limit` of simulated time passes.
    pub(crate) fn run(&mut self, tick: Duration, limit: Duration) -> Result<Summary> {
        let mut elapsed = Duration::ZERO;
        let mut spawned = 0;
        let mut due = Vec::new();

        while self.tally.done.get().is_none() && elapsed < limit {
            elapsed += tick;
            self.level.update(tick)?;

            if !self.tally.spawning_stopped.get() {
                for _ in 0..self.timer.advance(tick) {
                    if self.level.spawn_enemy(self.timer.interval())?.is_some() {
                        spawned += 1;
                    }
                }
            }

            due.clear();
            self.movement
                .handle(tick, &query::enemy_view(self.level.world()), &mut due);
            for enemy in &due {
                self.level.move_enemy(*enemy)?;
            }
        }

        if self.tally.done.get().is_none() {
            tracing::warn!(?elapsed, "simulation limit reached before the level ended");
        }

        Ok(Summary {
            outcome: self.level.outcome(),
            elapsed,
            spawned,
            killed: self.tally.killed.get(),
            kills_by_kind: self.tally.kills_by_kind.borrow().clone(),
            arrived: self.tally.arrived.get(),
            shots: self.tally.shots.get(),
            balance: self.level.resources().balance(),
            energy: query::headquarters_energy(self.level.world()),
        })
    }
}
