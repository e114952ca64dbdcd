//! Notification bus delivering [`Event`] values to registered listeners.

use std::{collections::BTreeMap, fmt, rc::Rc};

use thiserror::Error;

use crate::{Direction, EnemyId, EnemyKind, Event, GridCell, ObjectId, Operation, Subject};
use crate::{TowerId, TowerState};

/// Observer of simulation events.
///
/// Every method defaults to a no-op, so implementors only override the
/// events they care about.
pub trait Listener {
    /// An object entered the world.
    fn on_add(&self, _object: ObjectId, _cell: GridCell) {}

    /// An object left the world.
    fn on_remove(&self, _object: ObjectId) {}

    /// A tower finished its per-tick update.
    fn on_update(&self, _tower: TowerId, _state: TowerState) {}

    /// A tower was selected.
    fn on_activate(&self, _tower: TowerId) {}

    /// A tower was deselected.
    fn on_deactivate(&self, _tower: TowerId) {}

    /// A tower fired.
    fn on_shoot(&self, _tower: TowerId, _target: EnemyId) {}

    /// An enemy planned its next step.
    fn on_start_move(&self, _enemy: EnemyId, _direction: Direction) {}

    /// An enemy lost lives.
    fn on_get_hurt(&self, _enemy: EnemyId, _damage: u32) {}

    /// An enemy died.
    fn on_die(&self, _enemy: EnemyId, _kind: EnemyKind) {}

    /// An enemy reached the headquarters.
    fn on_success(&self, _enemy: EnemyId, _kind: EnemyKind) {}

    /// The headquarters lost energy.
    fn on_lose_energy(&self, _damage: u32, _energy: i32) {}

    /// The resource balance changed.
    fn on_operate(&self, _operation: Operation, _balance: i64) {}

    /// Spawning finished; spawn timers may be dropped.
    fn on_stop_spawning(&self) {}

    /// The level ended.
    fn on_done(&self, _user_success: bool) {}
}

/// Routes an event to the matching listener method.
fn dispatch(listener: &dyn Listener, event: &Event) {
    match *event {
        Event::Added { object, cell } => listener.on_add(object, cell),
        Event::Removed { object } => listener.on_remove(object),
        Event::TowerUpdated { tower, state } => listener.on_update(tower, state),
        Event::TowerActivated { tower } => listener.on_activate(tower),
        Event::TowerDeactivated { tower } => listener.on_deactivate(tower),
        Event::TowerShot { tower, target } => listener.on_shoot(tower, target),
        Event::EnemyStartedMove { enemy, direction } => listener.on_start_move(enemy, direction),
        Event::EnemyHurt { enemy, damage } => listener.on_get_hurt(enemy, damage),
        Event::EnemyDied { enemy, kind } => listener.on_die(enemy, kind),
        Event::EnemySucceeded { enemy, kind } => listener.on_success(enemy, kind),
        Event::EnergyLost { damage, energy } => listener.on_lose_energy(damage, energy),
        Event::ResourcesOperated { operation, balance } => {
            listener.on_operate(operation, balance);
        }
        Event::SpawningStopped => listener.on_stop_spawning(),
        Event::LevelDone { user_success } => listener.on_done(user_success),
    }
}

/// Errors raised by the notification bus.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum NotifyError {
    /// The listener was not registered for the subject.
    #[error("listener is not registered for {subject:?}")]
    NotFound {
        /// Subject the removal targeted; `None` for global listeners.
        subject: Option<Subject>,
    },
}

/// Registry of listeners keyed by the subject they observe.
///
/// Registration has set semantics: registering the same listener twice for a
/// subject keeps a single entry. Listener identity is the `Rc` allocation.
#[derive(Default)]
pub struct Notifier {
    by_subject: BTreeMap<Subject, Vec<Rc<dyn Listener>>>,
    global: Vec<Rc<dyn Listener>>,
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier")
            .field("subjects", &self.by_subject.len())
            .field("global", &self.global.len())
            .finish()
    }
}

impl Notifier {
    /// Creates an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `listener` for events emitted by `subject`.
    pub fn add_listener(&mut self, subject: Subject, listener: Rc<dyn Listener>) {
        let listeners = self.by_subject.entry(subject).or_default();
        if !listeners.iter().any(|known| same_listener(known, &listener)) {
            listeners.push(listener);
        }
    }

    /// Unregisters `listener` from `subject`.
    pub fn remove_listener(
        &mut self,
        subject: Subject,
        listener: &Rc<dyn Listener>,
    ) -> Result<(), NotifyError> {
        let not_found = NotifyError::NotFound {
            subject: Some(subject),
        };
        let listeners = self.by_subject.get_mut(&subject).ok_or(not_found)?;
        let position = listeners
            .iter()
            .position(|known| same_listener(known, listener))
            .ok_or(not_found)?;
        drop(listeners.swap_remove(position));
        if listeners.is_empty() {
            let _ = self.by_subject.remove(&subject);
        }
        Ok(())
    }

    /// Registers `listener` for every event regardless of subject.
    pub fn add_global_listener(&mut self, listener: Rc<dyn Listener>) {
        if !self.global.iter().any(|known| same_listener(known, &listener)) {
            self.global.push(listener);
        }
    }

    /// Unregisters a global listener.
    pub fn remove_global_listener(&mut self, listener: &Rc<dyn Listener>) -> Result<(), NotifyError> {
        let position = self
            .global
            .iter()
            .position(|known| same_listener(known, listener))
            .ok_or(NotifyError::NotFound { subject: None })?;
        drop(self.global.swap_remove(position));
        Ok(())
    }

    /// Number of listeners registered for `subject`.
    #[must_use]
    pub fn listener_count(&self, subject: Subject) -> usize {
        self.by_subject.get(&subject).map_or(0, Vec::len)
    }

    /// Delivers each event, in order, to the listeners of its subject and to
    /// every global listener.
    ///
    /// Listeners of an object are dropped once its `Removed` event has been
    /// delivered; identifiers are never reused.
    pub fn broadcast(&mut self, events: &[Event]) {
        for event in events {
            let subject = event.subject();
            if let Some(listeners) = self.by_subject.get(&subject) {
                for listener in listeners {
                    dispatch(listener.as_ref(), event);
                }
            }
            for listener in &self.global {
                dispatch(listener.as_ref(), event);
            }
            if let Event::Removed { .. } = event {
                let _ = self.by_subject.remove(&subject);
            }
        }
    }
}

fn same_listener(left: &Rc<dyn Listener>, right: &Rc<dyn Listener>) -> bool {
    std::ptr::eq(
        Rc::as_ptr(left).cast::<()>(),
        Rc::as_ptr(right).cast::<()>(),
    )
}
