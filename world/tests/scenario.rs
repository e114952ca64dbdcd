use std::time::Duration;

use bastion_core::{CellSize, Direction, EnemyKind, Event, GridCell, ObjectId, TowerKind};
use bastion_world::{query, StepOutcome, World, WorldError};

fn open_world() -> World {
    let mut world = World::new(CellSize::new(30, 30));
    let mut events = Vec::new();
    world
        .place_headquarters(GridCell::new(15, 28), &mut events)
        .expect("headquarters fits");
    world.calculate_paths().expect("headquarters placed");
    world
}

#[test]
fn enemy_walks_straight_down_an_open_field() {
    let mut world = open_world();
    let mut events = Vec::new();
    let enemy = world
        .add_enemy(EnemyKind::Common, GridCell::new(15, 0), &mut events)
        .expect("fits");
    assert_eq!(world.start_move(enemy, &mut events), Ok(Direction::South));

    let mut steps = 0;
    loop {
        steps += 1;
        match world.step_enemy(enemy, &mut events).expect("open path") {
            StepOutcome::Moved { cell, next } => {
                assert_eq!(cell, GridCell::new(15, steps));
                assert_eq!(next, Direction::South);
            }
            StepOutcome::Arrived => break,
        }
    }

    assert_eq!(steps, 28);
    assert_eq!(query::headquarters_energy(&world), Some(90));
    assert_eq!(query::enemy_count(&world), 0);
}

#[test]
fn tower_wall_forces_a_detour() {
    let mut world = open_world();
    let mut events = Vec::new();
    for x in (0..30).step_by(2) {
        if x == 28 {
            continue;
        }
        let _ = world
            .add_tower(TowerKind::Common, GridCell::new(x, 10), &mut events)
            .expect("fits");
    }
    world.calculate_paths().expect("headquarters placed");

    let enemy = world
        .add_enemy(EnemyKind::Fast, GridCell::new(0, 0), &mut events)
        .expect("fits");
    let _ = world.start_move(enemy, &mut events).expect("gap reachable");

    let mut arrived = false;
    for _ in 0..200 {
        if world.step_enemy(enemy, &mut events).expect("gap reachable") == StepOutcome::Arrived {
            arrived = true;
            break;
        }
        let cell = query::grid(&world)
            .position_of(ObjectId::Enemy(enemy))
            .expect("enemy placed");
        assert!(!query::grid(&world).is_solid_at(cell), "stepped onto {cell:?}");
    }

    assert!(arrived);
}

#[test]
fn common_tower_kills_common_enemy_after_four_reloads() {
    let mut world = open_world();
    let mut events = Vec::new();
    let tower = world
        .add_tower(TowerKind::Common, GridCell::new(5, 5), &mut events)
        .expect("fits");
    let enemy = world
        .add_enemy(EnemyKind::Common, GridCell::new(6, 8), &mut events)
        .expect("fits");

    let tick = Duration::from_millis(100);
    let mut shots = 0;
    let mut died_at = None;
    for step in 1..=40 {
        events.clear();
        world.update(tick, &mut events).expect("update");
        shots += events
            .iter()
            .filter(|event| matches!(event, Event::TowerShot { tower: t, target } if *t == tower && *target == enemy))
            .count();
        if events.iter().any(|event| matches!(event, Event::EnemyDied { .. })) {
            died_at = Some(step);
            break;
        }
    }

    assert_eq!(shots, 4);
    assert_eq!(died_at, Some(32));
    assert_eq!(query::enemy_count(&world), 0);
}

#[test]
fn solid_placement_errors_leave_world_untouched() {
    let mut world = open_world();
    let mut events = Vec::new();
    let _ = world
        .add_tower(TowerKind::Hard, GridCell::new(3, 3), &mut events)
        .expect("fits");
    events.clear();

    assert!(matches!(
        world.add_tower(TowerKind::Common, GridCell::new(4, 4), &mut events),
        Err(WorldError::InvariantViolation(_))
    ));
    assert!(matches!(
        world.add_obstacle(GridCell::new(30, 0), &mut events),
        Err(WorldError::InvariantViolation(_))
    ));
    assert!(matches!(
        world.place_headquarters(GridCell::new(0, 0), &mut events),
        Err(WorldError::InvariantViolation(_))
    ));
    assert!(events.is_empty());
    assert_eq!(query::tower_count(&world), 1);
}
