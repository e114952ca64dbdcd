use std::time::Duration;

use bastion_core::{CellSize, EnemyKind, GridCell};
use bastion_system_movement::Movement;
use bastion_world::{query, StepOutcome, World};

#[test]
fn paced_steps_bring_enemy_to_headquarters() {
    let mut world = World::new(CellSize::new(9, 9));
    let mut events = Vec::new();
    world
        .place_headquarters(GridCell::new(4, 8), &mut events)
        .expect("fits");
    world.calculate_paths().expect("headquarters placed");
    let enemy = world
        .add_enemy(EnemyKind::Fast, GridCell::new(4, 0), &mut events)
        .expect("fits");
    let _ = world.start_move(enemy, &mut events).expect("open field");

    let mut movement = Movement::new();
    let tick = Duration::from_millis(100);
    let mut requests = Vec::new();
    let mut elapsed = Duration::ZERO;
    let mut arrived = false;

    while !arrived && elapsed < Duration::from_secs(10) {
        elapsed += tick;
        requests.clear();
        movement.handle(tick, &query::enemy_view(&world), &mut requests);
        for id in &requests {
            if world.step_enemy(*id, &mut events).expect("open field") == StepOutcome::Arrived {
                arrived = true;
            }
        }
    }

    assert!(arrived);
    // Eight cells at 1.8 cells per second.
    assert!(elapsed >= Duration::from_millis(4_400), "arrived after {elapsed:?}");
    assert!(elapsed <= Duration::from_millis(4_600), "arrived after {elapsed:?}");
    assert_eq!(query::headquarters_energy(&world), Some(90));
}
