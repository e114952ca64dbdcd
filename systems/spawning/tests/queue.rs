use std::collections::BTreeMap;

use bastion_core::EnemyKind;
use bastion_system_spawning::{spawn_column, SpawnQueue, Wave, WaveGroup};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

fn waves() -> Vec<Wave> {
    vec![
        Wave::new(vec![
            WaveGroup::new(EnemyKind::Common, 6),
            WaveGroup::new(EnemyKind::Fast, 4),
        ]),
        Wave::new(vec![WaveGroup::new(EnemyKind::Boss, 2)]),
    ]
}

fn drain(mut queue: SpawnQueue) -> Vec<(usize, EnemyKind)> {
    let mut units = Vec::new();
    while let Some(unit) = queue.pop() {
        units.push((unit.wave, unit.kind));
    }
    units
}

#[test]
fn queue_holds_every_unit_in_wave_order() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);
    let queue = SpawnQueue::new(&waves(), &mut rng);
    assert_eq!(queue.remaining(), 12);

    let units = drain(queue);
    let waves_seen: Vec<usize> = units.iter().map(|(wave, _)| *wave).collect();
    let mut sorted = waves_seen.clone();
    sorted.sort_unstable();
    assert_eq!(waves_seen, sorted, "waves must not interleave");

    let mut counts = BTreeMap::new();
    for (_, kind) in &units {
        *counts.entry(*kind).or_insert(0) += 1;
    }
    assert_eq!(counts.get(&EnemyKind::Common), Some(&6));
    assert_eq!(counts.get(&EnemyKind::Fast), Some(&4));
    assert_eq!(counts.get(&EnemyKind::Boss), Some(&2));
    assert_eq!(units[10..], [(1, EnemyKind::Boss), (1, EnemyKind::Boss)]);
}

#[test]
fn same_seed_produces_same_order() {
    let first = SpawnQueue::new(&waves(), &mut ChaCha8Rng::seed_from_u64(42));
    let second = SpawnQueue::new(&waves(), &mut ChaCha8Rng::seed_from_u64(42));
    assert_eq!(drain(first), drain(second));
}

#[test]
fn front_does_not_consume() {
    let mut queue = SpawnQueue::new(&waves(), &mut ChaCha8Rng::seed_from_u64(1));
    let front = queue.front();
    assert_eq!(queue.remaining(), 12);
    assert_eq!(queue.pop(), front);
    assert_eq!(queue.remaining(), 11);
}

#[test]
fn empty_waves_produce_empty_queue() {
    let queue = SpawnQueue::new(&[Wave::default()], &mut ChaCha8Rng::seed_from_u64(1));
    assert!(queue.is_empty());
    assert_eq!(queue.front(), None);
}

#[test]
fn spawn_columns_stay_inside_the_grid() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..500 {
        let column = spawn_column(&mut rng, 21, 1, 30);
        assert!((0..=20).contains(&column), "column {column} escaped");
    }
    for _ in 0..100 {
        let column = spawn_column(&mut rng, 21, 1, 8);
        assert!((2..=18).contains(&column), "column {column} beyond spread");
    }
}
