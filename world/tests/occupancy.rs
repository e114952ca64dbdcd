use std::collections::BTreeMap;

use bastion_core::{CellSize, Footprint, GridCell, ObjectId, ObstacleId};
use bastion_world::{Grid, Placement};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Add { id: u32, x: i32, y: i32, wide: bool, solid: bool },
    Remove { id: u32 },
    Move { id: u32, x: i32, y: i32 },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u32..12, -1i32..9, -1i32..9, any::<bool>(), any::<bool>())
            .prop_map(|(id, x, y, wide, solid)| Op::Add { id, x, y, wide, solid }),
        (0u32..12).prop_map(|id| Op::Remove { id }),
        (0u32..12, -1i32..9, -1i32..9).prop_map(|(id, x, y)| Op::Move { id, x, y }),
    ]
}

fn object(id: u32) -> ObjectId {
    ObjectId::Obstacle(ObstacleId::new(id))
}

fn footprint(wide: bool, solid: bool) -> Footprint {
    let side = if wide { 2 } else { 1 };
    Footprint::new(CellSize::new(side, side), solid)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn occupancy_matches_placements(ops in prop::collection::vec(op(), 1..60)) {
        let mut grid = Grid::new(CellSize::new(8, 8));
        let mut expected: BTreeMap<ObjectId, Placement> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Add { id, x, y, wide, solid } => {
                    let cell = GridCell::new(x, y);
                    let footprint = footprint(wide, solid);
                    let fits = !expected.contains_key(&object(id))
                        && grid.contains(cell)
                        && !grid.is_out_at(footprint.size, cell)
                        && grid.can_fit_at(footprint.size, cell);
                    let result = grid.add(object(id), footprint, cell);
                    prop_assert_eq!(result.is_ok(), fits);
                    if fits {
                        let _ = expected.insert(object(id), Placement { origin: cell, footprint });
                    }
                }
                Op::Remove { id } => {
                    let result = grid.remove(object(id));
                    prop_assert_eq!(result.ok(), expected.remove(&object(id)));
                }
                Op::Move { id, x, y } => {
                    if let Some(placement) = expected.remove(&object(id)) {
                        let cell = GridCell::new(x, y);
                        let _ = grid.remove(object(id));
                        let fits = grid.contains(cell)
                            && !grid.is_out_at(placement.footprint.size, cell)
                            && grid.can_fit_at(placement.footprint.size, cell);
                        let _ = grid.add(object(id), placement.footprint, placement.origin);

                        let result = grid.move_to(object(id), cell);
                        prop_assert_eq!(result.is_ok(), fits);
                        if fits {
                            let _ = expected.insert(object(id), Placement { origin: cell, ..placement });
                        }
                    }
                }
            }

            for y in -1..9 {
                for x in -1..9 {
                    let cell = GridCell::new(x, y);
                    let covering: Vec<ObjectId> = expected
                        .iter()
                        .filter(|(_, placement)| placement.covers(cell))
                        .map(|(object, _)| *object)
                        .collect();
                    let solid: Vec<ObjectId> = expected
                        .iter()
                        .filter(|(_, placement)| placement.footprint.solid && placement.covers(cell))
                        .map(|(object, _)| *object)
                        .collect();

                    prop_assert!(solid.len() <= 1, "solid overlap at {:?}", cell);
                    prop_assert_eq!(grid.get_at(cell), covering.clone());
                    prop_assert_eq!(grid.is_empty_at(cell), covering.is_empty());
                    prop_assert_eq!(grid.solid_at(cell), solid.first().copied());
                }
            }
        }
    }
}
