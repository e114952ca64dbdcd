use bastion_core::{EnemyKind, Operation, TowerKind};
use bastion_system_economy::{CostTable, ResourceManager};
use proptest::prelude::*;

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        prop::sample::select(TowerKind::ALL.to_vec()).prop_map(Operation::AddTower),
        prop::sample::select(TowerKind::ALL.to_vec()).prop_map(Operation::RemoveTower),
        prop::sample::select(EnemyKind::ALL.to_vec()).prop_map(Operation::KillEnemy),
    ]
}

proptest! {
    #[test]
    fn balance_tracks_applied_costs(
        initial in 0i64..500,
        operations in prop::collection::vec(operation(), 0..80),
    ) {
        let table = CostTable::standard();
        let mut resources = ResourceManager::new(initial, table.clone());
        let mut events = Vec::new();
        let mut spent = 0;

        for operation in operations {
            let allowed = resources.can_be_done(operation);
            let result = resources.operate(operation, &mut events);
            prop_assert_eq!(result.is_ok(), allowed);
            if allowed {
                spent += table.cost(operation).unwrap_or_default();
            }
            prop_assert!(resources.balance() >= 0);
            prop_assert_eq!(resources.balance(), initial - spent);
        }
    }
}
