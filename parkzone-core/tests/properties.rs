//! Property-based checks over random command sequences.

use proptest::prelude::*;

use parkzone_core::prelude::*;

#[derive(Debug, Clone)]
enum Command {
    Create(ZoneId),
    Allocate(usize),
    Occupy(usize),
    Release(usize),
    Cancel(usize),
    Rollback(usize),
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        3 => (1u32..=4).prop_map(Command::Create),
        3 => any::<usize>().prop_map(Command::Allocate),
        2 => any::<usize>().prop_map(Command::Occupy),
        2 => any::<usize>().prop_map(Command::Release),
        1 => any::<usize>().prop_map(Command::Cancel),
        1 => (1usize..4).prop_map(Command::Rollback),
    ]
}

/// Three zones in a line plus an isolated fourth.
fn facility() -> ParkingSystem {
    let mut system = ParkingSystem::new(4).with_ledger_capacity(8);
    for (zone, capacity) in [(1, 2), (2, 3), (3, 2), (4, 1)] {
        system.setup_zone(zone, 1).unwrap();
        system.setup_area(zone, 0, zone * 100, capacity).unwrap();
    }
    system.add_zone_adjacency(1, 2).unwrap();
    system.add_zone_adjacency(2, 3).unwrap();
    system
}

fn pick(ids: &[RequestId], index: usize) -> Option<RequestId> {
    (!ids.is_empty()).then(|| ids[index % ids.len()])
}

fn legal(from: RequestState, to: RequestState) -> bool {
    use RequestState::*;
    matches!(
        (from, to),
        (Requested, Allocated)
            | (Allocated, Occupied)
            | (Occupied, Released)
            | (Requested | Allocated, Cancelled)
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn lifecycle_invariants_hold(commands in prop::collection::vec(command(), 1..120)) {
        let mut system = facility();
        let mut ids: Vec<RequestId> = Vec::new();
        let mut clock: Timestamp = 0;
        let mut last_total = 0;

        for command in commands {
            clock += 1;
            let is_rollback = matches!(command, Command::Rollback(_));
            let before: Vec<(RequestId, RequestState)> = system
                .active_requests()
                .map(|r| (r.id(), r.state()))
                .collect();

            match command {
                Command::Create(zone) => {
                    ids.push(system.create_request("PX", zone, clock).unwrap());
                }
                Command::Allocate(i) => {
                    if let Some(id) = pick(&ids, i) {
                        let _ = system.allocate(id);
                    }
                }
                Command::Occupy(i) => {
                    if let Some(id) = pick(&ids, i) {
                        let _ = system.occupy(id);
                    }
                }
                Command::Release(i) => {
                    if let Some(id) = pick(&ids, i) {
                        let _ = system.release(id, clock);
                    }
                }
                Command::Cancel(i) => {
                    if let Some(id) = pick(&ids, i) {
                        let _ = system.cancel(id);
                    }
                }
                Command::Rollback(k) => {
                    let recorded = system.ledger().len();
                    let occupied = system.zones().total_occupied();
                    match system.rollback_last_k(k) {
                        Ok(outcomes) => {
                            prop_assert!(outcomes.len() <= k.min(recorded));
                            let freed = outcomes.iter().filter(|o| o.slot_freed).count() as u64;
                            prop_assert_eq!(system.zones().total_occupied(), occupied - freed);
                        }
                        Err(err) => prop_assert_eq!(err.kind(), ErrorKind::LedgerEmpty),
                    }
                }
            }

            // Ordinary commands only move along the table.
            if !is_rollback {
                for (id, old) in before {
                    let new = system
                        .active_request(id)
                        .map(Request::state)
                        .or_else(|| system.history().find(id).map(HistoryRecord::state))
                        .unwrap();
                    prop_assert!(old == new || legal(old, new), "{old} -> {new}");
                }
            }

            // Slots held match requests holding them.
            let holding = system
                .active_requests()
                .filter(|r| matches!(r.state(), RequestState::Allocated | RequestState::Occupied))
                .count() as u64;
            prop_assert_eq!(system.zones().total_occupied(), holding);

            for request in system.active_requests() {
                prop_assert!(!request.state().is_terminal());
            }

            let total = system.analytics().total_requests;
            prop_assert!(total >= last_total);
            last_total = total;
            prop_assert!(system.ledger().len() <= system.ledger().capacity());
        }
    }

    #[test]
    fn allocation_prefers_requested_zone(taken in 0u32..3) {
        let mut system = facility();
        for _ in 0..taken {
            let id = system.create_request("FILL", 2, 0).unwrap();
            system.allocate(id).unwrap();
        }
        let id = system.create_request("PROBE", 2, 0).unwrap();
        let allocation = system.allocate(id).unwrap();
        prop_assert_eq!(allocation.zone_id, 2);
        prop_assert!(!allocation.cross_zone);
    }
}
