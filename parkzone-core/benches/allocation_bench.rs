#[macro_use]
extern crate criterion;

use criterion::{black_box, BatchSize, Criterion};

use parkzone_core::ledger::{AllocationOperation, RollbackLedger};
use parkzone_core::request::RequestState;
use parkzone_core::ParkingSystem;

fn facility(slots_per_zone: u32) -> ParkingSystem {
    let mut system = ParkingSystem::new(3);
    for zone in 1..=3 {
        system.setup_zone(zone, 1).unwrap();
        system.setup_area(zone, 0, zone * 100, slots_per_zone).unwrap();
    }
    system.add_zone_adjacency(1, 2).unwrap();
    system.add_zone_adjacency(2, 3).unwrap();
    system
}

fn bench_allocation(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocation_throughput");

    for slots in [64u32, 1024, 8192] {
        // Fill zone 1 and half of zone 2, so the first-fit scans run long.
        group.throughput(criterion::Throughput::Elements(u64::from(slots)));
        group.bench_function(format!("fill_{}", slots), |b| {
            b.iter_batched(
                || facility(slots),
                |mut system| {
                    for i in 0..(slots + slots / 2) {
                        let id = system.create_request("BENCH", 1, i64::from(i)).unwrap();
                        black_box(system.allocate(id).unwrap());
                    }
                    system
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_ledger_push(c: &mut Criterion) {
    let mut group = c.benchmark_group("ledger_push");

    for capacity in [128usize, 1000, 16384] {
        group.throughput(criterion::Throughput::Elements(capacity as u64));
        group.bench_function(format!("capacity_{}", capacity), |b| {
            let mut ledger = RollbackLedger::with_capacity(capacity);
            let operation = AllocationOperation {
                request_id: 1,
                vehicle_id: "BENCH".to_string(),
                slot_id: 1,
                zone_id: 1,
                timestamp: 0,
                previous_state: RequestState::Requested,
                new_state: RequestState::Allocated,
            };
            // Steady state: every push past capacity evicts.
            b.iter(|| black_box(ledger.push(operation.clone())));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_allocation, bench_ledger_push);
criterion_main!(benches);
