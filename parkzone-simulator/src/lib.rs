/*!
# Parkzone Simulator

Deterministic workload generation and scenario replay for the parking
allocation engine.

## Key Components:
- **Virtual Clock:** simulated time feeding request and release timestamps.
- **Simulator:** seeded random lifecycle traffic against a configured facility.
- **Replay Engine:** step-by-step playback of YAML scenarios.
- **Invariant Checker:** whole-system consistency checks between events.

Every outcome is folded into a BLAKE3 hash, so two runs with the same seed
and configuration produce the same hex digest.
*/

pub mod error;
pub mod invariants;
pub mod outcome;
pub mod replay;
pub mod scenario;
pub mod virtual_clock;

use blake3::Hasher;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info};

use parkzone_config::ParkzoneConfig;
use parkzone_core::history::{Analytics, ZoneUtilization};
use parkzone_core::topology::Zone;
use parkzone_core::{ParkingSystem, RequestId, ZoneId};

pub use error::SimulationError;
pub use invariants::{InvariantChecker, InvariantViolation};
pub use outcome::{OutcomeCounters, StepOutcome};
pub use replay::{ReplayEngine, ReplayReport};
pub use scenario::{Scenario, ScenarioEvent, TopologyBase};
pub use virtual_clock::VirtualClock;

/// Largest clock step between two simulated events.
const MAX_TICKS_PER_EVENT: i64 = 30;
/// Most allocations a single simulated rollback undoes.
const MAX_ROLLBACK: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub events: usize,
    pub counters: OutcomeCounters,
    pub analytics: Analytics,
    pub utilization: Vec<ZoneUtilization>,
    pub state_hash: String,
}

impl SimulationReport {
    /// Compare against a previously recorded hash.
    pub fn verify(&self, expected: &str) -> Result<(), SimulationError> {
        if self.state_hash.eq_ignore_ascii_case(expected) {
            Ok(())
        } else {
            Err(SimulationError::HashMismatch {
                expected: expected.to_string(),
                actual: self.state_hash.clone(),
            })
        }
    }
}

/// Drives seeded random lifecycle traffic against a parking system.
pub struct Simulator {
    seed: u64,
    rng: StdRng,
    clock: VirtualClock,
    system: ParkingSystem,
    zone_ids: Vec<ZoneId>,
    state_hasher: Hasher,
    counters: OutcomeCounters,
    checker: Option<InvariantChecker>,
    events: usize,
}

impl Simulator {
    /// A simulator over the facility described by `config`.
    pub fn new(config: &ParkzoneConfig, seed: u64) -> Result<Self, SimulationError> {
        Ok(Self::with_system(ParkingSystem::from_config(config)?, seed))
    }

    /// A simulator over an already laid out system.
    pub fn with_system(system: ParkingSystem, seed: u64) -> Self {
        let zone_ids = system.zones().iter().map(Zone::id).collect();
        Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            clock: VirtualClock::default(),
            system,
            zone_ids,
            state_hasher: Hasher::new(),
            counters: OutcomeCounters::default(),
            checker: None,
            events: 0,
        }
    }

    /// Check system invariants after every event and fail on the first
    /// violation.
    pub fn with_invariant_checks(mut self) -> Self {
        self.checker = Some(InvariantChecker::new());
        self
    }

    /// Simulates a single random command.
    pub fn simulate_event(&mut self) -> Result<StepOutcome, SimulationError> {
        let index = self.events;
        self.events += 1;

        let now = self
            .clock
            .advance(self.rng.random_range(1..=MAX_TICKS_PER_EVENT));

        let outcome = match self.rng.random_range(0..100u32) {
            0..=29 => self.create(now),
            30..=54 => self.with_active(|system, id| {
                outcome::settle(system.allocate(id), StepOutcome::Allocated)
            }),
            55..=69 => self.with_active(|system, id| {
                outcome::settle(system.occupy(id), |_| StepOutcome::Occupied)
            }),
            70..=84 => self.with_active(|system, id| {
                outcome::settle(system.release(id, now), |fee| StepOutcome::Released { fee })
            }),
            85..=94 => self.with_active(|system, id| {
                outcome::settle(system.cancel(id), |_| StepOutcome::Cancelled)
            }),
            _ => {
                let count = self.rng.random_range(1..=MAX_ROLLBACK);
                outcome::settle(self.system.rollback_last_k(count), |done| {
                    StepOutcome::rolled_back(&done)
                })
            }
        };

        debug!(index, now, %outcome, "Simulated event");
        self.state_hasher
            .update(format!("{index} {now} {outcome}\n").as_bytes());
        self.counters.record(&outcome);

        if let Some(checker) = self.checker.as_mut() {
            checker
                .check(&self.system)
                .map_err(|violation| SimulationError::Invariant {
                    event: index,
                    violation,
                })?;
        }
        Ok(outcome)
    }

    /// Runs `event_count` more events and summarizes the whole run so far.
    pub fn run(&mut self, event_count: usize) -> Result<SimulationReport, SimulationError> {
        for _ in 0..event_count {
            self.simulate_event()?;
        }
        let report = self.report();
        info!(
            seed = self.seed,
            events = report.events,
            state_hash = %report.state_hash,
            "Simulation complete"
        );
        Ok(report)
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            seed: self.seed,
            events: self.events,
            counters: self.counters,
            analytics: self.system.analytics(),
            utilization: self.system.zone_utilization(),
            state_hash: self.state_hash(),
        }
    }

    /// Hex digest of every outcome so far.
    pub fn state_hash(&self) -> String {
        hex::encode(self.state_hasher.finalize().as_bytes())
    }

    pub fn system(&self) -> &ParkingSystem {
        &self.system
    }

    fn create(&mut self, now: i64) -> StepOutcome {
        if self.zone_ids.is_empty() {
            return StepOutcome::from(&parkzone_core::ParkingError::ZoneNotFound(0));
        }
        let zone = self.zone_ids[self.rng.random_range(0..self.zone_ids.len())];
        let vehicle = format!("SIM-{:05}", self.counters.created);
        outcome::settle(self.system.create_request(&vehicle, zone, now), |request_id| {
            StepOutcome::Created { request_id }
        })
    }

    /// Apply `command` to a random active request; with none active, a
    /// request id that was never issued is used so the command is rejected.
    fn with_active(
        &mut self,
        command: impl FnOnce(&mut ParkingSystem, RequestId) -> StepOutcome,
    ) -> StepOutcome {
        let active = self.system.active_requests().count();
        let id = if active == 0 {
            0
        } else {
            let pick = self.rng.random_range(0..active);
            self.system
                .active_requests()
                .nth(pick)
                .map_or(0, |request| request.id())
        };
        command(&mut self.system, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_hash() {
        let config = ParkzoneConfig::default();
        let first = Simulator::new(&config, 42).unwrap().run(500).unwrap();
        let second = Simulator::new(&config, 42).unwrap().run(500).unwrap();
        assert_eq!(first.state_hash, second.state_hash);
        assert_eq!(first.counters, second.counters);
        assert!(first.verify(&second.state_hash).is_ok());
    }

    #[test]
    fn different_seeds_diverge() {
        let config = ParkzoneConfig::default();
        let a = Simulator::new(&config, 1).unwrap().run(200).unwrap();
        let b = Simulator::new(&config, 2).unwrap().run(200).unwrap();
        assert_ne!(a.state_hash, b.state_hash);
    }

    #[test]
    fn mismatched_hash_is_an_error() {
        let report = Simulator::new(&ParkzoneConfig::default(), 7)
            .unwrap()
            .run(10)
            .unwrap();
        assert!(matches!(
            report.verify("00"),
            Err(SimulationError::HashMismatch { .. })
        ));
    }

    #[test]
    fn invariants_hold_under_random_traffic() {
        let mut simulator = Simulator::new(&ParkzoneConfig::default(), 9)
            .unwrap()
            .with_invariant_checks();
        let report = simulator.run(2_000).unwrap();
        assert_eq!(report.events, 2_000);
        assert!(report.counters.created > 0);
        assert!(report.counters.allocated > 0);
    }
}
