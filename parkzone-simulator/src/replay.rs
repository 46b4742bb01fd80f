//! Replay module.
//!
//! Plays a [`Scenario`] back against a fresh parking system, driving request
//! and release times from a [`VirtualClock`]. Rejected commands are ordinary
//! outcomes and are recorded, not raised; only a malformed scenario (a
//! reference to a request that was never created) aborts the replay.

use blake3::Hasher;
use serde::Serialize;
use tracing::{debug, info, instrument};

use parkzone_config::ParkzoneConfig;
use parkzone_core::history::{Analytics, ZoneUtilization};
use parkzone_core::tariff::Tariff;
use parkzone_core::{ParkingSystem, RequestId};

use crate::outcome::{settle, OutcomeCounters, StepOutcome};
use crate::scenario::{Scenario, ScenarioEvent, TopologyBase};
use crate::virtual_clock::VirtualClock;
use crate::SimulationError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayStep {
    pub index: usize,
    pub event: ScenarioEvent,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub name: Option<String>,
    pub steps: Vec<ReplayStep>,
    pub counters: OutcomeCounters,
    pub analytics: Analytics,
    pub utilization: Vec<ZoneUtilization>,
    pub state_hash: String,
}

impl ReplayReport {
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

pub struct ReplayEngine {
    scenario: Scenario,
}

impl ReplayEngine {
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    /// Build the starting system, replay every event and summarize.
    pub fn run(&self, config: &ParkzoneConfig) -> Result<ReplayReport, SimulationError> {
        let mut system = self.base_system(config)?;
        self.run_on(&mut system)
    }

    /// Replay onto a caller-supplied system.
    #[instrument(skip_all, fields(scenario = self.scenario.name.as_deref().unwrap_or("unnamed")))]
    pub fn run_on(&self, system: &mut ParkingSystem) -> Result<ReplayReport, SimulationError> {
        let clock = VirtualClock::new(self.scenario.start_time);
        let mut requests: Vec<RequestId> = Vec::new();
        let mut counters = OutcomeCounters::default();
        let mut hasher = Hasher::new();
        let mut steps = Vec::with_capacity(self.scenario.events.len());

        for (index, event) in self.scenario.events.iter().enumerate() {
            let outcome = Self::apply(system, &clock, &mut requests, index, event)?;
            debug!(index, %outcome, "Replayed event");

            hasher.update(format!("{index} {outcome}\n").as_bytes());
            counters.record(&outcome);
            steps.push(ReplayStep {
                index,
                event: event.clone(),
                outcome,
            });
        }

        let state_hash = hex::encode(hasher.finalize().as_bytes());
        info!(steps = steps.len(), %state_hash, "Replay complete");

        Ok(ReplayReport {
            name: self.scenario.name.clone(),
            steps,
            counters,
            analytics: system.analytics(),
            utilization: system.zone_utilization(),
            state_hash,
        })
    }

    fn base_system(&self, config: &ParkzoneConfig) -> Result<ParkingSystem, SimulationError> {
        Ok(match self.scenario.topology {
            TopologyBase::Configured => ParkingSystem::from_config(config)?,
            TopologyBase::Empty => ParkingSystem::new(config.topology.max_zones)
                .with_ledger_capacity(config.ledger.capacity)
                .with_tariff(Tariff::from(&config.pricing)),
        })
    }

    fn apply(
        system: &mut ParkingSystem,
        clock: &VirtualClock,
        requests: &mut Vec<RequestId>,
        step: usize,
        event: &ScenarioEvent,
    ) -> Result<StepOutcome, SimulationError> {
        let outcome = match event {
            ScenarioEvent::SetupZone { zone, areas } => {
                settle(system.setup_zone(*zone, *areas), |_| StepOutcome::Configured)
            }
            ScenarioEvent::SetupArea {
                zone,
                index,
                area,
                capacity,
            } => settle(system.setup_area(*zone, *index, *area, *capacity), |_| {
                StepOutcome::Configured
            }),
            ScenarioEvent::Adjacent { a, b } => {
                settle(system.add_zone_adjacency(*a, *b), |_| StepOutcome::Configured)
            }
            ScenarioEvent::Advance { ticks } => StepOutcome::Advanced {
                now: clock.advance(*ticks),
            },
            ScenarioEvent::Create { vehicle, zone } => {
                let result = system.create_request(vehicle, *zone, clock.now());
                if let Ok(request_id) = result {
                    requests.push(request_id);
                }
                settle(result, |request_id| StepOutcome::Created { request_id })
            }
            ScenarioEvent::Allocate { request } => {
                settle(system.allocate(resolve(requests, step, *request)?), StepOutcome::Allocated)
            }
            ScenarioEvent::Occupy { request } => {
                settle(system.occupy(resolve(requests, step, *request)?), |_| StepOutcome::Occupied)
            }
            ScenarioEvent::Release { request } => settle(
                system.release(resolve(requests, step, *request)?, clock.now()),
                |fee| StepOutcome::Released { fee },
            ),
            ScenarioEvent::Cancel { request } => {
                settle(system.cancel(resolve(requests, step, *request)?), |_| StepOutcome::Cancelled)
            }
            ScenarioEvent::Rollback { count } => settle(system.rollback_last_k(*count), |done| {
                StepOutcome::rolled_back(&done)
            }),
        };
        Ok(outcome)
    }
}

fn resolve(requests: &[RequestId], step: usize, ordinal: usize) -> Result<RequestId, SimulationError> {
    requests
        .get(ordinal)
        .copied()
        .ok_or(SimulationError::UnknownRequest {
            step,
            ordinal,
            created: requests.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPILL_OVER: &str = r#"
name: spill-over
topology: empty
events:
  - { event: setup_zone, zone: 1, areas: 1 }
  - { event: setup_area, zone: 1, index: 0, area: 101, capacity: 1 }
  - { event: setup_zone, zone: 2, areas: 1 }
  - { event: setup_area, zone: 2, index: 0, area: 201, capacity: 5 }
  - { event: adjacent, a: 1, b: 2 }
  - { event: create, vehicle: A, zone: 1 }
  - { event: allocate, request: 0 }
  - { event: create, vehicle: B, zone: 1 }
  - { event: allocate, request: 1 }
"#;

    #[test]
    fn spill_over_scenario_allocates_cross_zone() {
        let scenario = Scenario::from_yaml(SPILL_OVER).unwrap();
        let report = ReplayEngine::new(scenario)
            .run(&ParkzoneConfig::default())
            .unwrap();

        assert_eq!(report.counters.cross_zone, 1);
        assert_eq!(report.analytics.cross_zone_allocations, 1);
        assert!(matches!(
            report.steps[8].outcome,
            StepOutcome::Allocated(allocation) if allocation.zone_id == 2 && allocation.cross_zone
        ));
    }

    #[test]
    fn replay_is_deterministic() {
        let config = ParkzoneConfig::default();
        let scenario = Scenario::from_yaml(SPILL_OVER).unwrap();
        let first = ReplayEngine::new(scenario.clone()).run(&config).unwrap();
        let second = ReplayEngine::new(scenario).run(&config).unwrap();
        assert_eq!(first.state_hash, second.state_hash);
    }

    #[test]
    fn recorded_hash_matches_regardless_of_case() {
        let scenario = Scenario::from_yaml(SPILL_OVER).unwrap();
        let report = ReplayEngine::new(scenario)
            .run(&ParkzoneConfig::default())
            .unwrap();

        assert!(report.verify(&report.state_hash.to_uppercase()).is_ok());
        assert!(matches!(
            report.verify("00"),
            Err(SimulationError::HashMismatch { .. })
        ));
    }

    #[test]
    fn rejected_commands_are_recorded_not_raised() {
        let scenario = Scenario::from_yaml(
            r#"
events:
  - { event: create, vehicle: A, zone: 1 }
  - { event: occupy, request: 0 }
  - { event: rollback, count: 2 }
"#,
        )
        .unwrap();
        let report = ReplayEngine::new(scenario)
            .run(&ParkzoneConfig::default())
            .unwrap();

        assert_eq!(report.counters.rejected, 2);
        assert!(report.steps[1].outcome.is_rejected());
    }

    #[test]
    fn dangling_request_reference_aborts() {
        let scenario = Scenario::from_yaml("events:\n  - { event: allocate, request: 3 }\n").unwrap();
        let err = ReplayEngine::new(scenario)
            .run(&ParkzoneConfig::default())
            .unwrap_err();
        assert!(matches!(
            err,
            SimulationError::UnknownRequest {
                step: 0,
                ordinal: 3,
                created: 0
            }
        ));
    }

    #[test]
    fn release_time_follows_virtual_clock() {
        let scenario = Scenario::from_yaml(
            r#"
start_time: 100
events:
  - { event: create, vehicle: A, zone: 2 }
  - { event: allocate, request: 0 }
  - { event: occupy, request: 0 }
  - { event: advance, ticks: 100 }
  - { event: release, request: 0 }
"#,
        )
        .unwrap();
        let report = ReplayEngine::new(scenario)
            .run(&ParkzoneConfig::default())
            .unwrap();

        assert_eq!(report.analytics.average_parking_duration, 100.0);
        assert_eq!(report.steps[4].outcome, StepOutcome::Released { fee: 1000 });
    }
}
