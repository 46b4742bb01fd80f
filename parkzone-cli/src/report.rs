//! Human-readable output.

use std::fs::File;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use parkzone_core::history::{Analytics, UtilizationBand, ZoneUtilization};
use parkzone_core::ParkingSystem;
use parkzone_simulator::{OutcomeCounters, ReplayReport, SimulationReport};
use parkzone_telemetry::MetricsRecorder;

pub fn print_simulation(report: &SimulationReport) {
    println!("seed {} | {} events", report.seed, report.events);
    print_counters(&report.counters);
    print_analytics(&report.analytics);
    print_utilization(&report.utilization);
    println!("state hash: {}", report.state_hash);
}

pub fn print_replay(report: &ReplayReport) {
    if let Some(name) = &report.name {
        println!("scenario {name}");
    }
    for step in &report.steps {
        println!("  [{:>3}] {}", step.index, step.outcome);
    }
    print_counters(&report.counters);
    print_analytics(&report.analytics);
    print_utilization(&report.utilization);
    println!("state hash: {}", report.state_hash);
}

pub fn print_topology(system: &ParkingSystem) {
    for zone in system.zones().iter() {
        let neighbours: Vec<String> = zone.adjacent().iter().map(u32::to_string).collect();
        println!(
            "zone {} ({} slots, adjacent: {})",
            zone.id(),
            zone.total_capacity(),
            if neighbours.is_empty() {
                "none".to_string()
            } else {
                neighbours.join(", ")
            }
        );
        for area in zone.areas() {
            match area.id() {
                Some(id) => println!("  area {id}: {} slots", area.capacity()),
                None => println!("  (unconfigured area)"),
            }
        }
    }
    println!(
        "{} zones, {} slots, ledger capacity {}",
        system.zones().len(),
        system.zones().total_capacity(),
        system.ledger().capacity()
    );
}

pub fn print_metrics(metrics: Option<&MetricsRecorder>) {
    let Some(metrics) = metrics else {
        return;
    };
    match metrics.gather_metrics() {
        Ok(text) => print!("{text}"),
        Err(err) => tracing::warn!("Could not render metrics: {err}"),
    }
}

/// Drop a repro note next to the working directory.
pub fn write_bug_report(report: &str) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let filename = format!("parkzone_bug_report_{}.txt", now);
    match File::create(&filename).and_then(|mut file| file.write_all(report.as_bytes())) {
        Ok(()) => eprintln!("Bug report written to {}", filename),
        Err(err) => eprintln!("Failed to write bug report: {err}"),
    }
}

fn print_counters(counters: &OutcomeCounters) {
    println!(
        "created {} | allocated {} ({} cross-zone) | occupied {} | released {} | cancelled {} | rolled back {} | rejected {} ({} capacity)",
        counters.created,
        counters.allocated,
        counters.cross_zone,
        counters.occupied,
        counters.released,
        counters.cancelled,
        counters.rolled_back,
        counters.rejected,
        counters.capacity_exhausted,
    );
}

fn print_analytics(analytics: &Analytics) {
    println!(
        "requests {} | completed {} | cancelled {} | cross-zone {}",
        analytics.total_requests,
        analytics.completed_requests,
        analytics.cancelled_requests,
        analytics.cross_zone_allocations,
    );
    println!(
        "avg duration {:.2} | utilization {:.2}% | revenue {}",
        analytics.average_parking_duration,
        analytics.zone_utilization_rate,
        analytics.total_revenue,
    );
}

fn print_utilization(zones: &[ZoneUtilization]) {
    for usage in zones {
        let band = match usage.band() {
            UtilizationBand::Available => "available",
            UtilizationBand::Partial => "partial",
            UtilizationBand::Full => "full",
        };
        println!(
            "  zone {}: {}/{} occupied ({:.1}%, {band})",
            usage.zone_id,
            usage.occupied,
            usage.total,
            usage.rate(),
        );
    }
}
