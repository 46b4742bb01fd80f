//! ## parkzone-telemetry::metrics
//! **Prometheus counters for the request lifecycle**

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Label value for allocations served in the requested zone.
pub const LOCAL: &str = "local";
/// Label value for allocations served by an adjacent zone.
pub const CROSS_ZONE: &str = "cross_zone";

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: Registry,
    pub requests: IntCounter,
    pub allocations: IntCounterVec,
    pub allocation_failures: IntCounter,
    pub releases: IntCounter,
    pub cancellations: IntCounter,
    pub rollbacks: IntCounter,
    pub occupied_slots: IntGauge,
    pub parking_duration: Histogram,
}

impl MetricsRecorder {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let requests = IntCounter::new("parkzone_requests_total", "Parking requests created")?;
        let allocations = IntCounterVec::new(
            Opts::new("parkzone_allocations_total", "Successful slot allocations"),
            &["locality"],
        )?;
        let allocation_failures = IntCounter::new(
            "parkzone_allocation_failures_total",
            "Allocations refused for lack of capacity",
        )?;
        let releases = IntCounter::new("parkzone_releases_total", "Completed stays")?;
        let cancellations =
            IntCounter::new("parkzone_cancellations_total", "Cancelled requests")?;
        let rollbacks = IntCounter::new("parkzone_rollbacks_total", "Allocations undone")?;
        let occupied_slots =
            IntGauge::new("parkzone_occupied_slots", "Slots currently taken across all zones")?;
        let parking_duration = Histogram::with_opts(
            HistogramOpts::new("parkzone_parking_duration", "Time units between request and release")
                .buckets(vec![10.0, 30.0, 60.0, 120.0, 240.0, 480.0, 1440.0]),
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(allocations.clone()))?;
        registry.register(Box::new(allocation_failures.clone()))?;
        registry.register(Box::new(releases.clone()))?;
        registry.register(Box::new(cancellations.clone()))?;
        registry.register(Box::new(rollbacks.clone()))?;
        registry.register(Box::new(occupied_slots.clone()))?;
        registry.register(Box::new(parking_duration.clone()))?;

        Ok(Self {
            registry,
            requests,
            allocations,
            allocation_failures,
            releases,
            cancellations,
            rollbacks,
            occupied_slots,
            parking_duration,
        })
    }

    /// Render every registered metric in the Prometheus text format.
    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    pub fn inc_requests(&self) {
        self.requests.inc();
    }

    pub fn inc_allocations(&self, cross_zone: bool) {
        let locality = if cross_zone { CROSS_ZONE } else { LOCAL };
        self.allocations.with_label_values(&[locality]).inc();
    }

    pub fn inc_allocation_failures(&self) {
        self.allocation_failures.inc();
    }

    pub fn observe_release(&self, duration: i64) {
        self.releases.inc();
        self.parking_duration.observe(duration as f64);
    }

    pub fn inc_cancellations(&self) {
        self.cancellations.inc();
    }

    pub fn inc_rollbacks(&self) {
        self.rollbacks.inc();
    }

    pub fn set_occupied_slots(&self, occupied: u64) {
        self.occupied_slots.set(occupied as i64);
    }
}
