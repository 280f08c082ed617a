use prometheus::{
    Encoder, GaugeVec, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub zone_resolutions_total: IntCounterVec,
    pub resolution_latency_seconds: HistogramVec,
    pub close_contacts_total: IntCounter,
    pub zone_occupancy: GaugeVec,
    pub users_deactivated_total: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let zone_resolutions_total = IntCounterVec::new(
            Opts::new("zone_resolutions_total", "Total zone resolutions by outcome"),
            &["outcome"],
        )
        .expect("valid zone_resolutions_total metric");

        let resolution_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "resolution_latency_seconds",
                "Latency of zone resolution in seconds",
            ),
            &["outcome"],
        )
        .expect("valid resolution_latency_seconds metric");

        let close_contacts_total = IntCounter::new(
            "close_contacts_total",
            "Close contacts recorded by the proximity matcher",
        )
        .expect("valid close_contacts_total metric");

        let zone_occupancy = GaugeVec::new(
            Opts::new("zone_occupancy", "Occupants seen at the last resolution"),
            &["zone_id"],
        )
        .expect("valid zone_occupancy metric");

        let users_deactivated_total = IntCounter::new(
            "users_deactivated_total",
            "Users flagged inactive by the idle sweep",
        )
        .expect("valid users_deactivated_total metric");

        registry
            .register(Box::new(zone_resolutions_total.clone()))
            .expect("register zone_resolutions_total");
        registry
            .register(Box::new(resolution_latency_seconds.clone()))
            .expect("register resolution_latency_seconds");
        registry
            .register(Box::new(close_contacts_total.clone()))
            .expect("register close_contacts_total");
        registry
            .register(Box::new(zone_occupancy.clone()))
            .expect("register zone_occupancy");
        registry
            .register(Box::new(users_deactivated_total.clone()))
            .expect("register users_deactivated_total");

        Self {
            registry,
            zone_resolutions_total,
            resolution_latency_seconds,
            close_contacts_total,
            zone_occupancy,
            users_deactivated_total,
        }
    }

    pub fn observe_resolution(&self, outcome: &str, elapsed_secs: f64) {
        self.zone_resolutions_total
            .with_label_values(&[outcome])
            .inc();
        self.resolution_latency_seconds
            .with_label_values(&[outcome])
            .observe(elapsed_secs);
    }

    pub fn set_zone_occupancy(&self, zone_id: Uuid, users_within: usize) {
        self.zone_occupancy
            .with_label_values(&[&zone_id.to_string()])
            .set(users_within as f64);
    }

    /// Drops the occupancy series of a deleted zone.
    pub fn forget_zone(&self, zone_id: Uuid) {
        // absent when the zone was never resolved
        let _ = self
            .zone_occupancy
            .remove_label_values(&[&zone_id.to_string()]);
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::Metrics;

    #[test]
    fn deleted_zone_series_is_dropped() {
        let metrics = Metrics::new();
        let kept = Uuid::new_v4();
        let deleted = Uuid::new_v4();
        metrics.set_zone_occupancy(kept, 3);
        metrics.set_zone_occupancy(deleted, 7);

        metrics.forget_zone(deleted);
        metrics.forget_zone(Uuid::new_v4());

        let text = metrics.encode().unwrap();
        assert!(text.contains(&kept.to_string()));
        assert!(!text.contains(&deleted.to_string()));
    }
}
