use prometheus::{Encoder, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub bookings_total: IntCounterVec,
    pub stage_transitions_total: IntCounterVec,
    pub price_estimates_total: IntCounterVec,
    pub notifications_total: IntCounterVec,
    pub active_simulations: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let bookings_total = IntCounterVec::new(
            Opts::new("bookings_total", "Booking lifecycle events by outcome"),
            &["outcome"],
        )
        .expect("valid bookings_total metric");

        let stage_transitions_total = IntCounterVec::new(
            Opts::new("stage_transitions_total", "Wizard transitions by target stage"),
            &["stage"],
        )
        .expect("valid stage_transitions_total metric");

        let price_estimates_total = IntCounterVec::new(
            Opts::new("price_estimates_total", "Resolved price estimates by surge state"),
            &["surge"],
        )
        .expect("valid price_estimates_total metric");

        let notifications_total = IntCounterVec::new(
            Opts::new("notifications_total", "Notifications sent by severity"),
            &["severity"],
        )
        .expect("valid notifications_total metric");

        let active_simulations = IntGauge::new(
            "active_simulations",
            "Timer-driven simulations currently running",
        )
        .expect("valid active_simulations metric");

        registry
            .register(Box::new(bookings_total.clone()))
            .expect("register bookings_total");
        registry
            .register(Box::new(stage_transitions_total.clone()))
            .expect("register stage_transitions_total");
        registry
            .register(Box::new(price_estimates_total.clone()))
            .expect("register price_estimates_total");
        registry
            .register(Box::new(notifications_total.clone()))
            .expect("register notifications_total");
        registry
            .register(Box::new(active_simulations.clone()))
            .expect("register active_simulations");

        Self {
            registry,
            bookings_total,
            stage_transitions_total,
            price_estimates_total,
            notifications_total,
            active_simulations,
        }
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Counts a simulation as active for as long as the guard lives.
pub struct ActiveGuard {
    gauge: IntGauge,
}

impl ActiveGuard {
    pub fn enter(gauge: &IntGauge) -> Self {
        gauge.inc();
        Self {
            gauge: gauge.clone(),
        }
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

#[cfg(test)]
mod tests {
    use super::{ActiveGuard, Metrics};

    #[test]
    fn guard_tracks_active_simulations() {
        let metrics = Metrics::new();
        let first = ActiveGuard::enter(&metrics.active_simulations);
        let second = ActiveGuard::enter(&metrics.active_simulations);
        assert_eq!(metrics.active_simulations.get(), 2);

        drop(first);
        drop(second);
        assert_eq!(metrics.active_simulations.get(), 0);
    }

    #[test]
    fn encode_lists_registered_metrics() {
        let metrics = Metrics::new();
        metrics.bookings_total.with_label_values(&["created"]).inc();

        let body = metrics.encode().unwrap();
        assert!(body.contains("bookings_total"));
        assert!(body.contains("active_simulations"));
    }
}
