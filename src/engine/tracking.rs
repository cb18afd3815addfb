use std::ops::ControlFlow;

use rand::Rng;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::geo::{haversine_km, jitter, GeoPoint};

/// Where simulated rides start; there is no geocoder behind the demo.
pub const DEFAULT_ANCHOR: GeoPoint = GeoPoint {
    lat: 28.6139,
    lng: 77.2090,
};

const MAX_STEP_DEGREES: f64 = 0.001;
const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackingStep {
    pub location: GeoPoint,
    pub drift_km: f64,
    pub route_deviation: bool,
    /// Set only on the step that first flagged the deviation.
    pub deviation_raised: bool,
}

#[derive(Debug, Clone)]
pub struct TrackingSimulator {
    anchor: GeoPoint,
    location: GeoPoint,
    route_deviation: bool,
    deviation_probability: f64,
}

impl TrackingSimulator {
    pub fn new(anchor: GeoPoint, deviation_probability: f64) -> Self {
        Self {
            anchor,
            location: anchor,
            route_deviation: false,
            deviation_probability: deviation_probability.clamp(0.0, 1.0),
        }
    }

    pub fn location(&self) -> GeoPoint {
        self.location
    }

    pub fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> TrackingStep {
        self.location = jitter(&self.location, MAX_STEP_DEGREES, rng);

        let deviation_raised =
            !self.route_deviation && rng.gen_bool(self.deviation_probability);
        if deviation_raised {
            self.route_deviation = true;
        }

        TrackingStep {
            location: self.location,
            drift_km: haversine_km(&self.anchor, &self.location),
            route_deviation: self.route_deviation,
            deviation_raised,
        }
    }
}

/// Moves the simulated driver every `period` until the task is dropped or
/// `on_step` breaks.
pub async fn run_tracking<R, F>(
    mut simulator: TrackingSimulator,
    period: Duration,
    mut rng: R,
    mut on_step: F,
) where
    R: Rng,
    F: FnMut(TrackingStep) -> ControlFlow<()>,
{
    let period = period.max(MIN_TICK_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if on_step(simulator.step(&mut rng)).is_break() {
            break;
        }
    }
}
