use rand::Rng;

use crate::models::booking::RideClass;
use crate::models::price::PriceBreakdown;

pub const SAFETY_FEE: f64 = 2.5;
pub const PER_KM_RATE: f64 = 0.8;
pub const PER_MINUTE_RATE: f64 = 0.2;
pub const SURGE_MULTIPLIER: f64 = 1.5;
pub const MIN_DISTANCE_KM: f64 = 5.0;
pub const MAX_DISTANCE_KM: f64 = 30.0;

const AVERAGE_SPEED_KMH: f64 = 30.0;
const MINUTES_PER_KM: f64 = 2.5;

pub fn base_price(ride_class: RideClass) -> f64 {
    match ride_class {
        RideClass::Standard => 8.0,
        RideClass::Premium => 15.0,
        RideClass::WomenOnly => 10.0,
        RideClass::Accessible => 12.0,
    }
}

/// Simulated fare quotes.
///
/// Every call draws a fresh distance and surge decision from the supplied
/// random source, so two estimates for the same trip usually differ.
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    surge_probability: f64,
}

impl PriceEstimator {
    pub fn new(surge_probability: f64) -> Self {
        Self {
            surge_probability: surge_probability.clamp(0.0, 1.0),
        }
    }

    pub fn surge_probability(&self) -> f64 {
        self.surge_probability
    }

    /// Returns `None` when either location is blank.
    pub fn estimate<R: Rng + ?Sized>(
        &self,
        pickup: &str,
        destination: &str,
        ride_class: RideClass,
        rng: &mut R,
    ) -> Option<PriceBreakdown> {
        if pickup.trim().is_empty() || destination.trim().is_empty() {
            return None;
        }

        let distance_km = rng.gen_range(MIN_DISTANCE_KM..MAX_DISTANCE_KM);
        let surged = rng.gen_bool(self.surge_probability);

        Some(breakdown(ride_class, distance_km, surged))
    }
}

pub fn breakdown(ride_class: RideClass, distance_km: f64, surged: bool) -> PriceBreakdown {
    let base_price = base_price(ride_class);
    let distance_price = distance_km * PER_KM_RATE;
    let travel_minutes = distance_km / AVERAGE_SPEED_KMH * 60.0;
    let time_price = travel_minutes * PER_MINUTE_RATE;
    let surge_multiplier = if surged { SURGE_MULTIPLIER } else { 1.0 };

    let subtotal = base_price + distance_price + time_price + SAFETY_FEE;
    let total_price = subtotal * surge_multiplier;

    PriceBreakdown {
        base_price,
        distance_km,
        distance_price: round_cents(distance_price),
        time_price: round_cents(time_price),
        surge_multiplier,
        safety_fee: SAFETY_FEE,
        total_price: round_cents(total_price),
        estimated_minutes: (distance_km * MINUTES_PER_KM).ceil() as u32,
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
