use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceBreakdown {
    pub base_price: f64,
    pub distance_km: f64,
    pub distance_price: f64,
    pub time_price: f64,
    pub surge_multiplier: f64,
    pub safety_fee: f64,
    pub total_price: f64,
    pub estimated_minutes: u32,
}

impl PriceBreakdown {
    pub fn is_surged(&self) -> bool {
        self.surge_multiplier > 1.0
    }
}
