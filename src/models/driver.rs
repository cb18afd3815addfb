use serde::{Deserialize, Serialize};

use crate::models::booking::RideClass;

pub type DriverId = u32;

pub const WOMEN_ONLY_SPECIALTY: &str = "Women-Only";
pub const ACCESSIBLE_SPECIALTY: &str = "Accessible";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub text: String,
    pub rating: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Driver {
    pub id: DriverId,
    pub name: String,
    pub rating: f64,
    pub experience_years: u32,
    pub completed_trips: u32,
    pub vehicle: String,
    pub plate: String,
    pub specialties: Vec<String>,
    pub languages: Vec<String>,
    pub reviews: Vec<Review>,
    pub badges: Vec<String>,
    pub accessibility_features: Vec<String>,
    pub special_training: Vec<String>,
    pub estimated_arrival_minutes: u32,
    pub price: f64,
    pub safety_score: u8,
}

impl Driver {
    pub fn has_specialty(&self, specialty: &str) -> bool {
        self.specialties.iter().any(|s| s == specialty)
    }

    pub fn serves(&self, ride_class: RideClass) -> bool {
        match ride_class {
            RideClass::Standard | RideClass::Premium => true,
            RideClass::WomenOnly => self.has_specialty(WOMEN_ONLY_SPECIALTY),
            RideClass::Accessible => self.has_specialty(ACCESSIBLE_SPECIALTY),
        }
    }
}
