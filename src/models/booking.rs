use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::driver::DriverId;
use crate::models::price::PriceBreakdown;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Location,
    Pricing,
    Payment,
    Driver,
    Tracking,
    Completed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Location => "location",
            Stage::Pricing => "pricing",
            Stage::Payment => "payment",
            Stage::Driver => "driver",
            Stage::Tracking => "tracking",
            Stage::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RideClass {
    #[default]
    Standard,
    Premium,
    WomenOnly,
    Accessible,
}

impl RideClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideClass::Standard => "standard",
            RideClass::Premium => "premium",
            RideClass::WomenOnly => "women-only",
            RideClass::Accessible => "accessible",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Card,
    Wallet,
    Cash,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EstimateState {
    #[default]
    Absent,
    Calculating,
    Ready { breakdown: PriceBreakdown },
}

/// Which leg of a confirmed ride the progress value describes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RidePhase {
    Pickup,
    Journey,
    Arrived,
}

impl RidePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RidePhase::Pickup => "pickup",
            RidePhase::Journey => "journey",
            RidePhase::Arrived => "arrived",
        }
    }

    pub fn status_text(&self) -> &'static str {
        match self {
            RidePhase::Pickup => "Driver en route to pickup",
            RidePhase::Journey => "In transit to destination",
            RidePhase::Arrived => "Trip completed - Have a safe day!",
        }
    }
}

/// `progress` restarts at 0 when the journey leg begins. `arrived` is set
/// once the driver reaches the pickup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ArrivalStatus {
    pub phase: RidePhase,
    pub status: String,
    pub progress: u8,
    pub arrived: bool,
    pub eta_minutes: u32,
}

impl ArrivalStatus {
    pub fn new(phase: RidePhase, progress: u8, arrived: bool, eta_minutes: u32) -> Self {
        Self {
            phase,
            status: phase.status_text().to_string(),
            progress,
            arrived,
            eta_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LiveTrack {
    pub active: bool,
    pub anchor: GeoPoint,
    pub location: GeoPoint,
    pub route_deviation: bool,
    pub updates: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SosStatus {
    #[default]
    Idle,
    CountingDown { remaining_secs: u32 },
    Sent { sent_at: DateTime<Utc> },
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingSession {
    pub id: Uuid,
    pub stage: Stage,
    pub pickup: String,
    pub destination: String,
    pub ride_class: RideClass,
    pub payment_method: PaymentMethod,
    pub selected_driver_id: Option<DriverId>,
    pub estimate: EstimateState,
    #[serde(skip)]
    pub estimate_generation: u64,
    pub arrival: Option<ArrivalStatus>,
    pub tracking: Option<LiveTrack>,
    pub sos: SosStatus,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingSession {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            stage: Stage::Location,
            pickup: String::new(),
            destination: String::new(),
            ride_class: RideClass::default(),
            payment_method: PaymentMethod::default(),
            selected_driver_id: None,
            estimate: EstimateState::default(),
            estimate_generation: 0,
            arrival: None,
            tracking: None,
            sos: SosStatus::default(),
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn has_locations(&self) -> bool {
        !self.pickup.trim().is_empty() && !self.destination.trim().is_empty()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for BookingSession {
    fn default() -> Self {
        Self::new()
    }
}
