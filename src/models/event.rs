use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::geo::GeoPoint;
use crate::models::booking::{RidePhase, Stage};
use crate::models::price::PriceBreakdown;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Destructive,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Destructive => "destructive",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub sent_at: DateTime<Utc>,
}

/// Everything a subscribed client can observe about a booking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BookingEvent {
    StageChanged {
        booking_id: Uuid,
        stage: Stage,
        progress_percent: u8,
    },
    EstimateReady {
        booking_id: Uuid,
        breakdown: PriceBreakdown,
    },
    ArrivalProgress {
        booking_id: Uuid,
        phase: RidePhase,
        progress: u8,
        eta_minutes: u32,
    },
    LocationUpdate {
        booking_id: Uuid,
        location: GeoPoint,
        drift_km: f64,
        route_deviation: bool,
    },
    SosCountdown {
        booking_id: Uuid,
        remaining_secs: u32,
    },
    Notification {
        booking_id: Uuid,
        notification: Notification,
    },
}

impl BookingEvent {
    pub fn booking_id(&self) -> Uuid {
        match self {
            BookingEvent::StageChanged { booking_id, .. }
            | BookingEvent::EstimateReady { booking_id, .. }
            | BookingEvent::ArrivalProgress { booking_id, .. }
            | BookingEvent::LocationUpdate { booking_id, .. }
            | BookingEvent::SosCountdown { booking_id, .. }
            | BookingEvent::Notification { booking_id, .. } => *booking_id,
        }
    }
}
