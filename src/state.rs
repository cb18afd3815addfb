use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::catalog::drivers::DriverCatalog;
use crate::catalog::places::Gazetteer;
use crate::catalog::safety::SafetyDirectory;
use crate::config::SimulationSettings;
use crate::engine::notify::{EventNotifier, Notifier};
use crate::engine::pricing::PriceEstimator;
use crate::engine::task::SessionTimers;
use crate::error::AppError;
use crate::models::booking::BookingSession;
use crate::models::event::{BookingEvent, Severity};
use crate::observability::metrics::Metrics;

pub struct AppState {
    pub sessions: DashMap<Uuid, BookingSession>,
    pub timers: DashMap<Uuid, SessionTimers>,
    pub drivers: DriverCatalog,
    pub places: Gazetteer,
    pub safety: SafetyDirectory,
    pub estimator: PriceEstimator,
    pub settings: SimulationSettings,
    pub events_tx: broadcast::Sender<BookingEvent>,
    pub metrics: Metrics,
    notifier: Arc<dyn Notifier>,
    rng: Mutex<StdRng>,
}

impl AppState {
    pub fn new(settings: SimulationSettings, event_buffer_size: usize) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(event_buffer_size.max(1));
        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            sessions: DashMap::new(),
            timers: DashMap::new(),
            drivers: DriverCatalog::demo(),
            places: Gazetteer::indian_cities(),
            safety: SafetyDirectory::demo(),
            estimator: PriceEstimator::new(settings.surge_probability),
            notifier: Arc::new(EventNotifier::new(events_tx.clone())),
            events_tx,
            metrics: Metrics::new(),
            rng: Mutex::new(rng),
            settings,
        }
    }

    pub fn with_drivers(mut self, drivers: DriverCatalog) -> Self {
        self.drivers = drivers;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> Result<T, AppError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| AppError::Internal("random source lock poisoned".to_string()))?;
        Ok(f(&mut rng))
    }

    pub fn notify(&self, booking_id: Uuid, title: &str, message: &str, severity: Severity) {
        self.metrics
            .notifications_total
            .with_label_values(&[severity.as_str()])
            .inc();
        self.notifier.notify(booking_id, title, message, severity);
    }

    pub fn publish(&self, event: BookingEvent) {
        let _ = self.events_tx.send(event);
    }
}
