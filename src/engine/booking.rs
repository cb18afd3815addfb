use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::engine::arrival::{self, RideTick};
use crate::engine::progress::percent;
use crate::engine::sos::{self, SosTick};
use crate::engine::stages::{self, ensure_stage};
use crate::engine::task::{ScopedTask, SessionTimers};
use crate::engine::tracking::{self, TrackingSimulator, TrackingStep, DEFAULT_ANCHOR};
use crate::error::AppError;
use crate::models::booking::{
    ArrivalStatus, BookingSession, EstimateState, LiveTrack, PaymentMethod, RideClass, RidePhase,
    SosStatus, Stage,
};
use crate::models::driver::{Driver, DriverId};
use crate::models::event::{BookingEvent, Severity};
use crate::observability::metrics::ActiveGuard;
use crate::state::AppState;

const MAX_LOCATION_LEN: usize = 120;

pub fn create_booking(state: &AppState) -> BookingSession {
    let session = BookingSession::new();
    state.sessions.insert(session.id, session.clone());
    state
        .metrics
        .bookings_total
        .with_label_values(&["created"])
        .inc();

    info!(booking_id = %session.id, "booking opened");
    session
}

pub fn get_booking(state: &AppState, id: Uuid) -> Result<BookingSession, AppError> {
    state
        .sessions
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| not_found(id))
}

/// Discards the session and every timer it owns.
pub fn cancel_booking(state: &AppState, id: Uuid) -> Result<BookingSession, AppError> {
    let (_, session) = state.sessions.remove(&id).ok_or_else(|| not_found(id))?;
    let released = state
        .timers
        .remove(&id)
        .map(|(_, timers)| timers.running())
        .unwrap_or(0);

    state
        .metrics
        .bookings_total
        .with_label_values(&["cancelled"])
        .inc();

    info!(booking_id = %id, stage = session.stage.as_str(), released, "booking closed");
    Ok(session)
}

pub fn update_locations(
    state: &Arc<AppState>,
    id: Uuid,
    pickup: String,
    destination: String,
) -> Result<BookingSession, AppError> {
    for (field, value) in [("pickup", &pickup), ("destination", &destination)] {
        if value.chars().count() > MAX_LOCATION_LEN {
            return Err(AppError::BadRequest(format!(
                "{field} must be at most {MAX_LOCATION_LEN} characters"
            )));
        }
    }

    let (session, generation) = with_session(state, id, |session| {
        ensure_stage(session, &[Stage::Location], "change locations")?;
        session.pickup = pickup.trim().to_string();
        session.destination = destination.trim().to_string();
        Ok(restart_estimate(session))
    })?;

    schedule_estimate(state, &session, generation);
    Ok(session)
}

pub fn set_ride_class(
    state: &Arc<AppState>,
    id: Uuid,
    ride_class: RideClass,
) -> Result<BookingSession, AppError> {
    let (session, generation) = with_session(state, id, |session| {
        ensure_stage(
            session,
            &[Stage::Location, Stage::Pricing],
            "change the ride class",
        )?;
        session.ride_class = ride_class;
        Ok(restart_estimate(session))
    })?;

    schedule_estimate(state, &session, generation);
    Ok(session)
}

pub fn set_payment_method(
    state: &AppState,
    id: Uuid,
    payment_method: PaymentMethod,
) -> Result<BookingSession, AppError> {
    let (session, ()) = with_session(state, id, |session| {
        ensure_stage(
            session,
            &[Stage::Location, Stage::Pricing, Stage::Payment],
            "change the payment method",
        )?;
        session.payment_method = payment_method;
        Ok(())
    })?;

    Ok(session)
}

pub fn eligible_drivers(state: &AppState, id: Uuid) -> Result<Vec<Driver>, AppError> {
    let ride_class = get_booking(state, id)?.ride_class;
    Ok(state
        .drivers
        .eligible(ride_class)
        .into_iter()
        .cloned()
        .collect())
}

pub fn select_driver(
    state: &AppState,
    id: Uuid,
    driver_id: DriverId,
) -> Result<BookingSession, AppError> {
    let driver = state
        .drivers
        .get(driver_id)
        .ok_or_else(|| AppError::NotFound(format!("driver {driver_id} not found")))?;

    let (session, ()) = with_session(state, id, |session| {
        ensure_stage(session, &[Stage::Driver], "select a driver")?;
        if !driver.serves(session.ride_class) {
            return Err(AppError::Validation(format!(
                "{} does not offer {} rides",
                driver.name,
                session.ride_class.as_str()
            )));
        }
        session.selected_driver_id = Some(driver.id);
        Ok(())
    })?;

    info!(booking_id = %id, driver_id, "driver selected");
    Ok(session)
}

pub fn advance_booking(state: &Arc<AppState>, id: Uuid) -> Result<BookingSession, AppError> {
    let (session, stage) = with_session(state, id, |session| {
        let stage = stages::advance(session)?;
        if stage == Stage::Tracking {
            begin_ride(state, session);
        }
        Ok(stage)
    })?;
    after_transition(state, &session, stage);
    Ok(session)
}

pub fn confirm_booking(state: &Arc<AppState>, id: Uuid) -> Result<BookingSession, AppError> {
    let (session, ()) = with_session(state, id, |session| {
        stages::confirm_booking(session)?;
        begin_ride(state, session);
        Ok(())
    })?;
    after_transition(state, &session, session.stage);
    Ok(session)
}

pub fn start_tracking(state: &Arc<AppState>, id: Uuid) -> Result<BookingSession, AppError> {
    let rng = StdRng::seed_from_u64(state.with_rng(|rng| rng.next_u64())?);
    let (session, ()) = with_session(state, id, |session| {
        ensure_stage(session, &[Stage::Tracking], "start live tracking")?;
        if session.tracking.as_ref().is_some_and(|track| track.active) {
            return Err(AppError::InvalidTransition(
                "live tracking is already running".to_string(),
            ));
        }
        session.tracking = Some(LiveTrack {
            active: true,
            anchor: DEFAULT_ANCHOR,
            location: DEFAULT_ANCHOR,
            route_deviation: false,
            updates: 0,
        });
        Ok(())
    })?;

    let simulator =
        TrackingSimulator::new(DEFAULT_ANCHOR, state.settings.route_deviation_probability);
    let guard = ActiveGuard::enter(&state.metrics.active_simulations);
    let task_state = state.clone();
    let period = state.settings.tracking_tick;

    let task = ScopedTask::spawn("tracking", async move {
        let _active = guard;
        tracking::run_tracking(simulator, period, rng, move |step| {
            on_tracking_step(&task_state, id, step)
        })
        .await;
    });
    install_timer(state, id, |timers| timers.tracking = Some(task));

    state.notify(
        id,
        "Live Tracking Started",
        "Your location is now being monitored and shared with trusted contacts",
        Severity::Info,
    );
    Ok(session)
}

pub fn stop_tracking(state: &AppState, id: Uuid) -> Result<BookingSession, AppError> {
    let (session, ()) = with_session(state, id, |session| {
        match session.tracking.as_mut() {
            Some(track) if track.active => {
                track.active = false;
                track.route_deviation = false;
                Ok(())
            }
            _ => Err(AppError::InvalidTransition(
                "live tracking is not running".to_string(),
            )),
        }
    })?;

    release_tracking(state, id);
    state.notify(
        id,
        "Tracking Stopped",
        "Live location monitoring has been disabled",
        Severity::Info,
    );
    Ok(session)
}

pub fn trigger_sos(state: &Arc<AppState>, id: Uuid) -> Result<BookingSession, AppError> {
    let seconds = state.settings.sos_countdown_secs;
    let (session, ()) = with_session(state, id, |session| {
        if session.stage == Stage::Completed {
            return Err(AppError::InvalidTransition(
                "ride is already completed".to_string(),
            ));
        }
        if matches!(session.sos, SosStatus::CountingDown { .. }) {
            return Err(AppError::InvalidTransition(
                "emergency countdown already running".to_string(),
            ));
        }
        session.sos = SosStatus::CountingDown {
            remaining_secs: seconds,
        };
        Ok(())
    })?;

    warn!(booking_id = %id, seconds, "emergency sos armed");
    state.publish(BookingEvent::SosCountdown {
        booking_id: id,
        remaining_secs: seconds,
    });

    let guard = ActiveGuard::enter(&state.metrics.active_simulations);
    let task_state = state.clone();
    let task = ScopedTask::spawn("sos", async move {
        let _active = guard;
        sos::run_countdown(seconds, move |tick| on_sos_tick(&task_state, id, tick)).await;
    });
    install_timer(state, id, |timers| timers.sos = Some(task));

    Ok(session)
}

pub fn cancel_sos(state: &AppState, id: Uuid) -> Result<BookingSession, AppError> {
    let (session, ()) = with_session(state, id, |session| {
        if !matches!(session.sos, SosStatus::CountingDown { .. }) {
            return Err(AppError::InvalidTransition(
                "no emergency countdown to cancel".to_string(),
            ));
        }
        session.sos = SosStatus::Cancelled;
        Ok(())
    })?;

    if let Some(mut timers) = state.timers.get_mut(&id) {
        timers.sos.take();
    }

    state.notify(
        id,
        "Emergency Cancelled",
        "No alerts were sent",
        Severity::Info,
    );
    Ok(session)
}

/// Runs `f` against the live session and returns a snapshot of it. The map
/// guard is released before returning.
fn with_session<T>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut BookingSession) -> Result<T, AppError>,
) -> Result<(BookingSession, T), AppError> {
    let mut entry = state.sessions.get_mut(&id).ok_or_else(|| not_found(id))?;
    let session = entry.value_mut();
    let output = f(session)?;
    session.touch();
    Ok((session.clone(), output))
}

/// Installs a task into the session's timer slots. If the session was closed
/// in the meantime the slots are discarded again, aborting the task.
fn install_timer(state: &AppState, id: Uuid, install: impl FnOnce(&mut SessionTimers)) {
    let mut slots = state.timers.entry(id).or_default();
    install(slots.value_mut());
    drop(slots);

    if !state.sessions.contains_key(&id) {
        state.timers.remove(&id);
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("booking {id} not found"))
}

/// Invalidates any in-flight estimate. Returns the generation to compute
/// for, or `None` when the locations are incomplete.
fn restart_estimate(session: &mut BookingSession) -> Option<u64> {
    session.estimate_generation += 1;
    if session.has_locations() {
        session.estimate = EstimateState::Calculating;
        Some(session.estimate_generation)
    } else {
        session.estimate = EstimateState::Absent;
        None
    }
}

fn schedule_estimate(state: &Arc<AppState>, session: &BookingSession, generation: Option<u64>) {
    let id = session.id;
    let Some(generation) = generation else {
        if let Some(mut timers) = state.timers.get_mut(&id) {
            timers.estimate.take();
        }
        return;
    };

    let task_state = state.clone();
    let latency = state.settings.price_latency;
    let pickup = session.pickup.clone();
    let destination = session.destination.clone();
    let ride_class = session.ride_class;

    let task = ScopedTask::spawn("estimate", async move {
        sleep(latency).await;
        resolve_estimate(&task_state, id, generation, &pickup, &destination, ride_class);
    });
    install_timer(state, id, |timers| timers.estimate = Some(task));
}

fn resolve_estimate(
    state: &AppState,
    id: Uuid,
    generation: u64,
    pickup: &str,
    destination: &str,
    ride_class: RideClass,
) {
    let drawn = state.with_rng(|rng| {
        state
            .estimator
            .estimate(pickup, destination, ride_class, rng)
    });
    let quote = match drawn {
        Ok(Some(quote)) => quote,
        Ok(None) => return,
        Err(err) => {
            error!(booking_id = %id, error = %err, "price estimate failed");
            return;
        }
    };

    {
        let Some(mut entry) = state.sessions.get_mut(&id) else {
            return;
        };
        if entry.estimate_generation != generation {
            return;
        }
        entry.estimate = EstimateState::Ready {
            breakdown: quote.clone(),
        };
        entry.touch();
    }

    let surge = if quote.is_surged() { "surge" } else { "normal" };
    state
        .metrics
        .price_estimates_total
        .with_label_values(&[surge])
        .inc();
    info!(
        booking_id = %id,
        total_price = quote.total_price,
        distance_km = quote.distance_km,
        surge_multiplier = quote.surge_multiplier,
        "price estimate ready"
    );

    state.publish(BookingEvent::EstimateReady {
        booking_id: id,
        breakdown: quote,
    });
}

fn after_transition(state: &Arc<AppState>, session: &BookingSession, stage: Stage) {
    state
        .metrics
        .stage_transitions_total
        .with_label_values(&[stage.as_str()])
        .inc();
    info!(booking_id = %session.id, stage = stage.as_str(), "stage changed");

    state.publish(BookingEvent::StageChanged {
        booking_id: session.id,
        stage,
        progress_percent: percent(stage),
    });

    if stage == Stage::Tracking {
        on_confirmed(state, session);
    }
}

/// Seeds the pickup leg on the session being confirmed.
fn begin_ride(state: &AppState, session: &mut BookingSession) {
    let driver_eta = session
        .selected_driver_id
        .and_then(|driver_id| state.drivers.get(driver_id))
        .map(|driver| driver.estimated_arrival_minutes)
        .unwrap_or(0);
    session.arrival = Some(ArrivalStatus::new(RidePhase::Pickup, 0, false, driver_eta));
}

fn on_confirmed(state: &Arc<AppState>, session: &BookingSession) {
    let id = session.id;
    let pickup_minutes = session
        .arrival
        .as_ref()
        .map(|arrival| arrival.eta_minutes)
        .unwrap_or(0);
    let trip_minutes = match &session.estimate {
        EstimateState::Ready { breakdown } => breakdown.estimated_minutes,
        _ => 0,
    };

    state
        .metrics
        .bookings_total
        .with_label_values(&["confirmed"])
        .inc();
    state.notify(
        id,
        "Booking Confirmed!",
        "Your driver has been notified and is on the way.",
        Severity::Info,
    );

    let guard = ActiveGuard::enter(&state.metrics.active_simulations);
    let task_state = state.clone();
    let step = state.settings.arrival_step;
    let period = state.settings.arrival_tick;

    let task = ScopedTask::spawn("arrival", async move {
        let _active = guard;
        arrival::run_ride(step, period, move |tick| {
            on_ride_tick(&task_state, id, pickup_minutes, trip_minutes, tick)
        })
        .await;
    });
    install_timer(state, id, |timers| timers.arrival = Some(task));
}

fn on_ride_tick(
    state: &AppState,
    id: Uuid,
    pickup_minutes: u32,
    trip_minutes: u32,
    tick: RideTick,
) -> ControlFlow<()> {
    match tick {
        RideTick::Advanced { phase, progress } => {
            let leg_minutes = match phase {
                RidePhase::Pickup => pickup_minutes,
                RidePhase::Journey | RidePhase::Arrived => trip_minutes,
            };
            let eta_minutes = arrival::remaining_eta(leg_minutes, progress);
            {
                let Some(mut entry) = state.sessions.get_mut(&id) else {
                    return ControlFlow::Break(());
                };
                entry.arrival = Some(ArrivalStatus::new(
                    phase,
                    progress,
                    phase != RidePhase::Pickup,
                    eta_minutes,
                ));
            }
            state.publish(BookingEvent::ArrivalProgress {
                booking_id: id,
                phase,
                progress,
                eta_minutes,
            });
            ControlFlow::Continue(())
        }
        RideTick::PickedUp => on_picked_up(state, id, trip_minutes),
        RideTick::Finished => on_trip_finished(state, id),
        RideTick::Idle => ControlFlow::Continue(()),
    }
}

fn on_picked_up(state: &AppState, id: Uuid, trip_minutes: u32) -> ControlFlow<()> {
    let (driver_name, pickup) = {
        let Some(mut entry) = state.sessions.get_mut(&id) else {
            return ControlFlow::Break(());
        };
        entry.arrival = Some(ArrivalStatus::new(RidePhase::Journey, 0, true, trip_minutes));
        (selected_driver_name(state, &entry), entry.pickup.clone())
    };

    info!(booking_id = %id, trip_minutes, "driver reached pickup");
    state.publish(BookingEvent::ArrivalProgress {
        booking_id: id,
        phase: RidePhase::Journey,
        progress: 0,
        eta_minutes: trip_minutes,
    });
    state.notify(
        id,
        "Driver Arrived",
        &format!("{driver_name} is waiting at {pickup}"),
        Severity::Info,
    );
    ControlFlow::Continue(())
}

fn on_trip_finished(state: &AppState, id: Uuid) -> ControlFlow<()> {
    let destination = {
        let Some(mut entry) = state.sessions.get_mut(&id) else {
            return ControlFlow::Break(());
        };
        entry.arrival = Some(ArrivalStatus::new(
            RidePhase::Arrived,
            arrival::ARRIVED,
            true,
            0,
        ));
        if let Err(err) = stages::complete(&mut entry) {
            error!(booking_id = %id, error = %err, "finished ride could not complete");
            return ControlFlow::Break(());
        }
        if let Some(track) = entry.tracking.as_mut() {
            track.active = false;
        }
        entry.destination.clone()
    };

    release_tracking(state, id);

    state.publish(BookingEvent::ArrivalProgress {
        booking_id: id,
        phase: RidePhase::Arrived,
        progress: arrival::ARRIVED,
        eta_minutes: 0,
    });
    state.publish(BookingEvent::StageChanged {
        booking_id: id,
        stage: Stage::Completed,
        progress_percent: percent(Stage::Completed),
    });
    state
        .metrics
        .stage_transitions_total
        .with_label_values(&[Stage::Completed.as_str()])
        .inc();
    state
        .metrics
        .bookings_total
        .with_label_values(&["completed"])
        .inc();

    state.notify(
        id,
        "Trip Completed",
        &format!("You have arrived at {destination}. {}", RidePhase::Arrived.status_text()),
        Severity::Info,
    );
    ControlFlow::Break(())
}

fn selected_driver_name(state: &AppState, session: &BookingSession) -> String {
    session
        .selected_driver_id
        .and_then(|driver_id| state.drivers.get(driver_id))
        .map(|driver| driver.name.clone())
        .unwrap_or_else(|| "Your driver".to_string())
}

fn on_tracking_step(state: &AppState, id: Uuid, step: TrackingStep) -> ControlFlow<()> {
    {
        let Some(mut entry) = state.sessions.get_mut(&id) else {
            return ControlFlow::Break(());
        };
        let Some(track) = entry.tracking.as_mut().filter(|track| track.active) else {
            return ControlFlow::Break(());
        };
        track.location = step.location;
        track.route_deviation = step.route_deviation;
        track.updates = track.updates.saturating_add(1);
    }

    state.publish(BookingEvent::LocationUpdate {
        booking_id: id,
        location: step.location,
        drift_km: step.drift_km,
        route_deviation: step.route_deviation,
    });

    if step.deviation_raised {
        warn!(booking_id = %id, drift_km = step.drift_km, "route deviation detected");
        state.notify(
            id,
            "Route Deviation Detected",
            "Driver has deviated from planned route. Trusted contacts notified.",
            Severity::Destructive,
        );
    }
    ControlFlow::Continue(())
}

/// Countdown state only moves while the session still says `CountingDown`,
/// so a cancel that wins the entry lock suppresses the alert.
fn on_sos_tick(state: &AppState, id: Uuid, tick: SosTick) -> ControlFlow<()> {
    {
        let Some(mut entry) = state.sessions.get_mut(&id) else {
            return ControlFlow::Break(());
        };
        if !matches!(entry.sos, SosStatus::CountingDown { .. }) {
            return ControlFlow::Break(());
        }
        entry.sos = match tick {
            SosTick::Remaining(remaining_secs) => SosStatus::CountingDown { remaining_secs },
            SosTick::Fire => SosStatus::Sent {
                sent_at: Utc::now(),
            },
        };
    }

    let remaining_secs = match tick {
        SosTick::Remaining(remaining_secs) => remaining_secs,
        SosTick::Fire => 0,
    };
    state.publish(BookingEvent::SosCountdown {
        booking_id: id,
        remaining_secs,
    });
    if tick != SosTick::Fire {
        return ControlFlow::Continue(());
    }

    for contact in &state.safety.trusted_contacts {
        warn!(booking_id = %id, recipient = %contact.name, phone = %contact.phone, "emergency alert dispatched");
    }
    for station in &state.safety.police_stations {
        warn!(booking_id = %id, recipient = %station.name, phone = %station.phone, "emergency alert dispatched");
    }

    state.notify(
        id,
        "Emergency Alert Sent",
        &format!(
            "Your location and details have been shared with {} trusted contacts and police.",
            state.safety.recipients()
        ),
        Severity::Destructive,
    );
    ControlFlow::Break(())
}

fn release_tracking(state: &AppState, id: Uuid) {
    if let Some(mut timers) = state.timers.get_mut(&id) {
        timers.tracking.take();
    }
}
