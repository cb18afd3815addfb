use chrono::Utc;

use crate::error::AppError;
use crate::models::booking::{BookingSession, Stage};

/// The wizard order. `Completed` sits outside it and is only reachable by
/// finishing a confirmed ride.
pub const WIZARD_STAGES: [Stage; 5] = [
    Stage::Location,
    Stage::Pricing,
    Stage::Payment,
    Stage::Driver,
    Stage::Tracking,
];

pub fn position(stage: Stage) -> Option<usize> {
    WIZARD_STAGES.iter().position(|s| *s == stage)
}

pub fn next_stage(stage: Stage) -> Option<Stage> {
    let index = position(stage)?;
    WIZARD_STAGES.get(index + 1).copied()
}

/// Moves the session one stage forward.
///
/// Leaving `Driver` is the booking confirmation, so it goes through
/// [`confirm_booking`] and its guard.
pub fn advance(session: &mut BookingSession) -> Result<Stage, AppError> {
    match session.stage {
        Stage::Location if !session.has_locations() => Err(AppError::Validation(
            "pickup and destination are required".to_string(),
        )),
        Stage::Driver => {
            confirm_booking(session)?;
            Ok(session.stage)
        }
        current => {
            let next = next_stage(current).ok_or_else(|| {
                AppError::InvalidTransition(format!("no stage after {}", current.as_str()))
            })?;
            session.stage = next;
            session.touch();
            Ok(next)
        }
    }
}

pub fn confirm_booking(session: &mut BookingSession) -> Result<(), AppError> {
    ensure_stage(session, &[Stage::Driver], "confirm a booking")?;

    if session.selected_driver_id.is_none() {
        return Err(AppError::MissingSelection);
    }

    session.stage = Stage::Tracking;
    session.confirmed_at = Some(Utc::now());
    session.touch();
    Ok(())
}

pub fn complete(session: &mut BookingSession) -> Result<(), AppError> {
    ensure_stage(session, &[Stage::Tracking], "complete a ride")?;

    if session.confirmed_at.is_none() {
        return Err(AppError::InvalidTransition(
            "ride was never confirmed".to_string(),
        ));
    }

    session.stage = Stage::Completed;
    session.touch();
    Ok(())
}

pub fn ensure_stage(
    session: &BookingSession,
    allowed: &[Stage],
    action: &str,
) -> Result<(), AppError> {
    if allowed.contains(&session.stage) {
        return Ok(());
    }

    Err(AppError::InvalidTransition(format!(
        "cannot {action} during the {} stage",
        session.stage.as_str()
    )))
}
