use std::ops::ControlFlow;

use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

use crate::models::booking::RidePhase;

pub const ARRIVED: u8 = 100;

const MIN_TICK_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalTick {
    Advanced(u8),
    Arrived,
    Idle,
}

/// Driver-arrival progress from 0 to 100. Once arrived, ticks are no-ops.
#[derive(Debug, Clone)]
pub struct ArrivalProgress {
    progress: u8,
    step: u8,
    arrived: bool,
}

impl ArrivalProgress {
    pub fn new(step: u8) -> Self {
        Self {
            progress: 0,
            step: step.max(1),
            arrived: false,
        }
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn has_arrived(&self) -> bool {
        self.arrived
    }

    pub fn tick(&mut self) -> ArrivalTick {
        if self.arrived {
            return ArrivalTick::Idle;
        }

        self.progress = self.progress.saturating_add(self.step).min(ARRIVED);
        if self.progress == ARRIVED {
            self.arrived = true;
            ArrivalTick::Arrived
        } else {
            ArrivalTick::Advanced(self.progress)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideTick {
    Advanced { phase: RidePhase, progress: u8 },
    /// The driver reached the pickup; the journey leg starts at 0.
    PickedUp,
    /// The journey leg reached 100.
    Finished,
    Idle,
}

/// Two legs of [`ArrivalProgress`]: driver to pickup, then pickup to
/// destination.
#[derive(Debug, Clone)]
pub struct RideProgress {
    phase: RidePhase,
    leg: ArrivalProgress,
    step: u8,
}

impl RideProgress {
    pub fn new(step: u8) -> Self {
        Self {
            phase: RidePhase::Pickup,
            leg: ArrivalProgress::new(step),
            step,
        }
    }

    pub fn phase(&self) -> RidePhase {
        self.phase
    }

    pub fn progress(&self) -> u8 {
        self.leg.progress()
    }

    pub fn tick(&mut self) -> RideTick {
        if self.phase == RidePhase::Arrived {
            return RideTick::Idle;
        }

        match self.leg.tick() {
            ArrivalTick::Advanced(progress) => RideTick::Advanced {
                phase: self.phase,
                progress,
            },
            ArrivalTick::Arrived if self.phase == RidePhase::Pickup => {
                self.phase = RidePhase::Journey;
                self.leg = ArrivalProgress::new(self.step);
                RideTick::PickedUp
            }
            ArrivalTick::Arrived => {
                self.phase = RidePhase::Arrived;
                RideTick::Finished
            }
            ArrivalTick::Idle => RideTick::Idle,
        }
    }
}

/// Remaining minutes, scaled from the leg's initial estimate.
pub fn remaining_eta(initial_minutes: u32, progress: u8) -> u32 {
    let remaining = u32::from(ARRIVED - progress.min(ARRIVED));
    (initial_minutes * remaining).div_ceil(u32::from(ARRIVED))
}

/// Ticks every `period` until the ride finishes or `on_tick` breaks.
/// The first tick lands one full period after the call.
pub async fn run_ride<F>(step: u8, period: Duration, mut on_tick: F)
where
    F: FnMut(RideTick) -> ControlFlow<()>,
{
    let mut ride = RideProgress::new(step);
    let period = period.max(MIN_TICK_PERIOD);
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let outcome = ride.tick();
        if on_tick(outcome).is_break() || outcome == RideTick::Finished {
            break;
        }
    }
}
