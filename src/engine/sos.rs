use std::ops::ControlFlow;

use tokio::time::{sleep, Duration};

const COUNTDOWN_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SosTick {
    Remaining(u32),
    Fire,
}

/// Counts down one second at a time and fires once at zero. Dropping the
/// future, or breaking from `on_tick`, before then means no alert is ever
/// sent.
pub async fn run_countdown<F>(seconds: u32, mut on_tick: F)
where
    F: FnMut(SosTick) -> ControlFlow<()>,
{
    let mut remaining = seconds;
    while remaining > 0 {
        sleep(COUNTDOWN_TICK).await;
        remaining -= 1;
        if remaining > 0 && on_tick(SosTick::Remaining(remaining)).is_break() {
            return;
        }
    }

    let _ = on_tick(SosTick::Fire);
}
