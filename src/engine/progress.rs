use crate::engine::stages::{position, WIZARD_STAGES};
use crate::models::booking::Stage;

pub fn percent(stage: Stage) -> u8 {
    let total = WIZARD_STAGES.len();
    match position(stage) {
        Some(index) => ((index + 1) * 100 / total) as u8,
        None => 100,
    }
}
