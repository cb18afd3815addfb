pub mod arrival;
pub mod booking;
pub mod notify;
pub mod pricing;
pub mod progress;
pub mod sos;
pub mod stages;
pub mod task;
pub mod tracking;
