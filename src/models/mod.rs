pub mod booking;
pub mod driver;
pub mod event;
pub mod price;
