pub mod drivers;
pub mod places;
pub mod safety;
