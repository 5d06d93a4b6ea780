pub mod controller;
mod loop_worker;
pub mod state;

pub use controller::DetectionController;
pub use state::{DetectorSnapshot, GestureReading};
