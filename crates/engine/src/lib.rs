pub mod controller;
pub mod detector;
pub mod publisher;
pub mod schedule;

#[cfg(test)]
mod testing;

pub use controller::{ControllerState, StatusLifecycleController};
pub use detector::{DetectorState, PollingChangeDetector};
pub use publisher::StatusPublisher;
pub use schedule::RepeatingTask;
