pub mod controller;
pub mod loop_worker;
pub mod trigger;

pub use controller::AutoSnapController;
pub use trigger::{AutoSnapConfig, SnapReason, SnapTrigger};
