//! Capture of the live workspace into snapshots and the reverse.

pub mod capture;
pub mod restore;

pub use capture::{filter_capturable, CaptureEngine};
pub use restore::{launch_name, RestoreEngine, RestoreResult};
