//! What is on screen, and the handful of window operations restore needs.

pub mod applescript;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Bounds, WindowDescriptor};

pub use applescript::AppleScriptWindowSource;
pub use mock::{StaticWindowSource, TimeBucketWindowSource};

/// Windows are addressed by the descriptors this source returned; `id` is
/// only meaningful to the source that produced it.
#[async_trait]
pub trait WindowSource: Send + Sync {
    /// On-screen windows of visible applications, minimized ones included
    /// with their flag set.
    async fn list_visible_windows(&self) -> Result<Vec<WindowDescriptor>>;

    async fn launch_application(&self, app_name: &str) -> Result<()>;

    async fn set_bounds(&self, window: &WindowDescriptor, bounds: Bounds) -> Result<()>;

    async fn set_minimized(&self, window: &WindowDescriptor, minimized: bool) -> Result<()>;

    async fn focus(&self, window: &WindowDescriptor) -> Result<()>;
}
