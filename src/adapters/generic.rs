use async_trait::async_trait;

use super::{AppAdapter, CaptureOutcome, RestoreOutcome};
use crate::models::{AdapterKind, AppState, WindowDescriptor};

/// Fallback for applications without a dedicated adapter. Window geometry is
/// handled by the restore engine, so there is nothing app-specific to do.
pub struct GenericAdapter;

#[async_trait]
impl AppAdapter for GenericAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Generic
    }

    fn aliases(&self) -> &[&'static str] {
        &[]
    }

    async fn capture(&self, _window: &WindowDescriptor) -> CaptureOutcome {
        CaptureOutcome::Empty
    }

    async fn restore(&self, _window: &WindowDescriptor, _state: &AppState) -> RestoreOutcome {
        RestoreOutcome::Skipped("no app-specific state".into())
    }

    async fn is_available(&self) -> bool {
        true
    }
}
