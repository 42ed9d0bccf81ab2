use anyhow::{Context, Result};
use std::time::Instant;

use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    db::{ContextSnapshot, Database, EventType, UserEvent},
    engine::CaptureEngine,
};

use super::trigger::{AutoSnapConfig, SnapTrigger};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const POLL_TIMEOUT_SECS: u64 = 30;

pub async fn autosnap_loop(
    capture: CaptureEngine,
    db: Database,
    config: AutoSnapConfig,
    cancel_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut trigger = SnapTrigger::new(Instant::now());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let fut = poll_once(&capture, &db, &config, &mut trigger);
                match tokio::time::timeout(Duration::from_secs(POLL_TIMEOUT_SECS), fut).await {
                    Ok(Ok(Some(snapshot))) => log_info!("auto-snapped '{}' ({})", snapshot.name, snapshot.id),
                    Ok(Ok(None)) => {},
                    Ok(Err(err)) => log_error!("auto-snap failed: {err:?}"),
                    Err(_) => log_warn!("auto-snap poll timeout (> {}s)", POLL_TIMEOUT_SECS),
                }
            }
            _ = cancel_token.cancelled() => {
                log_info!("auto-snap loop shutting down");
                break;
            }
        }
    }
}

/// Captures a candidate and persists it when the trigger fires.
pub async fn poll_once(
    capture: &CaptureEngine,
    db: &Database,
    config: &AutoSnapConfig,
    trigger: &mut SnapTrigger,
) -> Result<Option<ContextSnapshot>> {
    let mut candidate = capture.capture_context(None).await;
    let project = candidate.metadata.project.clone();

    let Some(reason) = trigger.evaluate(Instant::now(), project.as_deref(), config)
    else {
        return Ok(None);
    };

    candidate.name = reason.context_name();
    db.upsert_context(&candidate, config.max_retained)
        .await
        .context("failed to persist auto-snap")?;

    let event = UserEvent::new(EventType::AutoSnap, Some(candidate.id.clone()))
        .with_apps(candidate.app_names())
        .with_project(project);
    db.insert_event(&event)
        .await
        .context("failed to record auto-snap event")?;

    Ok(Some(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterRegistry;
    use crate::models::{Bounds, WindowDescriptor};
    use crate::test_support::temp_database;
    use crate::window_source::StaticWindowSource;
    use std::sync::Arc;

    #[tokio::test]
    async fn project_change_persists_a_named_snapshot_and_event() {
        let (_dir, db) = temp_database();
        let source = Arc::new(StaticWindowSource::new(vec![WindowDescriptor::new(
            "Visual Studio Code",
            "main.rs - alpha - Visual Studio Code",
            Bounds::default(),
        )]));
        let capture = CaptureEngine::new(source.clone(), Arc::new(AdapterRegistry::with_defaults()));
        let config = AutoSnapConfig {
            min_interval: std::time::Duration::ZERO,
            ..AutoSnapConfig::default()
        };
        let mut trigger = SnapTrigger::new(std::time::Instant::now());

        assert!(poll_once(&capture, &db, &config, &mut trigger).await.unwrap().is_none());

        source.replace_windows(vec![WindowDescriptor::new(
            "Visual Studio Code",
            "lib.rs - beta - Visual Studio Code",
            Bounds::default(),
        )]);
        let snapshot = poll_once(&capture, &db, &config, &mut trigger)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.name, "Auto: project_change");
        assert_eq!(db.load_all_contexts().await.unwrap().len(), 1);
        let events = db.recent_events(10).await.unwrap();
        assert_eq!(events[0].event_type, EventType::AutoSnap);
        assert_eq!(events[0].context_id.as_deref(), Some(snapshot.id.as_str()));
    }
}
