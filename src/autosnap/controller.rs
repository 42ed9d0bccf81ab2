use anyhow::{bail, Context, Result};
use log::info;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::db::Database;
use crate::engine::CaptureEngine;

use super::loop_worker::autosnap_loop;
use super::trigger::AutoSnapConfig;

struct RunningLoop {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Owns the background auto-snap loop.
pub struct AutoSnapController {
    capture: CaptureEngine,
    db: Database,
    running: Mutex<Option<RunningLoop>>,
}

impl AutoSnapController {
    pub fn new(capture: CaptureEngine, db: Database) -> Self {
        Self {
            capture,
            db,
            running: Mutex::new(None),
        }
    }

    pub async fn is_running(&self) -> bool {
        self.running.lock().await.is_some()
    }

    pub async fn start(&self, config: AutoSnapConfig) -> Result<()> {
        let mut running = self.running.lock().await;
        if running.is_some() {
            bail!("auto-snap already running");
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(autosnap_loop(
            self.capture.clone(),
            self.db.clone(),
            config,
            cancel_token.clone(),
        ));

        info!(
            "Auto-snap started (every {}s, polling every {}s)",
            config.interval.as_secs(),
            config.poll_interval.as_secs()
        );
        *running = Some(RunningLoop {
            handle,
            cancel_token,
        });
        Ok(())
    }

    /// Cancels the loop and waits for it to finish. No-op when stopped.
    pub async fn stop(&self) -> Result<()> {
        let Some(running) = self.running.lock().await.take() else {
            return Ok(());
        };
        running.cancel_token.cancel();
        running
            .handle
            .await
            .context("auto-snap loop task failed to join")?;
        info!("Auto-snap stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::AdapterRegistry;
    use crate::test_support::temp_database;
    use crate::window_source::StaticWindowSource;
    use std::sync::Arc;

    #[tokio::test]
    async fn starting_twice_is_an_error_and_stop_joins() {
        let (_dir, db) = temp_database();
        let capture = CaptureEngine::new(
            Arc::new(StaticWindowSource::new(Vec::new())),
            Arc::new(AdapterRegistry::new()),
        );
        let controller = AutoSnapController::new(capture, db);

        controller.start(AutoSnapConfig::default()).await.unwrap();
        assert!(controller.is_running().await);
        assert!(controller.start(AutoSnapConfig::default()).await.is_err());

        controller.stop().await.unwrap();
        assert!(!controller.is_running().await);
        controller.stop().await.unwrap();
    }
}
