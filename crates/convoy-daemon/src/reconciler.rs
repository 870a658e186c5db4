//! Reconciliation loop
//!
//! The coordinator core is quiescent between ticks; this outer loop calls
//! `progress_deployment` on an interval (and on demand, when a handler
//! nudges it) so rollouts advance without an operator polling
//! `/deploy/progress`.

use crate::config::ReconcilerConfig;
use convoy_deployment::TriggerService;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};

/// Interval-driven progress ticker.
pub struct Reconciler {
    config: ReconcilerConfig,
    trigger: Arc<TriggerService>,
    tick_tx: mpsc::Sender<()>,
    running: RwLock<bool>,
}

impl Reconciler {
    pub fn new(
        config: ReconcilerConfig,
        trigger: Arc<TriggerService>,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (tick_tx, tick_rx) = mpsc::channel(10);

        let reconciler = Arc::new(Self {
            config,
            trigger,
            tick_tx,
            running: RwLock::new(false),
        });

        (reconciler, tick_rx)
    }

    /// Request an immediate tick.
    pub async fn trigger_tick(&self) {
        let _ = self.tick_tx.send(()).await;
    }

    /// Run the loop until [`Reconciler::stop`] is called.
    pub async fn start(self: Arc<Self>, mut tick_rx: mpsc::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Reconciler disabled");
            return;
        }

        {
            let mut running = self.running.write().await;
            *running = true;
        }

        tracing::info!(interval_secs = self.config.interval_secs, "Reconciler started");

        let mut ticker = interval(Duration::from_secs(self.config.interval_secs));

        loop {
            tokio::select! {
                _ = ticker.tick() => self.reconcile().await,
                Some(_) = tick_rx.recv() => self.reconcile().await,
                else => break,
            }

            if !*self.running.read().await {
                break;
            }
        }

        tracing::info!("Reconciler stopped");
    }

    /// Stop the loop after the current tick.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    async fn reconcile(&self) {
        match self.trigger.progress_deployment().await {
            Ok(Some(record)) => {
                tracing::debug!(
                    deployment_id = %record.id,
                    status = ?record.status,
                    completed = record.progress.completed_instances,
                    in_progress = record.progress.in_progress_instances,
                    "Reconciled deployment"
                );
            }
            Ok(None) => {}
            Err(err) => {
                tracing::error!(error = %err, "Reconciliation tick failed");
            }
        }
    }
}
