//! Server setup and lifecycle
//!
//! The composition root: stores, services, strategy, and trigger service are
//! wired here and handed to the router as explicit dependencies.

use crate::api::rest::state::AppState;
use crate::api::create_router;
use crate::config::DaemonConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::reconciler::Reconciler;
use convoy_deployment::{
    DeploymentStore, InMemoryDeploymentStore, InMemoryLocker, Locker, RollingStrategy,
    TriggerService,
};
use convoy_inventory::{
    InMemoryInventoryStore, InventoryStore, RegistrationService, StateService, UpdateService,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// Assemble the full service graph over fresh in-memory stores.
pub fn bootstrap(config: &DaemonConfig) -> (AppState, mpsc::Receiver<()>) {
    let inventory: Arc<dyn InventoryStore> = Arc::new(InMemoryInventoryStore::new());
    let registration = Arc::new(RegistrationService::new(inventory.clone()));
    let updates = Arc::new(UpdateService::new(inventory.clone()));
    let inventory_state = Arc::new(StateService::new(inventory));

    let deployments: Arc<dyn DeploymentStore> = Arc::new(InMemoryDeploymentStore::new());
    let locker: Arc<dyn Locker> = Arc::new(InMemoryLocker::new());
    let strategy = Arc::new(RollingStrategy::new(deployments.clone(), inventory_state));
    let trigger = Arc::new(TriggerService::new(deployments, locker, strategy));

    let (reconciler, tick_rx) = Reconciler::new(config.reconciler.clone(), trigger.clone());

    (
        AppState::new(registration, updates, trigger, reconciler),
        tick_rx,
    )
}

/// The convoyd server
pub struct Server {
    config: DaemonConfig,
    state: AppState,
    tick_rx: mpsc::Receiver<()>,
}

impl Server {
    pub fn new(config: DaemonConfig) -> Self {
        let (state, tick_rx) = bootstrap(&config);
        Self {
            config,
            state,
            tick_rx,
        }
    }

    /// Serve until SIGINT/SIGTERM.
    pub async fn run(self) -> DaemonResult<()> {
        let addr = self.config.server.listen_addr;
        let reconciler = self.state.reconciler.clone();

        let app = create_router(self.state);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(listen_addr = %addr, "convoyd listening");

        let reconciler_handle = tokio::spawn(reconciler.clone().start(self.tick_rx));

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| DaemonError::Server(e.to_string()))?;

        tracing::info!("convoyd shutting down");

        reconciler.stop().await;
        reconciler_handle.abort();

        Ok(())
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal, initiating graceful shutdown");
        }
    }
}
