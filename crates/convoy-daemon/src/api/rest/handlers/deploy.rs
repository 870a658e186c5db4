//! Deployment handlers
//!
//! Single-flight means these endpoints never take a deployment id: they all
//! act on "the" in-flight rollout.

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{extract::State, http::StatusCode, Json};
use convoy_types::{
    DeploymentProgress, DeploymentRecord, DeploymentRequest, DeploymentStatus, Labels,
    RolloutConfiguration,
};
use serde::{Deserialize, Serialize};

/// Response for a triggered deployment
#[derive(Debug, Serialize)]
pub struct TriggerDeploymentResponse {
    pub message: String,
    pub request: DeploymentRequest,
}

/// Start a rollout for the instances matching the request labels.
pub async fn trigger_deployment(
    State(state): State<AppState>,
    Json(request): Json<DeploymentRequest>,
) -> ApiResult<(StatusCode, Json<TriggerDeploymentResponse>)> {
    state.trigger.trigger_deployment(request.clone()).await?;
    state.reconciler.trigger_tick().await;

    Ok((
        StatusCode::CREATED,
        Json(TriggerDeploymentResponse {
            message: "Deployment triggered successfully".to_string(),
            request,
        }),
    ))
}

/// Response for deployment status
#[derive(Debug, Serialize)]
pub struct DeploymentStatusResponse {
    pub deployments: Vec<DeploymentRecord>,
    pub count: usize,
}

/// All running deployments (at most one, by invariant).
pub async fn deployment_status(
    State(state): State<AppState>,
) -> ApiResult<Json<DeploymentStatusResponse>> {
    let deployments = state.trigger.get_deployment_status().await?;

    Ok(Json(DeploymentStatusResponse {
        count: deployments.len(),
        deployments,
    }))
}

/// Response for a progress tick
#[derive(Debug, Serialize)]
pub struct ProgressDeploymentResponse {
    pub message: String,
    pub deployment: Option<DeploymentRecord>,
    pub status: DeploymentStatus,
    pub progress: DeploymentProgress,
}

/// Run one reconciliation tick by hand (normally the reconciler's job).
pub async fn progress_deployment(
    State(state): State<AppState>,
) -> ApiResult<Json<ProgressDeploymentResponse>> {
    let response = match state.trigger.progress_deployment().await? {
        Some(record) => ProgressDeploymentResponse {
            message: "Deployment progressed successfully".to_string(),
            status: record.status,
            progress: record.progress,
            deployment: Some(record),
        },
        None => ProgressDeploymentResponse {
            message: "No deployment in progress".to_string(),
            status: DeploymentStatus::Unknown,
            progress: DeploymentProgress::default(),
            deployment: None,
        },
    };

    Ok(Json(response))
}

/// Request body for a rollback
#[derive(Debug, Deserialize)]
pub struct RollbackRequest {
    #[serde(default)]
    pub labels: Labels,
    #[serde(default)]
    pub configuration: RolloutConfiguration,
}

/// Response for a triggered rollback
#[derive(Debug, Serialize)]
pub struct RollbackResponse {
    pub message: String,
    pub deployment: DeploymentRecord,
}

/// Roll the selected population back to its previous completed versions.
pub async fn trigger_rollback(
    State(state): State<AppState>,
    Json(request): Json<RollbackRequest>,
) -> ApiResult<Json<RollbackResponse>> {
    let record = state
        .trigger
        .trigger_rollback(request.labels, request.configuration)
        .await?;
    state.reconciler.trigger_tick().await;

    Ok(Json(RollbackResponse {
        message: "Rollback triggered successfully".to_string(),
        deployment: record,
    }))
}
