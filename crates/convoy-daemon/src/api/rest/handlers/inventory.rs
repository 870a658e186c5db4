//! Inventory handlers: registration, listing, heartbeat patches

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use convoy_inventory::{RegistrationRequest, UpdateRequest};
use convoy_types::{Instance, VersionState};
use serde::Serialize;

/// Response for listing instances
#[derive(Debug, Serialize)]
pub struct ListInstancesResponse {
    pub instances: Vec<Instance>,
    pub count: usize,
}

/// List all instances in the inventory.
pub async fn list_instances(State(state): State<AppState>) -> ApiResult<Json<ListInstancesResponse>> {
    let instances = state.registration.list_all_instances().await?;

    Ok(Json(ListInstancesResponse {
        count: instances.len(),
        instances,
    }))
}

/// Response for a successful registration
#[derive(Debug, Serialize)]
pub struct RegisterInstanceResponse {
    pub message: String,
    pub instance: Instance,
}

/// Register an instance with the coordinator.
pub async fn register_instance(
    State(state): State<AppState>,
    Json(request): Json<RegistrationRequest>,
) -> ApiResult<(StatusCode, Json<RegisterInstanceResponse>)> {
    let instance = state.registration.register_instance(request).await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterInstanceResponse {
            message: "Instance registered successfully".to_string(),
            instance,
        }),
    ))
}

/// Response for a heartbeat patch; echoes both states so the agent can act
/// on its desired state without a second round trip.
#[derive(Debug, Serialize)]
pub struct UpdateInstanceResponse {
    pub message: String,
    pub instance: Instance,
    pub desired_state: VersionState,
    pub current_state: VersionState,
    pub update_needed: bool,
}

/// Apply a heartbeat patch to an instance.
pub async fn update_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateRequest>,
) -> ApiResult<Json<UpdateInstanceResponse>> {
    let instance = state.updates.update_instance(&id, request).await?;

    Ok(Json(UpdateInstanceResponse {
        message: "Instance updated successfully".to_string(),
        desired_state: instance.desired_state.clone(),
        current_state: instance.current_state.clone(),
        update_needed: instance.update_needed(),
        instance,
    }))
}
