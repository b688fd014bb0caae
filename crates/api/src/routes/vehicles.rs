//! Vehicle registration, rental, and query endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use common::UserId;
use domain::{
    Location, RentVehicle, ReturnVehicle, Role, UpdateVehicleStatus, Vehicle,
    VehicleCommandService, VehicleQueryService, VehicleRepository, VehicleStatus, VehicleSummary,
};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Header carrying the externally-resolved caller role.
pub const ROLE_HEADER: &str = "x-fleet-role";

/// Shared application state accessible from all handlers.
pub struct AppState<R: VehicleRepository> {
    pub commands: VehicleCommandService<R>,
    pub queries: VehicleQueryService<R>,
    pub repository: R,
}

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterVehicleRequest {
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Initial status; defaults to `Available` when omitted.
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub expected_status: String,
    pub new_status: String,
}

#[derive(Deserialize)]
pub struct RentalRequest {
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
pub struct NearbyParams {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: f64,
}

// -- Response types --

#[derive(Serialize)]
pub struct VehicleRegisteredResponse {
    pub id: String,
    pub status: String,
}

// -- Helpers --

fn parse_status(value: &str) -> Result<VehicleStatus, ApiError> {
    VehicleStatus::parse(value).map_err(ApiError::from)
}

/// Resolves the caller role from the `x-fleet-role` header.
///
/// A missing header yields `None` (the command layer rejects roleless
/// transitions); a present but unrecognized value is a client error.
fn caller_role(headers: &HeaderMap) -> Result<Option<Role>, ApiError> {
    let Some(raw) = headers.get(ROLE_HEADER) else {
        return Ok(None);
    };
    let value = raw
        .to_str()
        .map_err(|_| ApiError::BadRequest(format!("{ROLE_HEADER} header is not valid UTF-8")))?;
    let role = value
        .parse::<Role>()
        .map_err(|_| ApiError::BadRequest(format!("unrecognized role: {value}")))?;
    Ok(Some(role))
}

// -- Handlers --

/// POST /vehicles — register a vehicle in the fleet.
#[tracing::instrument(skip(state, req))]
pub async fn register<R: VehicleRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Json(req): Json<RegisterVehicleRequest>,
) -> Result<(StatusCode, Json<VehicleRegisteredResponse>), ApiError> {
    let location = Location::new(req.latitude, req.longitude)
        .map_err(|e| ApiError::from(domain::VehicleError::from(e)))?;
    let status = match req.status.as_deref() {
        Some(s) => parse_status(s)?,
        None => VehicleStatus::Available,
    };

    let mut vehicle = Vehicle::new(req.id, location, status)?;
    state.repository.save(&mut vehicle).await?;

    tracing::info!(vehicle_id = %vehicle.id(), status = %vehicle.status(), "vehicle registered");
    Ok((
        StatusCode::CREATED,
        Json(VehicleRegisteredResponse {
            id: vehicle.id().to_string(),
            status: vehicle.status().to_string(),
        }),
    ))
}

/// GET /vehicles/nearby?latitude=..&longitude=..&radius_km=..
#[tracing::instrument(skip(state))]
pub async fn nearby<R: VehicleRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Query(params): Query<NearbyParams>,
) -> Result<Json<Vec<VehicleSummary>>, ApiError> {
    let vehicles = state
        .queries
        .nearby(params.latitude, params.longitude, params.radius_km)
        .await?;
    Ok(Json(vehicles))
}

/// GET /users/{user_id}/vehicles — vehicles currently assigned to a user.
#[tracing::instrument(skip(state))]
pub async fn user_vehicles<R: VehicleRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<VehicleSummary>>, ApiError> {
    let vehicles = state.queries.by_user(&UserId::new(user_id)).await?;
    Ok(Json(vehicles))
}

/// PUT /vehicles/{id}/status — guarded status transition.
///
/// The body carries the caller's last-seen status as the concurrency
/// token; a stale value is rejected with 409.
#[tracing::instrument(skip(state, headers, req))]
pub async fn update_status<R: VehicleRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<StatusCode, ApiError> {
    let role = caller_role(&headers)?;
    let expected = parse_status(&req.expected_status)?;
    let new_status = parse_status(&req.new_status)?;

    state
        .commands
        .update_status(UpdateVehicleStatus::new(id, expected, new_status, role))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /vehicles/{id}/rent — rent an available vehicle.
#[tracing::instrument(skip(state, req))]
pub async fn rent<R: VehicleRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<RentalRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .commands
        .rent(RentVehicle::new(id, req.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /vehicles/{id}/return — return a rented vehicle.
#[tracing::instrument(skip(state, req))]
pub async fn return_vehicle<R: VehicleRepository + Clone + 'static>(
    State(state): State<Arc<AppState<R>>>,
    Path(id): Path<String>,
    Json(req): Json<RentalRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .commands
        .return_vehicle(ReturnVehicle::new(id, req.user_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
