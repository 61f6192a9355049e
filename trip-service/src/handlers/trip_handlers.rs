use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bmg_shared::models::{MessageResponse, Trip};
use log::info;
use serde_json::{json, Value};

use crate::error::Result;
use crate::extract::JsonBody;
use crate::models::{
    CreateTripRequest, InvitationRequest, UpdateTripRequest, UpdateTripUsersRequest,
};
use crate::services::trips::TripService;

/// POST /trip
pub async fn create_trip(
    State(service): State<Arc<TripService>>,
    Extension(user_id): Extension<String>,
    JsonBody(payload): JsonBody<CreateTripRequest>,
) -> Result<impl IntoResponse> {
    info!("User {} creating trip", user_id);
    let trip = service.create(payload).await?;
    Ok((StatusCode::CREATED, Json(json!({ "newTrip": trip }))))
}

/// GET /trip
pub async fn get_trips(State(service): State<Arc<TripService>>) -> Result<Json<Value>> {
    let trips = service.read_all().await?;
    Ok(Json(json!({ "trips": trips })))
}

/// GET /trip/user/:id
/// Trips the user is a member of
pub async fn get_trips_by_user(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let trips = service.read_by_user_id(&id).await?;
    info!("Found {} trips for user {}", trips.len(), id);
    Ok(Json(json!({ "trip": trips })))
}

/// GET /trip/:id
pub async fn get_trip(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<Trip>> {
    Ok(Json(service.read_by_id(&id).await?))
}

/// GET /trip/:id/users
pub async fn get_trip_with_users(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<Trip>> {
    Ok(Json(service.read_by_id_with_users(&id).await?))
}

/// GET /trip/:id/information
pub async fn get_trip_information(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<Trip>> {
    Ok(Json(service.read_by_id_with_minimum_information(&id).await?))
}

/// GET /trip/steps/:id
/// The trip's whole itinerary down to the steps
pub async fn get_trip_steps(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<Trip>> {
    Ok(Json(service.read_steps_by_id(&id).await?))
}

/// PUT /trip/:id
pub async fn update_trip(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateTripRequest>,
) -> Result<Json<Trip>> {
    Ok(Json(service.update(&id, payload).await?))
}

/// DELETE /trip/:id
pub async fn delete_trip(
    State(service): State<Arc<TripService>>,
    Extension(user_id): Extension<String>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    info!("User {} deleting trip {}", user_id, id);
    service.delete(&id).await?;
    Ok(Json(MessageResponse {
        message: "Trip deleted successfully".to_string(),
    }))
}

/// PUT /trip/:id/users
pub async fn update_trip_users(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<UpdateTripUsersRequest>,
) -> Result<Json<Trip>> {
    Ok(Json(service.update_users(&id, payload).await?))
}

/// DELETE /trip/:id/users/:userId
pub async fn remove_companion(
    State(service): State<Arc<TripService>>,
    Path((id, user_id)): Path<(String, String)>,
) -> Result<Json<Trip>> {
    Ok(Json(service.remove_companion(&id, &user_id).await?))
}

/// PUT /trip/:id/invitation
pub async fn respond_to_invitation(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<InvitationRequest>,
) -> Result<Json<Trip>> {
    Ok(Json(service.handle_invitation(&id, payload).await?))
}
