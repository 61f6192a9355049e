use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use bmg_shared::models::{MessageResponse, TripDay, TripPlanning, TripStep};
use log::info;

use crate::error::Result;
use crate::extract::JsonBody;
use crate::models::{AddPlanningRequest, DayRequest, DayUpdateRequest, StepRequest, StepUpdateRequest};
use crate::services::trips::TripService;

/// POST /trip/:id/planning
/// Starts the trip's planning with its first day
pub async fn add_planning(
    State(service): State<Arc<TripService>>,
    Extension(user_id): Extension<String>,
    Path(id): Path<String>,
    JsonBody(mut payload): JsonBody<AddPlanningRequest>,
) -> Result<impl IntoResponse> {
    // The caller is the editor unless someone else is named
    if payload.updated_by.is_none() {
        payload.updated_by = Some(user_id);
    }
    let trip = service.add_planning(&id, payload).await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

/// POST /trip/:id/planning/day (id = planning)
pub async fn add_day(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<DayRequest>,
) -> Result<impl IntoResponse> {
    let planning = service.add_day_to_planning(&id, payload).await?;
    Ok((StatusCode::CREATED, Json(planning)))
}

/// PUT /trip/:id/planning/day (id = day)
pub async fn update_day(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<DayUpdateRequest>,
) -> Result<Json<TripDay>> {
    Ok(Json(service.update_day(&id, payload).await?))
}

/// DELETE /trip/:id/planning/day (id = day)
pub async fn delete_day(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let day = service.delete_day(&id).await?;
    info!("Day {} deleted with {} steps", day.id, day.steps.len());
    Ok(Json(MessageResponse {
        message: "Day deleted successfully".to_string(),
    }))
}

/// GET /trip/day/:id
pub async fn get_day(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<TripDay>> {
    Ok(Json(service.read_with_steps(&id).await?))
}

/// GET /trip/planning/:id
pub async fn get_planning(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<TripPlanning>> {
    Ok(Json(service.read_with_days(&id).await?))
}

/// POST /trip/:id/day/step (id = day)
pub async fn add_step(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StepRequest>,
) -> Result<impl IntoResponse> {
    let day = service.add_step_to_day(&id, payload).await?;
    Ok((StatusCode::CREATED, Json(day)))
}

/// PUT /trip/:id/day/step (id = step)
pub async fn update_step(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
    JsonBody(payload): JsonBody<StepUpdateRequest>,
) -> Result<Json<TripStep>> {
    Ok(Json(service.update_step(&id, payload).await?))
}

/// DELETE /trip/:id/day/step (id = step)
pub async fn delete_step(
    State(service): State<Arc<TripService>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>> {
    service.delete_step(&id).await?;
    Ok(Json(MessageResponse {
        message: "Step deleted successfully".to_string(),
    }))
}
