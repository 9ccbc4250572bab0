//! # Timeslot Handlers
//!
//! Listing, lookup, and the claim lifecycle. Successful claims and releases
//! are published on the state's broadcast channel for `/sse` subscribers.

use axum::{extract::State, Json};
use slotbook_core::{
    errors::TimeslotError,
    models::{
        events::TimeslotEvent,
        requests::{GetByEmailParams, OccupyRequest, ReleaseRequest},
        timeslot::Timeslot,
    },
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::{
    extract::{AppJson, AppPath, AppQuery},
    middleware::error_handling::AppError,
    ApiState,
};

#[axum::debug_handler]
pub async fn list_timeslots(
    State(state): State<Arc<ApiState>>,
) -> Result<Json<Vec<Timeslot>>, AppError> {
    let timeslots = state.repository.list_timeslots().await?;
    Ok(Json(timeslots))
}

#[axum::debug_handler]
pub async fn get_timeslot(
    State(state): State<Arc<ApiState>>,
    AppPath(id): AppPath<i64>,
) -> Result<Json<Timeslot>, AppError> {
    let timeslot = state
        .repository
        .get_timeslot_by_id(id)
        .await?
        .ok_or_else(|| TimeslotError::NotFound(format!("Timeslot with ID {} not found", id)))?;

    Ok(Json(timeslot))
}

/// Responds with `null` when the email holds no slot.
#[axum::debug_handler]
pub async fn get_by_email(
    State(state): State<Arc<ApiState>>,
    AppQuery(params): AppQuery<GetByEmailParams>,
) -> Result<Json<Option<Timeslot>>, AppError> {
    let timeslot = state.repository.get_timeslot_by_email(&params.email).await?;
    Ok(Json(timeslot))
}

#[axum::debug_handler]
pub async fn occupy(
    State(state): State<Arc<ApiState>>,
    AppJson(payload): AppJson<OccupyRequest>,
) -> Result<Json<Timeslot>, AppError> {
    let timeslot = match state
        .repository
        .occupy_timeslot(payload.id, &payload.email)
        .await
    {
        Ok(timeslot) => timeslot,
        Err(err) => {
            warn!("Rejected claim on timeslot {}: {}", payload.id, err);
            return Err(err.into());
        }
    };

    info!("Timeslot {} occupied", timeslot.id());
    publish(
        &state,
        TimeslotEvent::Occupied {
            id: timeslot.id(),
            email: payload.email,
        },
    );

    Ok(Json(timeslot))
}

#[axum::debug_handler]
pub async fn release(
    State(state): State<Arc<ApiState>>,
    AppJson(payload): AppJson<ReleaseRequest>,
) -> Result<Json<Timeslot>, AppError> {
    let timeslot = match state
        .repository
        .release_timeslot(payload.id, &payload.email)
        .await
    {
        Ok(timeslot) => timeslot,
        Err(err) => {
            warn!("Rejected release of timeslot {}: {}", payload.id, err);
            return Err(err.into());
        }
    };

    info!("Timeslot {} released", timeslot.id());
    publish(
        &state,
        TimeslotEvent::Released {
            id: timeslot.id(),
            email: payload.email,
        },
    );

    Ok(Json(timeslot))
}

fn publish(state: &ApiState, event: TimeslotEvent) {
    // Sending only fails when nobody is subscribed
    if state.events.send(event).is_err() {
        debug!("No event subscribers connected");
    }
}
