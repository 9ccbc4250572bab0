use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/timeslots", get(handlers::timeslots::list_timeslots))
        .route(
            "/timeslots/getByEmail",
            get(handlers::timeslots::get_by_email),
        )
        .route("/timeslots/occupy", post(handlers::timeslots::occupy))
        .route("/timeslots/release", post(handlers::timeslots::release))
        .route("/timeslots/:id", get(handlers::timeslots::get_timeslot))
}
