use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{
    dto::BookAppointmentRequest,
    repo::{Appointment, NewAppointment},
};
use crate::{
    error::{ApiError, AppJson},
    state::AppState,
    validation::{normalize_email, optional, RequiredFields},
};

pub fn appointment_routes() -> Router<AppState> {
    Router::new().route("/appointments", get(list_appointments).post(book_appointment))
}

#[instrument(skip(state, payload))]
pub async fn book_appointment(
    State(state): State<AppState>,
    AppJson(payload): AppJson<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), ApiError> {
    let mut required = RequiredFields::new();
    let name = required.text("name", payload.name);
    let email = required.text("email", payload.email);
    let phone = required.text("phone", payload.phone);
    let date = required.text("date", payload.date);
    let time = required.text("time", payload.time);
    required.check()?;

    let new = NewAppointment {
        id: Uuid::new_v4(),
        name,
        email: normalize_email(&email),
        phone,
        date,
        time,
        message: optional(payload.message).unwrap_or_default(),
    };
    let (date, time) = (new.date.clone(), new.time.clone());

    let guard_slot = state.config.appointment_slot_check;
    let Some(appointment) = state.appointments.book(new, guard_slot).await? else {
        warn!(%date, %time, "slot already booked");
        return Err(ApiError::Conflict(format!(
            "The {} {} slot is already booked",
            date, time
        )));
    };

    info!(appointment_id = %appointment.id, %date, %time, "appointment booked");
    Ok((StatusCode::CREATED, Json(appointment)))
}

#[instrument(skip(state))]
pub async fn list_appointments(
    State(state): State<AppState>,
) -> Result<Json<Vec<Appointment>>, ApiError> {
    Ok(Json(state.appointments.list().await?))
}
