// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;
use tracing::{error, info, warn};

use shared_models::error::AppError;

use crate::extractors::{AppJson, AppPath, AppQuery};
use crate::models::{
    Appointment, AppointmentError, AppointmentListQuery, AppointmentRequest,
    ConflictCheckQuery, ConflictCheckResponse,
};
use crate::services::SharedStore;

const CONFLICT_MESSAGE: &str = "Appointment time conflicts with an existing booking.";

// ==============================================================================
// ERROR TRANSLATION
// ==============================================================================

fn store_error(err: AppointmentError) -> AppError {
    match err {
        AppointmentError::NotFound => AppError::NotFound("Appointment not found".to_string()),
        AppointmentError::Conflict(conflicts) => {
            warn!("Rejected booking overlapping {} appointment(s)", conflicts.len());
            AppError::Conflict {
                message: CONFLICT_MESSAGE.to_string(),
                conflicts: json!(conflicts),
            }
        }
        AppointmentError::StorageUnavailable(detail) => {
            error!("Appointment storage unavailable: {}", detail);
            AppError::ServiceUnavailable("Appointment storage is temporarily unavailable".to_string())
        }
    }
}

fn validate_request(request: &AppointmentRequest) -> Result<(), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::ValidationError("Title must not be empty.".to_string()));
    }

    if request.start_time >= request.end_time {
        return Err(AppError::ValidationError("EndTime must be later than StartTime.".to_string()));
    }

    Ok(())
}

// ==============================================================================
// QUERY HANDLERS
// ==============================================================================

/// `GET /appointments` with optional `date` or inclusive `from`/`to`.
#[axum::debug_handler]
pub async fn list_appointments(
    State(store): State<SharedStore>,
    AppQuery(query): AppQuery<AppointmentListQuery>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = match (query.date, query.from, query.to) {
        (Some(date), None, None) => store.list_by_date(date).await,
        (None, Some(from), Some(to)) => {
            if from > to {
                return Err(AppError::BadRequest("'from' must not be after 'to'".to_string()));
            }
            store.list_by_date_range(from, to).await
        }
        (None, None, None) => store.list_all().await,
        (Some(_), _, _) => {
            return Err(AppError::BadRequest("Use either 'date' or 'from'/'to', not both".to_string()));
        }
        _ => {
            return Err(AppError::BadRequest("'from' and 'to' must be given together".to_string()));
        }
    }
    .map_err(store_error)?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(store): State<SharedStore>,
    AppPath(appointment_id): AppPath<i64>,
) -> Result<Json<Appointment>, AppError> {
    store.get_by_id(appointment_id).await
        .map_err(store_error)?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Appointment not found".to_string()))
}

#[axum::debug_handler]
pub async fn check_conflicts(
    State(store): State<SharedStore>,
    AppQuery(query): AppQuery<ConflictCheckQuery>,
) -> Result<Json<ConflictCheckResponse>, AppError> {
    if query.start_time >= query.end_time {
        return Err(AppError::ValidationError("end_time must be later than start_time".to_string()));
    }

    let conflicting_appointments = store
        .find_conflicts(query.start_time, query.end_time, query.exclude_id)
        .await
        .map_err(store_error)?;

    Ok(Json(ConflictCheckResponse {
        has_conflict: !conflicting_appointments.is_empty(),
        conflicting_appointments,
    }))
}

// ==============================================================================
// MUTATION HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_appointment(
    State(store): State<SharedStore>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_request(&request)?;

    let appointment = store.create(request.into_candidate()).await
        .map_err(store_error)?;

    info!("Booked appointment {} ({} - {})",
          appointment.id, appointment.start_time, appointment.end_time);

    let location = format!("/appointments/{}", appointment.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(appointment)))
}

#[axum::debug_handler]
pub async fn update_appointment(
    State(store): State<SharedStore>,
    AppPath(appointment_id): AppPath<i64>,
    AppJson(request): AppJson<AppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    match request.id {
        Some(body_id) if body_id == appointment_id => {}
        Some(body_id) => {
            return Err(AppError::BadRequest(format!(
                "Body id {} does not match route id {}", body_id, appointment_id
            )));
        }
        None => {
            return Err(AppError::BadRequest("Body must include the appointment id".to_string()));
        }
    }

    validate_request(&request)?;

    let appointment = store.update(appointment_id, request.into_candidate()).await
        .map_err(store_error)?;

    info!("Updated appointment {}", appointment.id);

    Ok(Json(appointment))
}

#[axum::debug_handler]
pub async fn delete_appointment(
    State(store): State<SharedStore>,
    AppPath(appointment_id): AppPath<i64>,
) -> Result<StatusCode, AppError> {
    let deleted = store.delete(appointment_id).await
        .map_err(store_error)?;

    if !deleted {
        return Err(AppError::NotFound("Appointment not found".to_string()));
    }

    info!("Deleted appointment {}", appointment_id);
    Ok(StatusCode::NO_CONTENT)
}
