use axum::{
    extract::State,
    http::{header, HeaderName, StatusCode},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

use super::repo::Lawyer;
use crate::{
    error::{ApiError, AppJson, AppPath},
    state::AppState,
};

/// Keys owned by the record itself; dropped from submitted profiles.
const RESERVED_KEYS: [&str; 3] = ["id", "_id", "created_at"];

#[derive(Debug, Serialize)]
pub struct DeletedLawyer {
    pub id: Uuid,
    pub deleted: bool,
}

pub fn lawyer_routes() -> Router<AppState> {
    Router::new()
        .route("/lawyers", get(list_lawyers).post(create_lawyer))
        .route("/lawyers/:id", get(get_lawyer).delete(delete_lawyer))
}

#[instrument(skip(state))]
pub async fn list_lawyers(State(state): State<AppState>) -> Result<Json<Vec<Lawyer>>, ApiError> {
    Ok(Json(state.lawyers.list().await?))
}

#[instrument(skip(state))]
pub async fn get_lawyer(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Lawyer>, ApiError> {
    state
        .lawyers
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Lawyer not found".into()))
}

#[instrument(skip(state, body))]
pub async fn create_lawyer(
    State(state): State<AppState>,
    AppJson(body): AppJson<Value>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<Lawyer>), ApiError> {
    let Value::Object(mut profile) = body else {
        return Err(ApiError::Validation("Lawyer must be a JSON object".into()));
    };
    for key in RESERVED_KEYS {
        profile.remove(key);
    }

    let lawyer = state.lawyers.create(Uuid::new_v4(), profile).await?;
    info!(lawyer_id = %lawyer.id, "lawyer created");

    let location = format!("/lawyers/{}", lawyer.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(lawyer)))
}

#[instrument(skip(state))]
pub async fn delete_lawyer(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeletedLawyer>, ApiError> {
    if !state.lawyers.delete(id).await? {
        return Err(ApiError::NotFound("Lawyer not found".into()));
    }
    info!(lawyer_id = %id, "lawyer deleted");
    Ok(Json(DeletedLawyer { id, deleted: true }))
}
