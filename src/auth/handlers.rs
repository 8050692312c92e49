use axum::{
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn, Span};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{LoginRequest, PublicUser},
        extractors::SignupForm,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{NewUser, DEFAULT_ROLE},
    },
    error::{ApiError, AppJson},
    photos::services::{discard_photo, store_photo},
    state::AppState,
    validation::{normalize_email, optional, RequiredFields},
};

const EMAIL_TAKEN: &str = "User already exists with this email";

pub fn signup_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}

pub fn login_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

#[instrument(skip(state, form), fields(email))]
pub async fn signup(
    State(state): State<AppState>,
    form: SignupForm,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    let SignupForm { fields, photo } = form;

    let mut required = RequiredFields::new();
    let name = required.text("name", fields.name);
    let email = required.text("email", fields.email);
    let password = required.secret("password", fields.password);
    required.check()?;

    let email = normalize_email(&email);
    Span::current().record("email", email.as_str());

    if state.users.find_by_email(&email).await?.is_some() {
        warn!("email already registered");
        return Err(ApiError::Conflict(EMAIL_TAKEN.into()));
    }

    let password_hash = hash_password_blocking(password).await?;

    let photo = match photo {
        Some(item) => Some(store_photo(state.storage.as_ref(), item).await?),
        None => None,
    };

    let new_user = NewUser {
        id: Uuid::new_v4(),
        name,
        email,
        password_hash,
        role: optional(fields.role).unwrap_or_else(|| DEFAULT_ROLE.into()),
        gender: optional(fields.gender),
        photo: photo.as_ref().map(|p| p.reference.clone()),
    };

    let failure = match state.users.create(new_user).await {
        Ok(Some(user)) => {
            info!(user_id = %user.id, "user registered");
            return Ok((StatusCode::CREATED, Json(PublicUser::from(user))));
        }
        Ok(None) => {
            // Lost a race with a concurrent signup for the same email.
            warn!("email registered concurrently");
            ApiError::Conflict(EMAIL_TAKEN.into())
        }
        Err(e) => ApiError::from(e),
    };

    if let Some(p) = &photo {
        discard_photo(state.storage.as_ref(), p).await;
    }
    Err(failure)
}

#[instrument(skip(state, payload), fields(email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let mut required = RequiredFields::new();
    let email = required.text("email", payload.email);
    let password = required.secret("password", payload.password);
    required.check()?;

    let email = normalize_email(&email);
    Span::current().record("email", email.as_str());

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!("login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    if !verify_password_blocking(password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    info!(user_id = %user.id, "user logged in");
    Ok(Json(PublicUser::from(user)))
}
