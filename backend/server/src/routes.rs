use std::sync::Arc;

use auth::{Attributes, AuthError, ProviderError, Session};
use axum::{
    Json,
    body::Bytes,
    extract,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use records::{Role, StoreError, update_status};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use tracing::warn;

use crate::{
    error::AppError::{self, MalformedPayload, MissingFields},
    state::State,
    utils::get_status_update,
};

type AppState = extract::State<Arc<State>>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterPayload {
    email: Option<String>,
    password: Option<String>,
    display_name: Option<String>,
    role: Option<String>,

    #[serde(flatten)]
    attributes: Attributes,
}

#[derive(Deserialize)]
struct LoginPayload {
    email: Option<String>,
    password: Option<String>,
    role: Option<String>,
}

fn decode<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|_| MalformedPayload)
}

fn required(field: Option<String>) -> Result<String, AppError> {
    field.filter(|value| !value.is_empty()).ok_or(MissingFields)
}

fn role(field: Option<String>) -> Result<Role, AppError> {
    match field {
        Some(role) => role.parse().map_err(AppError::Invalid),
        None => Ok(Role::default()),
    }
}

pub async fn status_handler(
    extract::State(state): AppState,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let update = get_status_update(&body)?;

    update_status(state.store.as_ref(), &update.appointment_id, update.status)
        .await
        .map_err(|e| match e {
            StoreError::NotFound { .. } => {
                AppError::NotFound(format!("Appointment {} not found", update.appointment_id))
            }
            other => other.into(),
        })?;

    Ok(Json(json!({
        "success": true,
        "message": "Appointment status updated successfully",
    })))
}

pub async fn register_handler(
    extract::State(state): AppState,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: RegisterPayload = decode(&body)?;

    let email = required(payload.email)?;
    let password = required(payload.password)?;
    let display_name = required(payload.display_name)?;
    let role = role(payload.role)?;

    let session = Session::server();
    let record = state
        .accounts
        .register(
            &session,
            &email,
            &password,
            &display_name,
            role,
            payload.attributes,
        )
        .await?;

    // Release the provider session opened by registration
    if let Err(e) = state.accounts.sign_out(&session).await {
        warn!("Could not release registration session for {}: {e}", record.uid);
    }

    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn login_handler(
    extract::State(state): AppState,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let payload: LoginPayload = decode(&body)?;

    let email = required(payload.email)?;
    let password = required(payload.password)?;
    let role = role(payload.role)?;

    // The session ends with the request, the id token stays valid for /api/auth/me
    let outcome = state
        .accounts
        .login(&Session::server(), &email, &password, role)
        .await?;

    Ok(Json(json!({
        "user": outcome.record,
        "idToken": outcome.identity.id_token,
    })))
}

fn bearer(headers: &HeaderMap) -> Result<&str, AppError> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing bearer token".to_string()))
}

pub async fn me_handler(
    extract::State(state): AppState,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let token = bearer(&headers)?;

    let session = Session::server();
    state
        .accounts
        .resume(&session, token)
        .await
        .map_err(|e| match e {
            AuthError::Provider(ProviderError::Rejected { code }) => {
                AppError::Unauthorized(format!("Invalid id token: {code}"))
            }
            other => other.into(),
        })?;

    let record = state
        .accounts
        .current_user_data(&session)
        .await?
        .ok_or_else(|| AppError::NotFound("User data not found. Please contact support.".to_string()))?;

    Ok(Json(record))
}
