// POST /register and POST /login
use axum::{extract::State, http::StatusCode, response::Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::Claims;
use crate::clients::IdentityError;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

/// Register a new account with the identity provider. The account starts
/// unconfirmed; the provider sends the confirmation e-mail.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, &'static str), ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() || body.name.trim().is_empty() {
        return Err(ApiError::bad_request(
            "please provide e-mail, password and name",
        ));
    }

    // Domain gate runs before any provider call.
    if !body.email.ends_with(&state.permitted_email_domain) {
        return Err(ApiError::bad_request(format!(
            "registration is permitted only for {} e-mail addresses",
            state.permitted_email_domain
        )));
    }

    state
        .identity
        .sign_up(&body.email, &body.password, &body.name)
        .await
        .map_err(|e| {
            tracing::error!("sign-up rejected for {}: {e}", body.email);
            ApiError::bad_request(e.to_string())
        })?;

    Ok((
        StatusCode::CREATED,
        "User registered. Check your e-mail to confirm the account.",
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Verify credentials with the identity provider, then mint a session token
/// of our own.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
    if body.email.trim().is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("please provide e-mail and password"));
    }

    let user = state
        .identity
        .sign_in_with_password(&body.email, &body.password)
        .await
        .map_err(|e| match e {
            IdentityError::EmailNotConfirmed => ApiError::unauthorized(
                "login failed: e-mail not yet confirmed, check your inbox",
            ),
            // Collapsed: the client learns nothing beyond "wrong credentials".
            _ => ApiError::bad_request("invalid e-mail or password"),
        })?;

    let claims = Claims::new(user.id, user.display_name(), user.email.clone());
    let token = state.tokens.mint(&claims).map_err(|e| {
        tracing::error!("failed to mint session token: {e}");
        ApiError::internal_server_error("failed to create session")
    })?;

    Ok(Json(json!({
        "token": token,
        "user": { "id": claims.id, "name": claims.name, "email": claims.email },
    })))
}
