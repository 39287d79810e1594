// GET /propostas and POST /propostas (both behind the session middleware)
use axum::{extract::State, http::StatusCode, response::Json, Extension};
use serde::Deserialize;
use serde_json::Value;

use crate::clients::Proposal;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::AppState;

/// List the caller's proposals, newest first.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Proposal>>, ApiError> {
    let proposals = state.data.list_by_owner(user.id).await.map_err(|e| {
        tracing::error!("failed to list proposals for {}: {e}", user.id);
        ApiError::internal_server_error("failed to load proposals")
    })?;

    Ok(Json(proposals))
}

#[derive(Debug, Deserialize)]
pub struct CreateProposalRequest {
    pub title: Option<String>,
    pub data: Option<Value>,
}

/// Create a proposal owned by the caller. Ownership comes from the session
/// token; a `user_id` in the body is ignored.
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateProposalRequest>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let title = body
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("please provide a title"))?;

    let payload = body
        .data
        .filter(|d| !d.is_null())
        .ok_or_else(|| ApiError::bad_request("please provide the proposal data"))?;

    state
        .data
        .insert(user.id, title, payload)
        .await
        .map_err(|e| {
            tracing::error!("failed to save proposal for {}: {e}", user.id);
            ApiError::internal_server_error("failed to save proposal")
        })?;

    Ok((StatusCode::CREATED, "Proposal saved."))
}
