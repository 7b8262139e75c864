use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
};
use tracing::info;

use hushbox_types::api::{
    AcceptMessagesRequest, AcceptanceStatusResponse, Claims, UpdateAcceptanceResponse, UserProfile,
};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, inbox};

/// `GET /accept-messages`: the caller's own flag.
pub async fn get_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<AcceptanceStatusResponse>, ApiError> {
    let db = state.clone();
    let is_accepting_messages =
        blocking(move || inbox::acceptance_status(&db.db, claims.sub)).await?;

    Ok(Json(AcceptanceStatusResponse {
        success: true,
        is_accepting_messages,
    }))
}

/// `POST /accept-messages`: flip the caller's own flag. The target id comes
/// from the session only.
pub async fn set_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    payload: Result<Json<AcceptMessagesRequest>, JsonRejection>,
) -> Result<Json<UpdateAcceptanceResponse>, ApiError> {
    let Json(req) = payload?;

    let db = state.clone();
    let accepting = req.accept_messages;
    let user = blocking(move || inbox::set_acceptance_status(&db.db, claims.sub, accepting)).await?;

    info!("User {} set accepting messages to {}", user.username, accepting);

    Ok(Json(UpdateAcceptanceResponse {
        success: true,
        message: "Message acceptance status updated successfully".into(),
        updated_user: UserProfile::from(&user),
    }))
}

/// `GET /user-status/{username}`: public, exposes the flag and nothing else.
pub async fn public_status(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<AcceptanceStatusResponse>, ApiError> {
    let Path(username) = path.map_err(|r| ApiError::unresolvable_path(r, "User not found"))?;

    let db = state.clone();
    let is_accepting_messages =
        blocking(move || inbox::public_acceptance_status(&db.db, &username)).await?;

    Ok(Json(AcceptanceStatusResponse {
        success: true,
        is_accepting_messages,
    }))
}
