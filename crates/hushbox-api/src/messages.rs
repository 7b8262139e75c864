use axum::{
    Extension, Json,
    extract::{Path, State, rejection::{JsonRejection, PathRejection}},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::{debug, info};

use hushbox_types::api::{Claims, MessageView, MessagesResponse, SendMessageRequest, StatusResponse};

use crate::auth::AppState;
use crate::error::ApiError;
use crate::{blocking, inbox};

/// `GET /get-messages`: the caller's inbox, newest first. Read-only, so the
/// dashboard can call it as often as it likes to refresh.
pub async fn get_messages(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub;
    let messages = blocking(move || inbox::list_messages(&db.db, user_id)).await?;

    debug!("Listing {} messages for {}", messages.len(), claims.username);

    Ok(Json(MessagesResponse {
        success: true,
        messages: messages.iter().map(MessageView::from).collect(),
    }))
}

/// `DELETE /delete-message/{message_id}`: scoped to the caller's own inbox.
pub async fn delete_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    path: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(message_id) = path.map_err(|r| {
        ApiError::unresolvable_path(r, "Message not found or already deleted")
    })?;

    let db = state.clone();
    let user_id = claims.sub;
    let mid = message_id.clone();
    blocking(move || inbox::delete_message(&db.db, user_id, &mid)).await?;

    info!("User {} deleted message {}", claims.username, message_id);

    Ok(Json(StatusResponse::ok("Message deleted")))
}

/// `POST /send-messages`: public, unauthenticated.
pub async fn send_message(
    State(state): State<AppState>,
    payload: Result<Json<SendMessageRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;

    let db = state.clone();
    let recipient = req.username.clone().unwrap_or_default();
    blocking(move || {
        inbox::send_message(&db.db, req.username.as_deref(), req.content.as_deref())
    })
    .await?;

    info!("Delivered anonymous message to {}", recipient);

    Ok((
        StatusCode::CREATED,
        Json(StatusResponse::ok("Message sent successfully")),
    ))
}
