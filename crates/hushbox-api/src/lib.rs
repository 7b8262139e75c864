pub mod acceptance;
pub mod auth;
pub mod error;
pub mod inbox;
pub mod messages;
pub mod middleware;

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tracing::error;

use crate::auth::AppState;
use crate::error::ApiError;
use crate::middleware::require_auth;

/// All HTTP routes, mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/send-messages", post(messages::send_message))
        .route("/user-status/{username}", get(acceptance::public_status));

    let protected_routes = Router::new()
        .route(
            "/accept-messages",
            get(acceptance::get_status).post(acceptance::set_status),
        )
        .route("/get-messages", get(messages::get_messages))
        .route("/delete-message/{message_id}", delete(messages::delete_message))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .with_state(state)
}

/// Run blocking store work off the async runtime.
pub(crate) async fn blocking<F, T, E>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => {
            error!("spawn_blocking join error: {}", e);
            Err(ApiError::Internal)
        }
    }
}
