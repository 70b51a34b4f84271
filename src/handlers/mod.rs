pub mod api;
pub mod webhooks;

use axum::Router;

use crate::db::AppState;

/// Every route the server exposes, without middleware layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(api::router())
        .merge(webhooks::router())
}
