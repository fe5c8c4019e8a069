//! The public API surface: `POST /store`, `GET /retrieve`,
//! `DELETE /remove`, `GET /ping`, wired with axum and a
//! `tower_http::trace::TraceLayer`.

mod auth;
mod error;
mod handlers;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::node::Node;

pub fn router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/store", post(handlers::store_handler))
        .route("/retrieve", get(handlers::retrieve_handler))
        .route("/remove", delete(handlers::remove_handler))
        .route("/ping", get(handlers::ping_handler))
        .with_state(node)
        .layer(TraceLayer::new_for_http())
}
