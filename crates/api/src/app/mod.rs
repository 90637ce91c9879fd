//! HTTP API application wiring (Axum router + shared state).
//!
//! - `routes/`: HTTP routes + handlers
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Extension, Router};
use tower::ServiceBuilder;

use stockpile_infra::InventoryFacade;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// `default_timeout` bounds every request that does not send its own
/// deadline header.
pub fn build_app(facade: Arc<InventoryFacade>, default_timeout: Duration) -> Router {
    let deadline_state = middleware::DeadlineState { default_timeout };

    let inventory = routes::router().layer(axum::middleware::from_fn_with_state(
        deadline_state,
        middleware::deadline_middleware,
    ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(inventory)
        .layer(ServiceBuilder::new().layer(Extension(facade)))
}
