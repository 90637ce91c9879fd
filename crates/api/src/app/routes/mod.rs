use axum::Router;

pub mod inventory;
pub mod system;

/// Router for the inventory endpoints.
pub fn router() -> Router {
    Router::new().nest("/inventory", inventory::router())
}
