use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, Json};

use stockpile_infra::InventoryFacade;

/// Liveness plus the backends this process can serve.
pub async fn health(Extension(facade): Extension<Arc<InventoryFacade>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "backends": facade
            .available_backends()
            .iter()
            .map(|b| b.as_str())
            .collect::<Vec<_>>(),
    }))
}
