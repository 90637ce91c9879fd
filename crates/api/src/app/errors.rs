use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockpile_core::Backend;
use stockpile_infra::InventoryError;

pub fn inventory_error_to_response(err: InventoryError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        InventoryError::InvalidBackend(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_backend", message)
        }
        InventoryError::InvalidPagination(_) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_pagination", message)
        }
        InventoryError::InvalidIdentifier { .. } => {
            json_error(StatusCode::BAD_REQUEST, "invalid_id", message)
        }
        InventoryError::Validation(_) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", message)
        }
        InventoryError::NotFound(_) => json_error(StatusCode::NOT_FOUND, "not_found", message),
        InventoryError::PageOutOfRange { .. } => {
            json_error(StatusCode::NOT_FOUND, "page_out_of_range", message)
        }
        InventoryError::StoreUnavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
        }
        // Driver detail stays in the logs.
        InventoryError::Persistence { operation, .. } => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            format!("{operation} failed"),
        ),
        InventoryError::Timeout => json_error(StatusCode::GATEWAY_TIMEOUT, "timeout", message),
        InventoryError::Cancelled => {
            json_error(StatusCode::REQUEST_TIMEOUT, "cancelled", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Resolve the `flag` query parameter into a backend or a 400 response.
pub fn parse_backend_flag(flag: Option<&str>) -> Result<Backend, axum::response::Response> {
    Backend::from_flag(flag).map_err(|err| inventory_error_to_response(err.into()))
}
