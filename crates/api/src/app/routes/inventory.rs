use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use stockpile_core::RecordId;
use stockpile_infra::InventoryFacade;

use crate::app::{dto, errors};
use crate::context::RequestContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/:id", get(get_item).put(update_item).delete(delete_item))
}

pub async fn create_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<dto::BackendQuery>,
    Json(body): Json<dto::InventoryItemRequest>,
) -> axum::response::Response {
    let backend = match errors::parse_backend_flag(query.flag.as_deref()) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match facade
        .create_item(ctx.operation(), backend, body.into_draft())
        .await
    {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn list_items(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Extension(ctx): Extension<RequestContext>,
    Query(query): Query<dto::ListItemsQuery>,
) -> axum::response::Response {
    let backend = match errors::parse_backend_flag(query.flag.as_deref()) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match facade
        .get_items(
            ctx.operation(),
            backend,
            query.page(),
            query.page_size(),
            query.vendors(),
        )
        .await
    {
        Ok(page) => Json(dto::ListItemsResponse::from(page)).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::BackendQuery>,
) -> axum::response::Response {
    let backend = match errors::parse_backend_flag(query.flag.as_deref()) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match facade
        .get_item_by_id(ctx.operation(), backend, &RecordId::new(id))
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn update_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::BackendQuery>,
    Json(body): Json<dto::InventoryItemRequest>,
) -> axum::response::Response {
    let backend = match errors::parse_backend_flag(query.flag.as_deref()) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match facade
        .update_item(ctx.operation(), backend, &RecordId::new(id), body.into_draft())
        .await
    {
        Ok(record) => Json(record).into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(facade): Extension<Arc<InventoryFacade>>,
    Extension(ctx): Extension<RequestContext>,
    Path(id): Path<String>,
    Query(query): Query<dto::BackendQuery>,
) -> axum::response::Response {
    let backend = match errors::parse_backend_flag(query.flag.as_deref()) {
        Ok(b) => b,
        Err(res) => return res,
    };

    match facade
        .delete_item(ctx.operation(), backend, &RecordId::new(id))
        .await
    {
        Ok(()) => Json(dto::MessageResponse {
            message: "Item deleted successfully",
        })
        .into_response(),
        Err(e) => errors::inventory_error_to_response(e),
    }
}
