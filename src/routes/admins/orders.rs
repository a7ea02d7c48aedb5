use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    response::IntoResponse,
};
use utoipa_axum::router::OpenApiRouter;
use uuid::Uuid;

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
        middleware,
    },
    engine::{
        UpdateProgressReq, parse_id,
        views::{OrderCodeSuggestionRes, OrderRes, OwnerOrderRes},
    },
};

/// Order management for the store owner signed in with the bearer token.
pub fn routes_with_openapi(state: AppState) -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/admins/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(get_orders))
            .routes(utoipa_axum::routes!(suggest_order_code))
            .routes(utoipa_axum::routes!(update_order))
            .routes(utoipa_axum::routes!(delete_order))
            .route_layer(axum::middleware::from_fn_with_state(
                state,
                middleware::admins_authorization,
            )),
    )
}

/// Fetch every order placed against the caller's store, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "List orders", body = StdResponse<Vec<OwnerOrderRes>, String>),
        (status = 401, description = "Missing or invalid token", body = StdResponse<String, String>)
    )
)]
async fn get_orders(
    State(state): State<AppState>,
    Extension(admin_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let orders = state.orders().list_owner_orders(admin_id).await?;

    Ok(StdResponse::ok(orders, "Get orders successfully"))
}

/// Propose a random order code that no order currently holds.
#[utoipa::path(
    get,
    path = "/code-suggestion",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    responses(
        (status = 200, description = "Unused order code", body = StdResponse<OrderCodeSuggestionRes, String>)
    )
)]
async fn suggest_order_code(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let code = state.orders().suggest_order_code().await?;

    Ok(StdResponse::ok(
        OrderCodeSuggestionRes {
            order_code: code.into_string(),
        },
        "Order code suggested successfully",
    ))
}

/// Move an order to a new progress state.
///
/// `orderCode` is required for `accepted` and `done`, `reason` for `declined`.
/// Moving to `done` deducts stock for every line item.
#[utoipa::path(
    put,
    path = "/{id}",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "Order ID to update")
    ),
    request_body = UpdateProgressReq,
    responses(
        (status = 200, description = "Order updated", body = StdResponse<OrderRes, String>),
        (status = 400, description = "Invalid transition or insufficient stock", body = StdResponse<String, String>),
        (status = 403, description = "Order belongs to another store", body = StdResponse<String, String>),
        (status = 404, description = "Order not found", body = StdResponse<String, String>),
        (status = 409, description = "Order code already in use", body = StdResponse<String, String>)
    )
)]
async fn update_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(admin_id): Extension<Uuid>,
    payload: Result<Json<UpdateProgressReq>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&id)?;
    let Json(req) = payload?;
    let order = state
        .orders()
        .update_progress(admin_id, order_id, req)
        .await?;

    Ok(StdResponse::ok(
        OrderRes::from(order),
        "Order updated successfully",
    ))
}

/// Delete an order that is not yet done, together with its payment proof.
#[utoipa::path(
    delete,
    path = "/{id}",
    tags = ["Admin Orders"],
    security(("bearerAuth" = [])),
    params(
        ("id" = String, Path, description = "Order ID to delete")
    ),
    responses(
        (status = 200, description = "Order deleted", body = StdResponse<String, String>),
        (status = 400, description = "Order is done", body = StdResponse<String, String>),
        (status = 403, description = "Order belongs to another store", body = StdResponse<String, String>),
        (status = 404, description = "Order not found", body = StdResponse<String, String>)
    )
)]
async fn delete_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Extension(admin_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&id)?;
    state.orders().delete_order(admin_id, order_id).await?;

    Ok(StdResponse::<(), _>::empty("Order deleted successfully"))
}
