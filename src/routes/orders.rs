use axum::{
    extract::{Multipart, Path, State, multipart::Field, multipart::MultipartRejection},
    response::IntoResponse,
};
use serde_json::Value;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use crate::{
    core::{
        app_error::{AppError, StdResponse},
        app_state::AppState,
    },
    engine::{
        LineItemInput, PaymentDetailsInput, PlaceOrder, parse_id,
        views::{OrderRes, PublicOrderRes},
    },
    media::StoredFile,
};

/// Public, unauthenticated order routes used by storefronts.
pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(create_order))
            .routes(utoipa_axum::routes!(get_order)),
    )
}

/// Multipart body accepted by `POST /orders`.
#[allow(dead_code)]
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
struct CreateOrderForm {
    order_name: String,
    /// JSON array of `{"productId": "...", "quantity": 1}`.
    products: String,
    address: String,
    phone_primary: String,
    phone_secondary: Option<String>,
    /// `COD` or `Prepaid`.
    payment_type: String,
    site_owner: String,
    /// JSON object with `paymentPlatform`, `paymentPlatformUserName`,
    /// `accountId` and optionally `internalNote`. Required for Prepaid.
    payment_details: Option<String>,
    /// Transfer proof images. Required for Prepaid.
    #[schema(value_type = Vec<String>, format = Binary)]
    payment_screenshot: Vec<Vec<u8>>,
}

/// Place an order against a store.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body(content = CreateOrderForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Order created", body = StdResponse<OrderRes, String>),
        (status = 400, description = "Invalid order", body = StdResponse<String, String>),
        (status = 404, description = "Store, product or payment account not found", body = StdResponse<String, String>)
    )
)]
async fn create_order(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, AppError> {
    let mut multipart = multipart?;
    let mut request = PlaceOrder::default();
    let mut screenshots = Vec::new();

    if let Err(err) = read_order_form(&state, &mut multipart, &mut request, &mut screenshots).await
    {
        state.media.discard(&screenshots).await;
        return Err(err);
    }

    let order = state.orders().place_order(request, screenshots).await?;

    Ok(StdResponse::created(
        OrderRes::from(order),
        "Order created successfully",
    ))
}

async fn read_order_form(
    state: &AppState,
    multipart: &mut Multipart,
    request: &mut PlaceOrder,
    screenshots: &mut Vec<StoredFile>,
) -> Result<(), AppError> {
    while let Some(field) = multipart.next_field().await.map_err(|err| {
        AppError::BadRequest(format!("Invalid multipart body: {}", err.body_text()))
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "paymentScreenshot" {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await.map_err(|err| {
                AppError::BadRequest(format!("Failed to read upload: {}", err.body_text()))
            })?;
            if bytes.is_empty() {
                continue;
            }
            screenshots.push(state.media.store(file_name.as_deref(), &bytes).await?);
            continue;
        }

        let value = field_text(field).await?;
        match name.as_str() {
            "orderName" => request.order_name = Some(value),
            "products" => request.products = parse_line_items(&value),
            "address" => request.address = Some(value),
            "phonePrimary" => request.phone_primary = Some(value),
            "phoneSecondary" => request.phone_secondary = Some(value),
            "paymentType" => request.payment_type = Some(value),
            "siteOwner" => request.site_owner = Some(value),
            "paymentDetails" => {
                request.payment_details = serde_json::from_str::<PaymentDetailsInput>(&value).ok()
            }
            other => {
                if let Some(key) = other
                    .strip_prefix("paymentDetails[")
                    .and_then(|rest| rest.strip_suffix(']'))
                {
                    set_payment_detail(request.payment_details.get_or_insert_default(), key, value);
                }
            }
        }
    }

    Ok(())
}

async fn field_text(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|err| AppError::BadRequest(format!("Invalid form field: {}", err.body_text())))
}

/// Reads the `products` field. Anything that is not a JSON array yields no
/// line items; entries with unusable values are kept so validation can
/// reject them.
fn parse_line_items(raw: &str) -> Vec<LineItemInput> {
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(raw) else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| LineItemInput {
            product_id: item
                .get("productId")
                .and_then(Value::as_str)
                .map(str::to_string),
            quantity: item.get("quantity").and_then(|q| match q {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }),
        })
        .collect()
}

fn set_payment_detail(details: &mut PaymentDetailsInput, key: &str, value: String) {
    match key {
        "paymentPlatform" => details.payment_platform = Some(value),
        "paymentPlatformUserName" => details.payment_platform_user_name = Some(value),
        "accountId" => details.account_id = Some(value),
        "internalNote" => details.internal_note = Some(value),
        _ => {}
    }
}

/// Look up an order's status without signing in.
#[utoipa::path(
    get,
    path = "/{id}",
    tags = ["Orders"],
    params(
        ("id" = String, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Get order successfully", body = StdResponse<PublicOrderRes, String>),
        (status = 400, description = "Malformed order ID", body = StdResponse<String, String>),
        (status = 404, description = "Order not found", body = StdResponse<String, String>)
    )
)]
async fn get_order(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let order_id = parse_id(&id)?;
    let order = state.orders().get_public_order(order_id).await?;

    Ok(StdResponse::ok(order, "Get order successfully"))
}
