use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{
    OrderEngine,
    domain::{LineItem, NewOrder, Order, PaymentDetails, PaymentMethod, PaymentType},
    parse_id,
};
use crate::{
    core::app_error::AppError,
    media::{FileCheck, StoredFile},
};

/// A line item exactly as the customer sent it.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemInput {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsInput {
    pub payment_platform: Option<String>,
    pub payment_platform_user_name: Option<String>,
    pub account_id: Option<String>,
    pub internal_note: Option<String>,
}

/// Unvalidated order placement request.
#[derive(Debug, Default, Clone)]
pub struct PlaceOrder {
    pub order_name: Option<String>,
    pub products: Vec<LineItemInput>,
    pub address: Option<String>,
    pub phone_primary: Option<String>,
    pub phone_secondary: Option<String>,
    pub payment_type: Option<String>,
    pub site_owner: Option<String>,
    pub payment_details: Option<PaymentDetailsInput>,
}

/// Present and not just whitespace.
fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn verify_line_items(items: &[LineItemInput]) -> Result<Vec<LineItem>, AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest(
            "At least one product is required.".into(),
        ));
    }

    items
        .iter()
        .map(|item| {
            let product_id = item
                .product_id
                .as_deref()
                .and_then(|id| Uuid::parse_str(id.trim()).ok());
            let quantity = item
                .quantity
                .filter(|q| *q > 0)
                .and_then(|q| i32::try_from(q).ok());

            match (product_id, quantity) {
                (Some(product_id), Some(quantity)) => Ok(LineItem {
                    product_id,
                    quantity,
                }),
                _ => Err(AppError::BadRequest("Invalid product or quantity.".into())),
            }
        })
        .collect()
}

impl OrderEngine<'_> {
    /// Validates and persists a customer order. `screenshots` are files the
    /// upload layer already wrote for this request; they are removed again
    /// whenever the order is rejected or does not need them.
    pub async fn place_order(
        &self,
        request: PlaceOrder,
        screenshots: Vec<StoredFile>,
    ) -> Result<Order, AppError> {
        match self.try_place_order(request, &screenshots).await {
            Ok(order) => {
                if order.payment == PaymentMethod::Cod && !screenshots.is_empty() {
                    self.media.discard(&screenshots).await;
                }
                Ok(order)
            }
            Err(err) => {
                if !screenshots.is_empty() {
                    warn!(
                        files = screenshots.len(),
                        "Order rejected, removing uploaded files: {}", err
                    );
                    self.media.discard(&screenshots).await;
                }
                Err(err)
            }
        }
    }

    async fn try_place_order(
        &self,
        request: PlaceOrder,
        screenshots: &[StoredFile],
    ) -> Result<Order, AppError> {
        let line_items = verify_line_items(&request.products)?;

        let (Some(address), Some(phone_primary), Some(payment_type), Some(site_owner), Some(order_name)) = (
            filled(request.address),
            filled(request.phone_primary),
            filled(request.payment_type),
            filled(request.site_owner),
            filled(request.order_name),
        ) else {
            return Err(AppError::BadRequest("Missing required fields.".into()));
        };
        let site_owner = parse_id(&site_owner)?;
        let payment_type = payment_type.trim();

        let landing = self
            .store
            .find_landing_by_owner(site_owner)
            .await?
            .ok_or_else(|| AppError::NotFound("Store landing not found.".into()))?;

        let payment_type = payment_type
            .parse::<PaymentType>()
            .ok()
            .filter(|accepted| landing.accepts(*accepted))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "This store does not accept {} payments.",
                    payment_type
                ))
            })?;

        let mut total_amount = 0.0;
        for item in &line_items {
            let product = self
                .store
                .find_product(item.product_id)
                .await?
                // Another store's product is as unknown as a missing one.
                .filter(|product| product.owner_id == site_owner)
                .ok_or_else(|| {
                    AppError::NotFound(format!("Product not found: {}", item.product_id))
                })?;
            total_amount += product.effective_price() * f64::from(item.quantity);
        }

        let payment = match payment_type {
            PaymentType::Cod => PaymentMethod::Cod,
            PaymentType::Prepaid => {
                PaymentMethod::Prepaid(
                    self.verify_prepayment(site_owner, request.payment_details, screenshots)
                        .await?,
                )
            }
        };

        let payment_screenshots = match payment {
            PaymentMethod::Cod => Vec::new(),
            PaymentMethod::Prepaid(_) => screenshots.iter().map(|file| file.url.clone()).collect(),
        };

        let order = self
            .store
            .insert_order(NewOrder {
                order_name,
                products: line_items,
                total_amount,
                payment,
                payment_screenshots,
                phone_primary,
                phone_secondary: request.phone_secondary.unwrap_or_default(),
                address,
                site_owner,
            })
            .await?;

        info!(
            order_id = %order.id,
            site_owner = %order.site_owner,
            payment_type = %order.payment.payment_type(),
            total_amount = order.total_amount,
            "Order placed"
        );
        Ok(order)
    }

    async fn verify_prepayment(
        &self,
        site_owner: Uuid,
        details: Option<PaymentDetailsInput>,
        screenshots: &[StoredFile],
    ) -> Result<PaymentDetails, AppError> {
        if screenshots.is_empty() {
            return Err(AppError::BadRequest(
                "Transaction screenshot is required.".into(),
            ));
        }

        for file in screenshots {
            if let FileCheck::Invalid { reason } = self.media.validate(&file.path).await {
                return Err(AppError::BadRequest(reason));
            }
        }

        let details = details.unwrap_or_default();
        let (Some(payment_platform), Some(payment_platform_user_name), Some(account_id)) = (
            filled(details.payment_platform),
            filled(details.payment_platform_user_name),
            filled(details.account_id),
        ) else {
            return Err(AppError::BadRequest(
                "All payment details are required.".into(),
            ));
        };

        let account_id = parse_id(&account_id)?;
        // Customers can only pay into an account of the store they order from.
        self.store
            .find_payment_account(account_id)
            .await?
            .filter(|account| account.owner_id == site_owner)
            .ok_or_else(|| AppError::NotFound("Payment account not found.".into()))?;

        Ok(PaymentDetails {
            payment_platform,
            payment_platform_user_name,
            account_id,
            internal_note: filled(details.internal_note),
        })
    }
}
