//! JSON shapes returned by the order endpoints.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::domain::{LineItem, Order, PaymentType, Progress};
use crate::store::{PaymentAccount, Product};

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LineItemRes {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Payment details as stored. Serialized as `{}` for cash-on-delivery orders.
#[derive(Serialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsRes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_platform_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_note: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderRes {
    pub id: Uuid,
    pub order_code: Option<String>,
    pub order_name: String,
    pub products: Vec<LineItemRes>,
    pub total_amount: f64,
    pub payment_type: PaymentType,
    pub payment_details: PaymentDetailsRes,
    pub payment_screenshot: Vec<String>,
    /// Single proof image stored by older orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_screenshot: Option<String>,
    pub progress: Progress,
    pub reason: Option<String>,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub site_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderRes {
    fn from(order: Order) -> Self {
        let payment_type = order.payment.payment_type();
        let payment_details = order
            .payment
            .details()
            .map(|details| PaymentDetailsRes {
                payment_platform: Some(details.payment_platform.clone()),
                payment_platform_user_name: Some(details.payment_platform_user_name.clone()),
                account_id: Some(details.account_id),
                internal_note: details.internal_note.clone(),
            })
            .unwrap_or_default();

        OrderRes {
            id: order.id,
            order_code: order.order_code.map(|code| code.into_string()),
            order_name: order.order_name,
            products: order
                .products
                .into_iter()
                .map(|item| LineItemRes {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            total_amount: order.total_amount,
            payment_type,
            payment_details,
            payment_screenshot: order.payment_screenshots,
            transaction_screenshot: order.transaction_screenshot,
            progress: order.progress,
            reason: order.reason,
            phone_primary: order.phone_primary,
            phone_secondary: order.phone_secondary,
            address: order.address,
            site_owner: order.site_owner,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// Owner listing

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProductRes {
    pub name: String,
    pub price: f64,
    pub discount_price: Option<f64>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerLineItemRes {
    pub product_id: Uuid,
    pub quantity: i32,
    /// `None` when the product has since been removed from the catalog.
    pub product: Option<OwnerProductRes>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAccountRes {
    pub id: Uuid,
    pub platform: String,
    pub platform_user_name: String,
    pub account_number: String,
}

#[derive(Serialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerPaymentDetailsRes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_platform: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_platform_user_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<PaymentAccountRes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_note: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OwnerOrderRes {
    pub id: Uuid,
    pub order_code: Option<String>,
    pub order_name: String,
    pub products: Vec<OwnerLineItemRes>,
    pub total_amount: f64,
    pub payment_type: PaymentType,
    pub payment_details: OwnerPaymentDetailsRes,
    pub payment_screenshot: Vec<String>,
    /// Single proof image stored by older orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_screenshot: Option<String>,
    pub progress: Progress,
    pub reason: Option<String>,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub site_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OwnerOrderRes {
    pub fn resolve(
        order: Order,
        products: &HashMap<Uuid, Product>,
        accounts: &HashMap<Uuid, PaymentAccount>,
    ) -> Self {
        let payment_type = order.payment.payment_type();
        let payment_details = order
            .payment
            .details()
            .map(|details| OwnerPaymentDetailsRes {
                payment_platform: Some(details.payment_platform.clone()),
                payment_platform_user_name: Some(details.payment_platform_user_name.clone()),
                account_id: Some(details.account_id),
                account: accounts
                    .get(&details.account_id)
                    .map(|account| PaymentAccountRes {
                        id: account.id,
                        platform: account.platform.clone(),
                        platform_user_name: account.platform_user_name.clone(),
                        account_number: account.account_number.clone(),
                    }),
                internal_note: details.internal_note.clone(),
            })
            .unwrap_or_default();

        OwnerOrderRes {
            id: order.id,
            order_code: order.order_code.map(|code| code.into_string()),
            order_name: order.order_name,
            products: order
                .products
                .iter()
                .map(|item| OwnerLineItemRes {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    product: products.get(&item.product_id).map(|p| OwnerProductRes {
                        name: p.name.clone(),
                        price: p.price,
                        discount_price: p.discount_price,
                    }),
                })
                .collect(),
            total_amount: order.total_amount,
            payment_type,
            payment_details,
            payment_screenshot: order.payment_screenshots,
            transaction_screenshot: order.transaction_screenshot,
            progress: order.progress,
            reason: order.reason,
            phone_primary: order.phone_primary,
            phone_secondary: order.phone_secondary,
            address: order.address,
            site_owner: order.site_owner,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

// Public lookup

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicProductRes {
    pub name: String,
    pub price: f64,
    pub image: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicLineItemRes {
    pub product_id: Uuid,
    pub quantity: i32,
    pub product: Option<PublicProductRes>,
}

/// Only the platform survives; payer identity and notes are withheld.
#[derive(Serialize, Debug, Default, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicPaymentDetailsRes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_platform: Option<String>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicOrderRes {
    pub id: Uuid,
    pub order_code: Option<String>,
    pub order_name: String,
    pub products: Vec<PublicLineItemRes>,
    pub total_amount: f64,
    pub payment_type: PaymentType,
    pub payment_details: PublicPaymentDetailsRes,
    pub payment_screenshot: Vec<String>,
    /// Single proof image stored by older orders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_screenshot: Option<String>,
    pub progress: Progress,
    pub reason: Option<String>,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub site_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PublicOrderRes {
    pub fn resolve(order: Order, products: &HashMap<Uuid, Product>) -> Self {
        let payment_type = order.payment.payment_type();
        let payment_details = PublicPaymentDetailsRes {
            payment_platform: order
                .payment
                .details()
                .map(|details| details.payment_platform.clone()),
        };

        PublicOrderRes {
            id: order.id,
            order_code: order.order_code.map(|code| code.into_string()),
            order_name: order.order_name,
            products: order
                .products
                .iter()
                .map(|item| public_line_item(item, products))
                .collect(),
            total_amount: order.total_amount,
            payment_type,
            payment_details,
            payment_screenshot: order.payment_screenshots,
            transaction_screenshot: order.transaction_screenshot,
            progress: order.progress,
            reason: order.reason,
            phone_primary: order.phone_primary,
            phone_secondary: order.phone_secondary,
            address: order.address,
            site_owner: order.site_owner,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

fn public_line_item(item: &LineItem, products: &HashMap<Uuid, Product>) -> PublicLineItemRes {
    PublicLineItemRes {
        product_id: item.product_id,
        quantity: item.quantity,
        product: products.get(&item.product_id).map(|p| PublicProductRes {
            name: p.name.clone(),
            price: p.price,
            image: p.images.first().cloned(),
        }),
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderCodeSuggestionRes {
    pub order_code: String,
}
