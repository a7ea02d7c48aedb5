use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{AsChangeset, Identifiable, Insertable, Queryable},
};
use uuid::Uuid;

use crate::{
    engine::domain::{LineItem, Order, OrderCode, PaymentDetails, PaymentMethod, PaymentType},
    store::{Landing, PaymentAccount, Product},
};

// Catalog

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub stock_count: i32,
    pub images: Vec<String>,
}

impl From<ProductEntity> for Product {
    fn from(entity: ProductEntity) -> Self {
        Product {
            id: entity.id,
            owner_id: entity.owner_id,
            name: entity.name,
            price: entity.price,
            discount_price: entity.discount_price,
            stock_count: entity.stock_count,
            images: entity.images,
        }
    }
}

// Storefront

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::landings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LandingEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub store_name: String,
    pub accept_payment_types: Vec<String>,
}

impl From<LandingEntity> for Landing {
    fn from(entity: LandingEntity) -> Self {
        let accept_payment_types = entity
            .accept_payment_types
            .iter()
            .filter_map(|raw| raw.parse::<PaymentType>().ok())
            .collect();

        Landing {
            id: entity.id,
            owner_id: entity.owner_id,
            store_name: entity.store_name,
            accept_payment_types,
        }
    }
}

// Payment accounts

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::payment_accounts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PaymentAccountEntity {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub platform: String,
    pub platform_user_name: String,
    pub account_number: String,
}

impl From<PaymentAccountEntity> for PaymentAccount {
    fn from(entity: PaymentAccountEntity) -> Self {
        PaymentAccount {
            id: entity.id,
            owner_id: entity.owner_id,
            platform: entity.platform,
            platform_user_name: entity.platform_user_name,
            account_number: entity.account_number,
        }
    }
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderEntity {
    pub id: Uuid,
    pub order_code: Option<String>,
    pub order_name: String,
    pub total_amount: f64,
    pub progress: String,
    pub reason: Option<String>,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub payment_type: String,
    pub payment_platform: Option<String>,
    pub payment_platform_user_name: Option<String>,
    pub payment_account_id: Option<Uuid>,
    pub payment_internal_note: Option<String>,
    pub payment_screenshots: Vec<String>,
    pub transaction_screenshot: Option<String>,
    pub site_owner: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CreateOrderEntity {
    pub order_name: String,
    pub total_amount: f64,
    pub progress: String,
    pub phone_primary: String,
    pub phone_secondary: String,
    pub address: String,
    pub payment_type: String,
    pub payment_platform: Option<String>,
    pub payment_platform_user_name: Option<String>,
    pub payment_account_id: Option<Uuid>,
    pub payment_internal_note: Option<String>,
    pub payment_screenshots: Vec<String>,
    pub site_owner: Uuid,
}

/// Columns touched by a progress transition. `None` leaves a column as is.
#[derive(AsChangeset, Debug)]
#[diesel(table_name = crate::schema::orders)]
pub struct UpdateOrderProgressEntity {
    pub progress: String,
    pub order_code: Option<String>,
    pub reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::order_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemEntity {
    pub order_id: Uuid,
    pub line_no: i32,
    pub product_id: Uuid,
    pub quantity: i32,
}

impl OrderEntity {
    /// Rebuilds the domain order from its row and its line items, which must
    /// already be sorted by `line_no`.
    pub fn into_order(self, items: Vec<OrderItemEntity>) -> anyhow::Result<Order> {
        let progress = self
            .progress
            .parse()
            .with_context(|| format!("Order {} has an unknown progress", self.id))?;
        let payment_type: PaymentType = self
            .payment_type
            .parse()
            .with_context(|| format!("Order {} has an unknown payment type", self.id))?;

        let payment = match payment_type {
            PaymentType::Cod => PaymentMethod::Cod,
            PaymentType::Prepaid => PaymentMethod::Prepaid(PaymentDetails {
                payment_platform: self.payment_platform.unwrap_or_default(),
                payment_platform_user_name: self.payment_platform_user_name.unwrap_or_default(),
                account_id: self.payment_account_id.ok_or_else(|| {
                    anyhow!("Prepaid order {} has no payment account", self.id)
                })?,
                internal_note: self.payment_internal_note,
            }),
        };

        let order_code = self
            .order_code
            .map(|code| OrderCode::parse(&code))
            .transpose()
            .with_context(|| format!("Order {} has a malformed order code", self.id))?;

        Ok(Order {
            id: self.id,
            order_code,
            order_name: self.order_name,
            products: items
                .into_iter()
                .map(|item| LineItem {
                    product_id: item.product_id,
                    quantity: item.quantity,
                })
                .collect(),
            total_amount: self.total_amount,
            payment,
            payment_screenshots: self.payment_screenshots,
            transaction_screenshot: self.transaction_screenshot,
            progress,
            reason: self.reason,
            phone_primary: self.phone_primary,
            phone_secondary: self.phone_secondary,
            address: self.address,
            site_owner: self.site_owner,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}
