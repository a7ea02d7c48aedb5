//! Persistence seams consumed by the order engine.
//!
//! The catalog, storefront configuration and payment account directory are
//! owned by other parts of the platform; this service only reads them, with
//! the exception of the stock counter decremented on fulfillment.

pub mod memory;
pub mod pg;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::engine::domain::{NewOrder, Order, OrderCode, PaymentType, ProgressChange};

pub use memory::MemoryStore;
pub use pg::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Conflict(String),

    /// The order reached `done` before this change could be applied.
    #[error("Completed orders cannot be modified.")]
    OrderDone,

    #[error("Not enough stock for {product_name}")]
    InsufficientStock { product_name: String },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub price: f64,
    pub discount_price: Option<f64>,
    pub stock_count: i32,
    pub images: Vec<String>,
}

impl Product {
    /// Unit price after a positive discount, never below zero.
    pub fn effective_price(&self) -> f64 {
        let discount = self.discount_price.filter(|d| *d > 0.0).unwrap_or(0.0);
        (self.price - discount).max(0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Landing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub store_name: String,
    pub accept_payment_types: Vec<PaymentType>,
}

impl Landing {
    pub fn accepts(&self, payment_type: PaymentType) -> bool {
        self.accept_payment_types.contains(&payment_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAccount {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub platform: String,
    pub platform_user_name: String,
    pub account_number: String,
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>>;

    async fn find_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>>;
}

#[async_trait]
pub trait StorefrontStore: Send + Sync {
    async fn find_landing_by_owner(&self, owner_id: Uuid) -> StoreResult<Option<Landing>>;
}

#[async_trait]
pub trait PaymentDirectory: Send + Sync {
    async fn find_payment_account(&self, id: Uuid) -> StoreResult<Option<PaymentAccount>>;

    async fn find_payment_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<PaymentAccount>>;
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order>;

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>>;

    async fn find_order_by_code(&self, code: &OrderCode) -> StoreResult<Option<Order>>;

    /// Orders placed against `site_owner`, newest first.
    async fn find_orders_by_owner(&self, site_owner: Uuid) -> StoreResult<Vec<Order>>;

    /// Applies a progress transition atomically: either every stock
    /// decrement, the code assignment and the progress update land, or
    /// nothing changes. Products that no longer exist are skipped. Fails with
    /// [`StoreError::OrderDone`] if the order is already done.
    async fn apply_progress(&self, id: Uuid, change: &ProgressChange) -> StoreResult<Order>;

    /// Returns `false` when no such order existed. Done orders are kept and
    /// reported as [`StoreError::OrderDone`].
    async fn delete_order(&self, id: Uuid) -> StoreResult<bool>;
}

/// Every collaborator the order engine talks to.
pub trait Store: CatalogStore + StorefrontStore + PaymentDirectory + OrderStore {}

impl<T> Store for T where T: CatalogStore + StorefrontStore + PaymentDirectory + OrderStore {}
