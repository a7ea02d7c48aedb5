//! Order lifecycle engine: placement, retrieval, progress transitions and
//! deletion. Owner operations take the caller's admin id explicitly.

pub mod domain;
pub mod placement;
pub mod progress;
pub mod views;


use std::collections::{BTreeSet, HashMap};

use tracing::info;
use uuid::Uuid;

use crate::{
    core::app_error::AppError,
    media::MediaGate,
    store::{Product, Store},
};
use domain::{Order, Progress};
use views::{OwnerOrderRes, PublicOrderRes};

pub use placement::{LineItemInput, PaymentDetailsInput, PlaceOrder};
pub use progress::UpdateProgressReq;

pub struct OrderEngine<'a> {
    store: &'a dyn Store,
    media: &'a MediaGate,
}

/// Parses a path or body id, rejecting malformed input as a bad request.
pub fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| AppError::BadRequest(format!("Invalid ID format: {}", raw)))
}

impl<'a> OrderEngine<'a> {
    pub fn new(store: &'a dyn Store, media: &'a MediaGate) -> Self {
        Self { store, media }
    }

    /// Loads an order the caller owns.
    async fn owned_order(&self, caller: Uuid, order_id: Uuid) -> Result<Order, AppError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found.".into()))?;

        if order.site_owner != caller {
            return Err(AppError::ForbiddenResource("Access denied.".into()));
        }
        Ok(order)
    }

    async fn products_by_id(
        &self,
        orders: &[Order],
    ) -> Result<HashMap<Uuid, Product>, AppError> {
        let ids: Vec<Uuid> = orders
            .iter()
            .flat_map(|order| order.products.iter().map(|item| item.product_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        Ok(self
            .store
            .find_products(&ids)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect())
    }

    /// Every order placed against the caller's store, newest first, with
    /// products and payment accounts resolved.
    pub async fn list_owner_orders(&self, caller: Uuid) -> Result<Vec<OwnerOrderRes>, AppError> {
        let orders = self.store.find_orders_by_owner(caller).await?;
        let products = self.products_by_id(&orders).await?;

        let account_ids: Vec<Uuid> = orders
            .iter()
            .filter_map(|order| order.payment.details().map(|details| details.account_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let accounts = if account_ids.is_empty() {
            HashMap::new()
        } else {
            self.store
                .find_payment_accounts(&account_ids)
                .await?
                .into_iter()
                .map(|account| (account.id, account))
                .collect()
        };

        Ok(orders
            .into_iter()
            .map(|order| OwnerOrderRes::resolve(order, &products, &accounts))
            .collect())
    }

    /// Unauthenticated status lookup by the opaque order id.
    pub async fn get_public_order(&self, order_id: Uuid) -> Result<PublicOrderRes, AppError> {
        let order = self
            .store
            .find_order(order_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found.".into()))?;

        let products = self.products_by_id(std::slice::from_ref(&order)).await?;
        Ok(PublicOrderRes::resolve(order, &products))
    }

    /// Removes the order's screenshot files, then the order itself.
    pub async fn delete_order(&self, caller: Uuid, order_id: Uuid) -> Result<(), AppError> {
        let order = self.owned_order(caller, order_id).await?;

        if order.progress == Progress::Done {
            return Err(AppError::ImmutableState(
                "Cannot delete completed orders.".into(),
            ));
        }

        if !self.store.delete_order(order.id).await? {
            return Err(AppError::NotFound("Order not found.".into()));
        }

        // Files go only after the record, so an order that became done keeps its proof.
        for url in order.screenshot_urls() {
            self.media.remove(url).await;
        }

        info!(order_id = %order.id, site_owner = %caller, "Order deleted");
        Ok(())
    }
}
