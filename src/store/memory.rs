use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    CatalogStore, Landing, OrderStore, PaymentAccount, PaymentDirectory, Product, StoreError,
    StoreResult, StorefrontStore,
};
use crate::engine::domain::{NewOrder, Order, OrderCode, Progress, ProgressChange};

/// In-process store used by tests and local demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<Uuid, Product>,
    landings: HashMap<Uuid, Landing>,
    accounts: HashMap<Uuid, PaymentAccount>,
    orders: HashMap<Uuid, (u64, Order)>,
    next_seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_product(&self, product: Product) {
        self.inner.write().await.products.insert(product.id, product);
    }

    /// Landings are keyed by owner, one per store.
    pub async fn put_landing(&self, landing: Landing) {
        self.inner
            .write()
            .await
            .landings
            .insert(landing.owner_id, landing);
    }

    pub async fn put_payment_account(&self, account: PaymentAccount) {
        self.inner.write().await.accounts.insert(account.id, account);
    }

    pub async fn remove_product(&self, id: Uuid) {
        self.inner.write().await.products.remove(&id);
    }

    pub async fn product(&self, id: Uuid) -> Option<Product> {
        self.inner.read().await.products.get(&id).cloned()
    }

    pub async fn order_count(&self) -> usize {
        self.inner.read().await.orders.len()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        Ok(self.inner.read().await.products.get(&id).cloned())
    }

    async fn find_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.products.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl StorefrontStore for MemoryStore {
    async fn find_landing_by_owner(&self, owner_id: Uuid) -> StoreResult<Option<Landing>> {
        Ok(self.inner.read().await.landings.get(&owner_id).cloned())
    }
}

#[async_trait]
impl PaymentDirectory for MemoryStore {
    async fn find_payment_account(&self, id: Uuid) -> StoreResult<Option<PaymentAccount>> {
        Ok(self.inner.read().await.accounts.get(&id).cloned())
    }

    async fn find_payment_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<PaymentAccount>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.accounts.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let created = Order {
            id: Uuid::new_v4(),
            order_code: None,
            order_name: order.order_name,
            products: order.products,
            total_amount: order.total_amount,
            payment: order.payment,
            payment_screenshots: order.payment_screenshots,
            transaction_screenshot: None,
            progress: Progress::Pending,
            reason: None,
            phone_primary: order.phone_primary,
            phone_secondary: order.phone_secondary,
            address: order.address,
            site_owner: order.site_owner,
            created_at: now,
            updated_at: now,
        };

        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.orders.insert(created.id, (seq, created.clone()));
        Ok(created)
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .get(&id)
            .map(|(_, order)| order.clone()))
    }

    async fn find_order_by_code(&self, code: &OrderCode) -> StoreResult<Option<Order>> {
        Ok(self
            .inner
            .read()
            .await
            .orders
            .values()
            .find(|(_, order)| order.order_code.as_ref() == Some(code))
            .map(|(_, order)| order.clone()))
    }

    async fn find_orders_by_owner(&self, site_owner: Uuid) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut owned: Vec<&(u64, Order)> = inner
            .orders
            .values()
            .filter(|(_, order)| order.site_owner == site_owner)
            .collect();
        owned.sort_by(|(a_seq, a), (b_seq, b)| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b_seq.cmp(a_seq))
        });
        Ok(owned.into_iter().map(|(_, order)| order.clone()).collect())
    }

    async fn apply_progress(&self, id: Uuid, change: &ProgressChange) -> StoreResult<Order> {
        let mut inner = self.inner.write().await;

        match inner.orders.get(&id) {
            None => return Err(anyhow::anyhow!("Order {} vanished during update", id).into()),
            Some((_, order)) if order.progress == Progress::Done => {
                return Err(StoreError::OrderDone);
            }
            Some(_) => {}
        }

        if let Some(code) = &change.assign_code {
            let taken = inner
                .orders
                .values()
                .any(|(_, other)| other.id != id && other.order_code.as_ref() == Some(code));
            if taken {
                return Err(StoreError::Conflict(format!(
                    "Order code {} is already in use.",
                    code
                )));
            }
        }

        // Check every line before touching any stock. Repeated products are
        // checked against their combined quantity.
        let mut requested: HashMap<Uuid, i64> = HashMap::new();
        for item in &change.deduct_stock {
            let wanted = requested.entry(item.product_id).or_default();
            *wanted += i64::from(item.quantity);
            if let Some(product) = inner.products.get(&item.product_id) {
                if i64::from(product.stock_count) < *wanted {
                    return Err(StoreError::InsufficientStock {
                        product_name: product.name.clone(),
                    });
                }
            }
        }
        for item in &change.deduct_stock {
            if let Some(product) = inner.products.get_mut(&item.product_id) {
                product.stock_count -= item.quantity;
            }
        }

        let (_, order) = inner
            .orders
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("Order {} vanished during update", id))?;
        order.progress = change.progress;
        if let Some(code) = &change.assign_code {
            order.order_code = Some(code.clone());
        }
        if let Some(reason) = &change.reason {
            order.reason = Some(reason.clone());
        }
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.orders.get(&id) {
            None => Ok(false),
            Some((_, order)) if order.progress == Progress::Done => Err(StoreError::OrderDone),
            Some(_) => Ok(inner.orders.remove(&id).is_some()),
        }
    }
}
