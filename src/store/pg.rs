use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use super::{
    CatalogStore, Landing, OrderStore, PaymentAccount, PaymentDirectory, Product, StoreError,
    StoreResult, StorefrontStore,
};
use crate::{
    core::db::DbPool,
    engine::domain::{NewOrder, Order, OrderCode, Progress, ProgressChange},
    models::{
        CreateOrderEntity, LandingEntity, OrderEntity, OrderItemEntity, PaymentAccountEntity,
        ProductEntity, UpdateOrderProgressEntity,
    },
    schema::{landings, order_items, orders, payment_accounts, products},
};

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                debug!("Unique violation: {}", info.message());
                StoreError::Conflict("Order code is already in use.".into())
            }
            other => StoreError::Backend(other.into()),
        }
    }
}

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn load_items(
    conn: &mut AsyncPgConnection,
    order_ids: Vec<Uuid>,
) -> anyhow::Result<HashMap<Uuid, Vec<OrderItemEntity>>> {
    let items: Vec<OrderItemEntity> = order_items::table
        .filter(order_items::order_id.eq_any(order_ids))
        .order_by((order_items::order_id, order_items::line_no))
        .select(OrderItemEntity::as_select())
        .get_results(conn)
        .await
        .context("Failed to get order items")?;

    let mut group: HashMap<Uuid, Vec<OrderItemEntity>> = HashMap::new();
    for item in items {
        group.entry(item.order_id).or_default().push(item);
    }
    Ok(group)
}

async fn hydrate(conn: &mut AsyncPgConnection, entity: OrderEntity) -> StoreResult<Order> {
    let mut group = load_items(conn, vec![entity.id]).await?;
    let items = group.remove(&entity.id).unwrap_or_default();
    Ok(entity.into_order(items)?)
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn find_product(&self, id: Uuid) -> StoreResult<Option<Product>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let product = products::table
            .find(id)
            .select(ProductEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get product")?;

        Ok(product.map(Product::from))
    }

    async fn find_products(&self, ids: &[Uuid]) -> StoreResult<Vec<Product>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let products: Vec<ProductEntity> = products::table
            .filter(products::id.eq_any(ids.to_vec()))
            .select(ProductEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get products")?;

        Ok(products.into_iter().map(Product::from).collect())
    }
}

#[async_trait]
impl StorefrontStore for PgStore {
    async fn find_landing_by_owner(&self, owner_id: Uuid) -> StoreResult<Option<Landing>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let landing = landings::table
            .filter(landings::owner_id.eq(owner_id))
            .select(LandingEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get store landing")?;

        Ok(landing.map(Landing::from))
    }
}

#[async_trait]
impl PaymentDirectory for PgStore {
    async fn find_payment_account(&self, id: Uuid) -> StoreResult<Option<PaymentAccount>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let account = payment_accounts::table
            .find(id)
            .select(PaymentAccountEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get payment account")?;

        Ok(account.map(PaymentAccount::from))
    }

    async fn find_payment_accounts(&self, ids: &[Uuid]) -> StoreResult<Vec<PaymentAccount>> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let accounts: Vec<PaymentAccountEntity> = payment_accounts::table
            .filter(payment_accounts::id.eq_any(ids.to_vec()))
            .select(PaymentAccountEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get payment accounts")?;

        Ok(accounts.into_iter().map(PaymentAccount::from).collect())
    }
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: NewOrder) -> StoreResult<Order> {
        let mut pooled = self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let details = order.payment.details().cloned();
        let values = CreateOrderEntity {
            order_name: order.order_name,
            total_amount: order.total_amount,
            progress: Progress::Pending.as_str().into(),
            phone_primary: order.phone_primary,
            phone_secondary: order.phone_secondary,
            address: order.address,
            payment_type: order.payment.payment_type().as_str().into(),
            payment_platform: details.as_ref().map(|d| d.payment_platform.clone()),
            payment_platform_user_name: details
                .as_ref()
                .map(|d| d.payment_platform_user_name.clone()),
            payment_account_id: details.as_ref().map(|d| d.account_id),
            payment_internal_note: details.and_then(|d| d.internal_note),
            payment_screenshots: order.payment_screenshots,
            site_owner: order.site_owner,
        };
        let line_items = order.products;

        let (entity, items) = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    let entity = diesel::insert_into(orders::table)
                        .values(values)
                        .returning(OrderEntity::as_returning())
                        .get_result(conn)
                        .await
                        .context("Failed to create order")?;

                    let items: Vec<OrderItemEntity> = line_items
                        .iter()
                        .zip(0..)
                        .map(|(item, line_no)| OrderItemEntity {
                            order_id: entity.id,
                            line_no,
                            product_id: item.product_id,
                            quantity: item.quantity,
                        })
                        .collect();

                    diesel::insert_into(order_items::table)
                        .values(items.clone())
                        .execute(conn)
                        .await
                        .context("Failed to create order items")?;

                    Ok::<(OrderEntity, Vec<OrderItemEntity>), StoreError>((entity, items))
                })
            })
            .await?;

        Ok(entity.into_order(items)?)
    }

    async fn find_order(&self, id: Uuid) -> StoreResult<Option<Order>> {
        let mut pooled = self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let entity = orders::table
            .find(id)
            .select(OrderEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        match entity {
            Some(entity) => Ok(Some(hydrate(conn, entity).await?)),
            None => Ok(None),
        }
    }

    async fn find_order_by_code(&self, code: &OrderCode) -> StoreResult<Option<Order>> {
        let mut pooled = self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let entity = orders::table
            .filter(orders::order_code.eq(code.as_str()))
            .select(OrderEntity::as_select())
            .first(conn)
            .await
            .optional()
            .context("Failed to get order by code")?;

        match entity {
            Some(entity) => Ok(Some(hydrate(conn, entity).await?)),
            None => Ok(None),
        }
    }

    async fn find_orders_by_owner(&self, site_owner: Uuid) -> StoreResult<Vec<Order>> {
        let mut pooled = self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let entities: Vec<OrderEntity> = orders::table
            .filter(orders::site_owner.eq(site_owner))
            .order_by(orders::created_at.desc())
            .select(OrderEntity::as_select())
            .get_results(conn)
            .await
            .context("Failed to get store orders")?;

        let order_ids = entities.iter().map(|order| order.id).collect();
        let mut group = load_items(conn, order_ids).await?;

        entities
            .into_iter()
            .map(|entity| {
                let items = group.remove(&entity.id).unwrap_or_default();
                entity.into_order(items).map_err(StoreError::from)
            })
            .collect()
    }

    async fn apply_progress(&self, id: Uuid, change: &ProgressChange) -> StoreResult<Order> {
        let mut pooled = self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;
        let conn: &mut AsyncPgConnection = &mut pooled;

        let deduct_stock = change.deduct_stock.clone();
        let update = UpdateOrderProgressEntity {
            progress: change.progress.as_str().into(),
            order_code: change.assign_code.clone().map(OrderCode::into_string),
            reason: change.reason.clone(),
            updated_at: Utc::now(),
        };

        let entity = conn
            .transaction(move |conn| {
                Box::pin(async move {
                    // Updating the order first locks its row, so concurrent
                    // transitions queue up and see each other's `done`.
                    let entity = diesel::update(
                        orders::table
                            .find(id)
                            .filter(orders::progress.ne(Progress::Done.as_str())),
                    )
                    .set(&update)
                    .returning(OrderEntity::as_returning())
                    .get_result(conn)
                    .await
                    .optional()?;

                    let Some(entity) = entity else {
                        let exists: Option<Uuid> = orders::table
                            .find(id)
                            .select(orders::id)
                            .first(conn)
                            .await
                            .optional()?;
                        return Err(match exists {
                            Some(_) => StoreError::OrderDone,
                            None => anyhow::anyhow!("Order {} vanished during update", id).into(),
                        });
                    };

                    for item in &deduct_stock {
                        // Conditional decrement: the row only changes if enough stock is left.
                        let updated = diesel::update(
                            products::table
                                .find(item.product_id)
                                .filter(products::stock_count.ge(item.quantity)),
                        )
                        .set(products::stock_count.eq(products::stock_count - item.quantity))
                        .execute(conn)
                        .await?;

                        if updated == 0 {
                            let name: Option<String> = products::table
                                .find(item.product_id)
                                .select(products::name)
                                .first(conn)
                                .await
                                .optional()?;

                            if let Some(product_name) = name {
                                return Err(StoreError::InsufficientStock { product_name });
                            }
                        }
                    }

                    Ok::<OrderEntity, StoreError>(entity)
                })
            })
            .await?;

        hydrate(conn, entity).await
    }

    async fn delete_order(&self, id: Uuid) -> StoreResult<bool> {
        let conn = &mut self
            .pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let deleted = diesel::delete(
            orders::table
                .find(id)
                .filter(orders::progress.ne(Progress::Done.as_str())),
        )
        .execute(conn)
        .await
        .context("Failed to delete order")?;

        if deleted > 0 {
            return Ok(true);
        }

        let remaining: Option<Uuid> = orders::table
            .find(id)
            .select(orders::id)
            .first(conn)
            .await
            .optional()
            .context("Failed to get order")?;

        match remaining {
            Some(_) => Err(StoreError::OrderDone),
            None => Ok(false),
        }
    }
}

