//! Runs against a real PostgreSQL database when `TEST_DATABASE_URL` is set,
//! and is skipped otherwise.

use diesel::sql_types::{Double, Integer, Text, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use diesel_migrations::{EmbeddedMigrations, embed_migrations};
use storefront_orderservice::{
    core::db::{self, DbPool},
    engine::domain::{LineItem, NewOrder, OrderCode, PaymentMethod, Progress, ProgressChange},
    store::{CatalogStore, OrderStore, PgStore, StoreError},
};
use tokio::sync::OnceCell;
use uuid::Uuid;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

static MIGRATED: OnceCell<()> = OnceCell::const_new();

struct PgFixture {
    pool: DbPool,
    store: PgStore,
    owner: Uuid,
}

impl PgFixture {
    async fn connect() -> Option<Self> {
        let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
            eprintln!("TEST_DATABASE_URL not set, skipping PostgreSQL store test");
            return None;
        };

        MIGRATED
            .get_or_init(|| async {
                db::run_migrations_blocking(MIGRATIONS, &url)
                    .await
                    .expect("failed to run migrations");
            })
            .await;

        let pool = db::create_pool(&url).await.expect("failed to build pool");
        let owner = Uuid::new_v4();
        {
            let conn = &mut pool.get().await.expect("failed to get connection");
            diesel::sql_query("INSERT INTO users (id, username) VALUES ($1, $2)")
                .bind::<SqlUuid, _>(owner)
                .bind::<Text, _>(owner.to_string())
                .execute(conn)
                .await
                .expect("failed to seed user");
        }

        Some(Self {
            store: PgStore::new(pool.clone()),
            pool,
            owner,
        })
    }

    async fn product(&self, name: &str, stock: i32) -> Uuid {
        let id = Uuid::new_v4();
        let conn = &mut self.pool.get().await.expect("failed to get connection");
        diesel::sql_query(
            "INSERT INTO products (id, owner_id, name, price, stock_count) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind::<SqlUuid, _>(id)
        .bind::<SqlUuid, _>(self.owner)
        .bind::<Text, _>(name)
        .bind::<Double, _>(10.0)
        .bind::<Integer, _>(stock)
        .execute(conn)
        .await
        .expect("failed to seed product");
        id
    }

    async fn order(&self, items: &[(Uuid, i32)]) -> Uuid {
        self.store
            .insert_order(NewOrder {
                order_name: "Birthday order".into(),
                products: items
                    .iter()
                    .map(|(product_id, quantity)| LineItem {
                        product_id: *product_id,
                        quantity: *quantity,
                    })
                    .collect(),
                total_amount: 10.0,
                payment: PaymentMethod::Cod,
                payment_screenshots: vec![],
                phone_primary: "0911111111".into(),
                phone_secondary: String::new(),
                address: "12 Market St".into(),
                site_owner: self.owner,
            })
            .await
            .expect("failed to insert order")
            .id
    }

    async fn stock(&self, product: Uuid) -> i32 {
        self.store
            .find_product(product)
            .await
            .unwrap()
            .expect("product exists")
            .stock_count
    }
}

fn fresh_code() -> OrderCode {
    OrderCode::generate(&mut rand::thread_rng())
}

fn fulfil(items: &[(Uuid, i32)]) -> ProgressChange {
    ProgressChange {
        progress: Progress::Done,
        assign_code: Some(fresh_code()),
        reason: None,
        deduct_stock: items
            .iter()
            .map(|(product_id, quantity)| LineItem {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect(),
    }
}

#[tokio::test]
async fn done_orders_are_fulfilled_once() {
    let Some(fx) = PgFixture::connect().await else {
        return;
    };
    let mug = fx.product("mug", 5).await;
    let items = [(mug, 2)];
    let order = fx.order(&items).await;

    let done = fx.store.apply_progress(order, &fulfil(&items)).await.unwrap();
    assert_eq!(done.progress, Progress::Done);

    let again = fx
        .store
        .apply_progress(order, &fulfil(&items))
        .await
        .unwrap_err();
    assert!(matches!(again, StoreError::OrderDone));
    assert_eq!(fx.stock(mug).await, 3);

    let err = fx.store.delete_order(order).await.unwrap_err();
    assert!(matches!(err, StoreError::OrderDone));
}

#[tokio::test]
async fn shortage_rolls_back_the_whole_transition() {
    let Some(fx) = PgFixture::connect().await else {
        return;
    };
    let plenty = fx.product("plenty", 10).await;
    let scarce = fx.product("scarce", 1).await;
    let items = [(plenty, 4), (scarce, 2)];
    let order = fx.order(&items).await;

    let err = fx
        .store
        .apply_progress(order, &fulfil(&items))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::InsufficientStock { ref product_name } if product_name == "scarce"));
    assert_eq!(fx.stock(plenty).await, 10);
    assert_eq!(fx.stock(scarce).await, 1);
    let stored = fx.store.find_order(order).await.unwrap().unwrap();
    assert_eq!(stored.progress, Progress::Pending);
    assert_eq!(stored.order_code, None);
}

#[tokio::test]
async fn duplicate_codes_hit_the_unique_index() {
    let Some(fx) = PgFixture::connect().await else {
        return;
    };
    let mug = fx.product("mug", 5).await;
    let first = fx.order(&[(mug, 1)]).await;
    let second = fx.order(&[(mug, 1)]).await;
    let accept = ProgressChange {
        progress: Progress::Accepted,
        assign_code: Some(fresh_code()),
        reason: None,
        deduct_stock: vec![],
    };

    fx.store.apply_progress(first, &accept).await.unwrap();
    let err = fx.store.apply_progress(second, &accept).await.unwrap_err();

    assert!(matches!(err, StoreError::Conflict(_)));
    let stored = fx.store.find_order(second).await.unwrap().unwrap();
    assert_eq!(stored.progress, Progress::Pending);
}

#[tokio::test]
async fn missing_orders_are_reported_by_delete() {
    let Some(fx) = PgFixture::connect().await else {
        return;
    };

    assert!(!fx.store.delete_order(Uuid::new_v4()).await.unwrap());
}
