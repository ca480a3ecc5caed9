//! Service tests against a live PostgreSQL database
//!
//! Each test migrates a throwaway schema and drops it afterwards. Set
//! `IMS_TEST_DATABASE_URL` (or `DATABASE_URL`) to run them; without one they
//! return early.

use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

use super::auth::{LoginInput, RegisterInput};
use super::products::CreateProductInput;
use super::requests::RequestQuery;
use super::sales::RecordSaleInput;
use super::suppliers::SupplierInput;
use super::{AuthService, ProductService, RequestService, SalesService, SupplierService};
use crate::config::{BootstrapConfig, Config, DatabaseConfig, JwtConfig, ServerConfig};
use crate::error::AppError;
use shared::{Actor, FulfillInput, RequestPayload, RequestStatus, Role};

// ============================================================================
// Test Database
// ============================================================================

struct TestDb {
    pool: PgPool,
    url: String,
    schema: String,
}

impl TestDb {
    async fn connect() -> Option<Self> {
        let url = match std::env::var("IMS_TEST_DATABASE_URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
        {
            Ok(url) => url,
            Err(_) => {
                eprintln!("IMS_TEST_DATABASE_URL not set, skipping database test");
                return None;
            }
        };

        let schema = format!("ims_test_{}", Uuid::new_v4().simple());
        let mut conn = PgConnection::connect(&url).await.unwrap();
        conn.execute(format!("CREATE SCHEMA {}", schema).as_str())
            .await
            .unwrap();
        conn.close().await.unwrap();

        let search_path = format!("SET search_path TO {}", schema);
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .after_connect(move |conn, _meta| {
                let search_path = search_path.clone();
                Box::pin(async move {
                    conn.execute(search_path.as_str()).await?;
                    Ok(())
                })
            })
            .connect(&url)
            .await
            .unwrap();

        sqlx::migrate!("./migrations").run(&pool).await.unwrap();

        Some(Self { pool, url, schema })
    }

    async fn teardown(self) {
        self.pool.close().await;
        let mut conn = PgConnection::connect(&self.url).await.unwrap();
        conn.execute(format!("DROP SCHEMA {} CASCADE", self.schema).as_str())
            .await
            .unwrap();
    }

    fn config(&self, bootstrap: BootstrapConfig) -> Config {
        Config {
            environment: "test".to_string(),
            server: ServerConfig {
                port: 0,
                host: "127.0.0.1".to_string(),
            },
            database: DatabaseConfig {
                url: self.url.clone(),
                max_connections: 8,
                min_connections: 1,
            },
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                token_expiry: 3600,
            },
            bootstrap,
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn actor(role: Role) -> Actor {
    Actor::new(Uuid::new_v4(), role)
}

async fn seed_product(pool: &PgPool, quantity: i64, min_threshold: i64) -> Uuid {
    ProductService::new(pool.clone())
        .create_product(
            &actor(Role::Admin),
            CreateProductInput {
                product_name: Some("Sparkling Water".into()),
                price: Some(Decimal::new(150, 2)),
                quantity: Some(quantity),
                min_threshold: Some(min_threshold),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .product
        .id
}

async fn seed_supplier(pool: &PgPool) -> Uuid {
    SupplierService::new(pool.clone())
        .create_supplier(
            &actor(Role::Admin),
            SupplierInput {
                supplier_name: Some("ABC Wholesale".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .id
}

fn refill(product_id: Uuid, quantity: i64) -> RequestPayload {
    RequestPayload {
        request_type: Some("refill".into()),
        product_id: Some(product_id),
        quantity_requested: Some(quantity),
        ..Default::default()
    }
}

async fn quantity_of(pool: &PgPool, product_id: Uuid) -> i32 {
    sqlx::query_scalar::<_, i32>("SELECT quantity FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn count_for_product(pool: &PgPool, table: &str, product_id: Uuid) -> i64 {
    sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {} WHERE product_id = $1",
        table
    ))
    .bind(product_id)
    .fetch_one(pool)
    .await
    .unwrap()
}

// ============================================================================
// Stock Ledger
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_sales_never_oversell() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let product_id = seed_product(&db.pool, 10, 0).await;
    let sales = SalesService::new(db.pool.clone());
    let seller = actor(Role::Sales);

    let handles: Vec<_> = (0..25)
        .map(|_| {
            let sales = sales.clone();
            tokio::spawn(async move {
                sales
                    .record_sale(
                        &seller,
                        RecordSaleInput {
                            product_id: Some(product_id),
                            quantity_sold: Some(1),
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut sold = 0;
    let mut refused = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => sold += 1,
            Err(AppError::InsufficientStock { available }) => {
                assert_eq!(available, 0);
                refused += 1;
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(sold, 10);
    assert_eq!(refused, 15);
    assert_eq!(quantity_of(&db.pool, product_id).await, 0);
    assert_eq!(count_for_product(&db.pool, "sales", product_id).await, 10);

    db.teardown().await;
}

#[tokio::test]
async fn low_stock_lists_products_below_threshold() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let empty = seed_product(&db.pool, 0, 5).await;
    let low = seed_product(&db.pool, 4, 5).await;
    seed_product(&db.pool, 5, 5).await;
    seed_product(&db.pool, 0, 0).await;

    let listed: Vec<Uuid> = ProductService::new(db.pool.clone())
        .list_low_stock()
        .await
        .unwrap()
        .into_iter()
        .map(|listing| listing.product.id)
        .collect();

    assert_eq!(listed, vec![empty, low]);

    db.teardown().await;
}

// ============================================================================
// Request Workflow
// ============================================================================

#[tokio::test]
async fn failed_fulfillment_leaves_request_pending() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let product_id = seed_product(&db.pool, 1, 10).await;
    let requests = RequestService::new(db.pool.clone());

    let request = requests
        .create_request(&actor(Role::Inventory), refill(product_id, 20))
        .await
        .unwrap();
    let request_id = request.request.id;

    let err = requests
        .fulfill_request(
            &actor(Role::Supplier),
            request_id,
            FulfillInput {
                supplier_id: Some(Uuid::new_v4()),
                quantity_added: Some(15),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(ref resource) if resource == "Supplier"));

    let reloaded = requests.get_request(request_id).await.unwrap();
    assert_eq!(reloaded.request.status, RequestStatus::Pending);
    assert!(reloaded.request.fulfilled_by.is_none());
    assert_eq!(quantity_of(&db.pool, product_id).await, 1);
    assert_eq!(count_for_product(&db.pool, "restocks", product_id).await, 0);

    db.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_fulfillments_restock_once() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let product_id = seed_product(&db.pool, 1, 10).await;
    let supplier_id = seed_supplier(&db.pool).await;
    let requests = RequestService::new(db.pool.clone());

    let request_id = requests
        .create_request(&actor(Role::Inventory), refill(product_id, 20))
        .await
        .unwrap()
        .request
        .id;

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let requests = requests.clone();
            let supplier = actor(Role::Supplier);
            tokio::spawn(async move {
                requests
                    .fulfill_request(
                        &supplier,
                        request_id,
                        FulfillInput {
                            supplier_id: Some(supplier_id),
                            quantity_added: Some(15),
                        },
                    )
                    .await
            })
        })
        .collect();

    let mut fulfilled = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(view) => {
                assert_eq!(view.request.status, RequestStatus::Fulfilled);
                fulfilled += 1;
            }
            Err(AppError::InvalidState(message)) => {
                assert_eq!(message, "Request is not pending");
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(fulfilled, 1);
    assert_eq!(quantity_of(&db.pool, product_id).await, 16);
    assert_eq!(count_for_product(&db.pool, "restocks", product_id).await, 1);

    db.teardown().await;
}

#[tokio::test]
async fn inventory_listing_is_scoped_to_requester() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let product_id = seed_product(&db.pool, 3, 10).await;
    let requests = RequestService::new(db.pool.clone());
    let first = actor(Role::Inventory);
    let second = actor(Role::Inventory);

    requests
        .create_request(&first, refill(product_id, 5))
        .await
        .unwrap();
    requests
        .create_request(
            &first,
            RequestPayload {
                request_type: Some("new_product".into()),
                product_name: Some("Green Tea".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    requests
        .create_request(&second, refill(product_id, 8))
        .await
        .unwrap();

    let own = requests
        .list_requests(&first, RequestQuery::default())
        .await
        .unwrap();
    assert_eq!(own.len(), 2);
    assert!(own.iter().all(|view| view.request.requested_by == first.id));

    let other = requests
        .list_requests(&second, RequestQuery::default())
        .await
        .unwrap();
    assert_eq!(other.len(), 1);
    assert_eq!(other[0].request.requested_by, second.id);

    for role in [Role::Admin, Role::Supplier, Role::Sales] {
        let all = requests
            .list_requests(&actor(role), RequestQuery::default())
            .await
            .unwrap();
        assert_eq!(all.len(), 3, "{} should see every request", role);
    }

    let fulfilled = requests
        .list_requests(
            &actor(Role::Admin),
            RequestQuery {
                status: Some("fulfilled".into()),
            },
        )
        .await
        .unwrap();
    assert!(fulfilled.is_empty());

    db.teardown().await;
}

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn bootstrap_creates_first_admin_once() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let bootstrap = BootstrapConfig {
        admin_name: Some("Admin User".into()),
        admin_email: Some("Admin@Test.com".into()),
        admin_password: Some("admin123".into()),
    };
    let auth = AuthService::new(db.pool.clone(), &db.config(bootstrap.clone()));

    let admin = auth.ensure_admin(&bootstrap).await.unwrap().unwrap();
    assert_eq!(admin.role, Role::Admin);
    assert_eq!(admin.email, "admin@test.com");

    assert!(auth.ensure_admin(&bootstrap).await.unwrap().is_none());

    let session = auth
        .login(LoginInput {
            email: "admin@test.com".into(),
            password: "admin123".into(),
        })
        .await
        .unwrap();
    assert_eq!(session.user.id, admin.id);
    assert_eq!(session.user.role, Role::Admin);

    db.teardown().await;
}

#[tokio::test]
async fn bootstrap_without_credentials_does_nothing() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let auth = AuthService::new(db.pool.clone(), &db.config(BootstrapConfig::default()));

    assert!(auth
        .ensure_admin(&BootstrapConfig::default())
        .await
        .unwrap()
        .is_none());

    let admins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(&db.pool)
        .await
        .unwrap();
    assert_eq!(admins, 0);

    db.teardown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_registrations_conflict_on_email() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let auth = AuthService::new(db.pool.clone(), &db.config(BootstrapConfig::default()));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let auth = auth.clone();
            tokio::spawn(async move {
                auth.register(RegisterInput {
                    name: "Sales Staff".into(),
                    email: "sales@test.com".into(),
                    password: "demo123".into(),
                    role: None,
                })
                .await
            })
        })
        .collect();

    let mut registered = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(session) => {
                assert_eq!(session.user.role, Role::Sales);
                registered += 1;
            }
            Err(AppError::Conflict(message)) => {
                assert_eq!(message, "Email already registered");
            }
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(registered, 1);

    db.teardown().await;
}

#[tokio::test]
async fn duplicate_email_insert_maps_to_conflict() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let insert = "INSERT INTO users (name, email, password_hash, role) VALUES ('A', 'dup@test.com', 'x', 'sales')";

    sqlx::query(insert).execute(&db.pool).await.unwrap();
    let err: AppError = sqlx::query(insert)
        .execute(&db.pool)
        .await
        .unwrap_err()
        .into();

    assert!(matches!(err, AppError::Conflict(ref message) if message == "Email already registered"));

    db.teardown().await;
}
