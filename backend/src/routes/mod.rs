//! Route definitions for the Inventory Management Platform

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (register/login public, me protected)
        .nest("/auth", auth_routes(state))
        // Protected routes
        .nest("/users", protected(user_routes(), state))
        .nest("/products", protected(product_routes(), state))
        .nest("/suppliers", protected(supplier_routes(), state))
        .nest("/sales", protected(sales_routes(), state))
        .nest("/restock", protected(restock_routes(), state))
        .nest("/requests", protected(request_routes(), state))
        .nest("/dashboard", protected(dashboard_routes(), state))
}

/// Require a valid bearer token on every route of `router`
fn protected(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    router.route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Authentication routes
fn auth_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .merge(protected(Router::new().route("/me", get(handlers::me)), state))
}

/// User administration routes (admin)
fn user_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_users)).route(
        "/:user_id",
        put(handlers::update_user).delete(handlers::delete_user),
    )
}

/// Product catalogue routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/low-stock", get(handlers::list_low_stock))
        .route(
            "/:product_id",
            put(handlers::update_product).delete(handlers::delete_product),
        )
}

/// Supplier catalogue routes
fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:supplier_id",
            put(handlers::update_supplier).delete(handlers::delete_supplier),
        )
}

/// Sale routes
fn sales_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::list_sales).post(handlers::record_sale))
}

/// Restock routes
fn restock_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_restocks).post(handlers::record_restock),
    )
}

/// Request workflow routes
fn request_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_requests).post(handlers::create_request),
        )
        .route("/:request_id/fulfill", put(handlers::fulfill_request))
        .route("/:request_id/reject", put(handlers::reject_request))
}

/// Dashboard routes (admin)
fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/stats", get(handlers::get_stats))
}
