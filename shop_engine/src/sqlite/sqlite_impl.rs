//! `SqliteDatabase` is a concrete implementation of a shop engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`] module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::{migrate::MigrateError, SqlitePool};
use uuid::Uuid;

use super::db::{branches, carts, catalog, customers, db_url, new_pool, orders, users};
use crate::{
    db_types::{
        AdminUser,
        Branch,
        Cart,
        CartContents,
        CartItem,
        CartLine,
        Collection,
        CollectionSummary,
        CustomerSummary,
        FullOrder,
        NewAdminUser,
        NewProduct,
        NewProductImage,
        Order,
        OrderItem,
        OrderStatusType,
        PaymentStatus,
        Pesewas,
        Product,
        ProductImage,
        ProductUpdate,
    },
    order_objects::{
        BranchQueryFilter,
        CheckoutRequest,
        OrderQueryFilter,
        OrderScope,
        OrderUpdate,
        Page,
        Pagination,
        ProductQueryFilter,
    },
    traits::{
        AdminError,
        AdminManagement,
        AuthApiError,
        AuthManagement,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        CheckoutError,
        OrderFlowDatabase,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object, using the URL from the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    /// Connects to the database at `url`, creating the file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date using the migrations embedded in this crate.
    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn search_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let page = catalog::search_products(filter, pagination, &mut conn).await?;
        Ok(page)
    }

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let product = catalog::fetch_product(id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_collections(&self) -> Result<Vec<CollectionSummary>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let collections = catalog::fetch_collections(&mut conn).await?;
        Ok(collections)
    }

    async fn fetch_collection(&self, id: i64) -> Result<Option<CollectionSummary>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let collection = catalog::fetch_collection(id, &mut conn).await?;
        Ok(collection)
    }

    async fn insert_collection(&self, name: &str) -> Result<Collection, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let collection = catalog::insert_collection(name, &mut conn).await?;
        Ok(collection)
    }

    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let product = catalog::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let product = catalog::update_product(id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn insert_product_image(
        &self,
        product_id: i64,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let image = catalog::insert_product_image(product_id, image, &mut tx).await?;
        tx.commit().await?;
        Ok(image)
    }

    async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        let images = catalog::fetch_product_images(product_id, &mut conn).await?;
        Ok(images)
    }
}

impl CartManagement for SqliteDatabase {
    async fn create_cart(&self) -> Result<Cart, CartError> {
        let mut conn = self.pool.acquire().await?;
        let id = Uuid::new_v4().to_string();
        let cart = carts::insert_cart(&id, &mut conn).await?;
        Ok(cart)
    }

    async fn fetch_cart(&self, cart_id: &str) -> Result<Option<CartContents>, CartError> {
        let mut conn = self.pool.acquire().await?;
        let Some(cart) = carts::fetch_cart(cart_id, &mut conn).await? else {
            return Ok(None);
        };
        let lines = carts::fetch_cart_lines(&cart.id, &mut conn).await?;
        let contents = CartContents::try_new(cart.id, lines).ok_or_else(|| CartError::CartTooLarge(cart_id.into()))?;
        Ok(Some(contents))
    }

    async fn add_cart_item(&self, cart_id: &str, product_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        let mut tx = self.pool.begin().await?;
        if !carts::touch_cart(cart_id, &mut tx).await? {
            return Err(CartError::CartNotFound(cart_id.to_string()));
        }
        let item = carts::upsert_cart_item(cart_id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn update_cart_item(&self, cart_id: &str, item_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        let mut tx = self.pool.begin().await?;
        if !carts::touch_cart(cart_id, &mut tx).await? {
            return Err(CartError::CartNotFound(cart_id.to_string()));
        }
        let item = carts::update_cart_item(cart_id, item_id, quantity, &mut tx)
            .await?
            .ok_or(CartError::ItemNotFound(item_id))?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_cart_item(&self, cart_id: &str, item_id: i64) -> Result<(), CartError> {
        let mut tx = self.pool.begin().await?;
        if !carts::touch_cart(cart_id, &mut tx).await? {
            return Err(CartError::CartNotFound(cart_id.to_string()));
        }
        if !carts::delete_cart_item(cart_id, item_id, &mut tx).await? {
            return Err(CartError::ItemNotFound(item_id));
        }
        tx.commit().await?;
        Ok(())
    }

    async fn delete_cart(&self, cart_id: &str) -> Result<bool, CartError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = carts::delete_cart(cart_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn purge_abandoned_carts(&self, age: Duration) -> Result<u64, CartError> {
        let mut conn = self.pool.acquire().await?;
        let count = carts::delete_abandoned_carts(age, &mut conn).await?;
        Ok(count)
    }
}

impl OrderFlowDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn checkout(&self, request: CheckoutRequest) -> Result<FullOrder, CheckoutError> {
        let cart_id = request.cart_id.clone();
        let mut tx = self.pool.begin().await?;
        // The first write locks the cart until commit. A concurrent checkout of the same cart waits here, and then
        // finds that the cart is gone.
        if !carts::touch_cart(&cart_id, &mut tx).await? {
            return Err(CheckoutError::CartNotFound(cart_id));
        }
        let lines = carts::fetch_cart_lines(&cart_id, &mut tx).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let branch = branches::fetch_branch(request.branch_id, &mut tx)
            .await?
            .ok_or(CheckoutError::BranchNotFound(request.branch_id))?;
        if !branch.is_active {
            return Err(CheckoutError::BranchInactive(branch.id));
        }
        if let Some(line) = lines.iter().find(|l| !l.is_available) {
            return Err(CheckoutError::ProductUnavailable(line.product_id));
        }
        let total = CartLine::total_of(&lines)
            .ok_or_else(|| CheckoutError::ValidationError("The cart total is too large to charge".into()))?;
        let customer = customers::upsert_customer(request.customer.clone(), &mut tx).await?;
        let order = orders::insert_order(&customer, &request, total, &mut tx).await?;
        for line in &lines {
            orders::insert_order_item(order.id, line.product_id, line.quantity, line.unit_price, &mut tx).await?;
        }
        let items = orders::fetch_order_items(order.id, &mut tx).await?;
        carts::delete_cart(&cart_id, &mut tx).await?;
        tx.commit().await?;
        debug!("📦️ Cart {cart_id} checked out as order #{} for {total} ({} items)", order.id, items.len());
        Ok(FullOrder { order, items })
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<FullOrder>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order(order_id, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(Some(FullOrder { order, items }))
    }

    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_reference(reference, &mut conn).await?;
        Ok(order)
    }

    async fn set_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
        access_code: &str,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::set_payment_reference(order_id, reference, access_code, &mut tx).await?;
        let order = match updated {
            Some(order) => order,
            None => {
                return match orders::fetch_order(order_id, &mut tx).await? {
                    Some(order) if order.is_paid() => Err(CheckoutError::AlreadyPaid(order_id)),
                    Some(_) => Err(CheckoutError::OrderCancelled(order_id)),
                    None => Err(CheckoutError::OrderNotFound(order_id)),
                };
            },
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn mark_payment_completed(
        &self,
        reference: &str,
        amount_paid: Pesewas,
    ) -> Result<Option<Order>, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        // The conditional updates are the lock. Whoever runs them first wins; everyone else sees zero rows.
        let reopened = orders::reopen_cancelled_order(reference, amount_paid, &mut tx).await?;
        if let Some(order) = orders::try_complete_payment(reference, amount_paid, &mut tx).await? {
            tx.commit().await?;
            if reopened.is_some() {
                warn!("💳️ Order #{} was cancelled before payment {reference} arrived. Reopened.", order.id);
            }
            info!("💳️ Payment {reference} completed for order #{}", order.id);
            return Ok(Some(order));
        }
        let order = orders::fetch_order_by_reference(reference, &mut tx)
            .await?
            .ok_or_else(|| CheckoutError::PaymentReferenceNotFound(reference.to_string()))?;
        tx.commit().await?;
        if order.payment_status == PaymentStatus::Completed {
            if order.paystack_ref.as_deref() == Some(reference) {
                debug!("💳️ Payment {reference} for order #{} was already completed. Nothing to do.", order.id);
            } else {
                warn!(
                    "💳️ Order #{} was already paid through {}. Payment {reference} is a second charge and should be \
                     refunded.",
                    order.id,
                    order.paystack_ref.as_deref().unwrap_or("an unknown reference")
                );
            }
            return Ok(None);
        }
        warn!(
            "💳️ Payment {reference} for order #{} is short. Expected {}, received {amount_paid}.",
            order.id, order.total_price
        );
        Err(CheckoutError::AmountMismatch { order_id: order.id, expected: order.total_price, received: amount_paid })
    }

    async fn mark_payment_failed(&self, reference: &str) -> Result<Option<Order>, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let updated = orders::try_fail_payment(reference, &mut tx).await?;
        if updated.is_none() && orders::fetch_order_by_reference(reference, &mut tx).await?.is_none() {
            return Err(CheckoutError::PaymentReferenceNotFound(reference.to_string()));
        }
        tx.commit().await?;
        Ok(updated)
    }

    async fn cancel_unpaid_orders(&self, age: Duration) -> Result<Vec<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let cancelled = orders::cancel_unpaid_orders(age, &mut conn).await?;
        Ok(cancelled)
    }
}

impl AdminManagement for SqliteDatabase {
    async fn search_orders(
        &self,
        scope: OrderScope,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let page = orders::search_orders(scope, filter, pagination, &mut conn).await?;
        Ok(page)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn update_order(&self, order_id: i64, update: OrderUpdate) -> Result<Option<Order>, AdminError> {
        let mut tx = self.pool.begin().await?;
        if let Some(branch_id) = update.branch_id {
            if branches::fetch_branch(branch_id, &mut tx).await?.is_none() {
                return Err(AdminError::BranchNotFound(branch_id));
            }
        }
        let order = orders::update_order(order_id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::update_order_status(order_id, from, to, &mut conn).await?;
        Ok(order)
    }

    async fn delete_unpaid_order(&self, order_id: i64) -> Result<bool, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let deleted = orders::delete_unpaid_order(order_id, &mut conn).await?;
        Ok(deleted)
    }

    async fn fetch_branches(&self, filter: BranchQueryFilter) -> Result<Vec<Branch>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let branches = branches::fetch_branches(filter, &mut conn).await?;
        Ok(branches)
    }

    async fn fetch_branch(&self, branch_id: i64) -> Result<Option<Branch>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let branch = branches::fetch_branch(branch_id, &mut conn).await?;
        Ok(branch)
    }

    async fn insert_branch(&self, name: &str, is_active: bool) -> Result<Branch, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let branch = branches::insert_branch(name, is_active, &mut conn).await?;
        Ok(branch)
    }

    async fn set_branch_active(&self, branch_id: i64, is_active: bool) -> Result<Option<Branch>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let branch = branches::set_branch_active(branch_id, is_active, &mut conn).await?;
        Ok(branch)
    }

    async fn search_customers(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<Page<CustomerSummary>, AdminError> {
        let mut conn = self.pool.acquire().await?;
        let page = customers::search_customers(search, pagination, &mut conn).await?;
        Ok(page)
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<AdminUser>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_username(username, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<AdminUser>, AuthApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user_by_id(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn insert_user(&self, user: NewAdminUser) -> Result<AdminUser, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        if users::fetch_user_by_username(&user.username, &mut tx).await?.is_some() {
            return Err(AuthApiError::UserAlreadyExists(user.username));
        }
        let id = users::insert_user(user, &mut tx).await?;
        let user = users::fetch_user_by_id(id, &mut tx).await?.ok_or(AuthApiError::UserNotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(user)
    }

    async fn assign_branch(&self, user_id: i64, branch_id: i64) -> Result<AdminUser, AuthApiError> {
        let mut tx = self.pool.begin().await?;
        if users::fetch_user_by_id(user_id, &mut tx).await?.is_none() {
            return Err(AuthApiError::UserNotFound(user_id.to_string()));
        }
        if branches::fetch_branch(branch_id, &mut tx).await?.is_none() {
            return Err(AuthApiError::BranchNotFound(branch_id));
        }
        users::upsert_branch_account(user_id, branch_id, &mut tx).await?;
        let user =
            users::fetch_user_by_id(user_id, &mut tx).await?.ok_or(AuthApiError::UserNotFound(user_id.to_string()))?;
        tx.commit().await?;
        Ok(user)
    }
}
