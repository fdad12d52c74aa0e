use chrono::Duration;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{Cart, CartItem, CartLine, MAX_ITEM_QUANTITY},
    traits::CartError,
};

const CART_LINES_QUERY: &str = r#"
    SELECT
        cart_items.id AS id,
        cart_items.product_id AS product_id,
        products.name AS product_name,
        products.price AS unit_price,
        products.is_available AS is_available,
        cart_items.quantity AS quantity
    FROM cart_items JOIN products ON cart_items.product_id = products.id
    WHERE cart_items.cart_id = $1
    ORDER BY cart_items.id
"#;

pub async fn insert_cart(id: &str, conn: &mut SqliteConnection) -> Result<Cart, sqlx::Error> {
    let cart: Cart = sqlx::query_as("INSERT INTO carts (id) VALUES ($1) RETURNING *").bind(id).fetch_one(conn).await?;
    debug!("🛒️ Cart {} created", cart.id);
    Ok(cart)
}

pub async fn fetch_cart(id: &str, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM carts WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_cart_lines(id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as(CART_LINES_QUERY).bind(id).fetch_all(conn).await
}

/// Bumps the cart's `updated_at`. As the first statement of a transaction, this takes the write lock for the cart.
/// Returns false if the cart does not exist.
pub async fn touch_cart(id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result =
        sqlx::query("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Adds the product to the cart, summing quantities if the product is already present. The summed quantity is
/// subject to the same limit as a single addition.
pub async fn upsert_cart_item(
    cart_id: &str,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, CartError> {
    check_quantity(quantity)?;
    let available: Option<bool> = sqlx::query_scalar("SELECT is_available FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(&mut *conn)
        .await?;
    match available {
        None => return Err(CartError::ProductNotFound(product_id)),
        Some(false) => return Err(CartError::ProductUnavailable(product_id)),
        Some(true) => {},
    }
    let existing: Option<i64> =
        sqlx::query_scalar("SELECT quantity FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart_id)
            .bind(product_id)
            .fetch_optional(&mut *conn)
            .await?;
    if let Some(existing) = existing {
        check_quantity(existing.saturating_add(quantity))?;
    }
    let item: CartItem = sqlx::query_as(
        r#"
            INSERT INTO cart_items (cart_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            RETURNING *;
        "#,
    )
    .bind(cart_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await?;
    trace!("🛒️ Cart {cart_id} now holds {} of product {product_id}", item.quantity);
    Ok(item)
}

pub async fn update_cart_item(
    cart_id: &str,
    item_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, CartError> {
    check_quantity(quantity)?;
    let item: Option<CartItem> =
        sqlx::query_as("UPDATE cart_items SET quantity = $1 WHERE id = $2 AND cart_id = $3 RETURNING *")
            .bind(quantity)
            .bind(item_id)
            .bind(cart_id)
            .fetch_optional(conn)
            .await?;
    Ok(item)
}

fn check_quantity(quantity: i64) -> Result<(), CartError> {
    if (1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        Ok(())
    } else {
        Err(CartError::InvalidQuantity(quantity))
    }
}

pub async fn delete_cart_item(cart_id: &str, item_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
        .bind(item_id)
        .bind(cart_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Deletes the cart. Its items go with it.
pub async fn delete_cart(id: &str, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_abandoned_carts(age: Duration, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM carts WHERE unixepoch(updated_at) < unixepoch('now') - $1")
        .bind(age.num_seconds())
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
