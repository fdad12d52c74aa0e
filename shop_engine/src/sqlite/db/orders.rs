use chrono::Duration;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::escape_like;
use crate::{
    db_types::{Customer, Order, OrderItem, OrderStatusType, PaymentStatus, Pesewas},
    order_objects::{CheckoutRequest, OrderQueryFilter, OrderScope, OrderUpdate, Page, Pagination},
};

const ORDER_ITEMS_QUERY: &str = r#"
    SELECT
        order_items.id AS id,
        order_items.order_id AS order_id,
        order_items.product_id AS product_id,
        products.name AS product_name,
        order_items.quantity AS quantity,
        order_items.price_at_purchase AS price_at_purchase
    FROM order_items JOIN products ON order_items.product_id = products.id
    WHERE order_items.order_id = $1
    ORDER BY order_items.id
"#;

/// Inserts a new order for the customer. This is not atomic. Embed the call inside a transaction, together with the
/// order items, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(
    customer: &Customer,
    request: &CheckoutRequest,
    total_price: Pesewas,
    conn: &mut SqliteConnection,
) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                customer_id,
                customer_name,
                customer_number,
                customer_email,
                recipient_name,
                recipient_number,
                recipient_address,
                branch_id,
                total_price
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(customer.id)
    .bind(customer.full_name())
    .bind(&customer.phone)
    .bind(&customer.email)
    .bind(&request.recipient_name)
    .bind(&request.recipient_number)
    .bind(&request.recipient_address)
    .bind(request.branch_id)
    .bind(total_price.value())
    .fetch_one(conn)
    .await?;
    debug!("📦️ Order #{} inserted for customer #{}", order.id, customer.id);
    Ok(order)
}

pub async fn insert_order_item(
    order_id: i64,
    product_id: i64,
    quantity: i64,
    price_at_purchase: Pesewas,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO order_items (order_id, product_id, quantity, price_at_purchase) VALUES ($1, $2, $3, $4)")
        .bind(order_id)
        .bind(product_id)
        .bind(quantity)
        .bind(price_at_purchase.value())
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as(ORDER_ITEMS_QUERY).bind(order_id).fetch_all(conn).await
}

pub async fn fetch_order_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        SELECT orders.* FROM orders JOIN payment_attempts ON payment_attempts.order_id = orders.id
        WHERE payment_attempts.reference = $1
        "#,
    )
    .bind(reference)
    .fetch_optional(conn)
    .await
}

/// Stores the gateway reference on the order, unless it has already been paid for or has been cancelled. A
/// previously failed payment goes back to `Pending`, since the new reference starts a new attempt. The reference is
/// also recorded as a payment attempt for the order.
pub async fn set_payment_reference(
    order_id: i64,
    reference: &str,
    access_code: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET
            paystack_ref = $1,
            paystack_access_code = $2,
            payment_status = 'Pending',
            updated_at = CURRENT_TIMESTAMP
        WHERE id = $3 AND payment_status != 'Completed' AND status != 'Cancelled'
        RETURNING *;
        "#,
    )
    .bind(reference)
    .bind(access_code)
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    if order.is_some() {
        sqlx::query(
            "INSERT INTO payment_attempts (reference, order_id, access_code) VALUES ($1, $2, $3) ON CONFLICT \
             (reference) DO NOTHING",
        )
        .bind(reference)
        .bind(order_id)
        .bind(access_code)
        .execute(conn)
        .await?;
    }
    Ok(order)
}

/// Moves a cancelled order back to `Pending` if the payment for `reference` covers its total and the payment has not
/// been completed yet. Returns the id of the reopened order.
pub async fn reopen_cancelled_order(
    reference: &str,
    amount_paid: Pesewas,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar(
        r#"
        UPDATE orders SET status = 'Pending', updated_at = CURRENT_TIMESTAMP
        WHERE id = (SELECT order_id FROM payment_attempts WHERE reference = $1)
            AND status = 'Cancelled' AND payment_status != 'Completed' AND total_price <= $2
        RETURNING id;
        "#,
    )
    .bind(reference)
    .bind(amount_paid.value())
    .fetch_optional(conn)
    .await
}

/// The payment status transition to `Completed`, as a single conditional write.
///
/// Only one statement can ever match a given order, because the match requires the payment to not yet be completed.
/// The order is found through its payment attempts, so a superseded reference still matches, and becomes the
/// order's reference again.
/// Returns `None` if nothing was updated: the reference is unknown, the payment is already completed, or the amount
/// does not cover the order total.
pub async fn try_complete_payment(
    reference: &str,
    amount_paid: Pesewas,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> = sqlx::query_as(
        r#"
        UPDATE orders SET
            payment_status = 'Completed',
            paystack_ref = $1,
            paystack_access_code = (SELECT access_code FROM payment_attempts WHERE reference = $1),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = (SELECT order_id FROM payment_attempts WHERE reference = $1)
            AND payment_status != 'Completed' AND total_price <= $2
        RETURNING *;
        "#,
    )
    .bind(reference)
    .bind(amount_paid.value())
    .fetch_optional(conn)
    .await?;
    trace!("💳️ Completing payment {reference}: {}", if order.is_some() { "updated" } else { "no change" });
    Ok(order)
}

/// Moves a pending payment to `Failed`. Returns `None` if the payment was not pending, or if `reference` is no longer
/// the order's current reference.
pub async fn try_fail_payment(reference: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET payment_status = 'Failed', updated_at = CURRENT_TIMESTAMP WHERE paystack_ref = $1 AND \
         payment_status = 'Pending' RETURNING *",
    )
    .bind(reference)
    .fetch_optional(conn)
    .await
}

fn push_order_filters(builder: &mut QueryBuilder<'_, Sqlite>, scope: OrderScope, filter: &OrderQueryFilter) {
    // Admin listings only show paid orders unless asked otherwise
    let payment_status = filter.payment_status.unwrap_or(PaymentStatus::Completed);
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    where_clause.push("payment_status = ");
    where_clause.push_bind_unseparated(payment_status.to_string());
    if let OrderScope::Branch(branch_id) = scope {
        where_clause.push("branch_id = ");
        where_clause.push_bind_unseparated(branch_id);
    }
    if let Some(branch_id) = filter.branch_id {
        where_clause.push("branch_id = ");
        where_clause.push_bind_unseparated(branch_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status.to_string());
    }
    if let Some(customer_id) = filter.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(since) = filter.since {
        where_clause.push("unixepoch(created_at) >= ");
        where_clause.push_bind_unseparated(since.timestamp());
    }
    if let Some(until) = filter.until {
        where_clause.push("unixepoch(created_at) <= ");
        where_clause.push_bind_unseparated(until.timestamp());
    }
    if let Some(search) = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        where_clause.push("(recipient_name LIKE ");
        where_clause.push_bind_unseparated(format!("{}%", escape_like(search)));
        where_clause.push_unseparated(" ESCAPE '\\'");
        where_clause.push_unseparated(" OR id IN (SELECT order_id FROM payment_attempts WHERE reference = ");
        where_clause.push_bind_unseparated(search.to_string());
        where_clause.push_unseparated(")");
        if let Ok(id) = search.parse::<i64>() {
            where_clause.push_unseparated(" OR id = ");
            where_clause.push_bind_unseparated(id);
        }
        where_clause.push_unseparated(")");
    }
}

/// Fetches one page of the orders in `scope` that match the filter, newest first.
pub async fn search_orders(
    scope: OrderScope,
    filter: OrderQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<Order>, sqlx::Error> {
    if scope == OrderScope::Nothing {
        return Ok(Page::new(0, pagination, Vec::new()));
    }
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_order_filters(&mut count_query, scope, &filter);
    let count = count_query.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_order_filters(&mut builder, scope, &filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("📦️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📦️ Result of search_orders: {} of {count}", orders.len());
    Ok(Page::new(count, pagination, orders))
}

/// Applies the non-empty fields of `update`. The caller must ensure the update is not empty.
pub async fn update_order(
    id: i64,
    update: OrderUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET updated_at = CURRENT_TIMESTAMP");
    if let Some(name) = update.recipient_name {
        builder.push(", recipient_name = ").push_bind(name);
    }
    if let Some(number) = update.recipient_number {
        builder.push(", recipient_number = ").push_bind(number);
    }
    if let Some(address) = update.recipient_address {
        builder.push(", recipient_address = ").push_bind(address);
    }
    if let Some(branch_id) = update.branch_id {
        builder.push(", branch_id = ").push_bind(branch_id);
    }
    builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    trace!("📦️ Executing query: {}", builder.sql());
    builder.build_query_as::<Order>().fetch_optional(conn).await
}

/// Compare-and-set on the order status.
pub async fn update_order_status(
    id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(to.to_string())
    .bind(id)
    .bind(from.to_string())
    .fetch_optional(conn)
    .await
}

pub async fn delete_unpaid_order(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND payment_status != 'Completed'")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Cancels orders that are still `Pending` with a `Pending` payment, and that were placed more than `age` ago.
pub async fn cancel_unpaid_orders(age: Duration, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
        UPDATE orders SET status = 'Cancelled', updated_at = CURRENT_TIMESTAMP
        WHERE status = 'Pending' AND payment_status = 'Pending'
          AND unixepoch(created_at) < unixepoch('now') - $1
        RETURNING *;
        "#,
    )
    .bind(age.num_seconds())
    .fetch_all(conn)
    .await
}
