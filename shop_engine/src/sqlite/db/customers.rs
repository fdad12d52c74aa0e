use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::escape_like;
use crate::{
    db_types::{Customer, CustomerDetails, CustomerSummary},
    order_objects::{Page, Pagination},
};

/// Fetches the customer with the given email address, creating them if necessary. The stored name, phone number and
/// birth date are replaced with the ones supplied.
pub async fn upsert_customer(details: CustomerDetails, conn: &mut SqliteConnection) -> Result<Customer, sqlx::Error> {
    let customer: Customer = sqlx::query_as(
        r#"
            INSERT INTO customers (first_name, last_name, email, phone, birth_date) VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                phone = excluded.phone,
                birth_date = COALESCE(excluded.birth_date, customers.birth_date)
            RETURNING *;
        "#,
    )
    .bind(details.first_name)
    .bind(details.last_name)
    .bind(details.email.trim().to_lowercase())
    .bind(details.phone)
    .bind(details.birth_date)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Customer #{} is {}", customer.id, customer.email);
    Ok(customer)
}

fn push_name_filter(builder: &mut QueryBuilder<'_, Sqlite>, search: Option<&str>) {
    if let Some(search) = search {
        let pattern = format!("{}%", escape_like(search));
        builder.push(" WHERE customers.first_name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" ESCAPE '\\' OR customers.last_name LIKE ");
        builder.push_bind(pattern);
        builder.push(" ESCAPE '\\'");
    }
}

pub async fn search_customers(
    search: Option<String>,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<CustomerSummary>, sqlx::Error> {
    let search = search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM customers");
    push_name_filter(&mut count_query, search);
    let count = count_query.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new(
        r#"SELECT customers.*, COUNT(orders.id) AS orders_count
        FROM customers LEFT JOIN orders ON orders.customer_id = customers.id"#,
    );
    push_name_filter(&mut builder, search);
    builder.push(" GROUP BY customers.id ORDER BY customers.first_name, customers.last_name LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let customers = builder.build_query_as::<CustomerSummary>().fetch_all(conn).await?;
    Ok(Page::new(count, pagination, customers))
}
