use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use super::escape_like;
use crate::{
    db_types::{Collection, CollectionSummary, NewProduct, NewProductImage, Product, ProductImage, ProductUpdate},
    order_objects::{Page, Pagination, ProductOrdering, ProductQueryFilter},
    traits::CatalogError,
};

const COLLECTION_SUMMARY_QUERY: &str = r#"
    SELECT collections.id AS id, collections.name AS name, COUNT(products.id) AS product_count
    FROM collections LEFT JOIN products ON products.collection_id = collections.id
"#;

fn push_product_filters(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ProductQueryFilter) {
    let search = filter.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty());
    let has_filters = filter.collection_id.is_some() ||
        filter.min_price.is_some() ||
        filter.max_price.is_some() ||
        filter.is_available.is_some() ||
        search.is_some();
    if !has_filters {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(id) = filter.collection_id {
        where_clause.push("collection_id = ");
        where_clause.push_bind_unseparated(id);
    }
    if let Some(min) = filter.min_price {
        where_clause.push("price >= ");
        where_clause.push_bind_unseparated(min.value());
    }
    if let Some(max) = filter.max_price {
        where_clause.push("price <= ");
        where_clause.push_bind_unseparated(max.value());
    }
    if let Some(available) = filter.is_available {
        where_clause.push("is_available = ");
        where_clause.push_bind_unseparated(available);
    }
    if let Some(search) = search {
        // LIKE is case-insensitive for ASCII in SQLite
        let pattern = format!("%{}%", escape_like(search));
        where_clause.push("(name LIKE ");
        where_clause.push_bind_unseparated(pattern.clone());
        where_clause.push_unseparated(" ESCAPE '\\' OR description LIKE ");
        where_clause.push_bind_unseparated(pattern);
        where_clause.push_unseparated(" ESCAPE '\\')");
    }
}

pub async fn search_products(
    filter: ProductQueryFilter,
    pagination: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<Product>, sqlx::Error> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_product_filters(&mut count_query, &filter);
    let count = count_query.build_query_scalar::<i64>().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM products");
    push_product_filters(&mut builder, &filter);
    let ordering = match filter.ordering {
        Some(ProductOrdering::PriceAscending) => " ORDER BY price ASC, id ASC",
        Some(ProductOrdering::PriceDescending) => " ORDER BY price DESC, id ASC",
        None => " ORDER BY id ASC",
    };
    builder.push(ordering);
    builder.push(" LIMIT ");
    builder.push_bind(pagination.limit());
    builder.push(" OFFSET ");
    builder.push_bind(pagination.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(Page::new(count, pagination, products))
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_collections(conn: &mut SqliteConnection) -> Result<Vec<CollectionSummary>, sqlx::Error> {
    let sql = format!("{COLLECTION_SUMMARY_QUERY} GROUP BY collections.id ORDER BY collections.id");
    sqlx::query_as(&sql).fetch_all(conn).await
}

pub async fn fetch_collection(id: i64, conn: &mut SqliteConnection) -> Result<Option<CollectionSummary>, sqlx::Error> {
    let sql = format!("{COLLECTION_SUMMARY_QUERY} WHERE collections.id = $1 GROUP BY collections.id");
    sqlx::query_as(&sql).bind(id).fetch_optional(conn).await
}

async fn collection_exists(id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT id FROM collections WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(found.is_some())
}

pub async fn insert_collection(name: &str, conn: &mut SqliteConnection) -> Result<Collection, sqlx::Error> {
    let collection: Collection = sqlx::query_as("INSERT INTO collections (name) VALUES ($1) RETURNING *")
        .bind(name)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ Collection '{}' created with id {}", collection.name, collection.id);
    Ok(collection)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogError> {
    if !collection_exists(product.collection_id, &mut *conn).await? {
        return Err(CatalogError::CollectionNotFound(product.collection_id));
    }
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (name, description, price, is_available, collection_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(product.name)
    .bind(product.description)
    .bind(product.price.value())
    .bind(product.is_available)
    .bind(product.collection_id)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Product '{}' created with id {}", product.name, product.id);
    Ok(product)
}

pub async fn update_product(
    id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, CatalogError> {
    if update.is_empty() {
        debug!("🗃️ No fields to update for product {id}. Update request skipped.");
        return Err(CatalogError::NoOp);
    }
    if let Some(collection_id) = update.collection_id {
        if !collection_exists(collection_id, &mut *conn).await? {
            return Err(CatalogError::CollectionNotFound(collection_id));
        }
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE products SET updated_at = CURRENT_TIMESTAMP");
    if let Some(name) = update.name {
        builder.push(", name = ").push_bind(name);
    }
    if let Some(description) = update.description {
        builder.push(", description = ").push_bind(description);
    }
    if let Some(price) = update.price {
        builder.push(", price = ").push_bind(price.value());
    }
    if let Some(available) = update.is_available {
        builder.push(", is_available = ").push_bind(available);
    }
    if let Some(collection_id) = update.collection_id {
        builder.push(", collection_id = ").push_bind(collection_id);
    }
    builder.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let product = builder.build_query_as::<Product>().fetch_optional(conn).await?;
    Ok(product)
}

pub async fn insert_product_image(
    product_id: i64,
    image: NewProductImage,
    conn: &mut SqliteConnection,
) -> Result<ProductImage, CatalogError> {
    if fetch_product(product_id, &mut *conn).await?.is_none() {
        return Err(CatalogError::ProductNotFound(product_id));
    }
    let sql = "INSERT INTO product_images (product_id, url, size_bytes) VALUES ($1, $2, $3) RETURNING *";
    let image = sqlx::query_as(sql)
        .bind(product_id)
        .bind(image.url)
        .bind(image.size_bytes)
        .fetch_one(conn)
        .await?;
    Ok(image)
}

pub async fn fetch_product_images(
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<ProductImage>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM product_images WHERE product_id = $1 ORDER BY id")
        .bind(product_id)
        .fetch_all(conn)
        .await
}
