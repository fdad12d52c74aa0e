use thiserror::Error;

use crate::{
    db_types::{Collection, CollectionSummary, NewProduct, NewProductImage, Product, ProductImage, ProductUpdate},
    order_objects::{Page, Pagination, ProductQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Collection {0} does not exist")]
    CollectionNotFound(i64),
    #[error("Invalid catalog entry. {0}")]
    ValidationError(String),
    #[error("The requested product change would result in a no-op.")]
    NoOp,
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Read access to the public catalog, and the write operations store admins use to maintain it.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Fetches one page of products matching `filter`. Unless an ordering is requested, products are ordered by id.
    async fn search_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, CatalogError>;

    async fn fetch_product(&self, id: i64) -> Result<Option<Product>, CatalogError>;

    /// Lists all collections, each annotated with the number of products in it.
    async fn fetch_collections(&self) -> Result<Vec<CollectionSummary>, CatalogError>;

    async fn fetch_collection(&self, id: i64) -> Result<Option<CollectionSummary>, CatalogError>;

    async fn insert_collection(&self, name: &str) -> Result<Collection, CatalogError>;

    /// Inserts a product. The collection must exist.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogError>;

    /// Applies the non-empty fields of `update`. Returns `None` if the product does not exist.
    async fn update_product(&self, id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogError>;

    async fn insert_product_image(&self, product_id: i64, image: NewProductImage)
        -> Result<ProductImage, CatalogError>;

    async fn fetch_product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError>;
}
