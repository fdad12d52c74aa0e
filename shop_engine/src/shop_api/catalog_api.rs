use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{
        Collection,
        CollectionSummary,
        NewProduct,
        NewProductImage,
        Product,
        ProductImage,
        ProductUpdate,
        MAX_IMAGE_SIZE_BYTES,
        MAX_NAME_LENGTH,
    },
    order_objects::{Page, Pagination, ProductQueryFilter},
    traits::{CatalogError, CatalogManagement},
};

/// Read access to the catalog for shoppers, and catalog maintenance for admins.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn list_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, CatalogError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(CatalogError::ValidationError(format!("min_price ({min}) exceeds max_price ({max})")));
            }
        }
        self.db.search_products(filter, pagination).await
    }

    pub async fn product_by_id(&self, id: i64) -> Result<Option<Product>, CatalogError> {
        self.db.fetch_product(id).await
    }

    pub async fn list_collections(&self) -> Result<Vec<CollectionSummary>, CatalogError> {
        self.db.fetch_collections().await
    }

    pub async fn collection_by_id(&self, id: i64) -> Result<Option<CollectionSummary>, CatalogError> {
        self.db.fetch_collection(id).await
    }

    pub async fn create_collection(&self, name: &str) -> Result<Collection, CatalogError> {
        let name = validate_name(name)?;
        self.db.insert_collection(name).await
    }

    pub async fn create_product(&self, mut product: NewProduct) -> Result<Product, CatalogError> {
        product.name = validate_name(&product.name)?.to_string();
        if product.price.is_negative() {
            return Err(CatalogError::ValidationError("A product price cannot be negative".into()));
        }
        let product = self.db.insert_product(product).await?;
        info!("🗃️ New product #{} '{}' added at {}", product.id, product.name, product.price);
        Ok(product)
    }

    /// Applies the given changes to the product. Empty updates are rejected with [`CatalogError::NoOp`].
    pub async fn update_product(&self, id: i64, mut update: ProductUpdate) -> Result<Product, CatalogError> {
        if let Some(name) = update.name.as_deref() {
            update.name = Some(validate_name(name)?.to_string());
        }
        if update.price.map(|p| p.is_negative()).unwrap_or(false) {
            return Err(CatalogError::ValidationError("A product price cannot be negative".into()));
        }
        let product = self.db.update_product(id, update).await?.ok_or(CatalogError::ProductNotFound(id))?;
        debug!("🗃️ Product #{id} updated");
        Ok(product)
    }

    pub async fn add_product_image(
        &self,
        product_id: i64,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogError> {
        if image.url.trim().is_empty() {
            return Err(CatalogError::ValidationError("An image URL is required".into()));
        }
        if image.size_bytes < 0 || image.size_bytes > MAX_IMAGE_SIZE_BYTES {
            return Err(CatalogError::ValidationError(format!(
                "Images must be at most {} KiB. This one is {} bytes",
                MAX_IMAGE_SIZE_BYTES / 1024,
                image.size_bytes
            )));
        }
        self.db.insert_product_image(product_id, image).await
    }

    pub async fn product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError> {
        if self.db.fetch_product(product_id).await?.is_none() {
            return Err(CatalogError::ProductNotFound(product_id));
        }
        self.db.fetch_product_images(product_id).await
    }
}

fn validate_name(name: &str) -> Result<&str, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::ValidationError("A name is required".into()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(CatalogError::ValidationError(format!("Names are limited to {MAX_NAME_LENGTH} characters")));
    }
    Ok(name)
}
