use chrono::Duration;
use thiserror::Error;

use crate::db_types::{Cart, CartContents, CartItem, MAX_ITEM_QUANTITY};

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Cart {0} does not exist")]
    CartNotFound(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {0} is not available")]
    ProductUnavailable(i64),
    #[error("Cart item {0} does not exist")]
    ItemNotFound(i64),
    #[error("Quantity must be between 1 and {max}, not {0}", max = MAX_ITEM_QUANTITY)]
    InvalidQuantity(i64),
    #[error("The total for cart {0} is too large. Reduce the item quantities")]
    CartTooLarge(String),
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

/// Storage for anonymous shopping carts. Carts are identified by a UUID in string form.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    async fn create_cart(&self) -> Result<Cart, CartError>;

    /// Fetches a cart, its items and the current product details for each item. Fails with
    /// [`CartError::CartTooLarge`] if the total cannot be represented.
    async fn fetch_cart(&self, cart_id: &str) -> Result<Option<CartContents>, CartError>;

    /// Adds `quantity` of the product to the cart. If the product is already in the cart, the quantities are summed.
    /// The resulting quantity may not exceed [`MAX_ITEM_QUANTITY`].
    async fn add_cart_item(&self, cart_id: &str, product_id: i64, quantity: i64) -> Result<CartItem, CartError>;

    async fn update_cart_item(&self, cart_id: &str, item_id: i64, quantity: i64) -> Result<CartItem, CartError>;

    async fn remove_cart_item(&self, cart_id: &str, item_id: i64) -> Result<(), CartError>;

    /// Deletes the cart and its items. Returns false if the cart did not exist.
    async fn delete_cart(&self, cart_id: &str) -> Result<bool, CartError>;

    /// Deletes every cart that has not been touched for longer than `age`. Returns the number of carts removed.
    async fn purge_abandoned_carts(&self, age: Duration) -> Result<u64, CartError>;
}
