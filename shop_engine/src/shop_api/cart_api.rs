use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Cart, CartContents, CartItem, MAX_ITEM_QUANTITY},
    traits::{CartError, CartManagement},
};

/// Anonymous shopping carts. Shoppers hold on to the cart id; there is no other notion of ownership.
pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn create_cart(&self) -> Result<Cart, CartError> {
        self.db.create_cart().await
    }

    pub async fn cart(&self, cart_id: &str) -> Result<Option<CartContents>, CartError> {
        self.db.fetch_cart(cart_id).await
    }

    /// Adds the product to the cart. Adding a product that is already in the cart increases its quantity.
    pub async fn add_item(&self, cart_id: &str, product_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        check_quantity(quantity)?;
        let item = self.db.add_cart_item(cart_id, product_id, quantity).await?;
        trace!("🛒️ Added {quantity} of product {product_id} to cart {cart_id}");
        Ok(item)
    }

    pub async fn update_item(&self, cart_id: &str, item_id: i64, quantity: i64) -> Result<CartItem, CartError> {
        check_quantity(quantity)?;
        self.db.update_cart_item(cart_id, item_id, quantity).await
    }

    pub async fn remove_item(&self, cart_id: &str, item_id: i64) -> Result<(), CartError> {
        self.db.remove_cart_item(cart_id, item_id).await
    }

    pub async fn delete_cart(&self, cart_id: &str) -> Result<(), CartError> {
        if self.db.delete_cart(cart_id).await? {
            debug!("🛒️ Cart {cart_id} deleted");
            Ok(())
        } else {
            Err(CartError::CartNotFound(cart_id.to_string()))
        }
    }
}

fn check_quantity(quantity: i64) -> Result<(), CartError> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(CartError::InvalidQuantity(quantity));
    }
    Ok(())
}
