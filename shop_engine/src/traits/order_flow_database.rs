use chrono::Duration;
use thiserror::Error;

use crate::{
    db_types::{FullOrder, Order, Pesewas},
    order_objects::CheckoutRequest,
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("We have an internal database engine (configuration/uptime etc.) : {0}")]
    DatabaseError(String),
    #[error("Cart {0} does not exist")]
    CartNotFound(String),
    #[error("Cannot check out an empty cart")]
    EmptyCart,
    #[error("Branch {0} does not exist")]
    BranchNotFound(i64),
    #[error("Branch {0} is not accepting orders")]
    BranchInactive(i64),
    #[error("Product {0} is no longer available")]
    ProductUnavailable(i64),
    #[error("Invalid order details. {0}")]
    ValidationError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("No order has the payment reference {0}")]
    PaymentReferenceNotFound(String),
    #[error("Order {0} has already been paid for")]
    AlreadyPaid(i64),
    #[error("Order {0} has been cancelled")]
    OrderCancelled(i64),
    #[error("Payment for order {order_id} is short. Expected {expected}, but received {received}")]
    AmountMismatch { order_id: i64, expected: Pesewas, received: Pesewas },
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

/// This trait defines the highest level of behaviour for backends supporting the shop engine: turning carts into
/// orders and keeping the payment status of orders in step with the payment gateway.
///
/// Every method is atomic. In particular, the payment status methods must be safe to call concurrently for the same
/// order from any number of tasks (the synchronous verify call and the gateway webhook typically race each other).
#[allow(async_fn_in_trait)]
pub trait OrderFlowDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Converts the cart into an order in a single transaction.
    ///
    /// * The cart row is write-locked first, so concurrent checkouts of the same cart are serialised and only the first
    ///   one finds any items.
    /// * The branch must exist and be active, and every product in the cart must still be available.
    /// * The customer is fetched by email, or created. Their details are updated from the request.
    /// * Each order item records the product price at this moment.
    /// * The cart and its items are deleted.
    async fn checkout(&self, request: CheckoutRequest) -> Result<FullOrder, CheckoutError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<FullOrder>, CheckoutError>;

    /// Finds the order that any reference, current or superseded, was issued for.
    async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, CheckoutError>;

    /// Stores the gateway reference and access code for the order, replacing any previous ones. Earlier references
    /// are remembered, so a payment made against one of them is still credited to the order.
    /// Fails with [`CheckoutError::AlreadyPaid`] if the payment has been completed, and with
    /// [`CheckoutError::OrderCancelled`] if the order has been cancelled.
    async fn set_payment_reference(
        &self,
        order_id: i64,
        reference: &str,
        access_code: &str,
    ) -> Result<Order, CheckoutError>;

    /// Marks the payment for the order with the given reference as completed, provided `amount_paid` covers the order
    /// total.
    ///
    /// Exactly one caller wins the transition and receives `Some(order)`. If the payment was already completed, `None`
    /// is returned. An unknown reference, or an amount below the order total, is an error and leaves the order as is.
    ///
    /// The reference may be one that has since been replaced; the paid reference becomes the order's reference. A
    /// cancelled order that is paid for in full is reopened as `Pending`, since the customer has been charged.
    async fn mark_payment_completed(&self, reference: &str, amount_paid: Pesewas)
        -> Result<Option<Order>, CheckoutError>;

    /// Moves a `Pending` payment to `Failed`. Completed payments are never downgraded, and failures reported for a
    /// superseded reference are ignored. Returns the updated order if the status changed.
    async fn mark_payment_failed(&self, reference: &str) -> Result<Option<Order>, CheckoutError>;

    /// Cancels every order that is still awaiting payment and is older than `age`.
    async fn cancel_unpaid_orders(&self, age: Duration) -> Result<Vec<Order>, CheckoutError>;
}
