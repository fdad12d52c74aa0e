use thiserror::Error;

use crate::{
    db_types::{Branch, CustomerSummary, Order, OrderItem, OrderStatusType},
    order_objects::{BranchQueryFilter, OrderQueryFilter, OrderScope, OrderUpdate, Page, Pagination},
};

#[derive(Debug, Clone, Error)]
pub enum AdminError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(i64),
    #[error("Branch {0} does not exist")]
    BranchNotFound(i64),
    #[error("Forbidden. {0}")]
    Forbidden(String),
    #[error("The requested order change would result in a no-op.")]
    NoOp,
    #[error("An order cannot move from {from} to {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Order {0} has been paid for and cannot be deleted")]
    PaidOrderDeletion(i64),
    #[error("Invalid request. {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for AdminError {
    fn from(e: sqlx::Error) -> Self {
        AdminError::DatabaseError(e.to_string())
    }
}

/// Back-office queries over orders, branches and customers.
///
/// Branch scoping is applied by the backend in [`search_orders`](AdminManagement::search_orders) so that page counts
/// are correct. The single-order methods are unscoped; access checks happen in the API layer.
#[allow(async_fn_in_trait)]
pub trait AdminManagement {
    async fn search_orders(
        &self,
        scope: OrderScope,
        filter: OrderQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Order>, AdminError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, AdminError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AdminError>;

    async fn update_order(&self, order_id: i64, update: OrderUpdate) -> Result<Option<Order>, AdminError>;

    /// Sets the order status if it is still `from`. Returns `None` if the order was changed by someone else in the
    /// meantime.
    async fn update_order_status(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, AdminError>;

    /// Deletes the order and its items, unless its payment has been completed. Returns false if no order was deleted.
    async fn delete_unpaid_order(&self, order_id: i64) -> Result<bool, AdminError>;

    async fn fetch_branches(&self, filter: BranchQueryFilter) -> Result<Vec<Branch>, AdminError>;

    async fn fetch_branch(&self, branch_id: i64) -> Result<Option<Branch>, AdminError>;

    async fn insert_branch(&self, name: &str, is_active: bool) -> Result<Branch, AdminError>;

    async fn set_branch_active(&self, branch_id: i64, is_active: bool) -> Result<Option<Branch>, AdminError>;

    /// Lists customers, ordered by first and then last name, each with the number of orders they have placed.
    async fn search_customers(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<Page<CustomerSummary>, AdminError>;
}
