use serde::{Deserialize, Serialize};

use crate::db_types::{FullOrder, Order, OrderStatusType};

/// A cart has been checked out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: FullOrder,
}

impl OrderCreatedEvent {
    pub fn new(order: FullOrder) -> Self {
        Self { order }
    }
}

/// The payment for an order has been completed. Emitted exactly once per order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: FullOrder,
}

impl OrderPaidEvent {
    pub fn new(order: FullOrder) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }

    pub fn new_status(&self) -> OrderStatusType {
        self.order.status
    }
}

