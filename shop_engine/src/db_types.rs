use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use shop_common::Pesewas;
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Product images larger than this are rejected.
pub const MAX_IMAGE_SIZE_BYTES: i64 = 500 * 1024;
/// Upper bound for names stored on orders and products.
pub const MAX_NAME_LENGTH: usize = 100;
/// Upper bound for phone numbers stored on orders.
pub const MAX_PHONE_LENGTH: usize = 15;
/// The most units of a single product that a cart line may hold. Mirrored by a CHECK constraint on `cart_items`.
pub const MAX_ITEM_QUANTITY: i64 = 10_000;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(String);

//--------------------------------------        Branch         ---------------------------------------------------------
/// A fulfilment location. Every order is routed to exactly one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Branch {
    pub id: i64,
    pub name: String,
    pub is_active: bool,
}

//--------------------------------------         Role          ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Branch staff. Can see and process the orders of their own branch.
    Staff,
    /// Can see every branch, manage branches and staff, and delete orders.
    Superuser,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Staff => write!(f, "Staff"),
            Role::Superuser => write!(f, "Superuser"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Staff" => Ok(Self::Staff),
            "Superuser" => Ok(Self::Superuser),
            _ => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------       AdminUser       ---------------------------------------------------------
/// A back-office user. The branch link lives in its own table, and is joined in when users are fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AdminUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub is_superuser: bool,
    pub branch_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    pub fn roles(&self) -> Vec<Role> {
        if self.is_superuser {
            vec![Role::Staff, Role::Superuser]
        } else {
            vec![Role::Staff]
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAdminUser {
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password_hash: String,
    #[serde(default)]
    pub is_superuser: bool,
}

//--------------------------------------       Catalog         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Collection {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CollectionSummary {
    pub id: i64,
    pub name: String,
    pub product_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: Pesewas,
    pub is_available: bool,
    pub collection_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Pesewas,
    #[serde(default = "default_true")]
    pub is_available: bool,
    pub collection_id: i64,
}

fn default_true() -> bool {
    true
}

impl NewProduct {
    pub fn new<S: Into<String>>(name: S, price: Pesewas, collection_id: i64) -> Self {
        Self { name: name.into(), description: String::default(), price, is_available: true, collection_id }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = description.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Pesewas>,
    pub is_available: Option<bool>,
    pub collection_id: Option<i64>,
}

impl ProductUpdate {
    pub fn with_price(mut self, price: Pesewas) -> Self {
        self.price = Some(price);
        self
    }

    pub fn with_availability(mut self, is_available: bool) -> Self {
        self.is_available = Some(is_available);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.is_available.is_none() &&
            self.collection_id.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProductImage {
    pub id: i64,
    pub product_id: i64,
    pub url: String,
    pub size_bytes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductImage {
    pub url: String,
    pub size_bytes: i64,
}

//--------------------------------------       Customer        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
}

impl Customer {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CustomerSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub customer: Customer,
    pub orders_count: i64,
}

/// The customer details supplied at checkout. Customers are identified by their email address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum OrderStatusType {
    /// The order has been placed and is waiting to be dispatched.
    Pending,
    /// The branch has dispatched the order.
    Shipped,
    /// The order has been delivered.
    Completed,
    /// The order was cancelled by an admin or by the housekeeping worker.
    Cancelled,
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Shipped" => Ok(Self::Shipped),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

impl OrderStatusType {
    /// Whether an order may move from `self` to `to`. Orders only ever move forward, and `Completed` and `Cancelled`
    /// are terminal. Moving to the same status is not a transition.
    pub fn can_transition_to(&self, to: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, to), (Pending, Shipped | Completed | Cancelled) | (Shipped, Completed | Cancelled))
    }

    /// Statuses that warrant letting the customer know.
    pub fn notifies_customer(&self) -> bool {
        matches!(self, OrderStatusType::Shipped | OrderStatusType::Completed)
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "Pending"),
            PaymentStatus::Completed => write!(f, "Completed"),
            PaymentStatus::Failed => write!(f, "Failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------         Order         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub customer_number: String,
    pub customer_email: String,
    pub recipient_name: String,
    pub recipient_number: String,
    pub recipient_address: String,
    pub status: OrderStatusType,
    pub payment_status: PaymentStatus,
    pub branch_id: i64,
    /// The sum of `quantity * price_at_purchase` over the order items, fixed at checkout.
    pub total_price: Pesewas,
    pub paystack_ref: Option<String>,
    pub paystack_access_code: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price_at_purchase: Pesewas,
}

impl OrderItem {
    /// Checkout refuses carts whose total does not fit, so an order line never saturates in practice.
    pub fn line_total(&self) -> Pesewas {
        self.price_at_purchase.checked_mul(self.quantity).unwrap_or(Pesewas::from(i64::MAX))
    }
}

/// An order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

//--------------------------------------         Cart          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Cart {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: String,
    pub product_id: i64,
    pub quantity: i64,
}

/// A cart item joined with the current details of its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CartLine {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: Pesewas,
    pub is_available: bool,
    pub quantity: i64,
}

impl CartLine {
    /// `None` if the line total does not fit in an `i64`.
    pub fn line_total(&self) -> Option<Pesewas> {
        self.unit_price.checked_mul(self.quantity)
    }

    /// The sum of the line totals, or `None` if it overflows.
    pub fn total_of(lines: &[CartLine]) -> Option<Pesewas> {
        lines.iter().try_fold(Pesewas::default(), |total, line| total.checked_add(line.line_total()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartContents {
    pub id: String,
    pub items: Vec<CartLine>,
    pub total_price: Pesewas,
}

impl CartContents {
    /// Returns `None` if the cart total cannot be represented.
    pub fn try_new(id: String, items: Vec<CartLine>) -> Option<Self> {
        let total_price = CartLine::total_of(&items)?;
        Some(Self { id, items, total_price })
    }
}
