use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{CustomerDetails, OrderStatusType, Pesewas, PaymentStatus};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

//--------------------------------------      Pagination       ---------------------------------------------------------
/// Page-number pagination. Pages are numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    /// Builds a pagination request from optional query parameters, clamping out-of-range values.
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self { page, page_size }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// The total number of records matching the query, across all pages.
    pub count: i64,
    pub page: u32,
    pub page_size: u32,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(count: i64, pagination: Pagination, results: Vec<T>) -> Self {
        Self { count, page: pagination.page, page_size: pagination.page_size, results }
    }

    pub fn has_next(&self) -> bool {
        i64::from(self.page) * i64::from(self.page_size) < self.count
    }
}

//--------------------------------------      OrderScope       ---------------------------------------------------------
/// The set of orders an admin user is allowed to see and act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderScope {
    /// Superusers see every branch.
    All,
    /// Staff see the orders routed to their own branch.
    Branch(i64),
    /// Staff without a branch account see nothing.
    Nothing,
}

impl OrderScope {
    pub fn for_user(is_superuser: bool, branch_id: Option<i64>) -> Self {
        match (is_superuser, branch_id) {
            (true, _) => Self::All,
            (false, Some(id)) => Self::Branch(id),
            (false, None) => Self::Nothing,
        }
    }

    pub fn includes_branch(&self, branch_id: i64) -> bool {
        match self {
            Self::All => true,
            Self::Branch(id) => *id == branch_id,
            Self::Nothing => false,
        }
    }

    pub fn is_superuser(&self) -> bool {
        matches!(self, Self::All)
    }
}

//--------------------------------------   OrderQueryFilter    ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub status: Option<OrderStatusType>,
    pub payment_status: Option<PaymentStatus>,
    pub branch_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Matches a recipient name prefix, an exact order id, or an exact payment reference.
    pub search: Option<String>,
}

impl OrderQueryFilter {
    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn with_branch_id(mut self, branch_id: i64) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() &&
            self.payment_status.is_none() &&
            self.branch_id.is_none() &&
            self.customer_id.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.search.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(status) = &self.status {
            write!(f, "status: {status}. ")?;
        }
        if let Some(status) = &self.payment_status {
            write!(f, "payment_status: {status}. ")?;
        }
        if let Some(id) = &self.branch_id {
            write!(f, "branch_id: {id}. ")?;
        }
        if let Some(id) = &self.customer_id {
            write!(f, "customer_id: {id}. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since: {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until: {until}. ")?;
        }
        if let Some(search) = &self.search {
            write!(f, "search: {search}. ")?;
        }
        Ok(())
    }
}

//--------------------------------------     OrderUpdate       ---------------------------------------------------------
/// The editable fields of an existing order. Payment fields, the creation date and the order items are read-only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderUpdate {
    pub recipient_name: Option<String>,
    pub recipient_number: Option<String>,
    pub recipient_address: Option<String>,
    pub branch_id: Option<i64>,
}

impl OrderUpdate {
    pub fn with_recipient_name<S: Into<String>>(mut self, name: S) -> Self {
        self.recipient_name = Some(name.into());
        self
    }

    pub fn with_recipient_address<S: Into<String>>(mut self, address: S) -> Self {
        self.recipient_address = Some(address.into());
        self
    }

    pub fn with_branch_id(mut self, branch_id: i64) -> Self {
        self.branch_id = Some(branch_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.recipient_name.is_none() &&
            self.recipient_number.is_none() &&
            self.recipient_address.is_none() &&
            self.branch_id.is_none()
    }
}

//--------------------------------------    CheckoutRequest    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub cart_id: String,
    pub branch_id: i64,
    pub customer: CustomerDetails,
    pub recipient_name: String,
    pub recipient_number: String,
    pub recipient_address: String,
}

/// Emitted by the housekeeping sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HousekeepingResult {
    pub carts_purged: u64,
    pub orders_cancelled: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductQueryFilter {
    pub collection_id: Option<i64>,
    pub min_price: Option<Pesewas>,
    pub max_price: Option<Pesewas>,
    pub is_available: Option<bool>,
    /// Case-insensitive substring match on the name or the description.
    pub search: Option<String>,
    pub ordering: Option<ProductOrdering>,
}

impl ProductQueryFilter {
    pub fn with_collection_id(mut self, id: i64) -> Self {
        self.collection_id = Some(id);
        self
    }

    pub fn with_price_range(mut self, min: Option<Pesewas>, max: Option<Pesewas>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn ordered_by(mut self, ordering: ProductOrdering) -> Self {
        self.ordering = Some(ordering);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProductOrdering {
    #[serde(rename = "price")]
    PriceAscending,
    #[serde(rename = "-price")]
    PriceDescending,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchQueryFilter {
    pub is_active: Option<bool>,
    /// Branch name prefix.
    pub search: Option<String>,
}
