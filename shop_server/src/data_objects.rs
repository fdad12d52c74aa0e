use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_engine::{
    db_types::{AdminUser, OrderStatusType, PaymentStatus, Pesewas},
    order_objects::{
        BranchQueryFilter,
        CheckoutRequest,
        OrderQueryFilter,
        Pagination,
        ProductOrdering,
        ProductQueryFilter,
    },
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//--------------------------------------        Auth           ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: AdminUser,
}

impl LoginResponse {
    pub fn bearer(access_token: String, user: AdminUser) -> Self {
        Self { access_token, token_type: "Bearer".into(), user }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUserRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_superuser: bool,
    /// Staff members can be linked to their branch straight away.
    #[serde(default)]
    pub branch_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignBranchParams {
    pub branch_id: i64,
}

//--------------------------------------        Carts          ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemParams {
    pub product_id: i64,
    #[serde(default = "one")]
    pub quantity: i64,
}

fn one() -> i64 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuantityParams {
    pub quantity: i64,
}

//--------------------------------------   Checkout/Payment    ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutParams {
    #[serde(flatten)]
    pub request: CheckoutRequest,
    /// Overrides the configured Paystack callback URL for this payment.
    #[serde(default)]
    pub callback_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitializePaymentParams {
    #[serde(default)]
    pub callback_url: Option<String>,
}

//--------------------------------------       Queries         ---------------------------------------------------------
/// Query parameters for `GET /products`. Prices are decimal cedi amounts, e.g. `min_price=12.50`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductQueryParams {
    pub collection: Option<i64>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub is_available: Option<bool>,
    pub search: Option<String>,
    pub ordering: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ProductQueryParams {
    pub fn into_query(self) -> Result<(ProductQueryFilter, Pagination), ServerError> {
        let ordering = match self.ordering.as_deref() {
            None | Some("") => None,
            Some("price") => Some(ProductOrdering::PriceAscending),
            Some("-price") => Some(ProductOrdering::PriceDescending),
            Some(s) => return Err(ServerError::ValidationError(format!("Cannot order products by '{s}'"))),
        };
        let filter = ProductQueryFilter {
            collection_id: self.collection,
            min_price: parse_price(self.min_price.as_deref())?,
            max_price: parse_price(self.max_price.as_deref())?,
            is_available: self.is_available,
            search: self.search.filter(|s| !s.trim().is_empty()),
            ordering,
        };
        Ok((filter, Pagination::new(self.page, self.page_size)))
    }
}

fn parse_price(s: Option<&str>) -> Result<Option<Pesewas>, ServerError> {
    s.filter(|s| !s.trim().is_empty())
        .map(|s| s.parse::<Pesewas>().map_err(|e| ServerError::ValidationError(e.to_string())))
        .transpose()
}

/// Query parameters for `GET /api/orders`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryParams {
    pub status: Option<OrderStatusType>,
    pub payment_status: Option<PaymentStatus>,
    pub branch_id: Option<i64>,
    pub customer_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl OrderQueryParams {
    pub fn into_query(self) -> (OrderQueryFilter, Pagination) {
        let filter = OrderQueryFilter {
            status: self.status,
            payment_status: self.payment_status,
            branch_id: self.branch_id,
            customer_id: self.customer_id,
            since: self.since,
            until: self.until,
            search: self.search.filter(|s| !s.trim().is_empty()),
        };
        (filter, Pagination::new(self.page, self.page_size))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BranchQueryParams {
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl From<BranchQueryParams> for BranchQueryFilter {
    fn from(params: BranchQueryParams) -> Self {
        Self { is_active: params.is_active, search: params.search.filter(|s| !s.trim().is_empty()) }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerQueryParams {
    pub search: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

//--------------------------------------     Admin bodies      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateParams {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBranchParams {
    pub name: String,
    #[serde(default = "yes")]
    pub is_active: bool,
}

fn yes() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchUpdateParams {
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCollectionParams {
    pub name: String,
}
