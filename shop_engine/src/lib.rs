//! Shop Engine
//!
//! This library contains the core logic of the online store backend: the product catalog, shopping carts, checkout,
//! payment reconciliation and the branch-scoped order administration. It knows nothing about HTTP or about any
//! particular payment provider.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`] and the backends). SQLite is the supported backend. You should
//!    never need to access the database directly. Instead, use the public API provided by the engine. The exception
//!    is the data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The engine public API ([`mod@shop_api`]). This provides the public-facing functionality of the store. Backends
//!    need to implement the traits in [`mod@traits`] in order to be used by the API.
//!
//! The engine also emits events when orders are created, paid for, or change status. A simple hook system is used so
//! that you can react to these events, e.g. by sending emails.
pub mod db_types;
pub mod events;
pub mod traits;

mod shop_api;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use shop_api::{
    admin_api::AdminApi,
    auth_api::AuthApi,
    cart_api::CartApi,
    catalog_api::CatalogApi,
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db::db_url, SqliteDatabase};
