//! # Shop engine public API
//!
//! The `shop_api` module exposes the programmatic API for the store.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//!
//! * [`catalog_api`] lists collections and products, and lets admins maintain them.
//! * [`cart_api`] manages anonymous shopping carts.
//! * [`order_flow_api`] is the primary API for turning carts into orders and for reconciling order payments with the
//!   payment gateway. It also runs the housekeeping sweep.
//! * [`admin_api`] provides the branch-scoped back-office functions: order management, branches and customers.
//! * [`auth_api`] stores back-office users and their branch accounts.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! ```rust,ignore
//! use shop_engine::{CatalogApi, SqliteDatabase, order_objects::{Pagination, ProductQueryFilter}};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements CatalogManagement
//! let api = CatalogApi::new(db);
//! let page = api.list_products(ProductQueryFilter::default(), Pagination::default()).await?;
//! ```

pub mod admin_api;
pub mod auth_api;
pub mod cart_api;
pub mod catalog_api;
pub mod order_flow_api;
pub mod order_objects;
