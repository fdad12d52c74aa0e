//! #  Database management and control.
//!
//! This module provides the interfaces that define the contracts of the shop engine database *backends*.
//!
//! * [`CatalogManagement`] covers collections, products and product images.
//! * [`CartManagement`] covers anonymous shopping carts.
//! * [`OrderFlowDatabase`] is the highest-level trait. It converts carts into orders and reconciles payment state.
//!   Every method on it is atomic.
//! * [`AdminManagement`] provides the back-office queries: orders, branches and customers.
//! * [`AuthManagement`] stores admin users and their branch accounts.
mod admin_management;
mod auth_management;
mod cart_management;
mod catalog_management;
mod order_flow_database;

pub use admin_management::{AdminError, AdminManagement};
pub use auth_management::{AuthApiError, AuthManagement};
pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use order_flow_database::{CheckoutError, OrderFlowDatabase};
