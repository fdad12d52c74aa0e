//! # Shop server
//! The HTTP front end of the online store. It is responsible for:
//! * Serving the public storefront API: the product catalog, shopping carts and checkout.
//! * Starting Paystack payments, verifying them, and receiving Paystack's signed webhook notifications.
//! * The staff API under `/api`, where branch staff process the orders routed to their branch and superusers manage
//!   branches, staff accounts and the catalog.
//! * Sending customer emails when orders are paid for, shipped or delivered.
//! * Cleaning up abandoned carts and stale unpaid orders in the background.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! See [routes](routes/index.html) for the full list. `/health` returns a 200 OK response.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod housekeeping_worker;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
