pub mod helpers;
pub mod mocks;

mod admin;
mod auth;
mod payments;
mod storefront;
