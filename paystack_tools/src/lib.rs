//! A thin async client for the parts of the Paystack REST API the store uses.
//!
//! * [`PaystackApi::initialize_payment`] starts a transaction and hands back the hosted checkout URL.
//! * [`PaystackApi::verify_payment`] asks Paystack for the final state of a transaction.
//! * [`verify_webhook_signature`] authenticates webhook deliveries (`X-Paystack-Signature`).
//!
//! The [`PaymentGateway`] trait abstracts the first two calls so that the server can be exercised against a mock.
mod api;
mod config;
mod data_objects;
mod error;
mod gateway;
mod signature;

pub use api::PaystackApi;
pub use config::PaystackConfig;
pub use data_objects::{
    CustomField,
    InitializeRequest,
    InitializedTransaction,
    PaymentMetadata,
    TransactionStatus,
    VerifiedTransaction,
    WebhookEvent,
};
pub use error::PaystackApiError;
pub use gateway::PaymentGateway;
pub use signature::{calculate_signature, verify_webhook_signature, PAYSTACK_SIGNATURE_HEADER};
