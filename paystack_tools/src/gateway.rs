use crate::{InitializeRequest, InitializedTransaction, PaystackApiError, VerifiedTransaction};

/// The calls the store makes against its payment provider.
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Opens a new transaction and returns the URL the customer must visit to pay.
    async fn initialize_payment(&self, request: InitializeRequest) -> Result<InitializedTransaction, PaystackApiError>;

    /// Fetches the current state of the transaction identified by `reference`.
    async fn verify_payment(&self, reference: &str) -> Result<VerifiedTransaction, PaystackApiError>;
}
